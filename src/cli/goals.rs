//! Goal commands

use super::helpers::{parse_date, parse_id, Context};
use clap::Subcommand;
use pathwise_core::{
    error::{PathwiseError, Result},
    goals::GoalInput,
    types::{Goal, GoalId, GoalStatus},
};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// List your goals, newest first
    List,
    /// Add a goal
    Add {
        title: String,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Edit a goal you own
    Edit {
        id: String,
        title: String,
        #[arg(long)]
        deadline: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Set status: active, completed or cancelled
    Status { id: String, status: String },
    /// Delete a goal you own
    Delete { id: String },
}

fn print_goal(goal: &Goal) {
    println!(
        "  [{}] {} (due {})",
        goal.status.as_str(),
        goal.goal_title,
        goal.deadline
    );
    if let Some(description) = &goal.description {
        println!("        {}", description);
    }
    println!("        id: {}", goal.id);
}

pub async fn handle(ctx: &Context, command: GoalCommands) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;

    match command {
        GoalCommands::List => {
            let goals = app.goals.list(user_id).await?;
            ctx.output(&goals, |goals| {
                if goals.is_empty() {
                    println!("No goals yet");
                }
                goals.iter().for_each(print_goal);
            })
        }
        GoalCommands::Add {
            title,
            deadline,
            description,
        } => {
            let input = GoalInput {
                goal_title: title,
                description,
                deadline: parse_date(&deadline)?,
            };
            let goal = app.goals.create(user_id, input).await?;
            ctx.output(&goal, |goal| {
                println!("✓ Goal added");
                print_goal(goal);
            })
        }
        GoalCommands::Edit {
            id,
            title,
            deadline,
            description,
        } => {
            let id: GoalId = parse_id(&id)?;
            let input = GoalInput {
                goal_title: title,
                description,
                deadline: parse_date(&deadline)?,
            };
            let goal = app.goals.update(user_id, id, input).await?;
            ctx.output(&goal, |goal| {
                println!("✓ Goal updated");
                print_goal(goal);
            })
        }
        GoalCommands::Status { id, status } => {
            let id: GoalId = parse_id(&id)?;
            let status: GoalStatus = status.trim().parse().map_err(PathwiseError::Validation)?;
            let goal = app.goals.set_status(user_id, id, status).await?;
            ctx.output(&goal, |goal| {
                println!("✓ Goal is now {}", goal.status.as_str());
            })
        }
        GoalCommands::Delete { id } => {
            let id: GoalId = parse_id(&id)?;
            app.goals.delete(user_id, id).await?;
            println!("✓ Goal deleted");
            Ok(())
        }
    }
}
