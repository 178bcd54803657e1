//! Community Q&A commands

use super::helpers::{parse_id, Context};
use clap::Subcommand;
use pathwise_core::{
    error::Result,
    types::{AnswerId, QuestionId},
};

#[derive(Subcommand)]
pub enum CommunityCommands {
    /// Show all threads, newest first
    List,
    /// Ask a question
    Ask {
        question: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Answer a question
    Answer { question_id: String, answer: String },
    /// Edit a question you asked
    EditQuestion {
        id: String,
        question: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a question you asked, with its answers
    DeleteQuestion { id: String },
    /// Edit an answer you wrote
    EditAnswer { id: String, answer: String },
    /// Delete an answer you wrote
    DeleteAnswer { id: String },
}

pub async fn handle(ctx: &Context, command: CommunityCommands) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;

    match command {
        CommunityCommands::List => {
            let threads = app.community.threads().await?;
            ctx.output(&threads, |threads| {
                if threads.is_empty() {
                    println!("No questions yet. Be the first to ask!");
                }
                for thread in threads {
                    println!("Q: {}  ({})", thread.question.question, thread.author_name);
                    if let Some(description) = &thread.question.description {
                        println!("   {}", description);
                    }
                    println!("   id: {}", thread.question.id);
                    for answer in &thread.answers {
                        println!("   A: {}  ({})", answer.answer.answer, answer.author_name);
                        println!("      id: {}", answer.answer.id);
                    }
                    println!();
                }
            })
        }
        CommunityCommands::Ask {
            question,
            description,
        } => {
            let question = app.community.ask(user_id, &question, description).await?;
            ctx.output(&question, |q| println!("✓ Question posted ({})", q.id))
        }
        CommunityCommands::Answer {
            question_id,
            answer,
        } => {
            let question_id: QuestionId = parse_id(&question_id)?;
            let answer = app.community.answer(user_id, question_id, &answer).await?;
            ctx.output(&answer, |a| println!("✓ Answer posted ({})", a.id))
        }
        CommunityCommands::EditQuestion {
            id,
            question,
            description,
        } => {
            let id: QuestionId = parse_id(&id)?;
            let question = app
                .community
                .edit_question(user_id, id, &question, description)
                .await?;
            ctx.output(&question, |_| println!("✓ Question updated"))
        }
        CommunityCommands::DeleteQuestion { id } => {
            let id: QuestionId = parse_id(&id)?;
            app.community.delete_question(user_id, id).await?;
            println!("✓ Question deleted");
            Ok(())
        }
        CommunityCommands::EditAnswer { id, answer } => {
            let id: AnswerId = parse_id(&id)?;
            let answer = app.community.edit_answer(user_id, id, &answer).await?;
            ctx.output(&answer, |_| println!("✓ Answer updated"))
        }
        CommunityCommands::DeleteAnswer { id } => {
            let id: AnswerId = parse_id(&id)?;
            app.community.delete_answer(user_id, id).await?;
            println!("✓ Answer deleted");
            Ok(())
        }
    }
}
