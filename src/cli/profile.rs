//! Profile commands

use super::helpers::Context;
use clap::Subcommand;
use pathwise_core::{
    error::{PathwiseError, Result},
    profile::ProfileEdit,
    types::ExperienceLevel,
};

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show your profile
    Show,
    /// Edit your profile; omitted fields keep their value
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        goal: Option<String>,
        /// Entry, Junior, Intermediate or Senior
        #[arg(long)]
        experience: Option<String>,
        /// Comma separated, replaces the current list
        #[arg(long)]
        skills: Option<String>,
    },
}

pub async fn handle(ctx: &Context, command: ProfileCommands) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let profile = app.profiles.get(user_id).await?;

    let profile = match command {
        ProfileCommands::Show => profile,
        ProfileCommands::Edit {
            name,
            goal,
            experience,
            skills,
        } => {
            let experience_level = match experience {
                Some(raw) => raw
                    .trim()
                    .parse::<ExperienceLevel>()
                    .map_err(PathwiseError::Validation)?,
                None => profile.experience_level,
            };
            let edit = ProfileEdit {
                name: name.unwrap_or(profile.name),
                goal: goal.unwrap_or(profile.goal),
                experience_level,
                skills: skills.unwrap_or_else(|| profile.skills.join(", ")),
            };
            let updated = app.profiles.update(user_id, edit).await?;
            println!("✓ Profile updated");
            updated
        }
    };

    ctx.output(&profile, |profile| {
        println!("{}", profile.name);
        println!("  Experience:  {}", profile.experience_level);
        println!(
            "  Career path: {}",
            if profile.has_goal() { profile.goal.as_str() } else { "(none)" }
        );
        println!(
            "  Skills:      {}",
            if profile.skills.is_empty() { "(none)".to_string() } else { profile.skills.join(", ") }
        );
        println!("  Credibility: {}/100   Level {}", profile.credibility_score, profile.level);
        println!("  Language:    {}", profile.language);
    })
}
