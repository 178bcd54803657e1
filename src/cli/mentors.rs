//! Mentorship commands

use super::helpers::{parse_id, Context};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use pathwise_core::{
    error::{PathwiseError, Result},
    mentorship::ApplicationInput,
    types::MentorId,
};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum MentorCommands {
    /// List mentors by rating
    List,
    /// Book a session with a mentor
    Book {
        mentor_id: String,
        /// Session time (RFC 3339); now when omitted
        #[arg(long)]
        at: Option<String>,
    },
    /// Your booked sessions
    Sessions,
    /// Load mentors from a JSON array file
    Import { file: PathBuf },
    /// Apply to become a mentor
    Apply {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        qualification: String,
        /// Career path topic to mentor in
        #[arg(long)]
        stream: String,
        #[arg(long)]
        certificate_url: Option<String>,
    },
}

fn parse_session_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PathwiseError::validation(format!("Invalid session time '{}': {}", raw, e)))
}

pub async fn handle(ctx: &Context, command: MentorCommands) -> Result<()> {
    let app = ctx.open_app(false).await?;

    match command {
        MentorCommands::List => {
            ctx.signed_in(&app).await?;
            let mentors = app.mentorship.list_mentors().await?;
            ctx.output(&mentors, |mentors| {
                if mentors.is_empty() {
                    println!("No mentors available. Import some with `pathwise mentors import`.");
                }
                for mentor in mentors {
                    println!(
                        "  ★ {:.1}  {} - {} at {}",
                        mentor.rating, mentor.name, mentor.role, mentor.company
                    );
                    if !mentor.expertise.is_empty() {
                        println!("         {}", mentor.expertise.join(", "));
                    }
                    println!("         id: {}", mentor.id);
                }
            })
        }
        MentorCommands::Book { mentor_id, at } => {
            let user_id = ctx.signed_in(&app).await?;
            let mentor_id: MentorId = parse_id(&mentor_id)?;
            let at = at.as_deref().map(parse_session_time).transpose()?;
            let session = app.mentorship.book(user_id, mentor_id, at).await?;
            ctx.output(&session, |session| {
                println!(
                    "✓ Session booked for {}",
                    session.session_date.format("%Y-%m-%d %H:%M UTC")
                );
            })
        }
        MentorCommands::Sessions => {
            let user_id = ctx.signed_in(&app).await?;
            let sessions = app.mentorship.sessions(user_id).await?;
            ctx.output(&sessions, |sessions| {
                if sessions.is_empty() {
                    println!("No sessions booked");
                }
                for session in sessions {
                    println!(
                        "  {}  [{}]  mentor {}",
                        session.session_date.format("%Y-%m-%d %H:%M"),
                        session.status.as_str(),
                        session.mentor_id
                    );
                }
            })
        }
        MentorCommands::Import { file } => {
            let count = app.mentorship.import_mentors_from_path(&file).await?;
            println!("✓ Imported {} mentors from {}", count, file.display());
            Ok(())
        }
        MentorCommands::Apply {
            name,
            email,
            qualification,
            stream,
            certificate_url,
        } => {
            ctx.signed_in(&app).await?;
            let application = app
                .mentorship
                .apply(ApplicationInput {
                    full_name: name,
                    email,
                    educational_qualification: qualification,
                    stream_of_mentoring: stream,
                    certificate_url,
                })
                .await?;
            ctx.output(&application, |_| {
                println!("✓ Application submitted. We'll review it and get back to you soon.");
            })
        }
    }
}
