//! Registration, sign-in and sign-out commands

use super::helpers::{read_password, Context};
use pathwise_core::{
    error::{PathwiseError, Result},
    profile::Registration,
    types::ExperienceLevel,
};
use tracing::info;

pub async fn register(
    ctx: &Context,
    email: String,
    name: String,
    goal: String,
    experience: String,
    password: Option<String>,
) -> Result<()> {
    let app = ctx.open_app(true).await?;
    let experience_level: ExperienceLevel =
        experience.parse().map_err(PathwiseError::Validation)?;
    let password = read_password(password)?;
    let profile = app
        .profiles
        .register(Registration {
            email: email.clone(),
            password: password.clone(),
            name,
            goal,
            experience_level,
        })
        .await?;

    let sessions = ctx.sessions(app.events.clone());
    sessions.start(app.auth.sign_in(&email, &password).await?);
    ctx.persist(&sessions)?;

    ctx.output(&profile, |profile| {
        println!("✓ Registered {} ({})", profile.name, profile.id);
        if profile.has_goal() {
            println!("  Career path: {}", profile.goal);
        } else {
            println!("  Next: pick a career path with `pathwise paths`");
        }
    })
}

pub async fn login(ctx: &Context, email: String, password: Option<String>) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let password = read_password(password)?;
    let signed_in = app.auth.sign_in(&email, &password).await?;
    let user_id = signed_in.user_id;

    let sessions = ctx.sessions(app.events.clone());
    if let Some(previous) = sessions.current().filter(|s| s.user_id != user_id) {
        // Switching accounts retires the old token
        app.auth.sign_out(&previous.token).await?;
    }
    sessions.start(signed_in);
    ctx.persist(&sessions)?;
    info!("Signed in as {}", user_id);

    ctx.output(&user_id, |user_id| {
        println!("✓ Signed in ({})", user_id);
    })
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let sessions = ctx.sessions(app.events.clone());
    let Some(session) = sessions.end() else {
        println!("Not signed in");
        return Ok(());
    };
    ctx.persist(&sessions)?;
    app.auth.sign_out(&session.token).await?;
    println!("✓ Signed out");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let profile = app.profiles.get(user_id).await?;
    ctx.output(&profile, |profile| {
        println!("{} <{}>", profile.name, profile.id);
        println!("  Experience:  {}", profile.experience_level);
        println!(
            "  Career path: {}",
            if profile.has_goal() { profile.goal.as_str() } else { "(none)" }
        );
        println!("  Credibility: {}/100", profile.credibility_score);
    })
}
