//! Career path, dashboard and roadmap commands

use super::helpers::{parse_id, progress_bar, Context};
use pathwise_core::{
    dashboard::DashboardOutcome,
    error::Result,
    roadmap::{career_paths, CompletionResult, SkipReason},
    types::{ModuleId, ModuleState, RoadmapModule},
};

fn state_marker(module: &RoadmapModule) -> &'static str {
    match module.state() {
        ModuleState::Completed => "✓",
        ModuleState::Unlocked => "▶",
        ModuleState::Locked => "🔒",
    }
}

fn print_modules(modules: &[RoadmapModule]) {
    for module in modules {
        println!(
            "  {} {:>2}. {} [{}]",
            state_marker(module),
            module.order_index + 1,
            module.title,
            module.module_type.as_str()
        );
        println!("        id: {}", module.id);
    }
}

pub fn paths(ctx: &Context) -> Result<()> {
    ctx.output(&career_paths(), |paths| {
        println!("Career paths:");
        for path in paths.iter() {
            println!("  {:<14} {} - {}", path.value, path.title, path.description);
        }
    })
}

pub async fn select_path(ctx: &Context, topic: String) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let removed = app.careers.select_path(user_id, &topic).await?;
    println!("✓ Career path set to {}", topic.trim());
    if removed > 0 {
        println!("  Removed {} modules of your previous roadmaps", removed);
    }
    println!("  Run `pathwise dashboard` to generate the new roadmap");
    Ok(())
}

pub async fn dashboard(ctx: &Context) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let outcome = app.dashboard.load(user_id).await?;

    ctx.output(&outcome, |outcome| match outcome {
        DashboardOutcome::SelectCareerPath => {
            println!("No career path selected yet.");
            println!("Pick one with `pathwise select-path <TOPIC>`:");
            for path in career_paths() {
                println!("  {:<14} {}", path.value, path.title);
            }
        }
        DashboardOutcome::Ready(view) => {
            println!("Welcome back, {}", view.profile.name);
            println!(
                "  Credibility {}/100   Progress {}   Study hours {:.1}",
                view.profile.credibility_score,
                progress_bar(view.summary.percent),
                view.summary.study_hours
            );
            if let Some(metrics) = &view.metrics {
                println!(
                    "  Engagement {}   Velocity {}   Mastery {}",
                    metrics.engagement_score, metrics.velocity_score, metrics.mastery_score
                );
            }
            println!();
            println!("Roadmap ({}/{} completed):", view.summary.completed, view.summary.total);
            print_modules(&view.modules);
            if !view.recent_activity.is_empty() {
                println!();
                println!("Recent activity:");
                for log in &view.recent_activity {
                    println!(
                        "  {}  {}",
                        log.created_at.format("%Y-%m-%d %H:%M"),
                        log.action.as_str()
                    );
                }
            }
        }
    })
}

pub async fn progress(ctx: &Context) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let summary = app.dashboard.progress(user_id).await?;
    ctx.output(&summary, |summary| {
        println!(
            "{}/{} modules completed {}",
            summary.completed,
            summary.total,
            progress_bar(summary.percent)
        );
    })
}

pub async fn roadmap(ctx: &Context, topic: Option<String>) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let modules = app.dashboard.roadmap(user_id, topic.as_deref()).await?;
    ctx.output(&modules, |modules| {
        if modules.is_empty() {
            println!("No roadmap yet. Run `pathwise dashboard` to generate one.");
            return;
        }
        let mut current_topic: Option<&str> = None;
        for module in modules.iter() {
            if current_topic != Some(module.topic.as_str()) {
                current_topic = Some(module.topic.as_str());
                println!("{}:", module.topic);
            }
            print_modules(std::slice::from_ref(module));
        }
    })
}

pub async fn replace(ctx: &Context, topic: String) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let replaced = app.generator.replace(user_id, &topic).await?;
    ctx.output(&replaced, |replaced| {
        println!("✓ Roadmap replaced with {}", topic.trim());
        if replaced.removed > 0 {
            println!("  Removed {} modules of your previous roadmaps", replaced.removed);
        }
        print_modules(&replaced.modules);
    })
}

pub async fn complete(ctx: &Context, module_id: String) -> Result<()> {
    let module_id: ModuleId = parse_id(&module_id)?;
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let result = app.progression.complete_module(user_id, module_id).await?;

    ctx.output(&result, |result| match result {
        CompletionResult::Completed {
            module,
            unlocked,
            credibility,
            ..
        } => {
            println!("✓ Completed '{}'", module.title);
            match unlocked {
                Some(next) => println!("  Unlocked '{}'", next.title),
                None => println!("  That was the last module of {}", module.topic),
            }
            println!("  Credibility is now {}/100", credibility);
        }
        CompletionResult::Skipped {
            reason: SkipReason::Locked,
        } => println!("Module is still locked; complete the previous module first"),
        CompletionResult::Skipped {
            reason: SkipReason::AlreadyCompleted,
        } => println!("Module is already completed"),
    })
}

pub async fn reconcile(ctx: &Context) -> Result<()> {
    let app = ctx.open_app(false).await?;
    let user_id = ctx.signed_in(&app).await?;
    let reconciled = app.progression.reconcile(user_id).await?;
    ctx.output(&reconciled, |reconciled| {
        println!("✓ Recomputed derived scores");
        println!("  Credibility {}/100", reconciled.credibility);
        match &reconciled.metrics {
            Some(m) => println!(
                "  Engagement {}   Velocity {}   Mastery {}",
                m.engagement_score, m.velocity_score, m.mastery_score
            ),
            None => println!("  No activity yet, metrics unchanged"),
        }
    })
}
