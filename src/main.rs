//! PathWise - personalized career learning roadmaps
//!
//! Entry point for the `pathwise` command line and the `pathwise serve`
//! HTTP API.

mod cli;

use clap::{Parser, Subcommand};
use cli::{
    community::CommunityCommands, goals::GoalCommands, helpers::Context,
    mentors::MentorCommands, profile::ProfileCommands,
};
use pathwise_core::config::PathwiseConfig;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "pathwise")]
#[command(about = "Personalized career learning roadmaps", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Database path or libsql:// URL (overrides the config file)
    #[arg(long, env = "PATHWISE_DB")]
    db_path: Option<String>,

    /// Configuration file (defaults to ./pathwise.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,

    /// Create an account and profile, then sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// Career path topic (pick one later when omitted)
        #[arg(long, default_value = "")]
        goal: String,
        /// Entry, Junior, Intermediate or Senior
        #[arg(long, default_value = "Entry")]
        experience: String,
        /// Password (read from stdin when omitted)
        #[arg(long, env = "PATHWISE_PASSWORD")]
        password: Option<String>,
    },

    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PATHWISE_PASSWORD")]
        password: Option<String>,
    },

    /// Sign out and delete the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List the available career paths
    Paths,

    /// Choose a career path (wipes the current roadmap)
    SelectPath { topic: String },

    /// Load the dashboard, generating the roadmap on first use
    Dashboard,

    /// Completion summary of your roadmap
    Progress,

    /// Show roadmap modules for your path or a given topic
    Roadmap {
        #[arg(long)]
        topic: Option<String>,

        /// Replace every roadmap with the beginner steps of TOPIC
        #[arg(long, value_name = "TOPIC", conflicts_with = "topic")]
        replace: Option<String>,
    },

    /// Mark a module complete and unlock the next one
    Complete { module_id: String },

    /// Recompute progress, credibility and metrics from stored modules
    Reconcile,

    /// Manage goals
    Goals {
        #[command(subcommand)]
        command: GoalCommands,
    },

    /// Community questions and answers
    Community {
        #[command(subcommand)]
        command: CommunityCommands,
    },

    /// Mentors and sessions
    Mentors {
        #[command(subcommand)]
        command: MentorCommands,
    },

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Start the HTTP API server
    Serve {
        /// Listen address (defaults to api.addr from the configuration)
        #[arg(long)]
        addr: Option<String>,
    },
}

async fn run(cli: Cli) -> pathwise_core::Result<()> {
    let mut config = PathwiseConfig::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db_path {
        config.database.url = Some(db_path);
    }

    let ctx = Context {
        config,
        session_file: cli::helpers::default_session_file(),
        json: cli.json,
    };

    match cli.command {
        Commands::Init => cli::init::handle(&ctx).await,
        Commands::Register {
            email,
            name,
            goal,
            experience,
            password,
        } => cli::account::register(&ctx, email, name, goal, experience, password).await,
        Commands::Login { email, password } => cli::account::login(&ctx, email, password).await,
        Commands::Logout => cli::account::logout(&ctx).await,
        Commands::Whoami => cli::account::whoami(&ctx).await,
        Commands::Paths => cli::roadmap::paths(&ctx),
        Commands::SelectPath { topic } => cli::roadmap::select_path(&ctx, topic).await,
        Commands::Dashboard => cli::roadmap::dashboard(&ctx).await,
        Commands::Progress => cli::roadmap::progress(&ctx).await,
        Commands::Roadmap {
            replace: Some(topic),
            ..
        } => cli::roadmap::replace(&ctx, topic).await,
        Commands::Roadmap { topic, .. } => cli::roadmap::roadmap(&ctx, topic).await,
        Commands::Complete { module_id } => cli::roadmap::complete(&ctx, module_id).await,
        Commands::Reconcile => cli::roadmap::reconcile(&ctx).await,
        Commands::Goals { command } => cli::goals::handle(&ctx, command).await,
        Commands::Community { command } => cli::community::handle(&ctx, command).await,
        Commands::Mentors { command } => cli::mentors::handle(&ctx, command).await,
        Commands::Profile { command } => cli::profile::handle(&ctx, command).await,
        Commands::Serve { addr } => cli::serve::handle(&ctx, addr).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Broadcast lag from closed SSE clients is noise
    let filter = EnvFilter::new(format!(
        "pathwise={level},pathwise_core={level},tower_http={level},tokio::sync::broadcast=error,tokio_stream=error",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("PathWise v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(cli).await {
        debug!("Command failed: {:?}", err);
        eprintln!("Error: {}", err.user_message());
        std::process::exit(1);
    }
    Ok(())
}
