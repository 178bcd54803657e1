//! Database initialization command

use super::helpers::Context;
use pathwise_core::{
    app::default_database_path, error::Result, storage::libsql::ConnectionMode, LibsqlStorage,
};
use tracing::debug;

/// Create the database if missing and apply migrations
pub async fn handle(ctx: &Context) -> Result<()> {
    let url = ctx
        .config
        .database
        .url
        .clone()
        .unwrap_or_else(|| default_database_path().to_string_lossy().into_owned());
    debug!("Initializing database at {}", url);

    let storage = LibsqlStorage::new_with_validation(ConnectionMode::from_url(&url)?, true).await?;
    let applied = storage.applied_migrations().await?;

    println!("✓ Database initialized: {}", url);
    for migration in applied {
        println!("  - {}", migration);
    }
    Ok(())
}
