//! Shared helper functions for CLI commands
//!
//! Command context, the session token file and output formatting.

use pathwise_core::{
    api::EventBroadcaster,
    app::PathwiseApp,
    config::PathwiseConfig,
    error::{PathwiseError, Result},
    session::{CurrentSession, SessionManager},
    types::UserId,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

/// Session file under the user data directory
pub fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pathwise")
        .join("session.json")
}

/// Everything a command needs besides its own arguments
pub struct Context {
    pub config: PathwiseConfig,
    pub session_file: PathBuf,
    /// Print JSON instead of text
    pub json: bool,
}

impl Context {
    /// Open the store; commands that write accounts create it when missing
    pub async fn open_app(&self, create_if_missing: bool) -> Result<PathwiseApp> {
        PathwiseApp::open(self.config.clone(), create_if_missing).await
    }

    pub fn load_session(&self) -> Result<Option<CurrentSession>> {
        if !self.session_file.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.session_file)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save_session(&self, session: &CurrentSession) -> Result<()> {
        if let Some(parent) = self.session_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.session_file, serde_json::to_string_pretty(session)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.session_file, permissions)?;
        }
        debug!("Saved session to {}", self.session_file.display());
        Ok(())
    }

    /// Remove the session file, returning the session it held
    pub fn clear_session(&self) -> Result<Option<CurrentSession>> {
        let session = self.load_session().ok().flatten();
        if self.session_file.exists() {
            std::fs::remove_file(&self.session_file)?;
        }
        Ok(session)
    }

    /// Session manager on an event bus, seeded from the session file
    pub fn sessions(&self, events: EventBroadcaster) -> SessionManager {
        let sessions = SessionManager::new(events);
        if let Some(session) = self.load_session().ok().flatten() {
            sessions.restore(session);
        }
        sessions
    }

    /// Write the manager's current session to the session file, or remove it
    pub fn persist(&self, sessions: &SessionManager) -> Result<()> {
        match sessions.current() {
            Some(session) => self.save_session(&session),
            None => self.clear_session().map(|_| ()),
        }
    }

    /// The signed-in user, verified against the store
    pub async fn signed_in(&self, app: &PathwiseApp) -> Result<UserId> {
        let session = self.load_session()?.ok_or(PathwiseError::Unauthorized)?;
        app.auth.get_user(&session.token).await
    }

    /// Print `value` as JSON when `--json` is set, else run `text`
    pub fn output<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

/// Use the given password or read one line from stdin
pub fn read_password(provided: Option<String>) -> Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn parse_id<T>(raw: &str) -> Result<T>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    Ok(raw.trim().parse::<T>()?)
}

pub fn parse_date(raw: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| {
            PathwiseError::validation(format!(
                "Invalid date '{}' (expected YYYY-MM-DD): {}",
                raw, e
            ))
        })
}

/// `[####------] 40%`
pub fn progress_bar(percent: u8) -> String {
    let filled = (percent.min(100) as usize + 5) / 10;
    format!("[{}{}] {}%", "#".repeat(filled), "-".repeat(10 - filled), percent)
}
