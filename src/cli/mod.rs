//! CLI command handlers
//!
//! Each command group lives in its own module; `helpers` holds the shared
//! context (config, session file, output mode).

pub mod account;
pub mod community;
pub mod goals;
pub mod helpers;
pub mod init;
pub mod mentors;
pub mod profile;
pub mod roadmap;
pub mod serve;
