//! LibSQL storage backend implementation
//!
//! Persistent storage on a local libSQL file or a remote Turso database.
//! Schema is created by embedded, tracked migrations. The multi-row
//! mutations that must be atomic (bulk roadmap insert, completion core,
//! career reset, booking) each run in one transaction.

use crate::error::{PathwiseError, Result};
use crate::storage::{CompletionOutcome, StorageBackend};
use crate::types::{
    Account, ActivityAction, ActivityLog, AnswerId, AuthSession, CommunityAnswer,
    CommunityQuestion, ExperienceLevel, Goal, GoalId, Mentor, MentorApplication, MentorId,
    MentorSession, ModuleId, Profile, ProfileUpdate, QuestionId, RoadmapModule, UserId,
    UserMetrics,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use libsql::{params, Builder, Connection, Database, Transaction};
use tracing::{debug, info};

/// Migrations in application order
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial_schema.sql",
        include_str!("../../migrations/libsql/001_initial_schema.sql"),
    ),
    (
        "002_add_indexes.sql",
        include_str!("../../migrations/libsql/002_add_indexes.sql"),
    ),
];

const PROFILE_COLUMNS: &str =
    "id, name, goal, experience_level, skills, credibility_score, level, language, created_at";
const MODULE_COLUMNS: &str = "id, user_id, topic, order_index, title, description, type, \
     resources, is_completed, is_unlocked, difficulty, created_at";
const ACTIVITY_COLUMNS: &str = "id, user_id, action, metadata, created_at";
const GOAL_COLUMNS: &str =
    "id, user_id, goal_title, description, deadline, status, created_at, updated_at";
const QUESTION_COLUMNS: &str = "id, user_id, question, description, created_at, updated_at";
const ANSWER_COLUMNS: &str = "id, question_id, user_id, answer, created_at, updated_at";
const MENTOR_COLUMNS: &str = "id, name, role, company, rating, expertise, image, min_credibility";
const SESSION_COLUMNS: &str = "id, user_id, mentor_id, session_date, status, created_at";

/// Parse SQL file into individual statements
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();

        // Skip comment-only and empty lines between statements
        if current.is_empty() && (trimmed.is_empty() || trimmed.starts_with("--")) {
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        if trimmed.ends_with(';') {
            statements.push(std::mem::take(&mut current));
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PathwiseError::Other(format!("Invalid timestamp '{}': {}", value, e)))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| PathwiseError::Other(format!("Invalid date '{}': {}", value, e)))
}

fn bool_flag(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// LibSQL storage backend
pub struct LibsqlStorage {
    db: Database,
}

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// Remote database (Turso Cloud)
    Remote { url: String, token: String },
}

impl ConnectionMode {
    /// Resolve a database URL: `libsql://` URLs are remote and read the token
    /// from `TURSO_AUTH_TOKEN`, anything else is a local path
    pub fn from_url(database_url: &str) -> Result<Self> {
        if database_url.starts_with("libsql://") {
            let token = std::env::var("TURSO_AUTH_TOKEN").map_err(|_| {
                PathwiseError::Database(
                    "TURSO_AUTH_TOKEN must be set to connect to a remote database".into(),
                )
            })?;
            Ok(ConnectionMode::Remote {
                url: database_url.to_string(),
                token,
            })
        } else {
            Ok(ConnectionMode::Local(database_url.to_string()))
        }
    }
}

impl LibsqlStorage {
    /// Validate a local database file before opening
    ///
    /// Returns `Ok(false)` when the file is absent and `must_exist` is false,
    /// `Ok(true)` when it exists and carries the SQLite header.
    fn validate_database_file(db_path: &str, must_exist: bool) -> Result<bool> {
        use std::io::Read;
        use std::path::Path;

        let path = Path::new(db_path);

        if !path.exists() {
            if must_exist {
                return Err(PathwiseError::Database(format!(
                    "Database file not found at '{}'. Please run 'pathwise init' first or check your database.url configuration.",
                    db_path
                )));
            }
            return Ok(false);
        }

        let mut header = [0u8; 16];
        let read = std::fs::File::open(path).and_then(|mut file| file.read_exact(&mut header));
        match read {
            Ok(()) if &header == b"SQLite format 3\0" => {
                debug!("Database file validation passed: {}", db_path);
                Ok(true)
            }
            Ok(()) => Err(PathwiseError::Database(format!(
                "Database file at '{}' is corrupted or not a valid SQLite database. Please delete it and run 'pathwise init'.",
                db_path
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(PathwiseError::Database(format!(
                    "Database file at '{}' is corrupted or invalid (file too small). Please delete it and run 'pathwise init'.",
                    db_path
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(PathwiseError::Database(format!(
                    "Cannot read database file at '{}': Permission denied. Please check file permissions.",
                    db_path
                )))
            }
            Err(e) => Err(PathwiseError::Database(format!(
                "Cannot read database file at '{}': {}",
                db_path, e
            ))),
        }
    }

    /// Create a new LibSQL storage backend with validation
    ///
    /// With `create_if_missing` false a missing local file is an error; with
    /// it true the file and its parent directory are created.
    pub async fn new_with_validation(
        mode: ConnectionMode,
        create_if_missing: bool,
    ) -> Result<Self> {
        info!(
            "Connecting to LibSQL database (create_if_missing: {})",
            create_if_missing
        );

        let db = match mode {
            ConnectionMode::Local(ref path) => {
                let exists = Self::validate_database_file(path, !create_if_missing)?;
                if create_if_missing && !exists {
                    if let Some(parent) = std::path::Path::new(path).parent() {
                        if !parent.as_os_str().is_empty() {
                            std::fs::create_dir_all(parent).map_err(|e| {
                                PathwiseError::Database(format!(
                                    "Failed to create database directory {}: {}",
                                    parent.display(),
                                    e
                                ))
                            })?;
                        }
                    }
                }

                Builder::new_local(path).build().await.map_err(|e| {
                    PathwiseError::Database(format!("Failed to create local database: {}", e))
                })?
            }
            ConnectionMode::Remote { ref url, ref token } => {
                Builder::new_remote(url.clone(), token.clone())
                    .build()
                    .await
                    .map_err(|e| {
                        PathwiseError::Database(format!("Failed to create remote database: {}", e))
                    })?
            }
        };

        info!("LibSQL database connection established");

        let storage = Self { db };
        storage.verify_database_health().await?;
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database
    pub async fn new(mode: ConnectionMode) -> Result<Self> {
        Self::new_with_validation(mode, false).await
    }

    /// Verify the database answers queries and accepts writes
    async fn verify_database_health(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.query("SELECT 1", ()).await.map_err(|e| {
            PathwiseError::Database(format!(
                "Database corruption detected or invalid database file: {}",
                e
            ))
        })?;

        let write_test = r#"
            CREATE TABLE IF NOT EXISTS _health_check (id INTEGER PRIMARY KEY);
            DROP TABLE IF EXISTS _health_check;
        "#;

        if let Err(e) = conn.execute_batch(write_test).await {
            let error_msg = e.to_string().to_lowercase();
            if error_msg.contains("readonly") || error_msg.contains("permission") {
                return Err(PathwiseError::Database(format!(
                    "Database is read-only or lacks write permissions: {}",
                    e
                )));
            }
            return Err(PathwiseError::Database(format!(
                "Database write test failed: {}",
                e
            )));
        }

        debug!("Database health check passed");
        Ok(())
    }

    /// Run pending migrations, recording each in `_migrations_applied`
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations_applied (
                migration_name TEXT PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            PathwiseError::Migration(format!("Failed to create migrations table: {}", e))
        })?;

        for (name, sql) in MIGRATIONS {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM _migrations_applied WHERE migration_name = ?",
                    params![*name],
                )
                .await?;
            let already_applied = match rows.next().await? {
                Some(row) => row.get::<i64>(0)?,
                None => 0,
            };
            if already_applied > 0 {
                debug!("Skipping already applied migration: {}", name);
                continue;
            }

            let statements = parse_sql_statements(sql);
            debug!("Parsed {} statements from {}", statements.len(), name);
            for (i, statement) in statements.iter().enumerate() {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }
                conn.execute(statement, ()).await.map_err(|e| {
                    PathwiseError::Migration(format!(
                        "Failed to execute statement #{} in {}: {}\nStatement: {}",
                        i + 1,
                        name,
                        e,
                        &statement[..statement.len().min(300)]
                    ))
                })?;
            }

            conn.execute(
                "INSERT INTO _migrations_applied (migration_name, applied_at) VALUES (?, ?)",
                params![*name, Utc::now().timestamp()],
            )
            .await
            .map_err(|e| PathwiseError::Migration(format!("Failed to record migration: {}", e)))?;

            info!("Executed migration: {}", name);
        }

        info!("Database migrations completed");
        Ok(())
    }

    /// Names of migrations recorded as applied
    pub async fn applied_migrations(&self) -> Result<Vec<String>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                "SELECT migration_name FROM _migrations_applied ORDER BY migration_name",
                (),
            )
            .await?;
        let mut names = Vec::new();
        while let Some(row) = rows.next().await? {
            names.push(row.get::<String>(0)?);
        }
        Ok(names)
    }

    fn get_conn(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| PathwiseError::Database(format!("Failed to get connection: {}", e)))
    }

    async fn commit(tx: Transaction) -> Result<()> {
        tx.commit().await.map_err(|e| {
            let error_msg = e.to_string();
            if error_msg.contains("readonly") || error_msg.contains("permission") {
                PathwiseError::Database(
                    "Transaction failed: database is read-only. Ensure the file and its WAL files are writable."
                        .to_string(),
                )
            } else if error_msg.contains("locked") || error_msg.contains("busy") {
                PathwiseError::Database(
                    "Transaction failed: database is locked. Another process may be writing."
                        .to_string(),
                )
            } else {
                PathwiseError::Database(format!("Transaction commit failed: {}", error_msg))
            }
        })
    }

    async fn insert_modules_on(conn: &Connection, modules: &[RoadmapModule]) -> Result<()> {
        let sql = format!(
            "INSERT INTO roadmaps ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            MODULE_COLUMNS
        );
        for module in modules {
            conn.execute(
                &sql,
                params![
                    module.id.to_string(),
                    module.user_id.to_string(),
                    module.topic.clone(),
                    module.order_index,
                    module.title.clone(),
                    module.description.clone(),
                    module.module_type.as_str(),
                    serde_json::to_string(&module.resources)?,
                    bool_flag(module.is_completed),
                    bool_flag(module.is_unlocked),
                    module.difficulty,
                    format_timestamp(&module.created_at),
                ],
            )
            .await?;
        }
        Ok(())
    }

    async fn insert_activity_on(conn: &Connection, log: &ActivityLog) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO activity_logs ({}) VALUES (?, ?, ?, ?, ?)",
                ACTIVITY_COLUMNS
            ),
            params![
                log.id.to_string(),
                log.user_id.to_string(),
                log.action.as_str(),
                log.metadata.to_string(),
                format_timestamp(&log.created_at),
            ],
        )
        .await?;
        Ok(())
    }
}

fn row_to_account(row: &libsql::Row) -> Result<Account> {
    Ok(Account {
        id: UserId::from_string(&row.get::<String>(0)?)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_timestamp(&row.get::<String>(3)?)?,
    })
}

fn row_to_auth_session(row: &libsql::Row) -> Result<AuthSession> {
    Ok(AuthSession {
        token_hash: row.get(0)?,
        user_id: UserId::from_string(&row.get::<String>(1)?)?,
        created_at: parse_timestamp(&row.get::<String>(2)?)?,
        expires_at: parse_timestamp(&row.get::<String>(3)?)?,
    })
}

fn row_to_profile(row: &libsql::Row) -> Result<Profile> {
    let skills_json: String = row.get(4)?;
    let credibility: i64 = row.get(5)?;
    Ok(Profile {
        id: UserId::from_string(&row.get::<String>(0)?)?,
        name: row.get(1)?,
        goal: row.get(2)?,
        experience_level: ExperienceLevel::from_label(&row.get::<String>(3)?),
        skills: serde_json::from_str(&skills_json)?,
        credibility_score: credibility.clamp(0, 100) as u8,
        level: row.get(6)?,
        language: row.get(7)?,
        created_at: parse_timestamp(&row.get::<String>(8)?)?,
    })
}

fn row_to_module(row: &libsql::Row) -> Result<RoadmapModule> {
    let type_str: String = row.get(6)?;
    let resources_json: String = row.get(7)?;
    Ok(RoadmapModule {
        id: ModuleId::from_string(&row.get::<String>(0)?)?,
        user_id: UserId::from_string(&row.get::<String>(1)?)?,
        topic: row.get(2)?,
        order_index: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        module_type: type_str.parse().map_err(PathwiseError::Other)?,
        resources: serde_json::from_str(&resources_json)?,
        is_completed: row.get::<i64>(8)? != 0,
        is_unlocked: row.get::<i64>(9)? != 0,
        difficulty: row.get(10)?,
        created_at: parse_timestamp(&row.get::<String>(11)?)?,
    })
}

fn row_to_activity(row: &libsql::Row) -> Result<ActivityLog> {
    let metadata_json: String = row.get(3)?;
    Ok(ActivityLog {
        id: crate::types::ActivityId::from_string(&row.get::<String>(0)?)?,
        user_id: UserId::from_string(&row.get::<String>(1)?)?,
        action: ActivityAction::from(row.get::<String>(2)?),
        metadata: serde_json::from_str(&metadata_json)?,
        created_at: parse_timestamp(&row.get::<String>(4)?)?,
    })
}

fn row_to_metrics(row: &libsql::Row) -> Result<UserMetrics> {
    Ok(UserMetrics {
        user_id: UserId::from_string(&row.get::<String>(0)?)?,
        engagement_score: row.get(1)?,
        velocity_score: row.get(2)?,
        mastery_score: row.get(3)?,
        updated_at: parse_timestamp(&row.get::<String>(4)?)?,
    })
}

fn row_to_goal(row: &libsql::Row) -> Result<Goal> {
    let status: String = row.get(5)?;
    Ok(Goal {
        id: GoalId::from_string(&row.get::<String>(0)?)?,
        user_id: UserId::from_string(&row.get::<String>(1)?)?,
        goal_title: row.get(2)?,
        description: row.get(3)?,
        deadline: parse_date(&row.get::<String>(4)?)?,
        status: status.parse().map_err(PathwiseError::Other)?,
        created_at: parse_timestamp(&row.get::<String>(6)?)?,
        updated_at: parse_timestamp(&row.get::<String>(7)?)?,
    })
}

fn row_to_question(row: &libsql::Row) -> Result<CommunityQuestion> {
    Ok(CommunityQuestion {
        id: QuestionId::from_string(&row.get::<String>(0)?)?,
        user_id: UserId::from_string(&row.get::<String>(1)?)?,
        question: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_timestamp(&row.get::<String>(4)?)?,
        updated_at: parse_timestamp(&row.get::<String>(5)?)?,
    })
}

fn row_to_answer(row: &libsql::Row) -> Result<CommunityAnswer> {
    Ok(CommunityAnswer {
        id: AnswerId::from_string(&row.get::<String>(0)?)?,
        question_id: QuestionId::from_string(&row.get::<String>(1)?)?,
        user_id: UserId::from_string(&row.get::<String>(2)?)?,
        answer: row.get(3)?,
        created_at: parse_timestamp(&row.get::<String>(4)?)?,
        updated_at: parse_timestamp(&row.get::<String>(5)?)?,
    })
}

fn row_to_mentor(row: &libsql::Row) -> Result<Mentor> {
    let expertise_json: String = row.get(5)?;
    let min_credibility: i64 = row.get(7)?;
    Ok(Mentor {
        id: MentorId::from_string(&row.get::<String>(0)?)?,
        name: row.get(1)?,
        role: row.get(2)?,
        company: row.get(3)?,
        rating: row.get(4)?,
        expertise: serde_json::from_str(&expertise_json)?,
        image: row.get(6)?,
        min_credibility: min_credibility.clamp(0, 100) as u8,
    })
}

fn row_to_session(row: &libsql::Row) -> Result<MentorSession> {
    let status: String = row.get(4)?;
    Ok(MentorSession {
        id: crate::types::MentorSessionId::from_string(&row.get::<String>(0)?)?,
        user_id: UserId::from_string(&row.get::<String>(1)?)?,
        mentor_id: MentorId::from_string(&row.get::<String>(2)?)?,
        session_date: parse_timestamp(&row.get::<String>(3)?)?,
        status: status.parse().map_err(PathwiseError::Other)?,
        created_at: parse_timestamp(&row.get::<String>(5)?)?,
    })
}

#[async_trait]
impl StorageBackend for LibsqlStorage {
    async fn create_account(&self, account: &Account) -> Result<()> {
        debug!("Creating account {}", account.id);
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO accounts (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
            params![
                account.id.to_string(),
                account.email.clone(),
                account.password_hash.clone(),
                format_timestamp(&account.created_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                "SELECT id, email, password_hash, created_at FROM accounts WHERE email = ?",
                params![email],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_auth_session(&self, session: &AuthSession) -> Result<()> {
        debug!("Creating auth session for {}", session.user_id);
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO auth_sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
            params![
                session.token_hash.clone(),
                session.user_id.to_string(),
                format_timestamp(&session.created_at),
                format_timestamp(&session.expires_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_auth_session(&self, token_hash: &str) -> Result<Option<AuthSession>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                "SELECT token_hash, user_id, created_at, expires_at FROM auth_sessions WHERE token_hash = ?",
                params![token_hash],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_auth_session(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_auth_session(&self, token_hash: &str) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM auth_sessions WHERE token_hash = ?",
            params![token_hash],
        )
        .await?;
        Ok(())
    }

    async fn create_profile(&self, profile: &Profile) -> Result<()> {
        debug!("Creating profile {}", profile.id);
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO profiles ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                PROFILE_COLUMNS
            ),
            params![
                profile.id.to_string(),
                profile.name.clone(),
                profile.goal.clone(),
                profile.experience_level.as_str(),
                serde_json::to_string(&profile.skills)?,
                profile.credibility_score as i64,
                profile.level,
                profile.language.clone(),
                format_timestamp(&profile.created_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS),
                params![user_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<Profile> {
        debug!("Updating profile {}", user_id);
        let conn = self.get_conn()?;
        let affected = conn
            .execute(
                "UPDATE profiles SET name = ?, goal = ?, experience_level = ?, skills = ? WHERE id = ?",
                params![
                    update.name.clone(),
                    update.goal.clone(),
                    update.experience_level.as_str(),
                    serde_json::to_string(&update.skills)?,
                    user_id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(PathwiseError::ProfileNotFound(user_id.to_string()));
        }
        self.get_profile(user_id)
            .await?
            .ok_or_else(|| PathwiseError::ProfileNotFound(user_id.to_string()))
    }

    async fn set_credibility(&self, user_id: UserId, score: u8) -> Result<()> {
        debug!("Setting credibility of {} to {}", user_id, score);
        let conn = self.get_conn()?;
        let affected = conn
            .execute(
                "UPDATE profiles SET credibility_score = ? WHERE id = ?",
                params![score as i64, user_id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(PathwiseError::ProfileNotFound(user_id.to_string()));
        }
        Ok(())
    }

    async fn insert_modules(&self, modules: &[RoadmapModule]) -> Result<()> {
        if modules.is_empty() {
            return Ok(());
        }
        debug!("Inserting {} roadmap modules", modules.len());

        let conn = self.get_conn()?;
        let tx = conn.transaction().await?;
        Self::insert_modules_on(&tx, modules).await?;
        Self::commit(tx).await
    }

    async fn replace_roadmap(&self, user_id: UserId, modules: &[RoadmapModule]) -> Result<u64> {
        debug!("Replacing roadmap of {} with {} modules", user_id, modules.len());

        let conn = self.get_conn()?;
        let tx = conn.transaction().await?;
        let deleted = tx
            .execute(
                "DELETE FROM roadmaps WHERE user_id = ?",
                params![user_id.to_string()],
            )
            .await?;
        if let Err(err) = Self::insert_modules_on(&tx, modules).await {
            tx.rollback().await?;
            return Err(err);
        }
        Self::commit(tx).await?;
        Ok(deleted)
    }

    async fn list_modules(
        &self,
        user_id: UserId,
        topic: Option<&str>,
    ) -> Result<Vec<RoadmapModule>> {
        let conn = self.get_conn()?;
        let mut rows = match topic {
            Some(topic) => {
                conn.query(
                    &format!(
                        "SELECT {} FROM roadmaps WHERE user_id = ? AND topic = ? ORDER BY order_index ASC",
                        MODULE_COLUMNS
                    ),
                    params![user_id.to_string(), topic],
                )
                .await?
            }
            None => {
                conn.query(
                    &format!(
                        "SELECT {} FROM roadmaps WHERE user_id = ? ORDER BY order_index ASC, created_at ASC, rowid ASC",
                        MODULE_COLUMNS
                    ),
                    params![user_id.to_string()],
                )
                .await?
            }
        };

        let mut modules = Vec::new();
        while let Some(row) = rows.next().await? {
            modules.push(row_to_module(&row)?);
        }
        Ok(modules)
    }

    async fn get_module(
        &self,
        user_id: UserId,
        module_id: ModuleId,
    ) -> Result<Option<RoadmapModule>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM roadmaps WHERE id = ? AND user_id = ?",
                    MODULE_COLUMNS
                ),
                params![module_id.to_string(), user_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_module(&row)?)),
            None => Ok(None),
        }
    }

    async fn complete_module(
        &self,
        user_id: UserId,
        module_id: ModuleId,
    ) -> Result<CompletionOutcome> {
        debug!("Completing module {} for {}", module_id, user_id);

        let conn = self.get_conn()?;
        let tx = conn.transaction().await?;

        let current = {
            let mut rows = tx
                .query(
                    &format!(
                        "SELECT {} FROM roadmaps WHERE id = ? AND user_id = ?",
                        MODULE_COLUMNS
                    ),
                    params![module_id.to_string(), user_id.to_string()],
                )
                .await?;
            match rows.next().await? {
                Some(row) => Some(row_to_module(&row)?),
                None => None,
            }
        };

        let mut module = match current {
            Some(module) => module,
            None => {
                tx.rollback().await?;
                return Ok(CompletionOutcome::NotFound);
            }
        };
        if module.is_completed {
            tx.rollback().await?;
            return Ok(CompletionOutcome::AlreadyCompleted);
        }
        if !module.is_unlocked {
            tx.rollback().await?;
            return Ok(CompletionOutcome::Locked);
        }

        tx.execute(
            "UPDATE roadmaps SET is_completed = 1 WHERE id = ?",
            params![module.id.to_string()],
        )
        .await?;
        module.is_completed = true;

        let successor = {
            let mut rows = tx
                .query(
                    &format!(
                        "SELECT {} FROM roadmaps WHERE user_id = ? AND topic = ? AND order_index > ? \
                         ORDER BY order_index ASC LIMIT 1",
                        MODULE_COLUMNS
                    ),
                    params![user_id.to_string(), module.topic.clone(), module.order_index],
                )
                .await?;
            match rows.next().await? {
                Some(row) => Some(row_to_module(&row)?),
                None => None,
            }
        };

        let unlocked = match successor {
            Some(mut next) => {
                tx.execute(
                    "UPDATE roadmaps SET is_unlocked = 1 WHERE id = ?",
                    params![next.id.to_string()],
                )
                .await?;
                next.is_unlocked = true;
                Some(next)
            }
            None => None,
        };

        let log = ActivityLog::new(
            user_id,
            ActivityAction::ModuleCompleted,
            serde_json::json!({ "roadmap_id": module.id, "title": module.title }),
        );
        Self::insert_activity_on(&tx, &log).await?;

        Self::commit(tx).await?;
        Ok(CompletionOutcome::Applied { module, unlocked })
    }

    async fn count_completed_modules(&self, user_id: UserId) -> Result<usize> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM roadmaps WHERE user_id = ? AND is_completed = 1",
                params![user_id.to_string()],
            )
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(count.max(0) as usize)
    }

    async fn reset_career_path(&self, user_id: UserId, topic: &str) -> Result<u64> {
        debug!("Resetting career path of {} to {}", user_id, topic);

        let conn = self.get_conn()?;
        let tx = conn.transaction().await?;

        let affected = tx
            .execute(
                "UPDATE profiles SET goal = ? WHERE id = ?",
                params![topic, user_id.to_string()],
            )
            .await?;
        if affected == 0 {
            tx.rollback().await?;
            return Err(PathwiseError::ProfileNotFound(user_id.to_string()));
        }

        let deleted = tx
            .execute(
                "DELETE FROM roadmaps WHERE user_id = ?",
                params![user_id.to_string()],
            )
            .await?;

        Self::commit(tx).await?;
        Ok(deleted)
    }

    async fn insert_activity(&self, log: &ActivityLog) -> Result<()> {
        debug!("Logging activity {} for {}", log.action.as_str(), log.user_id);
        let conn = self.get_conn()?;
        Self::insert_activity_on(&conn, log).await
    }

    async fn list_activity(
        &self,
        user_id: UserId,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityLog>> {
        let conn = self.get_conn()?;
        let base = format!(
            "SELECT {} FROM activity_logs WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
            ACTIVITY_COLUMNS
        );
        let mut rows = match limit {
            Some(limit) => {
                conn.query(
                    &format!("{} LIMIT ?", base),
                    params![user_id.to_string(), limit as i64],
                )
                .await?
            }
            None => conn.query(&base, params![user_id.to_string()]).await?,
        };

        let mut logs = Vec::new();
        while let Some(row) = rows.next().await? {
            logs.push(row_to_activity(&row)?);
        }
        Ok(logs)
    }

    async fn upsert_metrics(&self, metrics: &UserMetrics) -> Result<()> {
        debug!("Upserting metrics for {}", metrics.user_id);
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO user_metrics (user_id, engagement_score, velocity_score, mastery_score, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                engagement_score = excluded.engagement_score,
                velocity_score = excluded.velocity_score,
                mastery_score = excluded.mastery_score,
                updated_at = excluded.updated_at
            "#,
            params![
                metrics.user_id.to_string(),
                metrics.engagement_score,
                metrics.velocity_score,
                metrics.mastery_score,
                format_timestamp(&metrics.updated_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_metrics(&self, user_id: UserId) -> Result<Option<UserMetrics>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                "SELECT user_id, engagement_score, velocity_score, mastery_score, updated_at \
                 FROM user_metrics WHERE user_id = ?",
                params![user_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_metrics(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_goal(&self, goal: &Goal) -> Result<()> {
        debug!("Creating goal {}", goal.id);
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO user_goals ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                GOAL_COLUMNS
            ),
            params![
                goal.id.to_string(),
                goal.user_id.to_string(),
                goal.goal_title.clone(),
                goal.description.clone(),
                goal.deadline.to_string(),
                goal.status.as_str(),
                format_timestamp(&goal.created_at),
                format_timestamp(&goal.updated_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM user_goals WHERE id = ?", GOAL_COLUMNS),
                params![id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_goal(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_goal(&self, goal: &Goal) -> Result<()> {
        debug!("Updating goal {}", goal.id);
        let conn = self.get_conn()?;
        let affected = conn
            .execute(
                "UPDATE user_goals SET goal_title = ?, description = ?, deadline = ?, status = ?, updated_at = ? \
                 WHERE id = ?",
                params![
                    goal.goal_title.clone(),
                    goal.description.clone(),
                    goal.deadline.to_string(),
                    goal.status.as_str(),
                    format_timestamp(&goal.updated_at),
                    goal.id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(PathwiseError::NotFound(format!("goal {}", goal.id)));
        }
        Ok(())
    }

    async fn delete_goal(&self, id: GoalId) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM user_goals WHERE id = ?",
            params![id.to_string()],
        )
        .await?;
        Ok(())
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM user_goals WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
                    GOAL_COLUMNS
                ),
                params![user_id.to_string()],
            )
            .await?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next().await? {
            goals.push(row_to_goal(&row)?);
        }
        Ok(goals)
    }

    async fn create_question(&self, question: &CommunityQuestion) -> Result<()> {
        debug!("Creating question {}", question.id);
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO community_questions ({}) VALUES (?, ?, ?, ?, ?, ?)",
                QUESTION_COLUMNS
            ),
            params![
                question.id.to_string(),
                question.user_id.to_string(),
                question.question.clone(),
                question.description.clone(),
                format_timestamp(&question.created_at),
                format_timestamp(&question.updated_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<CommunityQuestion>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM community_questions WHERE id = ?",
                    QUESTION_COLUMNS
                ),
                params![id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_question(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_question(&self, question: &CommunityQuestion) -> Result<()> {
        let conn = self.get_conn()?;
        let affected = conn
            .execute(
                "UPDATE community_questions SET question = ?, description = ?, updated_at = ? WHERE id = ?",
                params![
                    question.question.clone(),
                    question.description.clone(),
                    format_timestamp(&question.updated_at),
                    question.id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(PathwiseError::NotFound(format!("question {}", question.id)));
        }
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<()> {
        debug!("Deleting question {} and its answers", id);
        let conn = self.get_conn()?;
        let tx = conn.transaction().await?;
        tx.execute(
            "DELETE FROM community_answers WHERE question_id = ?",
            params![id.to_string()],
        )
        .await?;
        tx.execute(
            "DELETE FROM community_questions WHERE id = ?",
            params![id.to_string()],
        )
        .await?;
        Self::commit(tx).await
    }

    async fn list_questions(&self) -> Result<Vec<CommunityQuestion>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM community_questions ORDER BY created_at DESC, rowid DESC",
                    QUESTION_COLUMNS
                ),
                (),
            )
            .await?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next().await? {
            questions.push(row_to_question(&row)?);
        }
        Ok(questions)
    }

    async fn create_answer(&self, answer: &CommunityAnswer) -> Result<()> {
        debug!("Creating answer {} on {}", answer.id, answer.question_id);
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO community_answers ({}) VALUES (?, ?, ?, ?, ?, ?)",
                ANSWER_COLUMNS
            ),
            params![
                answer.id.to_string(),
                answer.question_id.to_string(),
                answer.user_id.to_string(),
                answer.answer.clone(),
                format_timestamp(&answer.created_at),
                format_timestamp(&answer.updated_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_answer(&self, id: AnswerId) -> Result<Option<CommunityAnswer>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM community_answers WHERE id = ?",
                    ANSWER_COLUMNS
                ),
                params![id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_answer(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_answer(&self, answer: &CommunityAnswer) -> Result<()> {
        let conn = self.get_conn()?;
        let affected = conn
            .execute(
                "UPDATE community_answers SET answer = ?, updated_at = ? WHERE id = ?",
                params![
                    answer.answer.clone(),
                    format_timestamp(&answer.updated_at),
                    answer.id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(PathwiseError::NotFound(format!("answer {}", answer.id)));
        }
        Ok(())
    }

    async fn delete_answer(&self, id: AnswerId) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM community_answers WHERE id = ?",
            params![id.to_string()],
        )
        .await?;
        Ok(())
    }

    async fn list_answers(&self, question_id: QuestionId) -> Result<Vec<CommunityAnswer>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM community_answers WHERE question_id = ? ORDER BY created_at ASC, rowid ASC",
                    ANSWER_COLUMNS
                ),
                params![question_id.to_string()],
            )
            .await?;
        let mut answers = Vec::new();
        while let Some(row) = rows.next().await? {
            answers.push(row_to_answer(&row)?);
        }
        Ok(answers)
    }

    async fn upsert_mentor(&self, mentor: &Mentor) -> Result<()> {
        debug!("Upserting mentor {} ({})", mentor.name, mentor.id);
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO mentors (id, name, role, company, rating, expertise, image, min_credibility)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                role = excluded.role,
                company = excluded.company,
                rating = excluded.rating,
                expertise = excluded.expertise,
                image = excluded.image,
                min_credibility = excluded.min_credibility
            "#,
            params![
                mentor.id.to_string(),
                mentor.name.clone(),
                mentor.role.clone(),
                mentor.company.clone(),
                mentor.rating,
                serde_json::to_string(&mentor.expertise)?,
                mentor.image.clone(),
                mentor.min_credibility as i64,
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_mentor(&self, id: MentorId) -> Result<Option<Mentor>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM mentors WHERE id = ?", MENTOR_COLUMNS),
                params![id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_mentor(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_mentors(&self) -> Result<Vec<Mentor>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM mentors ORDER BY rating DESC, name ASC",
                    MENTOR_COLUMNS
                ),
                (),
            )
            .await?;
        let mut mentors = Vec::new();
        while let Some(row) = rows.next().await? {
            mentors.push(row_to_mentor(&row)?);
        }
        Ok(mentors)
    }

    async fn book_session(&self, session: &MentorSession, log: &ActivityLog) -> Result<()> {
        debug!(
            "Booking session {} with mentor {} for {}",
            session.id, session.mentor_id, session.user_id
        );
        let conn = self.get_conn()?;
        let tx = conn.transaction().await?;
        tx.execute(
            &format!(
                "INSERT INTO mentor_sessions ({}) VALUES (?, ?, ?, ?, ?, ?)",
                SESSION_COLUMNS
            ),
            params![
                session.id.to_string(),
                session.user_id.to_string(),
                session.mentor_id.to_string(),
                format_timestamp(&session.session_date),
                session.status.as_str(),
                format_timestamp(&session.created_at),
            ],
        )
        .await?;
        Self::insert_activity_on(&tx, log).await?;
        Self::commit(tx).await
    }

    async fn list_sessions(&self, user_id: UserId) -> Result<Vec<MentorSession>> {
        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM mentor_sessions WHERE user_id = ? ORDER BY session_date DESC, rowid DESC",
                    SESSION_COLUMNS
                ),
                params![user_id.to_string()],
            )
            .await?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(row_to_session(&row)?);
        }
        Ok(sessions)
    }

    async fn create_application(&self, application: &MentorApplication) -> Result<()> {
        debug!("Recording mentor application {}", application.id);
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO mentor_applications \
             (id, full_name, email, educational_qualification, stream_of_mentoring, certificate_url, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                application.id.to_string(),
                application.full_name.clone(),
                application.email.clone(),
                application.educational_qualification.clone(),
                application.stream_of_mentoring.clone(),
                application.certificate_url.clone(),
                application.status.as_str(),
                format_timestamp(&application.created_at),
            ],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::{create_test_storage, sample_modules, sample_profile};
    use crate::types::{ExperienceLevel, GoalStatus};

    #[test]
    fn test_parse_sql_statements_skips_comments() {
        let sql = "-- header\n\nCREATE TABLE a (id TEXT);\n-- between\nCREATE INDEX i ON a(id);\n";
        let statements = parse_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE"));
        assert!(statements[1].starts_with("CREATE INDEX"));
    }

    #[test]
    fn test_timestamps_are_fixed_width() {
        let a = Utc::now();
        let b = a + chrono::Duration::milliseconds(1);
        let (fa, fb) = (format_timestamp(&a), format_timestamp(&b));
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert_eq!(parse_timestamp(&fa).unwrap().timestamp_micros(), a.timestamp_micros());
    }

    #[test]
    fn test_connection_mode_from_local_path() {
        let mode = ConnectionMode::from_url("/tmp/pathwise.db").unwrap();
        assert!(matches!(mode, ConnectionMode::Local(path) if path == "/tmp/pathwise.db"));
    }

    #[tokio::test]
    async fn test_missing_database_requires_init() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        let result = LibsqlStorage::new(ConnectionMode::Local(path.display().to_string())).await;
        assert!(matches!(result, Err(PathwiseError::Database(_))));
    }

    #[tokio::test]
    async fn test_migrations_are_tracked_and_idempotent() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        storage.run_migrations().await.unwrap();
        assert_eq!(
            storage.applied_migrations().await.unwrap(),
            vec!["001_initial_schema.sql", "002_add_indexes.sql"]
        );
    }

    #[tokio::test]
    async fn test_profile_round_trip_and_update() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let profile = sample_profile("Ada", "AI");
        storage.create_profile(&profile).await.unwrap();

        let loaded = storage.get_profile(profile.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Ada");
        assert_eq!(loaded.credibility_score, 0);
        assert_eq!(loaded.language, "English");

        let updated = storage
            .update_profile(
                profile.id,
                &ProfileUpdate {
                    name: "Ada L.".into(),
                    goal: "FullStack".into(),
                    experience_level: ExperienceLevel::Senior,
                    skills: vec!["rust".into(), "sql".into()],
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.goal, "FullStack");
        assert_eq!(updated.skills, vec!["rust", "sql"]);
        assert_eq!(updated.experience_level, ExperienceLevel::Senior);
    }

    #[tokio::test]
    async fn test_duplicate_order_index_is_a_constraint_error() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let user = UserId::new();
        let modules = sample_modules(user, "AI", 2);
        storage.insert_modules(&modules).await.unwrap();

        let mut duplicate = sample_modules(user, "AI", 1);
        duplicate[0].id = ModuleId::new();
        let err = storage.insert_modules(&duplicate).await.unwrap_err();
        assert!(matches!(
            err,
            PathwiseError::Store {
                kind: crate::error::StoreErrorKind::Constraint,
                ..
            }
        ));
        assert_eq!(storage.list_modules(user, Some("AI")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_complete_module_unlocks_successor_and_logs() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let user = UserId::new();
        let modules = sample_modules(user, "AI", 3);
        storage.insert_modules(&modules).await.unwrap();

        let outcome = storage.complete_module(user, modules[0].id).await.unwrap();
        match outcome {
            CompletionOutcome::Applied { module, unlocked } => {
                assert!(module.is_completed);
                assert_eq!(unlocked.map(|m| m.order_index), Some(1));
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let stored = storage.list_modules(user, Some("AI")).await.unwrap();
        assert!(stored[0].is_completed);
        assert!(stored[1].is_unlocked);
        assert!(!stored[2].is_unlocked);

        let logs = storage.list_activity(user, None).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, ActivityAction::ModuleCompleted);
        assert_eq!(logs[0].metadata["title"], modules[0].title.as_str());
        assert_eq!(storage.count_completed_modules(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_complete_module_guards_write_nothing() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let user = UserId::new();
        let modules = sample_modules(user, "AI", 2);
        storage.insert_modules(&modules).await.unwrap();

        assert_eq!(
            storage.complete_module(user, modules[1].id).await.unwrap(),
            CompletionOutcome::Locked
        );
        assert_eq!(
            storage.complete_module(UserId::new(), modules[0].id).await.unwrap(),
            CompletionOutcome::NotFound
        );
        storage.complete_module(user, modules[0].id).await.unwrap();
        assert_eq!(
            storage.complete_module(user, modules[0].id).await.unwrap(),
            CompletionOutcome::AlreadyCompleted
        );
        assert_eq!(storage.list_activity(user, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_career_path_wipes_all_topics() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let profile = sample_profile("Grace", "AI");
        storage.create_profile(&profile).await.unwrap();
        storage
            .insert_modules(&sample_modules(profile.id, "AI", 2))
            .await
            .unwrap();
        storage
            .insert_modules(&sample_modules(profile.id, "FullStack", 3))
            .await
            .unwrap();

        let deleted = storage
            .reset_career_path(profile.id, "DataScience")
            .await
            .unwrap();
        assert_eq!(deleted, 5);
        assert!(storage.list_modules(profile.id, None).await.unwrap().is_empty());
        assert_eq!(
            storage.get_profile(profile.id).await.unwrap().unwrap().goal,
            "DataScience"
        );
    }

    #[tokio::test]
    async fn test_reset_career_path_without_profile_changes_nothing() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let user = UserId::new();
        storage
            .insert_modules(&sample_modules(user, "AI", 2))
            .await
            .unwrap();

        let err = storage.reset_career_path(user, "AI").await.unwrap_err();
        assert!(matches!(err, PathwiseError::ProfileNotFound(_)));
        assert_eq!(storage.list_modules(user, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_metrics_upsert_overwrites() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let user = UserId::new();
        let mut metrics = UserMetrics {
            user_id: user,
            engagement_score: 10,
            velocity_score: 5,
            mastery_score: 8,
            updated_at: Utc::now(),
        };
        storage.upsert_metrics(&metrics).await.unwrap();
        metrics.engagement_score = 30;
        storage.upsert_metrics(&metrics).await.unwrap();

        let stored = storage.get_metrics(user).await.unwrap().unwrap();
        assert_eq!(stored.engagement_score, 30);
        assert_eq!(stored.mastery_score, 8);
    }

    #[tokio::test]
    async fn test_goal_update_and_listing_order() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let user = UserId::new();
        let now = Utc::now();
        let mut first = Goal {
            id: GoalId::new(),
            user_id: user,
            goal_title: "Ship portfolio".into(),
            description: None,
            deadline: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let second = Goal {
            id: GoalId::new(),
            goal_title: "Learn SQL".into(),
            created_at: now + chrono::Duration::seconds(1),
            updated_at: now + chrono::Duration::seconds(1),
            ..first.clone()
        };
        storage.create_goal(&first).await.unwrap();
        storage.create_goal(&second).await.unwrap();

        first.status = GoalStatus::Completed;
        storage.update_goal(&first).await.unwrap();

        let goals = storage.list_goals(user).await.unwrap();
        assert_eq!(goals[0].goal_title, "Learn SQL");
        assert_eq!(goals[1].status, GoalStatus::Completed);
        assert_eq!(goals[1].deadline, first.deadline);
    }

    #[tokio::test]
    async fn test_delete_question_removes_answers() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let now = Utc::now();
        let question = CommunityQuestion {
            id: QuestionId::new(),
            user_id: UserId::new(),
            question: "How do I start with Rust?".into(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        storage.create_question(&question).await.unwrap();
        let answer = CommunityAnswer {
            id: AnswerId::new(),
            question_id: question.id,
            user_id: UserId::new(),
            answer: "Read the book".into(),
            created_at: now,
            updated_at: now,
        };
        storage.create_answer(&answer).await.unwrap();

        storage.delete_question(question.id).await.unwrap();
        assert!(storage.get_question(question.id).await.unwrap().is_none());
        assert!(storage.get_answer(answer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mentors_sorted_by_rating() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        for (name, rating) in [("Lin", 4.2), ("Ravi", 4.9), ("Sam", 4.5)] {
            storage
                .upsert_mentor(&Mentor {
                    id: MentorId::new(),
                    name: name.into(),
                    role: "Engineer".into(),
                    company: "Acme".into(),
                    rating,
                    expertise: vec!["Rust".into()],
                    image: String::new(),
                    min_credibility: 0,
                })
                .await
                .unwrap();
        }
        let names: Vec<_> = storage
            .list_mentors()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Ravi", "Sam", "Lin"]);
    }

    #[tokio::test]
    async fn test_replace_roadmap_is_all_or_nothing() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let user = UserId::new();
        storage.insert_modules(&sample_modules(user, "AI", 2)).await.unwrap();
        storage.insert_modules(&sample_modules(user, "FullStack", 1)).await.unwrap();
        let other = UserId::new();
        storage.insert_modules(&sample_modules(other, "AI", 1)).await.unwrap();

        let deleted = storage
            .replace_roadmap(user, &sample_modules(user, "CyberSecurity", 3))
            .await
            .unwrap();
        assert_eq!(deleted, 3);
        let stored = storage.list_modules(user, None).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|m| m.topic == "CyberSecurity"));
        assert_eq!(storage.list_modules(other, None).await.unwrap().len(), 1);

        // A failing insert keeps the previous rows
        let mut clashing = sample_modules(user, "AI", 2);
        clashing[1].order_index = 0;
        assert!(storage.replace_roadmap(user, &clashing).await.is_err());
        let stored = storage.list_modules(user, None).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|m| m.topic == "CyberSecurity"));
    }
}
