//! Storage configuration.
//!
//! # Responsibility
//! - Describe where the database lives and how connections are tuned.
//! - Read overrides from the process environment.
//!
//! # Invariants
//! - Defaults match a file database named `db.sqlite` with foreign keys on.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable selecting the database file (`:memory:` allowed).
pub const DB_FILE_ENV: &str = "FRESH_ORM_DB_FILE";
/// Environment variable overriding the busy timeout, in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "FRESH_ORM_BUSY_TIMEOUT_MS";

const DEFAULT_DB_FILE: &str = "db.sqlite";
const MEMORY_LOCATION: &str = ":memory:";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the database is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

impl DbLocation {
    /// Parses a user-supplied location; `:memory:` selects an in-memory
    /// database.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyLocation);
        }
        if trimmed == MEMORY_LOCATION {
            return Ok(Self::Memory);
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }

    /// Short label for log events.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

impl Display for DbLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(MEMORY_LOCATION),
        }
    }
}

/// Connection settings used by `open_db`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub location: DbLocation,
    /// Enforce `FOREIGN KEY` clauses on write.
    pub foreign_keys: bool,
    pub busy_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            location: DbLocation::File(PathBuf::from(DEFAULT_DB_FILE)),
            foreign_keys: true,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl DbConfig {
    pub fn in_memory() -> Self {
        Self {
            location: DbLocation::Memory,
            ..Self::default()
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DbLocation::File(path.into()),
            ..Self::default()
        }
    }

    /// Builds a config from defaults plus environment overrides.
    ///
    /// # Errors
    /// - `EmptyLocation` when `FRESH_ORM_DB_FILE` is set but blank.
    /// - `InvalidBusyTimeout` when `FRESH_ORM_BUSY_TIMEOUT_MS` is not an integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(location) = lookup(DB_FILE_ENV) {
            config.location = DbLocation::parse(&location)?;
        }
        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidBusyTimeout(raw.clone()))?;
            config.busy_timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyLocation,
    InvalidBusyTimeout(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLocation => write!(f, "database location cannot be empty"),
            Self::InvalidBusyTimeout(raw) => {
                write!(f, "busy timeout must be whole milliseconds, got `{raw}`")
            }
        }
    }
}

impl Error for ConfigError {}
