//! Storage connection settings: `.env` in the working directory first, then the process environment.

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::fmt;
use std::path::PathBuf;

use crate::utils::config::StorageConsts;

/// Load `.env` from the working directory if present. Variables already set in the process win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(".env: {}", e),
    }
}

/// PostgreSQL connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct PgSettings {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl fmt::Debug for PgSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgSettings")
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Which storage engine to open, and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageConfig {
    Sqlite { path: PathBuf },
    Postgres(PgSettings),
}

impl StorageConfig {
    /// Read the storage settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (process env in production, a map in tests).
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = get(StorageConsts::ENV_BACKEND).unwrap_or_else(|| "sqlite".to_string());
        match backend.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageConfig::Sqlite {
                path: PathBuf::from(
                    get(StorageConsts::ENV_SQLITE_PATH)
                        .unwrap_or_else(|| StorageConsts::DEFAULT_SQLITE_PATH.to_string()),
                ),
            }),
            "postgres" | "postgresql" => {
                let port = match get(StorageConsts::ENV_PG_PORT) {
                    Some(p) => p
                        .parse::<u16>()
                        .with_context(|| format!("{} is not a port: {p}", StorageConsts::ENV_PG_PORT))?,
                    None => StorageConsts::DEFAULT_PG_PORT,
                };
                Ok(StorageConfig::Postgres(PgSettings {
                    user: get(StorageConsts::ENV_PG_USER)
                        .unwrap_or_else(|| StorageConsts::DEFAULT_PG_USER.to_string()),
                    password: get(StorageConsts::ENV_PG_PASSWORD).unwrap_or_default(),
                    database: get(StorageConsts::ENV_PG_DB)
                        .unwrap_or_else(|| StorageConsts::DEFAULT_PG_DB.to_string()),
                    host: get(StorageConsts::ENV_PG_HOST)
                        .unwrap_or_else(|| StorageConsts::DEFAULT_PG_HOST.to_string()),
                    port,
                }))
            }
            other => bail!(
                "{} must be `sqlite` or `postgres`, got `{}`",
                StorageConsts::ENV_BACKEND,
                other
            ),
        }
    }
}
