//! Environment-driven configuration.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `STRUCTUREBOT_CORPORATION` | corporation to check |
//! | `STRUCTUREBOT_ESI_URL` | ESI base URL |
//! | `STRUCTUREBOT_LOGIN_URL` | SSO token endpoint |
//! | `STRUCTUREBOT_SSO_CLIENT_ID`, `STRUCTUREBOT_SSO_CLIENT_SECRET`, `STRUCTUREBOT_SSO_REFRESH_TOKEN` | SSO credentials (all or none) |
//! | `STRUCTUREBOT_SLACK_WEBHOOK`, `STRUCTUREBOT_SLACK_CHANNEL` | notification target |
//! | `STRUCTUREBOT_FUEL_WARNING_DAYS` | low fuel horizon, default 7 |
//! | `STRUCTUREBOT_STATIC_DATA` | SQLite SDE export |
//! | `STRUCTUREBOT_TYPES` | CSV type catalog, preferred over the SDE |

use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::auth::{SsoCredentials, DEFAULT_LOGIN_URL};
use crate::catalog::TypeCatalog;
use crate::error::{Error, Result};
use crate::esi::DEFAULT_ESI_URL;
use crate::sde::StaticData;
use crate::structure::{FuelPolicy, DEFAULT_FUEL_WARNING_DAYS, MAX_FUEL_WARNING_DAYS};
use crate::types::TypeRegistry;

const STATIC_DATA_FILENAME: &str = "sde.sqlite";

/// Slack webhook target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    pub webhook_url: String,
    pub channel: Option<String>,
}

/// Runtime configuration for a monitoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub corporation: Option<String>,
    pub esi_url: String,
    pub login_url: String,
    pub sso: Option<SsoCredentials>,
    pub slack: Option<SlackConfig>,
    pub fuel_policy: FuelPolicy,
    pub static_data: Option<PathBuf>,
    pub types: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corporation: None,
            esi_url: DEFAULT_ESI_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            sso: None,
            slack: None,
            fuel_policy: FuelPolicy::default(),
            static_data: None,
            types: None,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let sso = match (
            get("STRUCTUREBOT_SSO_CLIENT_ID"),
            get("STRUCTUREBOT_SSO_CLIENT_SECRET"),
            get("STRUCTUREBOT_SSO_REFRESH_TOKEN"),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(SsoCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            (None, None, None) => None,
            _ => {
                return Err(Error::Config {
                    message: "STRUCTUREBOT_SSO_CLIENT_ID, STRUCTUREBOT_SSO_CLIENT_SECRET and \
                              STRUCTUREBOT_SSO_REFRESH_TOKEN must be set together"
                        .to_string(),
                })
            }
        };

        let fuel_warning_days = match get("STRUCTUREBOT_FUEL_WARNING_DAYS") {
            Some(days) => days
                .parse::<i64>()
                .ok()
                .filter(|days| (1..=MAX_FUEL_WARNING_DAYS).contains(days))
                .ok_or_else(|| Error::Config {
                    message: format!(
                        "STRUCTUREBOT_FUEL_WARNING_DAYS must be between 1 and \
                         {MAX_FUEL_WARNING_DAYS}, got '{days}'"
                    ),
                })?,
            None => DEFAULT_FUEL_WARNING_DAYS,
        };
        let fuel_policy = FuelPolicy::try_from_days(fuel_warning_days)?;

        let config = Self {
            corporation: get("STRUCTUREBOT_CORPORATION"),
            esi_url: get("STRUCTUREBOT_ESI_URL").unwrap_or_else(|| DEFAULT_ESI_URL.to_string()),
            login_url: get("STRUCTUREBOT_LOGIN_URL")
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            sso,
            slack: get("STRUCTUREBOT_SLACK_WEBHOOK").map(|webhook_url| SlackConfig {
                webhook_url,
                channel: get("STRUCTUREBOT_SLACK_CHANNEL"),
            }),
            fuel_policy,
            static_data: get("STRUCTUREBOT_STATIC_DATA").map(PathBuf::from),
            types: get("STRUCTUREBOT_TYPES").map(PathBuf::from),
        };
        debug!(
            corporation = ?config.corporation,
            sso = config.sso.is_some(),
            slack = config.slack.is_some(),
            fuel_warning_days,
            "loaded configuration"
        );
        Ok(config)
    }

    /// Build the type registry from the CSV catalog if configured, otherwise
    /// from the SDE export (falling back to the platform data directory).
    pub fn type_registry(&self) -> Result<TypeRegistry> {
        if let Some(path) = &self.types {
            return Ok(TypeRegistry::new(TypeCatalog::from_path(path)?));
        }

        let path = match &self.static_data {
            Some(path) => path.clone(),
            None => default_static_data_path()?,
        };
        if !path.exists() {
            return Err(Error::Config {
                message: format!(
                    "static data not found at {}; set STRUCTUREBOT_STATIC_DATA or STRUCTUREBOT_TYPES",
                    path.display()
                ),
            });
        }
        Ok(TypeRegistry::new(StaticData::open(&path)?))
    }
}

/// Platform data directory location for the SDE export.
pub fn default_static_data_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "structurebot", "structurebot").ok_or(Error::Config {
        message: "failed to resolve project directories for static data".to_string(),
    })?;
    Ok(Path::new(dirs.data_dir()).join(STATIC_DATA_FILENAME))
}
