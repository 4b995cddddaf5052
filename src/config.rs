//! Configuration types, read from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::cards::ThemePalette;
use crate::error::ConfigError;
use crate::pipeline::DEFAULT_TRIGGER;

/// Lark/Feishu Open Platform credentials.
#[derive(Debug, Clone)]
pub struct LarkConfig {
    pub app_id: String,
    pub app_secret: SecretString,
    /// Expected `header.token` on event callbacks. Unchecked when `None`.
    pub verification_token: Option<String>,
    /// Open API origin, e.g. `https://open.feishu.cn`.
    pub base_url: String,
}

/// Submission handling settings.
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    /// Post title that marks a private message as a submission.
    pub trigger: String,
    /// Group chats each accepted submission is forwarded to, in order.
    pub group_chats: Vec<String>,
    pub themes: ThemePalette,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER.to_string(),
            group_chats: Vec::new(),
            themes: ThemePalette::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Budget for processing one inbound event before it is cancelled.
    pub event_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            event_timeout: Duration::from_secs(30),
        }
    }
}

/// Log output settings. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    /// Directory for daily-rolling log files, in addition to stderr.
    pub path: Option<PathBuf>,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub lark: LarkConfig,
    pub submission: SubmissionConfig,
    pub server: ServerConfig,
    pub db_path: PathBuf,
    pub log: LogConfig,
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let lark = LarkConfig {
            app_id: require("FEISHU_APP_ID")?,
            app_secret: SecretString::from(require("FEISHU_APP_SECRET")?),
            verification_token: get("FEISHU_VERIFICATION_TOKEN"),
            base_url: get("FEISHU_BASE_URL")
                .unwrap_or_else(|| "https://open.feishu.cn".to_string()),
        };

        let themes = split_list(get("CARD_THEMES"));
        let submission = SubmissionConfig {
            trigger: get("SUBMISSION_TRIGGER").unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
            group_chats: split_list(get("GROUP_CHATS")),
            themes: if themes.is_empty() {
                ThemePalette::default()
            } else {
                ThemePalette::new(themes)?
            },
        };

        let defaults = ServerConfig::default();
        let timeout_secs: u64 = parse_or(
            "EVENT_TIMEOUT_SECS",
            get("EVENT_TIMEOUT_SECS"),
            defaults.event_timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "EVENT_TIMEOUT_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }
        let server = ServerConfig {
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            event_timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            lark,
            submission,
            server,
            db_path: get("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/miko-news.db")),
            log: LogConfig {
                level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                path: get("LOG_PATH").map(PathBuf::from),
            },
        })
    }

    /// Create the database and log directories if missing.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        if let Some(dir) = &self.log.path {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
    }
}
