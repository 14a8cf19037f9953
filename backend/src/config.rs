//! Application configuration.
//!
//! Read from `showring.toml` with every field defaulted, so an empty file is
//! valid. Environment variables are applied on top of whatever the file set.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::db::factory::RepositoryType;
use crate::engine::policy::{CompletionRule, InclusionPolicy, ScopeMode, StatusMode};
use crate::ingest::normalizer::LabelRules;
use crate::models::records::FollowField;

pub const CONFIG_FILE_NAME: &str = "showring.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No {0} found in standard locations")]
    NotFound(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feeds: FeedSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// Where the two feeds come from and how often to poll them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSettings {
    /// URL (`http://`, `https://`) or filesystem path of the schedule feed.
    #[serde(default)]
    pub schedule: String,
    /// URL or filesystem path of the trips feed.
    #[serde(default)]
    pub trips: String,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_refresh_secs() -> u64 {
    480
}

fn default_request_timeout_secs() -> u64 {
    20
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            schedule: String::new(),
            trips: String::new(),
            refresh_secs: default_refresh_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl FeedSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn is_configured(&self) -> bool {
        !self.schedule.trim().is_empty() && !self.trips.trim().is_empty()
    }
}

/// Reconciliation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub follow_field: FollowField,
    #[serde(default = "default_completed_statuses")]
    pub completed_statuses: Vec<String>,
    #[serde(default = "default_ring_label_template")]
    pub ring_label_template: String,
    #[serde(default = "default_group_label_fallback")]
    pub group_label_fallback: String,
    #[serde(default)]
    pub default_scope: ScopeMode,
    #[serde(default)]
    pub default_status: StatusMode,
}

fn default_completed_statuses() -> Vec<String> {
    vec!["Completed".to_string()]
}

fn default_ring_label_template() -> String {
    "Ring {id}".to_string()
}

fn default_group_label_fallback() -> String {
    "(Group)".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            follow_field: FollowField::default(),
            completed_statuses: default_completed_statuses(),
            ring_label_template: default_ring_label_template(),
            group_label_fallback: default_group_label_fallback(),
            default_scope: ScopeMode::default(),
            default_status: StatusMode::default(),
        }
    }
}

impl EngineSettings {
    pub fn label_rules(&self) -> LabelRules {
        LabelRules {
            ring_label_template: self.ring_label_template.clone(),
            group_label_fallback: self.group_label_fallback.clone(),
        }
    }

    pub fn completion_rule(&self) -> CompletionRule {
        CompletionRule {
            statuses: self.completed_statuses.clone(),
        }
    }

    pub fn default_policy(&self) -> InclusionPolicy {
        InclusionPolicy::new(self.default_scope, self.default_status)
    }
}

/// Repository type settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
    /// File repository location.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_repo_type() -> String {
    "local".to_string()
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
            path: None,
        }
    }
}

impl RepositorySettings {
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repo_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `showring.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                info!("Loading configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound(CONFIG_FILE_NAME))
    }

    /// File from the default location (or built-in defaults when there is
    /// none), then environment overrides, then validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::from_default_location() {
            Ok(config) => config,
            Err(ConfigError::NotFound(name)) => {
                info!("No {} found, using defaults", name);
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable numbers are ignored
    /// with a warning.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SHOWRING_SCHEDULE_URL") {
            self.feeds.schedule = v;
        }
        if let Some(v) = get("SHOWRING_TRIPS_URL") {
            self.feeds.trips = v;
        }
        if let Some(v) = get("SHOWRING_REFRESH_SECS") {
            match v.trim().parse() {
                Ok(secs) => self.feeds.refresh_secs = secs,
                Err(_) => warn!("Ignoring invalid SHOWRING_REFRESH_SECS={:?}", v),
            }
        }
        if let Some(v) = get("REPOSITORY_TYPE") {
            self.repository.repo_type = v;
        }
        if let Some(v) = get("SHOWRING_STATE_PATH") {
            self.repository.path = Some(PathBuf::from(v));
            if lookup("REPOSITORY_TYPE").is_none() {
                self.repository.repo_type = "file".to_string();
            }
        }
        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            match v.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT={:?}", v),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.repository
            .repository_type()
            .map_err(ConfigError::Invalid)?;
        if self.feeds.refresh_secs == 0 {
            return Err(ConfigError::Invalid(
                "feeds.refresh_secs must be positive".to_string(),
            ));
        }
        if self.engine.completed_statuses.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "engine.completed_statuses must name at least one status".to_string(),
            ));
        }
        Ok(())
    }
}
