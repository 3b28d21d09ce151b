//! Application configuration.
//!
//! Every field has a default, so an empty JSON object or an empty
//! environment yields a working in-memory setup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gesture::DeletePolicy;
use crate::parser::GeminiConfig;
use crate::repository::FirestoreConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which schedule store backs the app
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Firestore(FirestoreConfig),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// None falls back to the literal parser
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Presentation options for schedule cards and the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Relative ("3日後") instead of absolute dates
    pub show_relative_time: bool,
    pub allow_swipe: bool,
    pub allow_drag: bool,
    pub delete_policy: DeletePolicy,
    pub show_completed: bool,
    /// Live relative-time recomputation
    pub refresh_interval_secs: u32,
    /// Snapshot polling for stores without push
    pub poll_interval_secs: u32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            show_relative_time: true,
            allow_swipe: true,
            allow_drag: true,
            delete_policy: DeletePolicy::CompletedOnly,
            show_completed: false,
            refresh_interval_secs: 60,
            poll_interval_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub user_id: String,
    pub store: StoreConfig,
    pub parser: ParserConfig,
    pub view: ViewOptions,
    /// Lines kept by the in-app log panel
    pub log_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: "local-user".to_string(),
            store: StoreConfig::default(),
            parser: ParserConfig::default(),
            view: ViewOptions::default(),
            log_capacity: 500,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from `SCHEDULE_*` keys. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(user_id) = get("SCHEDULE_USER_ID") {
            config.user_id = user_id;
        }

        match get("SCHEDULE_STORE").as_deref() {
            None | Some("memory") => {}
            Some("firestore") => {
                let project_id = get("SCHEDULE_FIRESTORE_PROJECT")
                    .ok_or(ConfigError::Missing("SCHEDULE_FIRESTORE_PROJECT"))?;
                let api_key = get("SCHEDULE_FIRESTORE_API_KEY")
                    .ok_or(ConfigError::Missing("SCHEDULE_FIRESTORE_API_KEY"))?;
                let mut firestore = FirestoreConfig::new(project_id, api_key);
                if let Some(collection) = get("SCHEDULE_FIRESTORE_COLLECTION") {
                    firestore.collection = collection;
                }
                config.store = StoreConfig::Firestore(firestore);
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SCHEDULE_STORE",
                    message: format!("unknown store kind {:?}", other),
                })
            }
        }

        if let Some(api_key) = get("SCHEDULE_GEMINI_API_KEY") {
            let mut gemini = GeminiConfig::new(api_key);
            if let Some(model) = get("SCHEDULE_GEMINI_MODEL") {
                gemini.model = model;
            }
            config.parser.gemini = Some(gemini);
        }

        if let Some(policy) = get("SCHEDULE_DELETE_POLICY") {
            config.view.delete_policy = match policy.as_str() {
                "always" => DeletePolicy::Always,
                "completed_only" => DeletePolicy::CompletedOnly,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "SCHEDULE_DELETE_POLICY",
                        message: format!("expected always or completed_only, got {:?}", other),
                    })
                }
            };
        }

        if let Some(capacity) = get("SCHEDULE_LOG_CAPACITY") {
            config.log_capacity = capacity.parse().map_err(|e| ConfigError::Invalid {
                key: "SCHEDULE_LOG_CAPACITY",
                message: format!("{}", e),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Missing("user_id"));
        }
        if let StoreConfig::Firestore(firestore) = &self.store {
            if firestore.project_id.trim().is_empty() {
                return Err(ConfigError::Missing("store.project_id"));
            }
            if firestore.api_key.trim().is_empty() {
                return Err(ConfigError::Missing("store.api_key"));
            }
        }
        if let Some(gemini) = &self.parser.gemini {
            if gemini.api_key.trim().is_empty() {
                return Err(ConfigError::Missing("parser.gemini.api_key"));
            }
        }
        if self.view.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "view.refresh_interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.view.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "view.poll_interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "log_capacity",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
