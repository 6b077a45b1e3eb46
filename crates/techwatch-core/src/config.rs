//! Environment-driven configuration, with an optional TOML file underlay.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default)]
    pub reddit_client_id: Option<String>,
    #[serde(default)]
    pub reddit_client_secret: Option<String>,
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub devto_api_key: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            redis_url: default_redis_url(),
            reddit_client_id: None,
            reddit_client_secret: None,
            youtube_api_key: None,
            anthropic_api_key: None,
            devto_api_key: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load from an optional TOML file, then overlay matching environment
    /// variables (env always wins — mirrors the file+env layering the rest
    /// of the pack uses for its own config).
    pub fn load(file: Option<&std::path::Path>) -> Self {
        let mut settings = match file {
            Some(path) => std::fs::read_to_string(path)
                .ok()
                .and_then(|s| toml::from_str(&s).ok())
                .unwrap_or_default(),
            None => Settings::default(),
        };
        settings.merge_env();
        settings
    }

    pub fn merge_env(&mut self) {
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database_url = v;
        }
        if let Ok(v) = std::env::var("REDIS_URL") {
            self.redis_url = v;
        }
        if let Ok(v) = std::env::var("REDDIT_CLIENT_ID") {
            self.reddit_client_id = Some(v);
        }
        if let Ok(v) = std::env::var("REDDIT_CLIENT_SECRET") {
            self.reddit_client_secret = Some(v);
        }
        if let Ok(v) = std::env::var("YOUTUBE_API_KEY") {
            self.youtube_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("DEVTO_API_KEY") {
            self.devto_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.log_level = v;
        }
    }
}

fn default_database_url() -> String {
    "sqlite://techwatch.db".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
