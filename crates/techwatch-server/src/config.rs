//! HTTP server bind settings — separate from [`techwatch_core::Settings`],
//! which carries the database/Redis/API-key secrets shared with the other
//! binaries. Only `host`/`port`/`log_level` are server-specific.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Merge environment variables into config (env vars take precedence).
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("TECHWATCH_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("TECHWATCH_PORT")
            && let Ok(port) = val.parse::<u16>()
        {
            self.port = port;
        }
        if let Ok(val) = std::env::var("TECHWATCH_LOG_LEVEL") {
            self.log_level = val;
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_to_localhost_8090() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8090);
    }
}
