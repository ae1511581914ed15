use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::services::llm::LlmConfig;

/// Runtime settings, read from the environment once at startup. Every
/// environment variable the process consumes is surfaced through this
/// struct so the rest of the code never touches `std::env` directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub database_url: Option<String>,
    pub llm: LlmConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env_parsed("HOST").unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = env_parsed("PORT").unwrap_or(3000);
        let log_level = env_string("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let enable_file_logs = env_string("ENABLE_FILE_LOGS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let log_dir = env_string("LOG_DIR").unwrap_or_else(|| "./logs".to_string());

        let llm = LlmConfig::new(
            env_string("LLM_API_KEY"),
            env_string("LLM_MODEL"),
            env_string("LLM_API_ENDPOINT").or_else(|| env_string("LLM_BASE_URL")),
            env_parsed("LLM_TIMEOUT"),
        );

        Self {
            host,
            port,
            log_level,
            enable_file_logs,
            log_dir,
            database_url: env_string("DATABASE_URL"),
            llm,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Directory for rolling file logs, when file logging is switched on.
    pub fn file_log_dir(&self) -> Option<&str> {
        self.enable_file_logs.then_some(self.log_dir.as_str())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    env_string(key)?.parse().ok()
}
