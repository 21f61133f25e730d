//! Command-line and environment configuration.
//!
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;

/// usrapi-manager - browse and edit users of a remote REST collection
#[derive(Parser, Debug, Clone)]
#[command(name = "usrapi-manager", version, about, long_about = None)]
pub struct Config {
    /// Base URL of the remote resource; users live under `<base>/users`
    #[arg(long, env = "USRAPI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "USRAPI_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Theme file (key = #RRGGBB); created with defaults when missing
    #[arg(long, env = "USRAPI_THEME", default_value = "theme.conf")]
    pub theme: PathBuf,

    /// Keybindings file (Action = KeySpec); created with defaults when missing
    #[arg(long, env = "USRAPI_KEYBINDS", default_value = "keybinds.conf")]
    pub keybinds: PathBuf,

    /// Log file; the terminal is owned by the UI
    #[arg(long, env = "USRAPI_LOG_FILE", default_value = "usrapi-manager.log")]
    pub log_file: PathBuf,

    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive)
    #[arg(long, env = "USRAPI_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}
