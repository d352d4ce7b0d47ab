use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Signing secret used when none is configured; the server warns on startup if it is still in use
pub const DEV_JWT_SECRET: &str = "mobile-master-dev-secret-change-me";

/// How many requests a client may make within a sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitPolicy {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn apply_update(self, update: RateLimitPolicyUpdate) -> Self {
        Self {
            max_requests: update.max_requests.unwrap_or(self.max_requests),
            window_secs: update.window_secs.unwrap_or(self.window_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RateLimitPolicyUpdate {
    #[serde(default)]
    pub max_requests: Option<u32>,
    #[serde(default)]
    pub window_secs: Option<u64>,
}

/// Where rate-limit hits are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Shared across server processes through the `rate_limit_hits` table
    Database,
    /// Per-process only
    Memory,
}

/// Configuration for the Mobile Master server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    /// Lifetime of an issued token in hours
    pub token_ttl_hours: u64,
    pub login_rate_limit: RateLimitPolicy,
    pub api_rate_limit: RateLimitPolicy,
    pub rate_limit_backend: RateLimitBackend,
    /// Directory for daily-rolling log files; logs go to stdout only when unset
    pub log_dir: Option<PathBuf>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub bind_addr: Option<String>,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub token_ttl_hours: Option<u64>,
    #[serde(default)]
    pub login_rate_limit: RateLimitPolicyUpdate,
    #[serde(default)]
    pub api_rate_limit: RateLimitPolicyUpdate,
    #[serde(default)]
    pub rate_limit_backend: Option<RateLimitBackend>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "mobile-master", about = "Shop management API for mobile phone retailers")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on, e.g. 0.0.0.0:3000
    #[clap(long, env = "BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Token signing secret
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in hours
    #[clap(long, env = "TOKEN_TTL_HOURS")]
    pub token_ttl_hours: Option<u64>,

    /// Sign-in attempts allowed per window
    #[clap(long, env = "LOGIN_RATE_LIMIT_MAX")]
    pub login_max_requests: Option<u32>,

    /// Sign-in rate-limit window in seconds
    #[clap(long, env = "LOGIN_RATE_LIMIT_WINDOW_SECS")]
    pub login_window_secs: Option<u64>,

    /// API requests allowed per window
    #[clap(long, env = "API_RATE_LIMIT_MAX")]
    pub api_max_requests: Option<u32>,

    /// API rate-limit window in seconds
    #[clap(long, env = "API_RATE_LIMIT_WINDOW_SECS")]
    pub api_window_secs: Option<u64>,

    /// Where rate-limit hits are counted
    #[clap(long, value_enum, env = "RATE_LIMIT_BACKEND")]
    pub rate_limit_backend: Option<RateLimitBackend>,

    /// Directory for daily-rolling log files
    #[clap(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[clap(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,

    /// Debug mode
    #[clap(long, env = "MOBILE_MASTER_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            bind_addr: update.bind_addr.unwrap_or(self.bind_addr),
            jwt_secret: update.jwt_secret.unwrap_or(self.jwt_secret),
            token_ttl_hours: update.token_ttl_hours.unwrap_or(self.token_ttl_hours),
            login_rate_limit: self.login_rate_limit.apply_update(update.login_rate_limit),
            api_rate_limit: self.api_rate_limit.apply_update(update.api_rate_limit),
            rate_limit_backend: update.rate_limit_backend.unwrap_or(self.rate_limit_backend),
            log_dir: update.log_dir.or(self.log_dir),
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Returns the base (default) configuration
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let database_url = config_path.map_or("mobile_master.db".to_string(), |path| {
        path.join("mobile_master.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        bind_addr: "127.0.0.1:3000".to_string(),
        jwt_secret: DEV_JWT_SECRET.to_string(),
        token_ttl_hours: 24,
        login_rate_limit: RateLimitPolicy { max_requests: 5, window_secs: 60 },
        api_rate_limit: RateLimitPolicy { max_requests: 120, window_secs: 60 },
        rate_limit_backend: RateLimitBackend::Database,
        log_dir: None,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: &CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url.clone(),
        bind_addr: args.bind_addr.clone(),
        jwt_secret: args.jwt_secret.clone(),
        token_ttl_hours: args.token_ttl_hours,
        login_rate_limit: RateLimitPolicyUpdate {
            max_requests: args.login_max_requests,
            window_secs: args.login_window_secs,
        },
        api_rate_limit: RateLimitPolicyUpdate {
            max_requests: args.api_max_requests,
            window_secs: args.api_window_secs,
        },
        rate_limit_backend: args.rate_limit_backend,
        log_dir: args.log_dir.clone(),
    }
}

/// Returns the platform config directory if it exists
pub fn get_config_dir_path() -> Option<PathBuf> {
    let Some(proj_dirs) = ProjectDirs::from("pk", "mobile-master", "mobile-master") else {
        warn!("Could not determine XDG config directory, skipping config file");
        return None;
    };

    let path = proj_dirs.config_dir().to_path_buf();
    if !path.exists() {
        info!("Config path not found at {:?}, using defaults", path);
        return None;
    }
    Some(path)
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: &CliArgs) -> Config {
    let config_dir = get_config_dir_path();
    let base = base_config(config_dir.clone());

    let config = base
        .apply_update(config_from_file(config_dir.map(|dir| dir.join("config.toml"))).unwrap_or_default())
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, bind_addr={}, rate_limit_backend={:?}, login={}/{}s, api={}/{}s",
        config.database_url,
        config.bind_addr,
        config.rate_limit_backend,
        config.login_rate_limit.max_requests,
        config.login_rate_limit.window_secs,
        config.api_rate_limit.max_requests,
        config.api_rate_limit.window_secs,
    );

    config
}
