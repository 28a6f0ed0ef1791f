/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 3000 | HTTP service port |
/// | DATABASE_PATH | tabacaria.db | SQLite database file |
/// | ADMIN_PASSWORD | (unset) | Static password for /api/auth |
/// | ENVIRONMENT | development | development \| production |
/// | LOG_LEVEL | info | tracing max level |
/// | LOG_DIR | (unset) | Daily-rolling log directory |
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API service port
    pub http_port: u16,
    /// SQLite database file path
    pub database_path: String,
    /// Static password gating the API; `None` disables the auth check
    pub admin_password: Option<String>,
    /// Running environment: development | production
    pub environment: String,
    /// tracing max level
    pub log_level: String,
    /// Log directory for daily-rolling files, stdout only if unset
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "tabacaria.db".into()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// Override the pieces tests care about
    pub fn with_overrides(database_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
