use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub sync_max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub sync_cron: String,
    pub alert_scan_cron: String,
    pub weekly_report_cron: String,
    pub twitter_bearer_token: Option<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub app_url: String,
    pub automation_base_url: String,
    /// Accepted bearer tokens for the HTTP API. Empty disables auth in development.
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("sync_max_retries", &self.sync_max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("sync_cron", &self.sync_cron)
            .field("alert_scan_cron", &self.alert_scan_cron)
            .field("weekly_report_cron", &self.weekly_report_cron)
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("email_from", &self.email_from)
            .field("app_url", &self.app_url)
            .field("automation_base_url", &self.automation_base_url)
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
