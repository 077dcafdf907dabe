//! Shared domain types and configuration for CryptoScope.

pub mod alert;
pub mod app_config;
pub mod config;
pub mod context;
pub mod metrics;
pub mod task;

use thiserror::Error;

pub use alert::{Alert, AlertData, AlertKind, Severity};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use context::RequestContext;
pub use metrics::{
    Account, Competitor, HashtagAnalytic, HashtagPeriod, Mention, Observation, Post, Sentiment,
    Snapshot, COMPETITOR_QUOTA,
};
pub use task::{TaskDescriptor, TaskKind};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid sentiment label: {0}")]
    InvalidSentiment(String),
    #[error("invalid hashtag period: {0}")]
    InvalidPeriod(String),
    #[error("invalid task: {0}")]
    InvalidTask(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
