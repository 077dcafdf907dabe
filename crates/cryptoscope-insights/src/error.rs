use chrono::{DateTime, Utc};
use thiserror::Error;

/// Malformed input detected while evaluating one account's metrics.
#[derive(Debug, Error, PartialEq)]
pub enum InsightError {
    #[error("snapshots belong to different accounts ({previous} vs {current})")]
    AccountMismatch { previous: i64, current: i64 },

    #[error("snapshot {current_id} ({current_at}) is not after snapshot {previous_id} ({previous_at})")]
    Misordered {
        previous_id: i64,
        previous_at: DateTime<Utc>,
        current_id: i64,
        current_at: DateTime<Utc>,
    },

    #[error("negative {field} on snapshot {snapshot_id}: {value}")]
    NegativeCount {
        snapshot_id: i64,
        field: &'static str,
        value: i64,
    },
}
