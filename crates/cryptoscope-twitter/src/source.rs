use chrono::{DateTime, Utc};

use crate::error::TwitterError;
use crate::types::ProfileData;

/// Where a sync reads a handle's current counts and recent activity from.
#[async_trait::async_trait]
pub trait ProfileSource: Send + Sync {
    /// Current profile counts plus posts and mentions published since `since`.
    async fn fetch(&self, handle: &str, since: DateTime<Utc>) -> Result<ProfileData, TwitterError>;
}
