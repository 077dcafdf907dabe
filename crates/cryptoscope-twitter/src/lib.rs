//! X/Twitter profile source for CryptoScope syncs.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod source;
pub mod types;

pub use client::TwitterClient;
pub use error::TwitterError;
pub use source::ProfileSource;
pub use types::{FetchedMention, FetchedPost, ProfileData};
