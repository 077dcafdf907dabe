//! HTTP API, background scheduler and the sync/alert/report pipelines for
//! CryptoScope.

pub mod api;
pub mod jobs;
pub mod middleware;
pub mod scheduler;
