use std::cmp::Reverse;

use cryptoscope_core::Alert;

/// Order alerts for display and keep the first `limit`.
///
/// Sorted by severity (critical, warning, success, info), newest first within
/// a severity. The sort is stable so equal alerts keep their detection order.
#[must_use]
pub fn rank_alerts(mut alerts: Vec<Alert>, limit: usize) -> Vec<Alert> {
    alerts.sort_by_key(|a| (a.severity, Reverse(a.created_at)));
    alerts.truncate(limit);
    alerts
}
