//! Two-snapshot comparison shared by delta, milestone and swing detection.

use cryptoscope_core::Snapshot;

use crate::error::InsightError;

/// Follower delta of a new measurement against the single most recent prior one.
///
/// Returns `0` when there is no prior snapshot.
#[must_use]
pub fn follower_delta(prior_follower_count: Option<i64>, new_follower_count: i64) -> i64 {
    prior_follower_count.map_or(0, |prior| new_follower_count - prior)
}

/// An ordered `(previous, current)` pair of snapshots for one account.
///
/// Construction validates ordering so rules never need to re-derive which
/// snapshot is newer.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPair<'a> {
    previous: &'a Snapshot,
    current: &'a Snapshot,
}

impl<'a> SnapshotPair<'a> {
    /// Pair two snapshots of the same account.
    ///
    /// Snapshots are ordered by `(captured_at, id)`; `current` must sort
    /// strictly after `previous`.
    ///
    /// # Errors
    ///
    /// Returns [`InsightError`] if the snapshots belong to different accounts,
    /// are out of order, or carry negative follower counts.
    pub fn new(previous: &'a Snapshot, current: &'a Snapshot) -> Result<Self, InsightError> {
        if previous.account_id != current.account_id {
            return Err(InsightError::AccountMismatch {
                previous: previous.account_id,
                current: current.account_id,
            });
        }
        if (current.captured_at, current.id) <= (previous.captured_at, previous.id) {
            return Err(InsightError::Misordered {
                previous_id: previous.id,
                previous_at: previous.captured_at,
                current_id: current.id,
                current_at: current.captured_at,
            });
        }
        for snapshot in [previous, current] {
            if snapshot.follower_count < 0 {
                return Err(InsightError::NegativeCount {
                    snapshot_id: snapshot.id,
                    field: "follower_count",
                    value: snapshot.follower_count,
                });
            }
        }
        Ok(Self { previous, current })
    }

    /// Pair the two most recent snapshots from a newest-first slice.
    ///
    /// Returns `Ok(None)` when fewer than two snapshots exist.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`SnapshotPair::new`].
    pub fn latest(newest_first: &'a [Snapshot]) -> Result<Option<Self>, InsightError> {
        match newest_first {
            [current, previous, ..] => Self::new(previous, current).map(Some),
            _ => Ok(None),
        }
    }

    #[must_use]
    pub fn previous(&self) -> &'a Snapshot {
        self.previous
    }

    #[must_use]
    pub fn current(&self) -> &'a Snapshot {
        self.current
    }

    #[must_use]
    pub fn delta(&self) -> i64 {
        self.current.follower_count - self.previous.follower_count
    }

    /// Thresholds in `ladder` with `previous < M <= current`, ascending.
    #[must_use]
    pub fn crossed(&self, ladder: &[i64]) -> Vec<i64> {
        ladder
            .iter()
            .copied()
            .filter(|&m| self.previous.follower_count < m && m <= self.current.follower_count)
            .collect()
    }
}
