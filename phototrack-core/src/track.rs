//! Time-ordered track store with tolerance-bounded interpolation search

use chrono::{DateTime, Local};
use log::debug;

use crate::error::TrackError;
use crate::position::{Coordinates, TrackPosition};

/// The recorded track, sorted ascending by UTC time.
///
/// Built once before matching starts, then shared read-only by every
/// worker; no locking is needed because nothing mutates it afterwards.
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    positions: Vec<TrackPosition>,
}

impl TrackStore {
    /// Build a store from positions in any order.
    ///
    /// The sort is stable: fixes with equal UTC time keep their relative
    /// input order and are treated as degenerate zero-width intervals by
    /// [`locate`](Self::locate).
    pub fn from_positions(mut positions: Vec<TrackPosition>) -> Self {
        positions.sort_by_key(|p| p.utc_time());
        TrackStore { positions }
    }

    /// Build a store from positions the caller asserts are already sorted.
    ///
    /// The ordering is trusted here and checked lazily: a search over a
    /// store that violates it reports [`TrackError::Unsorted`].
    pub fn from_sorted_positions(positions: Vec<TrackPosition>) -> Self {
        TrackStore { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Earliest and latest fix times in local rendering, for the run log.
    pub fn local_time_range(&self) -> Option<(DateTime<Local>, DateTime<Local>)> {
        match (self.positions.first(), self.positions.last()) {
            (Some(first), Some(last)) => Some((first.local_time(), last.local_time())),
            _ => None,
        }
    }

    /// Hunt for a pair of fixes bracketing `query` and interpolate between
    /// them.
    ///
    /// A pair `(p, q)` qualifies when `p.local_time <= query <= q.local_time`
    /// *and* both edge distances are within `tolerance_millis`. The second
    /// condition is deliberate: a sparse track can bracket a time yet still
    /// be too far from either fix to trust, so such photos are rejected
    /// rather than snapped to the nearest fix. The earliest qualifying pair
    /// wins.
    ///
    /// Returns `Ok(None)` when no pair qualifies; that is the expected
    /// outcome for photos taken off the track, not an error.
    pub fn locate(
        &self,
        query: DateTime<Local>,
        tolerance_millis: i64,
    ) -> Result<Option<Coordinates>, TrackError> {
        let query_millis = query.timestamp_millis();

        for (index, pair) in self.positions.windows(2).enumerate() {
            let (earlier, later) = (&pair[0], &pair[1]);

            let earlier_millis = earlier.local_time().timestamp_millis();
            let later_millis = later.local_time().timestamp_millis();

            // Zero-width interval, never matched against
            if earlier_millis == later_millis {
                continue;
            }

            if earlier_millis > later_millis {
                return Err(TrackError::Unsorted { index });
            }

            if query_millis < earlier_millis || query_millis > later_millis {
                continue;
            }

            if query_millis - earlier_millis > tolerance_millis
                || later_millis - query_millis > tolerance_millis
            {
                continue;
            }

            let ratio =
                (query_millis - earlier_millis) as f64 / (later_millis - earlier_millis) as f64;
            let latitude = (1.0 - ratio) * earlier.latitude() + ratio * later.latitude();
            let longitude = (1.0 - ratio) * earlier.longitude() + ratio * later.longitude();

            debug!(
                "interpolated position at ratio [{:.3}] between fixes [{}] and [{}]",
                ratio, earlier, later
            );

            return Ok(Some(Coordinates {
                latitude,
                longitude,
            }));
        }

        Ok(None)
    }
}
