//! Track position model

use core::fmt;

use chrono::{DateTime, Local, Utc};

/// A single GPS fix from the recorded track.
///
/// Positions are WGS84 with the capture instant in UTC; the local-zone
/// rendering of the same instant is derived once at construction and used
/// for all matching against photo capture times. Immutable after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPosition {
    latitude: f64,
    longitude: f64,
    utc_time: DateTime<Utc>,
    local_time: DateTime<Local>,
}

impl TrackPosition {
    /// Create a position from a UTC fix, deriving its local time.
    pub fn new(latitude: f64, longitude: f64, utc_time: DateTime<Utc>) -> Self {
        TrackPosition {
            latitude,
            longitude,
            utc_time,
            local_time: utc_time.with_timezone(&Local),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// The recorded UTC instant; the ordering key within a track.
    pub fn utc_time(&self) -> DateTime<Utc> {
        self.utc_time
    }

    /// The fix instant rendered in the process-local zone.
    pub fn local_time(&self) -> DateTime<Local> {
        self.local_time
    }
}

impl fmt::Display for TrackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Local time: [{}] UTC time: [{}] Lat: [{:.16}] Lon: [{:.16}]",
            self.local_time.format("%d/%m/%Y %H:%M:%S"),
            self.utc_time.format("%d/%m/%Y %H:%M:%S"),
            self.latitude,
            self.longitude
        )
    }
}

/// An interpolated WGS84 coordinate pair produced by the track search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_time_is_same_instant() {
        let utc = DateTime::from_timestamp(1_622_548_800, 0).unwrap();
        let position = TrackPosition::new(-25.0, 120.0, utc);
        assert_eq!(position.local_time().timestamp_millis(), utc.timestamp_millis());
        assert_eq!(position.utc_time(), utc);
    }
}
