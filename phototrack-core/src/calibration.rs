//! Camera clock calibration
//!
//! Cameras rarely agree with GPS time. The offset between the two clocks is
//! derived once per run from a single reference photo: the user photographs
//! something showing the true time (the GPS receiver's own display works)
//! and supplies that time as text. The resulting millisecond delta is then
//! applied uniformly to every photo's raw capture time.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone};

use crate::error::CalibrationError;

/// Required textual format for the true-time string, interpreted in the
/// process-local time zone.
pub const TRUE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The one-shot clock offset for a run. Immutable once computed.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    reference_capture_time: DateTime<Local>,
    true_time: DateTime<Local>,
    offset_millis: i64,
}

impl Calibration {
    /// Derive the offset from the reference photo's raw capture time and
    /// the user-supplied true-time string.
    pub fn from_reference(
        reference_capture_time: DateTime<Local>,
        true_time: &str,
    ) -> Result<Self, CalibrationError> {
        let wall_clock = NaiveDateTime::parse_from_str(true_time.trim(), TRUE_TIME_FORMAT)
            .map_err(|_| CalibrationError::InvalidFormat {
                input: true_time.to_string(),
            })?;

        let true_time = match Local.from_local_datetime(&wall_clock) {
            LocalResult::Single(instant) => instant,
            _ => {
                // DST gap or fold: refuse to guess an instant
                return Err(CalibrationError::InvalidLocalTime {
                    input: true_time.to_string(),
                });
            }
        };

        let offset_millis =
            true_time.timestamp_millis() - reference_capture_time.timestamp_millis();

        Ok(Calibration {
            reference_capture_time,
            true_time,
            offset_millis,
        })
    }

    /// The millisecond delta to add to every raw capture time.
    pub fn offset_millis(&self) -> i64 {
        self.offset_millis
    }

    pub fn reference_capture_time(&self) -> DateTime<Local> {
        self.reference_capture_time
    }

    pub fn true_time(&self) -> DateTime<Local> {
        self.true_time
    }

    /// Shift a raw capture time by the computed offset.
    pub fn calibrate(&self, raw_capture_time: DateTime<Local>) -> DateTime<Local> {
        raw_capture_time + Duration::milliseconds(self.offset_millis)
    }
}
