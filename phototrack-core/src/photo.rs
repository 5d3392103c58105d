//! Photo record entity and lifecycle
//!
//! A record moves through `Created -> TimeCalibrated -> Matched | Failed`.
//! The match transition happens exactly once, performed by exactly one
//! pipeline worker; the mutators are crate-private so nothing outside the
//! pipeline can revisit a record afterwards.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::calibration::Calibration;
use crate::position::Coordinates;

/// One photograph in the batch.
///
/// The source path is an opaque handle used only for logging and export
/// naming; the record never touches the file itself.
#[derive(Debug, Clone)]
pub struct PhotoRecord {
    source: PathBuf,
    raw_capture_time: Option<DateTime<Local>>,
    calibrated_time: Option<DateTime<Local>>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    matched: bool,
    thumbnail_target: Option<PathBuf>,
}

impl PhotoRecord {
    /// A record whose capture time could not be read.
    ///
    /// Such records still travel through the pipeline so the final counts
    /// account for every enumerated photo; they are deterministically
    /// partitioned as failed.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        PhotoRecord {
            source: source.into(),
            raw_capture_time: None,
            calibrated_time: None,
            latitude: None,
            longitude: None,
            matched: false,
            thumbnail_target: None,
        }
    }

    /// A record with its capture time loaded and the clock offset applied.
    pub fn calibrated(
        source: impl Into<PathBuf>,
        raw_capture_time: DateTime<Local>,
        calibration: &Calibration,
    ) -> Self {
        PhotoRecord {
            source: source.into(),
            raw_capture_time: Some(raw_capture_time),
            calibrated_time: Some(calibration.calibrate(raw_capture_time)),
            latitude: None,
            longitude: None,
            matched: false,
            thumbnail_target: None,
        }
    }

    /// Request a thumbnail render to `target` once this record matches.
    pub fn request_thumbnail(&mut self, target: impl Into<PathBuf>) {
        self.thumbnail_target = Some(target.into());
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name including extension, for image references in exports.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension, the export identifier.
    pub fn base_name(&self) -> String {
        self.source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn raw_capture_time(&self) -> Option<DateTime<Local>> {
        self.raw_capture_time
    }

    /// Capture time with the run's clock offset applied; all matching uses
    /// this.
    pub fn calibrated_time(&self) -> Option<DateTime<Local>> {
        self.calibrated_time
    }

    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    pub fn matched(&self) -> bool {
        self.matched
    }

    pub fn thumbnail_target(&self) -> Option<&Path> {
        self.thumbnail_target.as_deref()
    }

    /// Transition this record to Matched with its interpolated position.
    ///
    /// Called at most once, by the single worker owning the record.
    pub(crate) fn resolve(&mut self, coordinates: Coordinates) {
        debug_assert!(!self.matched, "photo record resolved twice");
        self.latitude = Some(coordinates.latitude);
        self.longitude = Some(coordinates.longitude);
        self.matched = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn calibration() -> Calibration {
        let reference = Local.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        Calibration::from_reference(reference, "2021-06-01 12:00:10").unwrap()
    }

    #[test]
    fn calibrated_record_carries_shifted_time() {
        let raw = Local.with_ymd_and_hms(2021, 6, 1, 12, 0, 3).unwrap();
        let record = PhotoRecord::calibrated("photos/IMG_0001.jpg", raw, &calibration());

        assert_eq!(record.raw_capture_time(), Some(raw));
        assert_eq!(
            record.calibrated_time(),
            Some(Local.with_ymd_and_hms(2021, 6, 1, 12, 0, 13).unwrap())
        );
        assert!(!record.matched());
        assert_eq!(record.latitude(), None);
    }

    #[test]
    fn unreadable_record_has_no_times() {
        let record = PhotoRecord::new("photos/broken.jpg");
        assert_eq!(record.raw_capture_time(), None);
        assert_eq!(record.calibrated_time(), None);
    }

    #[test]
    fn resolve_sets_position_and_matched() {
        let raw = Local.with_ymd_and_hms(2021, 6, 1, 12, 0, 3).unwrap();
        let mut record = PhotoRecord::calibrated("IMG_0001.jpg", raw, &calibration());

        record.resolve(Coordinates {
            latitude: -25.5,
            longitude: 120.25,
        });

        assert!(record.matched());
        assert_eq!(record.latitude(), Some(-25.5));
        assert_eq!(record.longitude(), Some(120.25));
    }

    #[test]
    fn export_names_derive_from_source() {
        let record = PhotoRecord::new("photos/trip/IMG_0042.JPG");
        assert_eq!(record.file_name(), "IMG_0042.JPG");
        assert_eq!(record.base_name(), "IMG_0042");
    }

    #[test]
    fn thumbnail_request_is_recorded() {
        let mut record = PhotoRecord::new("IMG_0001.jpg");
        assert_eq!(record.thumbnail_target(), None);

        record.request_thumbnail("out/IMG_0001.jpg");
        assert_eq!(
            record.thumbnail_target(),
            Some(Path::new("out/IMG_0001.jpg"))
        );
    }
}
