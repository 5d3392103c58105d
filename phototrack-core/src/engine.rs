//! Geotagging run orchestration
//!
//! The engine owns the full run against capability traits only: validate
//! the configuration, build the track store, calibrate the camera clock
//! from the reference photo (a hard prerequisite), load every enumerated
//! photo's capture time with per-record isolation, drain the matching
//! pipeline, and hand the matched subset to the optional output sinks.
//!
//! # Error taxonomy
//!
//! - **Fatal / pre-run**: configuration conflicts, an unparseable track,
//!   calibration failure. These abort before any photo is partitioned.
//! - **Per-record**: unreadable metadata, thumbnail faults, search faults.
//!   Isolated to that record, which lands in the failed partition; the run
//!   continues.
//! - **Not-found**: a photo outside every tolerant bracket. A normal
//!   failed outcome, not an error.
//!
//! A run therefore either aborts cleanly before processing or completes
//! with a summary accounting for every input record.

use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::calibration::Calibration;
use crate::error::{CalibrationError, ConfigError, GeotagError};
use crate::export;
use crate::io::{FeatureSink, MarkupSink, MetadataReader, ThumbnailRenderer, TrackParser};
use crate::photo::PhotoRecord;
use crate::pipeline::{MatchingPipeline, PipelineConfig, Summary};
use crate::progress::ProgressSink;
use crate::track::TrackStore;

const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Caller-owned configuration for one run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Project name used to title output documents
    pub project_name: String,
    /// Recorded track file, handed to the track collaborator
    pub track_file: PathBuf,
    /// Directory the photos were enumerated from
    pub photos_dir: PathBuf,
    /// Directory all artifacts (and thumbnails) are written to
    pub output_dir: PathBuf,
    /// Whether to request thumbnail renders for matched photos
    pub thumbnails: bool,
    /// Matching tolerance in milliseconds, non-negative
    pub tolerance_millis: i64,
    /// Worker thread count, greater than zero
    pub workers: usize,
    /// Reference photo of known real-world time
    pub reference_photo: PathBuf,
    /// True time of the reference photo, `yyyy-MM-dd HH:mm:ss` local
    pub reference_time: String,
    /// Point-feature artifact name; `None` skips that writer
    pub feature_file: Option<String>,
    /// Scene-markup artifact name; `None` skips that writer
    pub markup_file: Option<String>,
}

impl EngineConfig {
    /// Pre-run validation. Everything here is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.tolerance_millis < 0 {
            return Err(ConfigError::NegativeTolerance(self.tolerance_millis));
        }
        if self.photos_dir == self.output_dir {
            return Err(ConfigError::OutputIsInput {
                dir: self.output_dir.clone(),
            });
        }
        if self.output_dir.is_file() {
            return Err(ConfigError::OutputIsFile {
                path: self.output_dir.clone(),
            });
        }
        Ok(())
    }
}

/// Everything a completed run reports back to the caller.
#[derive(Debug)]
pub struct RunReport {
    /// The clock offset that was applied to every photo
    pub offset_millis: i64,
    pub matched: Vec<PhotoRecord>,
    pub failed: Vec<PhotoRecord>,
    pub summary: Summary,
}

/// The geotagging engine, bound to its collaborators for one run.
pub struct GeotagEngine<'a> {
    config: EngineConfig,
    track_parser: &'a dyn TrackParser,
    metadata: &'a dyn MetadataReader,
    thumbnails: &'a dyn ThumbnailRenderer,
    progress: &'a dyn ProgressSink,
    feature_sink: Option<&'a dyn FeatureSink>,
    markup_sink: Option<&'a dyn MarkupSink>,
}

impl<'a> GeotagEngine<'a> {
    pub fn new(
        config: EngineConfig,
        track_parser: &'a dyn TrackParser,
        metadata: &'a dyn MetadataReader,
        thumbnails: &'a dyn ThumbnailRenderer,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        GeotagEngine {
            config,
            track_parser,
            metadata,
            thumbnails,
            progress,
            feature_sink: None,
            markup_sink: None,
        }
    }

    pub fn with_feature_sink(mut self, sink: &'a dyn FeatureSink) -> Self {
        self.feature_sink = Some(sink);
        self
    }

    pub fn with_markup_sink(mut self, sink: &'a dyn MarkupSink) -> Self {
        self.markup_sink = Some(sink);
        self
    }

    /// Run the full batch over the enumerated photo files.
    pub fn run(&self, photo_files: &[PathBuf]) -> Result<RunReport, GeotagError> {
        self.config.validate()?;

        fs::create_dir_all(&self.config.output_dir).map_err(|source| {
            ConfigError::CreateOutputDir {
                path: self.config.output_dir.clone(),
                source,
            }
        })?;

        let store = self.load_track()?;
        let calibration = self.calibrate()?;
        let records = self.load_records(photo_files, &calibration);

        let pipeline_config = PipelineConfig {
            workers: self.config.workers,
            tolerance_millis: self.config.tolerance_millis,
        };
        let pipeline =
            MatchingPipeline::new(&store, pipeline_config, self.thumbnails, self.progress);
        let report = pipeline.run(records);

        for photo in &report.failed {
            warn!(
                "failed to position photo: [{}] capture time: [{}] calibrated time: [{}]",
                photo.source().display(),
                format_time(photo.raw_capture_time()),
                format_time(photo.calibrated_time()),
            );
        }

        self.export_features(&report.matched)?;
        self.export_markup(&report.matched)?;

        Ok(RunReport {
            offset_millis: calibration.offset_millis(),
            matched: report.matched,
            failed: report.failed,
            summary: report.summary,
        })
    }

    fn load_track(&self) -> Result<TrackStore, GeotagError> {
        let positions =
            self.track_parser
                .parse(&self.config.track_file)
                .map_err(|source| GeotagError::Track {
                    path: self.config.track_file.clone(),
                    source,
                })?;

        let store = TrackStore::from_positions(positions);
        info!("loaded [{}] track positions", store.len());

        if let Some((first, last)) = store.local_time_range() {
            info!(
                "minimum track local time: [{}] maximum track local time: [{}]",
                first.format(LOG_TIME_FORMAT),
                last.format(LOG_TIME_FORMAT)
            );
        }

        Ok(store)
    }

    fn calibrate(&self) -> Result<Calibration, GeotagError> {
        let reference_time = self
            .metadata
            .capture_time(&self.config.reference_photo)
            .map_err(|e| CalibrationError::Reference {
                path: self.config.reference_photo.clone(),
                reason: e.to_string(),
            })?;

        let calibration = Calibration::from_reference(reference_time, &self.config.reference_time)?;
        info!(
            "found time difference: [{}] milliseconds",
            calibration.offset_millis()
        );

        Ok(calibration)
    }

    /// Load capture times for the enumerated photos.
    ///
    /// A photo whose metadata cannot be read still produces a record: it is
    /// logged here and deterministically ends up in the failed partition,
    /// so one bad file never aborts the batch.
    fn load_records(&self, photo_files: &[PathBuf], calibration: &Calibration) -> Vec<PhotoRecord> {
        let mut records = Vec::with_capacity(photo_files.len());

        for file in photo_files {
            let mut record = match self.metadata.capture_time(file) {
                Ok(raw) => PhotoRecord::calibrated(file.clone(), raw, calibration),
                Err(e) => {
                    warn!(
                        "failed to read capture time from: [{}] {}",
                        file.display(),
                        e
                    );
                    PhotoRecord::new(file.clone())
                }
            };

            if self.config.thumbnails {
                record.request_thumbnail(self.config.output_dir.join(record.file_name()));
            }

            records.push(record);
        }

        info!("found: [{}] matching input files to process", records.len());
        records
    }

    fn export_features(&self, matched: &[PhotoRecord]) -> Result<(), GeotagError> {
        let Some(name) = &self.config.feature_file else {
            return Ok(());
        };
        let Some(sink) = self.feature_sink else {
            debug!("no feature sink wired, skipping [{}]", name);
            return Ok(());
        };

        let collection = export::feature_collection(matched, self.config.thumbnails);
        sink.write_features(&collection)
            .map_err(|source| GeotagError::Export {
                artifact: name.clone(),
                source,
            })?;

        info!(
            "wrote [{}] point features to: [{}]",
            collection.features.len(),
            name
        );
        Ok(())
    }

    fn export_markup(&self, matched: &[PhotoRecord]) -> Result<(), GeotagError> {
        let Some(name) = &self.config.markup_file else {
            return Ok(());
        };
        let Some(sink) = self.markup_sink else {
            debug!("no markup sink wired, skipping [{}]", name);
            return Ok(());
        };

        let document = export::markup_document(&self.config.project_name, matched);
        sink.write_markup(&document)
            .map_err(|source| GeotagError::Export {
                artifact: name.clone(),
                source,
            })?;

        info!("saved markup file to: [{}]", name);
        Ok(())
    }
}

fn format_time(time: Option<chrono::DateTime<chrono::Local>>) -> String {
    match time {
        Some(t) => t.format(LOG_TIME_FORMAT).to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollaboratorError;
    use crate::position::TrackPosition;
    use crate::progress::NoopProgress;
    use chrono::{DateTime, Local, Utc};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    struct FakeTrack(Vec<TrackPosition>);

    impl TrackParser for FakeTrack {
        fn parse(&self, _source: &Path) -> Result<Vec<TrackPosition>, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenTrack;

    impl TrackParser for BrokenTrack {
        fn parse(&self, _source: &Path) -> Result<Vec<TrackPosition>, CollaboratorError> {
            Err(CollaboratorError::new("malformed track"))
        }
    }

    struct FakeMetadata(HashMap<PathBuf, DateTime<Local>>);

    impl MetadataReader for FakeMetadata {
        fn capture_time(&self, photo: &Path) -> Result<DateTime<Local>, CollaboratorError> {
            self.0
                .get(photo)
                .copied()
                .ok_or_else(|| CollaboratorError::new("no capture time in metadata"))
        }
    }

    struct NoThumbnails;

    impl ThumbnailRenderer for NoThumbnails {
        fn render(&self, _source: &Path, _target: &Path) -> Result<(), CollaboratorError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CollectingFeatureSink(Mutex<Option<export::FeatureCollection>>);

    impl FeatureSink for CollectingFeatureSink {
        fn write_features(
            &self,
            collection: &export::FeatureCollection,
        ) -> Result<(), CollaboratorError> {
            *self.0.lock().unwrap() = Some(collection.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CollectingMarkupSink(Mutex<Option<String>>);

    impl MarkupSink for CollectingMarkupSink {
        fn write_markup(&self, document: &str) -> Result<(), CollaboratorError> {
            *self.0.lock().unwrap() = Some(document.to_string());
            Ok(())
        }
    }

    fn local(seconds: i64) -> DateTime<Local> {
        DateTime::<Utc>::from_timestamp(seconds, 0)
            .unwrap()
            .with_timezone(&Local)
    }

    fn track() -> Vec<TrackPosition> {
        vec![
            TrackPosition::new(0.0, 0.0, DateTime::<Utc>::from_timestamp(0, 0).unwrap()),
            TrackPosition::new(1.0, 1.0, DateTime::<Utc>::from_timestamp(10, 0).unwrap()),
        ]
    }

    fn config(output_dir: &Path) -> EngineConfig {
        EngineConfig {
            project_name: "Trip".to_string(),
            track_file: PathBuf::from("track.gpx"),
            photos_dir: PathBuf::from("photos"),
            output_dir: output_dir.to_path_buf(),
            thumbnails: false,
            tolerance_millis: 6000,
            workers: 2,
            reference_photo: PathBuf::from("photos/reference.jpg"),
            reference_time: local(0).format("%Y-%m-%d %H:%M:%S").to_string(),
            feature_file: Some("trip.geojson".to_string()),
            markup_file: Some("trip.kml".to_string()),
        }
    }

    fn metadata() -> FakeMetadata {
        let mut times = HashMap::new();
        // Reference photo agrees with the true-time string: offset zero
        times.insert(PathBuf::from("photos/reference.jpg"), local(0));
        times.insert(PathBuf::from("photos/inside.jpg"), local(5));
        times.insert(PathBuf::from("photos/outside.jpg"), local(500));
        FakeMetadata(times)
    }

    #[test]
    fn full_run_partitions_and_exports() {
        let out = tempfile::tempdir().unwrap();
        let track = FakeTrack(track());
        let metadata = metadata();
        let features = CollectingFeatureSink::default();
        let markup = CollectingMarkupSink::default();

        let engine = GeotagEngine::new(
            config(out.path()),
            &track,
            &metadata,
            &NoThumbnails,
            &NoopProgress,
        )
        .with_feature_sink(&features)
        .with_markup_sink(&markup);

        let report = engine
            .run(&[
                PathBuf::from("photos/inside.jpg"),
                PathBuf::from("photos/outside.jpg"),
                PathBuf::from("photos/unreadable.jpg"),
            ])
            .unwrap();

        assert_eq!(report.offset_millis, 0);
        assert_eq!(report.summary.matched_count, 1);
        assert_eq!(report.summary.failed_count, 2);

        let collection = features.0.lock().unwrap().take().unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.features[0].name, "inside");
        assert!((collection.features[0].latitude - 0.5).abs() < 1e-12);

        let document = markup.0.lock().unwrap().take().unwrap();
        assert_eq!(document.matches("<Placemark>").count(), 1);
    }

    #[test]
    fn unreadable_metadata_fails_only_that_record() {
        let out = tempfile::tempdir().unwrap();
        let track = FakeTrack(track());
        let metadata = metadata();

        let engine = GeotagEngine::new(
            config(out.path()),
            &track,
            &metadata,
            &NoThumbnails,
            &NoopProgress,
        );

        let report = engine
            .run(&[
                PathBuf::from("photos/unreadable.jpg"),
                PathBuf::from("photos/inside.jpg"),
            ])
            .unwrap();

        assert_eq!(report.summary.matched_count, 1);
        assert_eq!(report.summary.failed_count, 1);
        assert_eq!(report.failed[0].base_name(), "unreadable");
    }

    #[test]
    fn empty_photo_set_completes_with_empty_outputs() {
        let out = tempfile::tempdir().unwrap();
        let track = FakeTrack(track());
        let metadata = metadata();
        let features = CollectingFeatureSink::default();
        let markup = CollectingMarkupSink::default();

        let engine = GeotagEngine::new(
            config(out.path()),
            &track,
            &metadata,
            &NoThumbnails,
            &NoopProgress,
        )
        .with_feature_sink(&features)
        .with_markup_sink(&markup);

        let report = engine.run(&[]).unwrap();

        assert_eq!(report.summary.matched_count, 0);
        assert_eq!(report.summary.failed_count, 0);
        assert!(features.0.lock().unwrap().as_ref().unwrap().features.is_empty());
        assert!(!markup.0.lock().unwrap().as_ref().unwrap().contains("<Placemark>"));
    }

    #[test]
    fn output_dir_equal_to_photos_dir_is_fatal() {
        let mut config = config(Path::new("photos"));
        config.photos_dir = PathBuf::from("photos");

        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutputIsInput { .. })
        ));
    }

    #[test]
    fn zero_workers_is_fatal() {
        let out = tempfile::tempdir().unwrap();
        let mut config = config(out.path());
        config.workers = 0;

        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));
    }

    #[test]
    fn calibration_failure_aborts_before_processing() {
        let out = tempfile::tempdir().unwrap();
        let track = FakeTrack(track());
        // Reference photo missing from the metadata fake
        let metadata = FakeMetadata(HashMap::new());
        let features = CollectingFeatureSink::default();

        let engine = GeotagEngine::new(
            config(out.path()),
            &track,
            &metadata,
            &NoThumbnails,
            &NoopProgress,
        )
        .with_feature_sink(&features);

        let result = engine.run(&[PathBuf::from("photos/inside.jpg")]);

        assert!(matches!(result, Err(GeotagError::Calibration(_))));
        assert!(features.0.lock().unwrap().is_none());
    }

    #[test]
    fn bad_true_time_string_aborts() {
        let out = tempfile::tempdir().unwrap();
        let track = FakeTrack(track());
        let metadata = metadata();
        let mut config = config(out.path());
        config.reference_time = "tomorrow-ish".to_string();

        let engine =
            GeotagEngine::new(config, &track, &metadata, &NoThumbnails, &NoopProgress);

        assert!(matches!(
            engine.run(&[]),
            Err(GeotagError::Calibration(CalibrationError::InvalidFormat { .. }))
        ));
    }

    #[test]
    fn unparseable_track_is_fatal_with_path_context() {
        let out = tempfile::tempdir().unwrap();
        let metadata = metadata();

        let engine = GeotagEngine::new(
            config(out.path()),
            &BrokenTrack,
            &metadata,
            &NoThumbnails,
            &NoopProgress,
        );

        match engine.run(&[]) {
            Err(GeotagError::Track { path, .. }) => {
                assert_eq!(path, PathBuf::from("track.gpx"));
            }
            other => panic!("expected track error, got {other:?}"),
        }
    }

    #[test]
    fn thumbnail_requests_target_the_output_directory() {
        let out = tempfile::tempdir().unwrap();
        let track = FakeTrack(track());
        let metadata = metadata();
        let mut config = config(out.path());
        config.thumbnails = true;

        let engine =
            GeotagEngine::new(config, &track, &metadata, &NoThumbnails, &NoopProgress);

        let report = engine.run(&[PathBuf::from("photos/inside.jpg")]).unwrap();

        assert_eq!(
            report.matched[0].thumbnail_target(),
            Some(out.path().join("inside.jpg").as_path())
        );
    }

    #[test]
    fn missing_artifact_names_skip_the_writers() {
        let out = tempfile::tempdir().unwrap();
        let track = FakeTrack(track());
        let metadata = metadata();
        let features = CollectingFeatureSink::default();
        let markup = CollectingMarkupSink::default();
        let mut config = config(out.path());
        config.feature_file = None;
        config.markup_file = None;

        let engine = GeotagEngine::new(config, &track, &metadata, &NoThumbnails, &NoopProgress)
            .with_feature_sink(&features)
            .with_markup_sink(&markup);

        engine.run(&[PathBuf::from("photos/inside.jpg")]).unwrap();

        assert!(features.0.lock().unwrap().is_none());
        assert!(markup.0.lock().unwrap().is_none());
    }
}
