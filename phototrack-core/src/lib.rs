//! # PhotoTrack Core
//!
//! Track matching and geotagging engine for batches of timestamped
//! photographs.
//!
//! This crate contains the calibration, matching and concurrency logic with
//! **zero file-format dependencies**: GPX parsing, EXIF extraction,
//! thumbnail rendering and artifact writing are abstracted behind the
//! capability traits in [`io`], so the same engine runs against real
//! collaborators in the command-line front end and against fakes in tests.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  phototrack-core (no file-format or I/O-library deps)       │
//! │  ├── calibration/  (one-shot camera clock offset)           │
//! │  ├── track/        (sorted store + interpolation search)    │
//! │  ├── photo/        (record entity and lifecycle)            │
//! │  ├── pipeline/     (worker pool, partition, progress)       │
//! │  ├── export/       (feature + markup assembly)              │
//! │  ├── engine/       (run orchestration)                      │
//! │  └── io            (collaborator capability traits)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                 ┌────────────┴────────────┐
//!                 │  phototrack-cli         │
//!                 │  (gpx, exif, image,     │
//!                 │   GeoJSON/KML writers)  │
//!                 └─────────────────────────┘
//! ```
//!
//! ## How a run works
//!
//! 1. The camera clock is calibrated once: the user supplies one reference
//!    photo and the true time it was taken, and the millisecond delta
//!    between the two becomes the run's [`Calibration`].
//! 2. Track positions are loaded into a [`TrackStore`], sorted ascending by
//!    UTC time, then shared read-only with every worker.
//! 3. A fixed pool of workers drains the photo backlog, querying the store
//!    with each photo's calibrated time. A photo matches when a pair of
//!    consecutive fixes brackets its time with both edges inside the
//!    tolerance; its position is linearly interpolated between them.
//! 4. Matched records are handed to the optional point-feature and
//!    scene-markup exporters; the summary accounts for every input record.
//!
//! ## Example: locating a photo on a track
//!
//! ```rust
//! use chrono::{DateTime, Local, Utc};
//! use phototrack_core::{Calibration, TrackPosition, TrackStore};
//!
//! let store = TrackStore::from_positions(vec![
//!     TrackPosition::new(0.0, 0.0, DateTime::<Utc>::from_timestamp(0, 0).unwrap()),
//!     TrackPosition::new(1.0, 1.0, DateTime::<Utc>::from_timestamp(10, 0).unwrap()),
//! ]);
//!
//! let query = DateTime::<Utc>::from_timestamp(5, 0)
//!     .unwrap()
//!     .with_timezone(&Local);
//! let found = store.locate(query, 6000).unwrap().unwrap();
//! assert!((found.latitude - 0.5).abs() < 1e-12);
//! ```

pub mod calibration;
pub mod engine;
pub mod error;
pub mod export;
pub mod io;
pub mod photo;
pub mod pipeline;
pub mod position;
pub mod progress;
pub mod track;

pub use calibration::{Calibration, TRUE_TIME_FORMAT};
pub use engine::{EngineConfig, GeotagEngine, RunReport};
pub use error::{CalibrationError, ConfigError, GeotagError, TrackError};
pub use export::{FeatureCollection, PointFeature};
pub use io::{
    CollaboratorError, FeatureSink, MarkupSink, MetadataReader, ThumbnailRenderer, TrackParser,
};
pub use photo::PhotoRecord;
pub use pipeline::{
    default_workers, MatchReport, MatchingPipeline, PipelineConfig, Summary,
    DEFAULT_TOLERANCE_MILLIS,
};
pub use position::{Coordinates, TrackPosition};
pub use progress::{NoopProgress, ProgressSink};
pub use track::TrackStore;
