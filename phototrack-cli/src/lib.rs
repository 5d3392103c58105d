//! # PhotoTrack CLI
//!
//! Command-line front end for the [`phototrack_core`] geotagging engine.
//!
//! This crate owns everything the engine keeps behind capability traits:
//! GPX track parsing, EXIF capture-time extraction, thumbnail rendering,
//! and the GeoJSON / KML artifact writers, plus argument parsing and
//! logging setup.
//!
//! ## Example
//!
//! ```text
//! phototrack \
//!     --project-name "Reef Survey" \
//!     --gpx track.gpx \
//!     --photos ./photos --recursive \
//!     --time-photo ./photos/gps_screen.jpg \
//!     --photo-time "2021-06-01 12:00:10" \
//!     --output-dir ./out --thumbnails \
//!     --geojson-file survey.geojson --kml-file survey.kml
//! ```

pub mod metadata;
pub mod photos;
pub mod progress;
pub mod sinks;
pub mod thumbnail;
pub mod track_gpx;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::debug;
use phototrack_core::{default_workers, EngineConfig, GeotagEngine, Summary};

use crate::metadata::ExifMetadataReader;
use crate::progress::LogProgress;
use crate::sinks::{FileMarkupSink, GeoJsonFeatureSink};
use crate::thumbnail::ImageThumbnailRenderer;
use crate::track_gpx::GpxTrackParser;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Clone, Debug)]
#[command(name = "phototrack", version, about = "Geotag photographs against a recorded GPS track")]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Project name used to title output files
    #[arg(long)]
    pub project_name: String,

    /// Input GPX track file
    #[arg(long)]
    pub gpx: PathBuf,

    /// Folder containing photos to process
    #[arg(long)]
    pub photos: PathBuf,

    /// Search recursively for photos
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Write thumbnails of matched photos to the output directory
    #[arg(long, default_value_t = false)]
    pub thumbnails: bool,

    /// Photo with known GPS timestamp, used to calibrate the camera clock
    #[arg(long)]
    pub time_photo: PathBuf,

    /// True time of the timestamp photo, as `yyyy-MM-dd HH:mm:ss` local time
    #[arg(long)]
    pub photo_time: String,

    /// Tolerance in milliseconds for GPS fixes to be considered
    #[arg(long, default_value_t = phototrack_core::DEFAULT_TOLERANCE_MILLIS)]
    pub tolerance: i64,

    /// Number of CPU cores to use for photo matching [default: all]
    #[arg(long)]
    pub cores: Option<usize>,

    /// Output directory to write results to
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Name of the GeoJSON point-feature file to write in the output directory
    #[arg(long)]
    pub geojson_file: Option<String>,

    /// Name of the KML file to write in the output directory
    #[arg(long)]
    pub kml_file: Option<String>,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            project_name: self.project_name.clone(),
            track_file: self.gpx.clone(),
            photos_dir: self.photos.clone(),
            output_dir: self.output_dir.clone(),
            thumbnails: self.thumbnails,
            tolerance_millis: self.tolerance,
            workers: self.cores.unwrap_or_else(default_workers),
            reference_photo: self.time_photo.clone(),
            reference_time: self.photo_time.clone(),
            feature_file: self.geojson_file.clone(),
            markup_file: self.kml_file.clone(),
        }
    }
}

/// Run one full batch for the parsed arguments.
pub fn run(cli: &Cli) -> anyhow::Result<Summary> {
    let config = cli.engine_config();
    debug!("engine configuration: {config:?}");

    let photo_files = photos::enumerate_photos(&cli.photos, cli.recursive)
        .with_context(|| format!("failed to list photos under {}", cli.photos.display()))?;

    let track_parser = GpxTrackParser;
    let metadata = ExifMetadataReader;
    let thumbnails = ImageThumbnailRenderer::default();
    let progress = LogProgress::default();

    let feature_sink = cli
        .geojson_file
        .as_ref()
        .map(|name| GeoJsonFeatureSink::new(cli.output_dir.join(name)));
    let markup_sink = cli
        .kml_file
        .as_ref()
        .map(|name| FileMarkupSink::new(cli.output_dir.join(name)));

    let mut engine = GeotagEngine::new(config, &track_parser, &metadata, &thumbnails, &progress);
    if let Some(sink) = &feature_sink {
        engine = engine.with_feature_sink(sink);
    }
    if let Some(sink) = &markup_sink {
        engine = engine.with_markup_sink(sink);
    }

    let report = engine.run(&photo_files)?;
    Ok(report.summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    const REQUIRED: &[&str] = &[
        "phototrack",
        "--project-name",
        "Trip",
        "--gpx",
        "track.gpx",
        "--photos",
        "photos",
        "--time-photo",
        "photos/ref.jpg",
        "--photo-time",
        "2021-06-01 12:00:10",
        "--output-dir",
        "out",
    ];

    #[test]
    fn minimal_arguments_parse_with_defaults() {
        let cli = parse(REQUIRED);

        assert_eq!(cli.tolerance, 2000);
        assert_eq!(cli.cores, None);
        assert!(!cli.recursive);
        assert!(!cli.thumbnails);
        assert_eq!(cli.geojson_file, None);
        assert_eq!(cli.kml_file, None);
    }

    #[test]
    fn engine_config_mirrors_arguments() {
        let mut args = REQUIRED.to_vec();
        args.extend_from_slice(&[
            "--tolerance",
            "5000",
            "--cores",
            "3",
            "--thumbnails",
            "--kml-file",
            "trip.kml",
        ]);
        let cli = parse(&args);

        let config = cli.engine_config();
        assert_eq!(config.tolerance_millis, 5000);
        assert_eq!(config.workers, 3);
        assert!(config.thumbnails);
        assert_eq!(config.markup_file.as_deref(), Some("trip.kml"));
        assert_eq!(config.feature_file, None);
        assert_eq!(config.reference_time, "2021-06-01 12:00:10");
    }

    #[test]
    fn missing_required_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["phototrack", "--gpx", "track.gpx"]).is_err());
    }
}
