//! Collaborator abstraction for format-independent geotagging.
//!
//! This module defines the capability traits the engine consumes, keeping
//! all file-format machinery (GPX parsing, EXIF extraction, image resizing,
//! vector-file and markup writing) out of the core. The front end supplies
//! real implementations; tests supply fakes.
//!
//! # Design
//!
//! Each trait covers exactly one collaborator from the engine's point of
//! view, and the error type crossing the boundary is deliberately minimal:
//! the engine only ever logs a collaborator failure or wraps it with its own
//! context, so a message is all it needs to carry.

use core::fmt;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::export::FeatureCollection;
use crate::position::TrackPosition;

// =============================================================================
// Error Type
// =============================================================================

/// Error reported by a collaborator across the capability boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorError {
    /// Human-readable failure description
    pub message: String,
}

impl CollaboratorError {
    /// Create a new collaborator error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CollaboratorError {}

impl From<std::io::Error> for CollaboratorError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

// =============================================================================
// Capability Traits
// =============================================================================

/// Produces track positions from a recorded track file.
///
/// The positions may arrive in any order; the store sorts them.
pub trait TrackParser {
    fn parse(&self, source: &Path) -> Result<Vec<TrackPosition>, CollaboratorError>;
}

/// Extracts a photo's embedded capture timestamp.
///
/// The timestamp is a camera wall-clock reading and is interpreted in the
/// process-local time zone. "No timestamp present" is a failure, not a
/// sentinel value.
pub trait MetadataReader: Send + Sync {
    fn capture_time(&self, photo: &Path) -> Result<DateTime<Local>, CollaboratorError>;
}

/// Renders a reduced-size copy of a photo to a target path.
///
/// Best-effort: the pipeline logs a failure here and keeps the match.
pub trait ThumbnailRenderer: Send + Sync {
    fn render(&self, source: &Path, target: &Path) -> Result<(), CollaboratorError>;
}

/// Consumes the assembled point-feature collection for the matched photos.
///
/// How the features are laid out on disk (GeoJSON, shapefile, ...) is the
/// sink's business; the engine only decides which records appear and with
/// what attributes.
pub trait FeatureSink {
    fn write_features(&self, collection: &FeatureCollection) -> Result<(), CollaboratorError>;
}

/// Consumes the rendered scene-markup document for the matched photos.
pub trait MarkupSink {
    fn write_markup(&self, document: &str) -> Result<(), CollaboratorError>;
}
