//! Output artifact sinks
//!
//! The engine decides which records to emit and with what attributes; these
//! sinks own the bytes. Point features land in a GeoJSON FeatureCollection,
//! the scene markup is written verbatim.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::info;
use phototrack_core::{CollaboratorError, FeatureCollection, FeatureSink, MarkupSink};
use serde_json::json;

/// Writes the matched photos as a GeoJSON FeatureCollection.
///
/// Geometry is a Point at `[longitude, latitude]` (WGS84, the GeoJSON
/// default CRS); the feature attributes keep the original survey schema
/// names.
#[derive(Debug, Clone)]
pub struct GeoJsonFeatureSink {
    path: PathBuf,
}

impl GeoJsonFeatureSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeatureSink for GeoJsonFeatureSink {
    fn write_features(&self, collection: &FeatureCollection) -> Result<(), CollaboratorError> {
        let features: Vec<_> = collection
            .features
            .iter()
            .map(|feature| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [feature.longitude, feature.latitude],
                    },
                    "properties": feature,
                })
            })
            .collect();

        let document = json!({
            "type": "FeatureCollection",
            "name": collection.name,
            "features": features,
        });

        let file = File::create(&self.path).map_err(|e| {
            CollaboratorError::new(format!("failed to create {}: {e}", self.path.display()))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &document).map_err(|e| {
            CollaboratorError::new(format!("failed to write {}: {e}", self.path.display()))
        })?;
        writer.flush().map_err(|e| {
            CollaboratorError::new(format!("failed to flush {}: {e}", self.path.display()))
        })?;

        info!("feature file written to: [{}]", self.path.display());
        Ok(())
    }
}

/// Writes the rendered markup document to a file.
#[derive(Debug, Clone)]
pub struct FileMarkupSink {
    path: PathBuf,
}

impl FileMarkupSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MarkupSink for FileMarkupSink {
    fn write_markup(&self, document: &str) -> Result<(), CollaboratorError> {
        std::fs::write(&self.path, document).map_err(|e| {
            CollaboratorError::new(format!("failed to write {}: {e}", self.path.display()))
        })?;

        info!("saved markup file to: [{}]", self.path.display());
        Ok(())
    }
}
