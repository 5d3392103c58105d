//! GPX track collaborator

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use phototrack_core::{CollaboratorError, TrackParser, TrackPosition};

/// Parses a GPX file into track positions.
///
/// Tracks and segments are concatenated in document order; points without a
/// timestamp are dropped since they can never be matched against. The store
/// sorts the result, so segment ordering quirks in the file are harmless.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpxTrackParser;

impl TrackParser for GpxTrackParser {
    fn parse(&self, source: &Path) -> Result<Vec<TrackPosition>, CollaboratorError> {
        let file = File::open(source).map_err(|e| {
            CollaboratorError::new(format!("failed to open {}: {e}", source.display()))
        })?;

        let gpx = gpx::read(BufReader::new(file)).map_err(|e| {
            CollaboratorError::new(format!("failed to parse GPX {}: {e}", source.display()))
        })?;

        let mut positions = Vec::new();
        let mut skipped = 0usize;

        for track in gpx.tracks {
            for segment in track.segments {
                for waypoint in segment.points {
                    let Some(time) = waypoint.time else {
                        skipped += 1;
                        continue;
                    };
                    let iso = time.format().map_err(|e| {
                        CollaboratorError::new(format!("bad waypoint time: {e}"))
                    })?;
                    let utc = DateTime::parse_from_rfc3339(&iso)
                        .map_err(|e| {
                            CollaboratorError::new(format!("bad waypoint time {iso}: {e}"))
                        })?
                        .with_timezone(&Utc);

                    let point = waypoint.point();
                    positions.push(TrackPosition::new(point.y(), point.x(), utc));
                }
            }
        }

        if skipped > 0 {
            debug!("dropped [{skipped}] waypoints without timestamps");
        }
        info!(
            "successfully parsed GPX file: [{}] with [{}] positions",
            source.display(),
            positions.len()
        );

        Ok(positions)
    }
}
