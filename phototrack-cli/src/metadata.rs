//! EXIF capture-time collaborator

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};
use phototrack_core::{CollaboratorError, MetadataReader};

/// EXIF stores wall-clock readings like `2021:06:01 12:00:03`.
const EXIF_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Reads the capture time from a photo's IFD0 `DateTime` tag.
///
/// The tag is a camera wall-clock reading with no zone information; it is
/// interpreted in the process-local time zone, which the clock calibration
/// then corrects for.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataReader;

impl MetadataReader for ExifMetadataReader {
    fn capture_time(&self, photo: &Path) -> Result<DateTime<Local>, CollaboratorError> {
        let file = File::open(photo).map_err(|e| {
            CollaboratorError::new(format!("failed to open {}: {e}", photo.display()))
        })?;

        let exif = exif::Reader::new()
            .read_from_container(&mut BufReader::new(file))
            .map_err(|e| {
                CollaboratorError::new(format!(
                    "failed to extract image meta data from {}: {e}",
                    photo.display()
                ))
            })?;

        let field = exif
            .get_field(exif::Tag::DateTime, exif::In::PRIMARY)
            .ok_or_else(|| {
                CollaboratorError::new(format!(
                    "input image had no capture time in meta data: {}",
                    photo.display()
                ))
            })?;

        let text = match &field.value {
            exif::Value::Ascii(strings) if !strings.is_empty() => {
                String::from_utf8_lossy(&strings[0]).trim().to_string()
            }
            _ => {
                return Err(CollaboratorError::new(format!(
                    "capture time tag is not text: {}",
                    photo.display()
                )))
            }
        };

        let wall_clock = NaiveDateTime::parse_from_str(&text, EXIF_TIME_FORMAT).map_err(|e| {
            CollaboratorError::new(format!("unparseable capture time [{text}]: {e}"))
        })?;

        match Local.from_local_datetime(&wall_clock) {
            LocalResult::Single(instant) => Ok(instant),
            _ => Err(CollaboratorError::new(format!(
                "capture time [{text}] is not a valid local wall-clock time"
            ))),
        }
    }
}
