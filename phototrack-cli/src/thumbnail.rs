//! Thumbnail rendering collaborator

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use phototrack_core::{CollaboratorError, ThumbnailRenderer};

/// Renders an aspect-preserving JPEG thumbnail of a matched photo.
#[derive(Debug, Clone, Copy)]
pub struct ImageThumbnailRenderer {
    width: u32,
    height: u32,
    quality: u8,
}

impl Default for ImageThumbnailRenderer {
    fn default() -> Self {
        ImageThumbnailRenderer {
            width: 512,
            height: 512,
            quality: 90,
        }
    }
}

impl ThumbnailRenderer for ImageThumbnailRenderer {
    fn render(&self, source: &Path, target: &Path) -> Result<(), CollaboratorError> {
        let image = image::open(source).map_err(|e| {
            CollaboratorError::new(format!("failed to open {}: {e}", source.display()))
        })?;

        let thumbnail = image.thumbnail(self.width, self.height);

        let file = File::create(target).map_err(|e| {
            CollaboratorError::new(format!("failed to create {}: {e}", target.display()))
        })?;
        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);

        thumbnail.write_with_encoder(encoder).map_err(|e| {
            CollaboratorError::new(format!("failed to write {}: {e}", target.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_readable_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.png");
        let target = dir.path().join("thumb.jpg");
        image::RgbImage::from_pixel(64, 32, image::Rgb([200, 100, 50]))
            .save(&source)
            .unwrap();

        ImageThumbnailRenderer::default()
            .render(&source, &target)
            .unwrap();

        let thumbnail = image::open(&target).unwrap().to_rgb8();
        assert!(thumbnail.width() <= 512 && thumbnail.height() <= 512);
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let error = ImageThumbnailRenderer::default()
            .render(Path::new("/nonexistent/photo.jpg"), &dir.path().join("t.jpg"))
            .unwrap_err();

        assert!(error.message.contains("/nonexistent/photo.jpg"));
    }
}
