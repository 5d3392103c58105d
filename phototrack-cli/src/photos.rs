//! Photo file enumeration

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions the batch considers photos, compared case-insensitively.
const PHOTO_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// Enumerate photo files under `dir`, sorted by path for stable logs.
pub fn enumerate_photos(dir: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    let mut photos = Vec::new();
    collect(dir, recursive, &mut photos)?;
    photos.sort();
    Ok(photos)
}

fn collect(dir: &Path, recursive: bool, photos: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            if recursive {
                collect(&path, recursive, photos)?;
            }
            continue;
        }

        if is_photo(&path) {
            photos.push(path);
        }
    }
    Ok(())
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PHOTO_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}
