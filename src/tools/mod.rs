//! Image loading and input traversal for the command-line driver.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use walkdir::WalkDir;

use crate::error::{GoudaError, Result};

/// Read an image, optionally converting it to 8-bit grayscale.
pub fn read_image<P: AsRef<Path>>(path: P, greyscale: bool) -> Result<DynamicImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| GoudaError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(if greyscale {
        DynamicImage::ImageLuma8(img.to_luma8())
    } else {
        img
    })
}

/// True if the extension names a format the `image` crate knows.
pub fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok()
}

/// Expand command-line inputs into the files to process.
///
/// Files are passed through untouched so that unreadable ones get reported.
/// Directories are walked recursively, in name order, keeping only image
/// files.
pub fn expand_inputs<I, P>(inputs: I) -> impl Iterator<Item = PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            paths.extend(
                WalkDir::new(input)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|path| is_image_path(path)),
            );
        } else {
            paths.push(input.to_path_buf());
        }
    }
    paths.into_iter()
}
