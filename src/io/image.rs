//! Companion image lookup and decode verification

use crate::io::configuration::SUPPORTED_IMAGE_EXTENSIONS;
use crate::io::error::{ReplicationError, Result};
use std::path::{Path, PathBuf};

/// Find the image that shares `annotation`'s base name
///
/// Extensions are tried in [`SUPPORTED_IMAGE_EXTENSIONS`] order and the first
/// existing file wins.
///
/// # Errors
///
/// Returns [`ReplicationError::MissingCompanion`] if no candidate exists
pub fn locate_companion(annotation: &Path) -> Result<PathBuf> {
    SUPPORTED_IMAGE_EXTENSIONS
        .iter()
        .map(|extension| annotation.with_extension(extension))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ReplicationError::MissingCompanion {
            annotation: annotation.to_path_buf(),
        })
}

/// Check that `image` decodes far enough to report its dimensions
///
/// # Errors
///
/// Returns [`ReplicationError::ImageVerify`] if the format cannot be guessed
/// or the header is unreadable
pub fn verify_image(image: &Path) -> Result<(u32, u32)> {
    let to_error = |source: image::ImageError| ReplicationError::ImageVerify {
        path: image.to_path_buf(),
        source,
    };

    let reader = image::ImageReader::open(image)
        .and_then(image::ImageReader::with_guessed_format)
        .map_err(|e| to_error(image::ImageError::IoError(e)))?;

    reader.into_dimensions().map_err(to_error)
}

/// Resolve the companion of `annotation`, optionally verifying that it decodes
///
/// # Errors
///
/// Returns [`ReplicationError::MissingCompanion`] or
/// [`ReplicationError::ImageVerify`]
pub fn resolve_companion(annotation: &Path, verify: bool) -> Result<PathBuf> {
    let image = locate_companion(annotation)?;
    if verify {
        verify_image(&image)?;
    }
    Ok(image)
}
