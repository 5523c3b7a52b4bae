// THEORY:
// The input boundary. Exactly one file must be chosen and it must look like an
// image (`image/*`) before any decoding starts; otherwise the core pipeline is never
// invoked. Once accepted, the file is decoded to RGBA8, the only pixel layout the
// rest of the crate understands.

use crate::{MosaicError, Result};
use image::{ImageFormat, RgbaImage};
use std::path::Path;
use tracing::debug;

/// Accepts a MIME type only if it is in the `image/` family.
pub fn validate_mime(mime: &str) -> Result<()> {
    if mime.starts_with("image/") {
        Ok(())
    } else {
        Err(MosaicError::InputRejected("File is not an image".to_string()))
    }
}

/// Checks the selected file before the pipeline starts; returns the path and its image format.
pub fn validate_upload(path: Option<&Path>) -> Result<(&Path, ImageFormat)> {
    let path = path.ok_or_else(|| MosaicError::InputRejected("No file uploaded".to_string()))?;
    let format = ImageFormat::from_path(path)
        .map_err(|_| MosaicError::InputRejected("File is not an image".to_string()))?;
    validate_mime(format.to_mime_type())?;
    debug!(path = %path.display(), mime = format.to_mime_type(), "Accepted input file");
    Ok((path, format))
}

/// Validates and decodes an image file into RGBA8 pixels.
pub fn open_image(path: &Path) -> Result<RgbaImage> {
    validate_upload(Some(path))?;
    let reader = image::ImageReader::open(path)
        .map_err(image::ImageError::IoError)?
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    Ok(reader.decode()?.to_rgba8())
}
