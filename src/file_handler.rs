//! The two external collaborators the engine consumes: decode-image-to-ARGB
//! and encode-ARGB-to-PNG, both via the `image` crate.

use std::path::Path;

use crate::error::DocumentError;
use crate::pixel_buffer::PixelBuffer;

/// Decodes any format the `image` crate understands into an opaque ARGB
/// buffer. Source alpha is composited over white during conversion.
pub fn load_image(path: &Path) -> Result<PixelBuffer, DocumentError> {
    let decoded = image::open(path).map_err(|err| {
        log::error!("failed to decode {}: {}", path.display(), err);
        DocumentError::DecodeFailed(err.to_string())
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::info!("decoded {} ({}x{})", path.display(), width, height);
    PixelBuffer::from_rgba(rgba.as_raw(), width, height)
}

/// Encodes the buffer as an 8-bit RGBA PNG. The canvas invariant keeps every
/// alpha byte opaque, so RGBA and RGB output are visually equivalent.
pub fn save_png(buf: &PixelBuffer, path: &Path) -> Result<(), DocumentError> {
    image::save_buffer(
        path,
        &buf.to_rgba_bytes(),
        buf.width(),
        buf.height(),
        image::ExtendedColorType::Rgba8,
    )
    .map_err(|err| {
        log::error!("failed to encode {}: {}", path.display(), err);
        DocumentError::EncodeFailed(err.to_string())
    })?;
    log::info!("saved {}", path.display());
    Ok(())
}
