use thiserror::Error;

/// Errors that can escape a document operation.
///
/// These are reported to the user as message boxes; none of them leaves the
/// document in an inconsistent state. A failed open keeps the previous
/// canvas, a failed save keeps the modified flag set.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("could not decode image: {0}")]
    DecodeFailed(String),
    #[error("could not encode PNG: {0}")]
    EncodeFailed(String),
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvasSize { width: u32, height: u32 },
    #[error("out of memory allocating a {width}x{height} pixel buffer")]
    OutOfMemory { width: u32, height: u32 },
}
