use crate::error::DocumentError;

/// Opaque white, the color of a fresh canvas.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// A fixed-size ARGB raster.
///
/// Pixels are `0xAARRGGBB` words in a flat row-major vector. Dimensions never
/// change after construction; "resizing" the canvas means replacing the
/// buffer. Canvas buffers keep every alpha byte at `0xFF` — the drawing
/// primitives and the redact filter both uphold that invariant.
#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Creates a buffer filled with opaque white.
    ///
    /// Fails with `InvalidCanvasSize` on a zero dimension and `OutOfMemory`
    /// when the backing allocation cannot be reserved, so a huge decoded
    /// image reports an error instead of aborting.
    pub fn new(width: u32, height: u32) -> Result<Self, DocumentError> {
        if width == 0 || height == 0 {
            return Err(DocumentError::InvalidCanvasSize { width, height });
        }
        let len = width as usize * height as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| DocumentError::OutOfMemory { width, height })?;
        pixels.resize(len, WHITE);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a buffer from straight-alpha RGBA8 rows, as produced by the
    /// image decoder. Each pixel is composited over opaque white so the
    /// canvas starts out fully opaque regardless of the source alpha.
    pub fn from_rgba(bytes: &[u8], width: u32, height: u32) -> Result<Self, DocumentError> {
        let mut buf = Self::new(width, height)?;
        debug_assert_eq!(bytes.len(), width as usize * height as usize * 4);
        for (word, rgba) in buf.pixels.iter_mut().zip(bytes.chunks_exact(4)) {
            let a = rgba[3] as u32;
            let over_white = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
            *word = pack(0xFF, over_white(rgba[0]), over_white(rgba[1]), over_white(rgba[2]));
        }
        Ok(buf)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes. Rows are packed, so this is always `4 * width`.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Reads the ARGB word at `(x, y)`; `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Writes the ARGB word at `(x, y)`; out-of-bounds writes are dropped.
    pub fn put_pixel(&mut self, x: u32, y: u32, argb: u32) {
        if x < self.width && y < self.height {
            self.pixels[y as usize * self.width as usize + x as usize] = argb;
        }
    }

    /// The raw word slice, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable raw access for the redact filter.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// RGBA8 rows for PNG encoding and texture upload. Alpha is `0xFF`
    /// everywhere by the canvas invariant.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for &word in &self.pixels {
            let (a, r, g, b) = unpack(word);
            bytes.extend_from_slice(&[r, g, b, a]);
        }
        bytes
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Packs channels into an `0xAARRGGBB` word.
pub fn pack(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Unpacks an `0xAARRGGBB` word into `(a, r, g, b)`.
pub fn unpack(argb: u32) -> (u8, u8, u8, u8) {
    (
        (argb >> 24) as u8,
        (argb >> 16) as u8,
        (argb >> 8) as u8,
        argb as u8,
    )
}
