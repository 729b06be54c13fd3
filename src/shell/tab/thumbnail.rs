use crate::shell::errors::ShellError;

/// Small RGBA8 snapshot of a tab's visible content, shown in the tab switcher.
///
/// Encoding is left to the view that captured it; the shell only stores and hands it out.
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
}

impl Thumbnail {
    pub fn from_raw(pixels: Vec<u8>, width: u32, height: u32, stride: u32) -> Result<Self, ShellError> {
        if stride < width.saturating_mul(4) {
            return Err(ShellError::InvalidThumbnail(format!(
                "stride {stride} is smaller than a row of {width} pixels"
            )));
        }
        if pixels.len() < (height as usize) * (stride as usize) {
            return Err(ShellError::InvalidThumbnail(format!(
                "pixel buffer of {} bytes too small for {width}x{height} (stride {stride})",
                pixels.len()
            )));
        }

        Ok(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    /// A fully transparent thumbnail of the given size
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0u8; (width as usize) * (height as usize) * 4],
            width,
            height,
            stride: width * 4,
        }
    }
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}
