//! # Raster Module
//!
//! Decoded pixel data and the identifiers that name it.
//!
//! A [`Raster`] is an immutable, interleaved 8-bit buffer with explicit
//! width, height and channel count. Once built it is never mutated; the
//! cache hands it out as `Arc<Raster>` so concurrent comparisons can share
//! it read-only.
//!
//! ## Decoders
//! - `FileDecoder` - reads files (memory-mapped when large), decodes JPEG
//!   with zune-jpeg and everything else with the `image` crate
//! - `InMemoryDecoder` - serves pre-built rasters, for tests and embedding

mod decoder;
mod file_bytes;
mod memory;

pub use decoder::{ColorMode, FileDecoder, RasterDecoder};
pub use file_bytes::{read_file_bytes, FileBytes};
pub use memory::InMemoryDecoder;

use crate::error::DimensionError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies one input image.
///
/// The position of an `ImageId` in the input sequence is what orders it;
/// the clustering engine never sorts ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(PathBuf);

impl ImageId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl From<PathBuf> for ImageId {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for ImageId {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl AsRef<Path> for ImageId {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// An immutable decoded pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl Raster {
    /// Wrap an interleaved buffer, checking that it matches the shape.
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        pixels: Vec<u8>,
    ) -> Result<Self, DimensionError> {
        if width == 0 || height == 0 {
            return Err(DimensionError::Empty);
        }
        if !(1..=4).contains(&channels) {
            return Err(DimensionError::UnsupportedChannels { channels });
        }

        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(DimensionError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    /// Build a raster by evaluating `f(x, y, channel)` for every sample.
    pub fn from_fn<F>(width: u32, height: u32, channels: u8, mut f: F) -> Result<Self, DimensionError>
    where
        F: FnMut(u32, u32, u8) -> u8,
    {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * channels as usize);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    pixels.push(f(x, y, c));
                }
            }
        }
        Self::new(width, height, channels, pixels)
    }

    /// Convert a decoded image into a raster.
    ///
    /// `ColorMode::Rgb` always yields three channels; `ColorMode::Native`
    /// keeps the source's channel layout, narrowed to 8 bits.
    pub fn from_dynamic(image: DynamicImage, mode: ColorMode) -> Result<Self, DimensionError> {
        let (width, height) = (image.width(), image.height());

        let (channels, pixels) = match mode {
            ColorMode::Rgb => (3, image.into_rgb8().into_raw()),
            ColorMode::Native => match image.color().channel_count() {
                1 => (1, image.into_luma8().into_raw()),
                2 => (2, image.into_luma_alpha8().into_raw()),
                4 => (4, image.into_rgba8().into_raw()),
                _ => (3, image.into_rgb8().into_raw()),
            },
        };

        Self::new(width, height, channels, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Interleaved samples, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Memory estimate used for the cache budget: width × height × channels
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Same width and height (channel count is checked separately)
    pub fn same_dimensions(&self, other: &Raster) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Smallest and largest sample across all channels
    pub fn value_range(&self) -> (u8, u8) {
        self.pixels
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, LumaA, Rgba};

    #[test]
    fn new_rejects_wrong_buffer_length() {
        let result = Raster::new(2, 2, 3, vec![0; 11]);
        assert_eq!(
            result,
            Err(DimensionError::BufferLength {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn new_rejects_empty_and_odd_channel_counts() {
        assert_eq!(Raster::new(0, 4, 3, vec![]), Err(DimensionError::Empty));
        assert_eq!(
            Raster::new(1, 1, 5, vec![0; 5]),
            Err(DimensionError::UnsupportedChannels { channels: 5 })
        );
    }

    #[test]
    fn from_fn_lays_out_samples_interleaved() {
        let raster = Raster::from_fn(2, 1, 3, |x, _, c| (x as u8) * 10 + c).unwrap();
        assert_eq!(raster.pixels(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(raster.byte_size(), 6);
    }

    #[test]
    fn value_range_spans_all_channels() {
        let raster = Raster::new(1, 2, 2, vec![40, 7, 200, 90]).unwrap();
        assert_eq!(raster.value_range(), (7, 200));
    }

    #[test]
    fn rgb_mode_drops_alpha() {
        let rgba = ImageBuffer::from_pixel(3, 2, Rgba([10u8, 20, 30, 255]));
        let raster = Raster::from_dynamic(DynamicImage::ImageRgba8(rgba), ColorMode::Rgb).unwrap();

        assert_eq!(raster.channels(), 3);
        assert_eq!(&raster.pixels()[..3], &[10, 20, 30]);
    }

    #[test]
    fn native_mode_keeps_luma_alpha() {
        let la = ImageBuffer::from_pixel(4, 4, LumaA([128u8, 255]));
        let raster =
            Raster::from_dynamic(DynamicImage::ImageLumaA8(la), ColorMode::Native).unwrap();

        assert_eq!(raster.channels(), 2);
        assert_eq!(raster.byte_size(), 32);
    }

    #[test]
    fn image_id_displays_its_path() {
        let id = ImageId::from("/photos/cat.png");
        assert_eq!(id.to_string(), "/photos/cat.png");
        assert_eq!(id.path(), Path::new("/photos/cat.png"));
    }
}
