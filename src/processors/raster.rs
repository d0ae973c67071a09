//! Raster image container and the image-decoder capability.
//!
//! A [`RasterImage`] is a contiguous interleaved (HWC) byte buffer plus
//! dimension and channel-order metadata. The channel order is metadata only:
//! the data is never silently reordered, consumers branch on it. Decoding of
//! image files is delegated to the `image` crate behind the [`ImageDecoder`]
//! trait; the default implementation strips alpha explicitly so a buffer never
//! claims fewer channels than it holds.

use crate::core::errors::OCRError;
use image::DynamicImage;
use std::path::PathBuf;

/// Order and count of interleaved channels in a raster buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// Blue, green, red.
    Bgr,
    /// Blue, green, red, alpha.
    Bgra,
    /// Single luminance channel.
    Gray,
}

impl ChannelOrder {
    /// Number of interleaved channels.
    pub fn channels(self) -> usize {
        match self {
            ChannelOrder::Rgb | ChannelOrder::Bgr => 3,
            ChannelOrder::Rgba | ChannelOrder::Bgra => 4,
            ChannelOrder::Gray => 1,
        }
    }

    /// Offsets of the red, green, and blue samples within a pixel.
    ///
    /// For grayscale the single channel is reported for all three.
    pub fn rgb_offsets(self) -> [usize; 3] {
        match self {
            ChannelOrder::Rgb | ChannelOrder::Rgba => [0, 1, 2],
            ChannelOrder::Bgr | ChannelOrder::Bgra => [2, 1, 0],
            ChannelOrder::Gray => [0, 0, 0],
        }
    }
}

/// A decoded raster image: row-major, channels interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// Interleaved pixel bytes, `width * height * channels` long.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Channel order of the buffer.
    pub order: ChannelOrder,
}

impl RasterImage {
    /// Wraps a buffer, validating the length invariant.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        order: ChannelOrder,
    ) -> Result<Self, OCRError> {
        if width == 0 || height == 0 {
            return Err(OCRError::invalid_input(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = width * height * order.channels();
        if data.len() != expected {
            return Err(OCRError::invalid_input(format!(
                "buffer length {} does not match {width}x{height}x{} = {expected}",
                data.len(),
                order.channels()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            order,
        })
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.order.channels()
    }

    /// Byte offset of pixel (x, y).
    #[inline]
    pub fn pixel_offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.channels()
    }

    /// Converts a decoded `image` crate value, stripping alpha.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            data: rgb.into_raw(),
            width: width as usize,
            height: height as usize,
            order: ChannelOrder::Rgb,
        }
    }

    /// Converts a decoded `image` crate value to a single-channel image.
    pub fn gray_from_dynamic(img: &DynamicImage) -> Self {
        let gray = img.to_luma8();
        let (width, height) = gray.dimensions();
        Self {
            data: gray.into_raw(),
            width: width as usize,
            height: height as usize,
            order: ChannelOrder::Gray,
        }
    }

    /// Converts to single-channel luma with BT.601 integer weights:
    /// `gray = round(0.299 R + 0.587 G + 0.114 B)`.
    ///
    /// Grayscale inputs are returned as-is.
    pub fn to_grayscale(&self) -> Self {
        if self.order == ChannelOrder::Gray {
            return self.clone();
        }
        let [r_off, g_off, b_off] = self.order.rgb_offsets();
        let channels = self.channels();
        let mut data = Vec::with_capacity(self.width * self.height);
        for pixel in self.data.chunks_exact(channels) {
            let luma = 0.299 * pixel[r_off] as f32
                + 0.587 * pixel[g_off] as f32
                + 0.114 * pixel[b_off] as f32;
            data.push(luma.round().clamp(0.0, 255.0) as u8);
        }
        Self {
            data,
            width: self.width,
            height: self.height,
            order: ChannelOrder::Gray,
        }
    }

    /// Copies the axis-aligned subregion `[x0, x1) x [y0, y1)`, clamped to the
    /// image bounds.
    pub fn crop(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> Result<Self, OCRError> {
        let x0 = x0.clamp(0, self.width as i64) as usize;
        let y0 = y0.clamp(0, self.height as i64) as usize;
        let x1 = x1.clamp(0, self.width as i64) as usize;
        let y1 = y1.clamp(0, self.height as i64) as usize;
        if x1 <= x0 || y1 <= y0 {
            return Err(OCRError::invalid_input(format!(
                "empty crop region ({x0},{y0})..({x1},{y1})"
            )));
        }
        let channels = self.channels();
        let mut data = Vec::with_capacity((x1 - x0) * (y1 - y0) * channels);
        for y in y0..y1 {
            let start = (y * self.width + x0) * channels;
            let end = (y * self.width + x1) * channels;
            data.extend_from_slice(&self.data[start..end]);
        }
        Self::new(data, x1 - x0, y1 - y0, self.order)
    }

    /// Rotates by a multiple of 90 degrees clockwise via index remap.
    pub fn rotate(&self, degrees: i32) -> Result<Self, OCRError> {
        let degrees = degrees.rem_euclid(360);
        if degrees % 90 != 0 {
            return Err(OCRError::invalid_input(format!(
                "rotation must be a multiple of 90 degrees, got {degrees}"
            )));
        }
        if degrees == 0 {
            return Ok(self.clone());
        }
        let channels = self.channels();
        let (out_w, out_h) = match degrees {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        };
        let mut data = vec![0u8; out_w * out_h * channels];
        for y in 0..self.height {
            for x in 0..self.width {
                let (dx, dy) = match degrees {
                    90 => (self.height - 1 - y, x),
                    180 => (self.width - 1 - x, self.height - 1 - y),
                    270 => (y, self.width - 1 - x),
                    _ => unreachable!(),
                };
                let src = self.pixel_offset(x, y);
                let dst = (dy * out_w + dx) * channels;
                data[dst..dst + channels].copy_from_slice(&self.data[src..src + channels]);
            }
        }
        Self::new(data, out_w, out_h, self.order)
    }
}

/// An opaque image source handed to a decoder.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A filesystem path.
    Path(PathBuf),
    /// An encoded byte buffer.
    Bytes(Vec<u8>),
}

/// The image-decoder capability.
///
/// Implementations must decode to 8-bit sRGB, strip alpha explicitly, and
/// return channel-order metadata matching the actual buffer.
pub trait ImageDecoder {
    /// Decodes a source to a color raster image.
    fn decode(&self, source: &ImageSource) -> Result<RasterImage, OCRError>;

    /// Decodes a source straight to a single-channel image for the
    /// recognition path.
    fn decode_grayscale(&self, source: &ImageSource) -> Result<RasterImage, OCRError>;
}

/// Decoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultImageDecoder;

impl DefaultImageDecoder {
    fn open(&self, source: &ImageSource) -> Result<DynamicImage, OCRError> {
        match source {
            ImageSource::Path(path) => {
                if !path.exists() {
                    return Err(OCRError::invalid_input(format!(
                        "image file does not exist: '{}'",
                        path.display()
                    )));
                }
                Ok(image::open(path)?)
            }
            ImageSource::Bytes(bytes) => Ok(image::load_from_memory(bytes)?),
        }
    }
}

impl ImageDecoder for DefaultImageDecoder {
    fn decode(&self, source: &ImageSource) -> Result<RasterImage, OCRError> {
        Ok(RasterImage::from_dynamic(&self.open(source)?))
    }

    fn decode_grayscale(&self, source: &ImageSource) -> Result<RasterImage, OCRError> {
        Ok(RasterImage::gray_from_dynamic(&self.open(source)?))
    }
}
