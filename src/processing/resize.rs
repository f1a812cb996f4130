//! Image resizing, rotation and encoding

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use tracing::debug;

use crate::config::ImageFormat;
use crate::error::{Result, ResizeDropError};

/// Available resize filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterType {
    /// Nearest neighbor (fastest, lowest quality)
    Nearest,
    /// Triangle (linear interpolation)
    Triangle,
    /// Catmull-Rom cubic spline
    CatmullRom,
    /// Lanczos with radius 3 (high quality)
    #[default]
    Lanczos3,
}

impl From<FilterType> for image::imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Calculate output dimensions for a max width / max height target.
///
/// Landscape images are bounded by `max_width` only, portrait and square
/// images by `max_height` only. Aspect ratio is kept and images are never
/// upscaled.
pub fn calculate_dimensions(
    original_width: u32,
    original_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    let (width, height) = (f64::from(original_width), f64::from(original_height));

    if original_width > original_height {
        if original_width > max_width {
            let scaled = (height * f64::from(max_width) / width).round() as u32;
            return (max_width, scaled.max(1));
        }
    } else if original_height > max_height {
        let scaled = (width * f64::from(max_height) / height).round() as u32;
        return (scaled.max(1), max_height);
    }

    (original_width, original_height)
}

/// Resamples decoded images to a target size
#[derive(Debug, Clone, Copy, Default)]
pub struct Resampler {
    filter: FilterType,
}

impl Resampler {
    /// Create a resampler with the default Lanczos3 filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resampler with a custom filter
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Resize to fit `max_width` x `max_height`
    pub fn resize(&self, image: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
        let (target_width, target_height) =
            calculate_dimensions(image.width(), image.height(), max_width, max_height);

        if target_width == image.width() && target_height == image.height() {
            debug!("No resize needed for {}x{}", target_width, target_height);
            return image.clone();
        }

        debug!(
            "Resizing {}x{} -> {}x{} using {:?}",
            image.width(),
            image.height(),
            target_width,
            target_height,
            self.filter
        );

        image.resize_exact(target_width, target_height, self.filter.into())
    }
}

/// Rotate clockwise by a multiple of 90 degrees
pub fn rotate(image: DynamicImage, degrees: u16) -> Result<DynamicImage> {
    match degrees {
        0 => Ok(image),
        90 => Ok(image.rotate90()),
        180 => Ok(image.rotate180()),
        270 => Ok(image.rotate270()),
        other => Err(ResizeDropError::invalid_parameters(
            format!("Rotation must be 0, 90, 180 or 270, got {other}")
        )),
    }
}

/// Encode an image in the output format
pub fn encode(image: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)?;
        }
        ImageFormat::Png => {
            image.write_to(&mut buffer, format.into())?;
        }
        ImageFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buffer))?;
        }
    }

    Ok(buffer.into_inner())
}
