//! Input checks run before a file is handed to the decoder

use std::io::Cursor;

use tracing::debug;

use crate::error::{Result, ResizeDropError};
use crate::processing::formats::detect_format_from_header;
use crate::processing::SourceFile;

/// Image validator for checking selected files before decoding
#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_file_size: u64,
    max_image_pixels: u64,
}

impl ImageValidator {
    /// Create a new image validator with default limits
    pub fn new() -> Self {
        Self {
            max_file_size: 200 * 1024 * 1024, // 200MB
            max_image_pixels: 100_000_000,    // 100 megapixels
        }
    }

    /// Create a validator with custom limits
    pub fn with_limits(max_file_size_mb: u64, max_megapixels: u64) -> Self {
        Self {
            max_file_size: max_file_size_mb * 1024 * 1024,
            max_image_pixels: max_megapixels * 1_000_000,
        }
    }

    /// Check a selected file and return its detected format.
    ///
    /// Dimensions are read from the image header, so an oversized image is
    /// rejected before any pixel data is decoded.
    pub fn validate(&self, file: &SourceFile) -> Result<image::ImageFormat> {
        debug!("Validating file: {}", file.name);

        if file.bytes.is_empty() {
            return Err(ResizeDropError::resize(&file.name, "file is empty"));
        }

        let size = file.bytes.len() as u64;
        if size > self.max_file_size {
            return Err(ResizeDropError::resize(
                &file.name,
                format!("file is {size} bytes, limit is {} bytes", self.max_file_size),
            ));
        }

        let format = detect_format_from_header(&file.bytes)
            .map_err(|e| ResizeDropError::resize(&file.name, e.to_string()))?;

        let (width, height) = image::ImageReader::with_format(Cursor::new(&file.bytes[..]), format)
            .into_dimensions()
            .map_err(|e| ResizeDropError::resize(&file.name, e.to_string()))?;
        self.validate_dimensions(&file.name, width, height)?;

        Ok(format)
    }

    /// Check image dimensions against the pixel limit
    pub fn validate_dimensions(&self, name: &str, width: u32, height: u32) -> Result<()> {
        let pixels = u64::from(width) * u64::from(height);
        if pixels == 0 || pixels > self.max_image_pixels {
            return Err(ResizeDropError::resize(
                name,
                format!("{width}x{height} is outside the supported range (limit: {} pixels)", self.max_image_pixels),
            ));
        }
        Ok(())
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D];

    fn png(name: &str, width: u32, height: u32) -> SourceFile {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        SourceFile::new(name, buffer.into_inner())
    }

    #[test]
    fn test_empty_file_rejected() {
        let validator = ImageValidator::new();
        let err = validator.validate(&SourceFile::new("empty.png", Vec::new())).unwrap_err();
        assert_eq!(err.file_name(), Some("empty.png"));
    }

    #[test]
    fn test_header_detection() {
        let validator = ImageValidator::new();
        let format = validator.validate(&png("a.png", 4, 4)).unwrap();
        assert_eq!(format, image::ImageFormat::Png);

        // Recognizable magic bytes but no readable header
        assert!(validator.validate(&SourceFile::new("a.png", PNG_HEADER.to_vec())).is_err());

        assert!(validator.validate(&SourceFile::new("a.png", b"not an image at all".to_vec())).is_err());
    }

    #[test]
    fn test_size_limit() {
        let validator = ImageValidator::with_limits(0, 1);
        assert!(validator.validate(&SourceFile::new("a.png", PNG_HEADER.to_vec())).is_err());
    }

    #[test]
    fn test_dimension_limit() {
        let validator = ImageValidator::with_limits(1, 1);
        assert!(validator.validate_dimensions("a.png", 1000, 1000).is_ok());
        assert!(validator.validate_dimensions("a.png", 1001, 1000).is_err());
        assert!(validator.validate_dimensions("a.png", 0, 10).is_err());
    }

    #[test]
    fn test_pixel_limit_checked_from_header() {
        let validator = ImageValidator {
            max_file_size: 1024 * 1024,
            max_image_pixels: 100,
        };

        assert!(validator.validate(&png("small.png", 10, 10)).is_ok());

        let err = validator.validate(&png("big.png", 20, 20)).unwrap_err();
        assert_eq!(err.file_name(), Some("big.png"));
        assert!(err.to_string().contains("20x20"));
    }
}
