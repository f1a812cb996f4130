//! Image format detection and handling

use std::path::Path;
use crate::config::ImageFormat;
use crate::error::{Result, ResizeDropError};

/// Detect the input format from the file's magic bytes
pub fn detect_format_from_header(data: &[u8]) -> Result<image::ImageFormat> {
    let kind = infer::get(data)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .ok_or_else(|| ResizeDropError::invalid_parameters(
            "Content is not a recognizable image"
        ))?;

    image::ImageFormat::from_mime_type(kind.mime_type())
        .filter(image::ImageFormat::reading_enabled)
        .ok_or_else(|| ResizeDropError::invalid_parameters(
            format!("Unsupported image format: {}", kind.mime_type())
        ))
}

/// Convert our ImageFormat to image crate format
impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

/// Get supported input extensions
pub fn supported_input_formats() -> &'static [&'static str] {
    &["jpg", "jpeg", "png", "webp", "gif", "tiff", "tif", "bmp"]
}

/// Check if a file extension is supported for input
pub fn is_supported_input_format(extension: &str) -> bool {
    supported_input_formats()
        .iter()
        .any(|&fmt| fmt.eq_ignore_ascii_case(extension))
}

/// Check whether a path looks like a selectable image
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(is_supported_input_format)
}

/// Name a delivered file.
///
/// The original name is kept unless `match_extension` is set, in which case
/// the extension is replaced by the output format's.
pub fn delivered_name(original: &str, format: ImageFormat, match_extension: bool) -> String {
    if !match_extension {
        return original.to_string();
    }

    let stem = match original.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => &original[..dot_pos],
        _ => original,
    };
    format!("{stem}.{}", format.extension())
}
