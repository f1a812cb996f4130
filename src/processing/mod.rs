//! Core image processing functionality

use std::future::Future;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::debug;

use crate::config::ResizeConfig;
use crate::error::{ErrorContext, Result, ResizeDropError};

pub mod data_uri;
pub mod formats;
pub mod resize;
pub mod validation;

pub use formats::*;
pub use resize::*;
pub use validation::*;

/// Parameters of one resize call
pub type ResizeRequest = ResizeConfig;

/// A file picked by the user: its name and raw content
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Create a source file from in-memory content
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a source file from disk, named after the path's final component
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ResizeDropError::invalid_parameters(
                format!("Path has no file name: {}", path.display())
            ))?;

        let bytes = fs::read(path).await?;
        Ok(Self::new(name, bytes))
    }
}

/// A resize capability turns a file into a data URI of the resized image.
///
/// Implementations are called concurrently for every file of a selection.
pub trait ResizeCapability: Send + Sync {
    fn resize(
        &self,
        file: &SourceFile,
        request: &ResizeRequest,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// A resized image held by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizedImage {
    /// Original file name, used as the download name
    pub name: String,
    /// Preview string handed back by the resize capability
    pub data_uri: String,
    /// Encoded image data
    pub bytes: Vec<u8>,
    /// Output dimensions when the encoded data can be probed
    pub dimensions: Option<(u32, u32)>,
}

impl ResizedImage {
    /// Fetch a data URI back into bytes
    pub fn from_data_uri(name: &str, uri: String) -> Result<Self> {
        let decoded = data_uri::decode(&uri).with_file_name(name)?;

        let dimensions = image::ImageReader::new(Cursor::new(&decoded.bytes))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());

        Ok(Self {
            name: name.to_string(),
            data_uri: uri,
            bytes: decoded.bytes,
            dimensions,
        })
    }
}

/// Default resize capability built on the `image` crate
#[derive(Debug, Clone, Default)]
pub struct ProcessingEngine {
    resampler: Resampler,
    validator: ImageValidator,
}

impl ProcessingEngine {
    /// Create a new processing engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom resize filter
    pub fn with_filter(filter: FilterType) -> Self {
        Self {
            resampler: Resampler::with_filter(filter),
            validator: ImageValidator::new(),
        }
    }

    /// Decode, resize, rotate and encode one file
    fn process(
        &self,
        file: &SourceFile,
        input_format: image::ImageFormat,
        request: &ResizeRequest,
    ) -> Result<Vec<u8>> {
        // The validator has already bounded the pixel count
        let mut reader = image::ImageReader::with_format(Cursor::new(&file.bytes[..]), input_format);
        reader.no_limits();
        let image = reader.decode().with_file_name(&file.name)?;

        debug!("Decoded {}: {}x{}", file.name, image.width(), image.height());

        let resized = self.resampler.resize(&image, request.width, request.height);
        let rotated = rotate(resized, request.rotation)?;
        encode(&rotated, request.format, request.quality).with_file_name(&file.name)
    }
}

impl ResizeCapability for ProcessingEngine {
    async fn resize(&self, file: &SourceFile, request: &ResizeRequest) -> Result<String> {
        request.validate()?;
        let input_format = self.validator.validate(file)?;

        let encoded = tokio::task::spawn_blocking({
            let engine = self.clone();
            let file = file.clone();
            let request = *request;
            move || engine.process(&file, input_format, &request)
        })
        .await
        .map_err(|e| ResizeDropError::system(format!("Task join error: {e}")))??;

        debug!("Encoded {} as {:?} ({} bytes)", file.name, request.format, encoded.len());

        Ok(data_uri::encode(request.format.mime_type(), &encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageFormat;
    use image::{DynamicImage, ImageBuffer, Rgba};

    fn png_file(name: &str, width: u32, height: u32) -> SourceFile {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, 128, 255])
        });
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        SourceFile::new(name, buffer.into_inner())
    }

    #[tokio::test]
    async fn test_engine_produces_png_data_uri() {
        let engine = ProcessingEngine::new();
        let uri = engine
            .resize(&png_file("wide.png", 200, 100), &ResizeRequest::new())
            .await
            .unwrap();

        assert!(uri.starts_with("data:image/png;base64,"));

        let resized = ResizedImage::from_data_uri("wide.png", uri).unwrap();
        assert_eq!(resized.name, "wide.png");
        assert_eq!(resized.dimensions, Some((35, 18)));
        assert!(resized.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn test_engine_applies_rotation_and_format() {
        let engine = ProcessingEngine::with_filter(FilterType::Triangle);
        let request = ResizeRequest::new()
            .size(35, 30)
            .rotation(90)
            .format(ImageFormat::Jpeg)
            .quality(90);

        let uri = engine.resize(&png_file("tall.png", 50, 100), &request).await.unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));

        let resized = ResizedImage::from_data_uri("tall.png", uri).unwrap();
        assert_eq!(resized.dimensions, Some((30, 15)));
    }

    #[tokio::test]
    async fn test_engine_rejects_invalid_input() {
        let engine = ProcessingEngine::new();

        let garbage = SourceFile::new("notes.png", b"definitely not pixels".to_vec());
        let err = engine.resize(&garbage, &ResizeRequest::new()).await.unwrap_err();
        assert_eq!(err.file_name(), Some("notes.png"));

        let zero = ResizeRequest::new().size(0, 30);
        let err = engine.resize(&png_file("a.png", 10, 10), &zero).await.unwrap_err();
        assert!(matches!(err, ResizeDropError::InvalidParameters { .. }));
    }

    #[test]
    fn test_fetch_rejects_malformed_uri() {
        let err = ResizedImage::from_data_uri("a.png", "not a uri".to_string()).unwrap_err();
        assert_eq!(err.file_name(), Some("a.png"));
    }

    #[tokio::test]
    async fn test_source_file_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"bytes").unwrap();

        let file = SourceFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "photo.png");
        assert_eq!(&*file.bytes, b"bytes");

        assert!(SourceFile::from_path(dir.path().join("missing.png")).await.is_err());
    }
}
