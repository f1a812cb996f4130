//! `data:` URI encoding of resized images and the fetch back into bytes

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, ResizeDropError};

/// A decoded data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Wrap encoded image bytes as a base64 data URI
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Turn a base64 data URI back into its bytes
pub fn decode(uri: &str) -> Result<DataUri> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ResizeDropError::data_uri("missing `data:` scheme", None))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ResizeDropError::data_uri("missing `,` separator", None))?;

    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ResizeDropError::data_uri("payload is not base64 encoded", None))?;

    let bytes = STANDARD.decode(payload.trim())?;

    Ok(DataUri {
        mime: if mime.is_empty() { "text/plain".to_string() } else { mime.to_string() },
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_shape() {
        let uri = encode("image/png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_decode_recovers_bytes() {
        let decoded = decode("data:image/png;base64,iVBORw==").unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode("image/png;base64,iVBORw==").is_err());
        assert!(decode("data:image/png;base64").is_err());
        assert!(decode("data:image/png,plain").is_err());
        assert!(decode("data:image/png;base64,***").is_err());
    }

    #[test]
    fn test_decode_defaults_mime() {
        let decoded = decode("data:;base64,aGk=").unwrap();
        assert_eq!(decoded.mime, "text/plain");
        assert_eq!(decoded.bytes, b"hi");
    }
}
