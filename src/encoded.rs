//! Encoded image payloads.
//!
//! The backend receives images as base64 data URIs embedded in a JSON body
//! and decodes whatever follows the first comma. [`EncodedImage`] keeps the
//! URI together with the MIME type it was built from so callers never have
//! to re-parse it.

use base64::{Engine as _, engine::general_purpose};

use crate::error::{PoetryError, PoetryResult};

/// A text-safe image payload of the form `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime: String,
    data_uri: String,
}

impl EncodedImage {
    /// Encode raw image bytes, sniffing the format from the magic bytes.
    pub fn from_bytes(bytes: &[u8]) -> PoetryResult<Self> {
        if bytes.is_empty() {
            return Err(PoetryError::image("encoding", "image is empty"));
        }
        let format = image::guess_format(bytes)
            .map_err(|e| PoetryError::image("format detection", e.to_string()))?;
        let mime = format.to_mime_type();
        let payload = general_purpose::STANDARD.encode(bytes);

        Ok(Self {
            mime: mime.to_string(),
            data_uri: format!("data:{};base64,{}", mime, payload),
        })
    }

    /// Parse an existing data URI, checking that the payload decodes.
    pub fn from_data_uri(uri: &str) -> PoetryResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| PoetryError::image("parsing data URI", "missing 'data:' prefix"))?;
        // Split where the backend does, at the first comma.
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| PoetryError::image("parsing data URI", "missing payload"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| PoetryError::image("parsing data URI", "payload is not base64"))?;
        if mime.is_empty() {
            return Err(PoetryError::image("parsing data URI", "missing MIME type"));
        }
        general_purpose::STANDARD.decode(payload)?;

        Ok(Self {
            mime: mime.to_string(),
            data_uri: uri.to_string(),
        })
    }

    /// The full data URI, as sent in the upload body.
    pub fn as_str(&self) -> &str {
        &self.data_uri
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The base64 text after the first comma.
    pub fn payload(&self) -> &str {
        self.data_uri
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    /// Decode the payload back into raw image bytes.
    pub fn to_bytes(&self) -> PoetryResult<Vec<u8>> {
        Ok(general_purpose::STANDARD.decode(self.payload())?)
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Payloads run to megabytes; show only the shape.
        write!(f, "{} image ({} base64 chars)", self.mime, self.payload().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, Rgba([200, 10, 10, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_from_bytes_builds_png_data_uri() {
        let bytes = png_bytes();
        let encoded = EncodedImage::from_bytes(&bytes).unwrap();

        assert_eq!(encoded.mime(), "image/png");
        assert!(encoded.as_str().starts_with("data:image/png;base64,iVBOR"));
        assert_eq!(encoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_from_bytes_rejects_non_images() {
        assert!(EncodedImage::from_bytes(b"").is_err());
        let err = EncodedImage::from_bytes(b"definitely not an image").unwrap_err();
        assert_eq!(err.category(), "image");
    }

    #[test]
    fn test_from_data_uri_keeps_original_text() {
        let uri = "data:image/jpeg;base64,/9j/4AAQ";
        let encoded = EncodedImage::from_data_uri(uri).unwrap();
        assert_eq!(encoded.mime(), "image/jpeg");
        assert_eq!(encoded.as_str(), uri);
        assert_eq!(encoded.payload(), "/9j/4AAQ");
    }

    #[test]
    fn test_from_data_uri_rejects_malformed_input() {
        assert!(EncodedImage::from_data_uri("image/png;base64,AAAA").is_err());
        assert!(EncodedImage::from_data_uri("data:image/png,AAAA").is_err());
        assert!(EncodedImage::from_data_uri("data:;base64,AAAA").is_err());
        assert!(EncodedImage::from_data_uri("data:image/png;base64,@@@").is_err());
        assert!(EncodedImage::from_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn test_from_data_uri_rejects_comma_in_mime() {
        // The payload starts at the first comma, so "x;base64,AAAA" would be
        // decoded and fail.
        let err = EncodedImage::from_data_uri("data:image/png,x;base64,AAAA").unwrap_err();
        assert_eq!(err.category(), "image");
    }

    #[test]
    fn test_parsed_uri_payload_always_decodes() {
        let uri = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png_bytes())
        );
        let encoded = EncodedImage::from_data_uri(&uri).unwrap();
        assert_eq!(encoded.to_bytes().unwrap(), png_bytes());
    }
}
