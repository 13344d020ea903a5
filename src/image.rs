//! Image input: a file path, raw bytes or a `data:` URL → base64 payload.
//!
//! Images are forwarded as-is. No resizing or re-encoding happens here; the
//! bytes are only sniffed so the request can carry the right MIME type and
//! a non-image file fails before any network call is made.

use crate::error::ItemLensError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// An image ready to embed in a request body.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// `image/jpeg`, `image/png`, `image/webp` or `image/gif`.
    pub mime_type: String,
    /// Standard base64, no `data:` prefix.
    pub data: String,
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("mime_type", &self.mime_type)
            .field("data", &format_args!("<{} bytes base64>", self.data.len()))
            .finish()
    }
}

impl ImageInput {
    /// Resolve a CLI-style argument: a `data:image/...` URL or a file path.
    pub fn resolve(input: &str) -> Result<Self, ItemLensError> {
        if input.starts_with("data:") {
            Self::from_data_url(input)
        } else {
            Self::from_path(input)
        }
    }

    /// Read and sniff an image file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ItemLensError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ItemLensError::ImageNotFound {
                path: path.to_path_buf(),
            },
            _ => ItemLensError::ImageRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let image = Self::from_bytes(&bytes).map_err(|_| ItemLensError::UnsupportedImage {
            input: path.display().to_string(),
        })?;
        debug!("Loaded {} ({}, {} bytes)", path.display(), image.mime_type, bytes.len());
        Ok(image)
    }

    /// Sniff raw bytes and base64-encode them.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ItemLensError> {
        let mime = sniff_mime(bytes).ok_or_else(|| ItemLensError::UnsupportedImage {
            input: format!("<{} bytes>", bytes.len()),
        })?;
        Ok(Self {
            mime_type: mime.to_string(),
            data: STANDARD.encode(bytes),
        })
    }

    /// Accept `data:image/<type>;base64,<payload>`.
    ///
    /// The payload is decoded once to check it is valid base64 and a known
    /// image type; the declared MIME type must agree with the bytes.
    pub fn from_data_url(url: &str) -> Result<Self, ItemLensError> {
        let unsupported = || ItemLensError::UnsupportedImage {
            input: truncate(url, 48),
        };

        let rest = url.strip_prefix("data:").ok_or_else(unsupported)?;
        let (header, payload) = rest.split_once(',').ok_or_else(unsupported)?;
        let declared = header.strip_suffix(";base64").ok_or_else(unsupported)?;
        if !declared.starts_with("image/") {
            return Err(unsupported());
        }

        let bytes = STANDARD.decode(payload.trim()).map_err(|_| unsupported())?;
        let sniffed = sniff_mime(&bytes).ok_or_else(unsupported)?;
        let declared = if declared == "image/jpg" { "image/jpeg" } else { declared };
        if declared != sniffed {
            return Err(unsupported());
        }

        Ok(Self {
            mime_type: sniffed.to_string(),
            data: payload.trim().to_string(),
        })
    }
}

/// MIME type from magic bytes, for the formats the vision API accepts.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89,
    ];

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(sniff_mime(PNG_1X1), Some("image/png"));
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"%PDF-1.7"), None);
    }

    #[test]
    fn from_bytes_encodes() {
        let img = ImageInput::from_bytes(PNG_1X1).unwrap();
        assert_eq!(img.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&img.data).unwrap(), PNG_1X1);
    }

    #[test]
    fn data_url_round_trip() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(PNG_1X1));
        let img = ImageInput::resolve(&url).unwrap();
        assert_eq!(img.mime_type, "image/png");
        assert_eq!(img.data, STANDARD.encode(PNG_1X1));
    }

    #[test]
    fn data_url_mismatched_type_rejected() {
        let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(PNG_1X1));
        assert!(matches!(
            ImageInput::from_data_url(&url),
            Err(ItemLensError::UnsupportedImage { .. })
        ));
    }

    #[test]
    fn missing_file() {
        let err = ImageInput::from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, ItemLensError::ImageNotFound { .. }));
    }

    #[test]
    fn non_image_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Name: not an image").unwrap();
        assert!(matches!(
            ImageInput::from_path(&path),
            Err(ItemLensError::UnsupportedImage { .. })
        ));
    }

    #[test]
    fn debug_hides_payload() {
        let img = ImageInput::from_bytes(PNG_1X1).unwrap();
        assert!(!format!("{img:?}").contains(&img.data));
    }
}
