//! Deterministic certificate rendering.
//!
//! The renderer is a pure function from an [`Entry`] and a branding asset
//! to PDF bytes. All embedded text comes from the entry itself (including
//! the footer timestamp), so rendering the same entry twice yields
//! identical bytes. The PDF is written directly with built-in Helvetica
//! fonts and uncompressed content streams; the branding image must be a
//! JPEG so it can be embedded as-is via `DCTDecode`.

mod layout;
mod pdf;

use std::io;
use std::path::{Path, PathBuf};

use super::entry::Entry;

/// Fixed download name for rendered certificates.
pub const DOCUMENT_FILENAME: &str = "Inscricao.pdf";
/// Canonical content type for rendered certificates.
pub const DOCUMENT_CONTENT_TYPE: &str = "application/pdf";

/// Placeholder rendered for absent optional values. The renderer never
/// emits an empty value silently.
pub(crate) const MISSING_VALUE: &str = "Não informado";

/// The branding image stamped on every certificate page.
#[derive(Debug, Clone)]
pub struct BrandingAsset {
    bytes: Vec<u8>,
    width: u16,
    height: u16,
    components: u8,
}

impl BrandingAsset {
    /// Load and validate the asset from disk. An unreadable path is a
    /// deployment problem and fatal to rendering.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path).map_err(|source| RenderError::AssetUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_jpeg_bytes(bytes)
    }

    /// Validate raw JPEG bytes and read the pixel dimensions from the
    /// frame header.
    pub fn from_jpeg_bytes(bytes: Vec<u8>) -> Result<Self, RenderError> {
        let (width, height, components) = jpeg_frame_header(&bytes).ok_or_else(|| {
            RenderError::UnsupportedAsset(
                "branding asset is not a baseline or progressive JPEG".to_string(),
            )
        })?;
        Ok(Self {
            bytes,
            width,
            height,
            components,
        })
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub(crate) fn is_grayscale(&self) -> bool {
        self.components == 1
    }
}

/// Certificate rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("branding asset unavailable at {path}: {source}")]
    AssetUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported branding asset: {0}")]
    UnsupportedAsset(String),
    #[error("entry violates a rendering invariant: {0}")]
    InvariantViolation(String),
}

/// Render the confirmation certificate for a persisted entry.
pub fn render(entry: &Entry, branding: &BrandingAsset) -> Result<Vec<u8>, RenderError> {
    let title = format!(
        "Inscrição - Prêmio CNA Brasil Artesanal 2024 - {}",
        entry.details.category.label()
    );
    let lines = layout::certificate_lines(entry)?;
    let footer_prefix = format!("Data/Hora: {}", entry.submitted_at_label());
    Ok(pdf::write_document(&title, &lines, &footer_prefix, branding))
}

/// Scan JPEG markers for the start-of-frame segment and return
/// `(width, height, components)`.
fn jpeg_frame_header(bytes: &[u8]) -> Option<(u16, u16, u8)> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }
    let mut pos = 2;
    while pos + 10 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        // Standalone markers carry no length.
        if (0xD0..=0xD9).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        if length < 2 {
            return None;
        }
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let height = u16::from_be_bytes([bytes[pos + 5], bytes[pos + 6]]);
            let width = u16::from_be_bytes([bytes[pos + 7], bytes[pos + 8]]);
            let components = bytes[pos + 9];
            if width == 0 || height == 0 {
                return None;
            }
            return Some((width, height, components));
        }
        pos += 2 + length;
    }
    None
}

/// Smallest syntactically valid JPEG header for a 2x1 image; enough for
/// the dimension scanner, not a decodable picture. Test fixture only.
#[cfg(test)]
pub(crate) fn tiny_jpeg() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    // APP0 segment, 16 bytes of payload.
    bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    bytes.extend_from_slice(b"JFIF\0");
    bytes.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    // SOF0: precision 8, height 1, width 2, one component.
    bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x02, 0x01]);
    bytes.extend_from_slice(&[0x01, 0x11, 0x00]);
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn reads_dimensions_from_sof_marker() {
        assert_eq!(jpeg_frame_header(&tiny_jpeg()), Some((2, 1, 1)));
    }

    #[test]
    fn rejects_non_jpeg_bytes() {
        assert_eq!(jpeg_frame_header(b"\x89PNG\r\n\x1a\n"), None);
        assert!(matches!(
            BrandingAsset::from_jpeg_bytes(b"not an image".to_vec()),
            Err(RenderError::UnsupportedAsset(_))
        ));
    }

    #[test]
    fn missing_file_is_asset_unavailable() {
        let missing = Path::new("/nonexistent/logo.jpg");
        match BrandingAsset::load(missing) {
            Err(RenderError::AssetUnavailable { path, .. }) => {
                assert_eq!(path, missing.to_path_buf());
            }
            other => panic!("expected AssetUnavailable, got {other:?}"),
        }
    }
}
