use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use snafu::{OptionExt, ResultExt};

use crate::error::{AttachmentResult, ReadImageSnafu, UnsupportedImageSnafu};

/// Extensions accepted as image attachments, lower-case.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    Some(match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    })
}

/// An image staged in the composer, already encoded for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub data_url: String,
}

impl Attachment {
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> AttachmentResult<Self> {
        let mime = Path::new(file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(mime_for_extension)
            .context(UnsupportedImageSnafu {
                stage: "attachment-mime",
                path: file_name.to_string(),
            })?;

        Ok(Self {
            file_name: file_name.to_string(),
            data_url: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
        })
    }

    pub fn read(path: &Path) -> AttachmentResult<Self> {
        let bytes = std::fs::read(path).context(ReadImageSnafu {
            stage: "attachment-read",
            path: path.display().to_string(),
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let attachment = Self::from_bytes(&file_name, &bytes)?;
        tracing::debug!(file = %attachment.file_name, bytes = bytes.len(), "image attached");
        Ok(attachment)
    }
}

/// Splits a base64 data URL into its media type and decoded bytes.
pub fn decode_data_url(data_url: &str) -> Option<(&str, Vec<u8>)> {
    let rest = data_url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime, bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::AttachmentError;

    #[test]
    fn bytes_become_a_typed_data_url() {
        let attachment = Attachment::from_bytes("Photo.JPG", b"abc").unwrap();
        assert_eq!(attachment.data_url, "data:image/jpeg;base64,YWJj");

        let (mime, bytes) = decode_data_url(&attachment.data_url).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, b"abc");
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        assert!(matches!(
            Attachment::from_bytes("notes.txt", b"x"),
            Err(AttachmentError::UnsupportedImage { .. })
        ));
        assert!(matches!(
            Attachment::from_bytes("no_extension", b"x"),
            Err(AttachmentError::UnsupportedImage { .. })
        ));
    }

    #[test]
    fn files_are_read_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".svg").tempfile().unwrap();
        file.write_all(b"<svg/>").unwrap();

        let attachment = Attachment::read(file.path()).unwrap();
        assert!(attachment.data_url.starts_with("data:image/svg+xml;base64,"));
        assert!(attachment.file_name.ends_with(".svg"));
    }

    #[test]
    fn malformed_data_urls_decode_to_none() {
        assert!(decode_data_url("https://example.com/a.png").is_none());
        assert!(decode_data_url("data:image/png,plain").is_none());
        assert!(decode_data_url("data:image/png;base64,***").is_none());
    }

    #[test]
    fn picker_extensions_all_have_a_mime_type() {
        for extension in IMAGE_EXTENSIONS {
            assert!(mime_for_extension(extension).is_some(), "{extension}");
        }
    }
}
