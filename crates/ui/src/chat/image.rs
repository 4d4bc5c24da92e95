use std::sync::Arc;

use gpui::{Image, ImageFormat};
use murmur_core::attachment::decode_data_url;

/// Decodes a stored `data:` URL into an image gpui can paint.
pub fn image_from_data_url(data_url: &str) -> Option<Arc<Image>> {
    let (mime, bytes) = decode_data_url(data_url)?;
    let format = image_format_for_mime(mime)?;
    Some(Arc::new(Image::from_bytes(format, bytes)))
}

fn image_format_for_mime(mime: &str) -> Option<ImageFormat> {
    Some(match mime {
        "image/png" => ImageFormat::Png,
        "image/jpeg" => ImageFormat::Jpeg,
        "image/gif" => ImageFormat::Gif,
        "image/webp" => ImageFormat::Webp,
        "image/bmp" => ImageFormat::Bmp,
        "image/svg+xml" => ImageFormat::Svg,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn known_image_types_map_to_formats() {
        assert!(matches!(
            image_format_for_mime("image/png"),
            Some(ImageFormat::Png)
        ));
        assert!(matches!(
            image_format_for_mime("image/svg+xml"),
            Some(ImageFormat::Svg)
        ));
        assert!(image_format_for_mime("text/plain").is_none());
    }

    #[::core::prelude::v1::test]
    fn malformed_urls_yield_no_image() {
        assert!(image_from_data_url("data:text/plain;base64,YWJj").is_none());
        assert!(image_from_data_url("not a data url").is_none());
        assert!(image_from_data_url("data:image/png;base64,YWJj").is_some());
    }
}
