//! Image intake and decoding into owned RGBA pixel buffers.

use std::path::Path;

use image::{ImageFormat, RgbaImage};

use crate::types::{ExtractionError, ExtractionResult, ImageBlob};

/// Fallback media type when none can be inferred.
const OCTET_STREAM: &str = "application/octet-stream";

impl ImageBlob {
    /// Read an image file, inferring the media type from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> ExtractionResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self::new(bytes, media_type_for_path(path), name))
    }

    /// Decode a base64 payload, optionally prefixed as a `data:` URL.
    pub fn from_base64(data: &str, mime: &str, name: impl Into<String>) -> ExtractionResult<Self> {
        use base64::Engine;

        let (payload, mime) = match data.strip_prefix("data:") {
            Some(rest) => {
                let (header, body) = rest.split_once(',').ok_or_else(|| {
                    ExtractionError::InvalidInput("Data URL is missing its payload".into())
                })?;
                let declared = header.strip_suffix(";base64").unwrap_or(header);
                let mime = if declared.is_empty() { mime } else { declared };
                (body, mime)
            }
            None => (data, mime),
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ExtractionError::InvalidInput(format!("Invalid base64: {e}")))?;

        Ok(Self::new(bytes, mime, name))
    }
}

/// Map a declared media type to a decoder format.
fn format_for_media_type(mime: &str) -> Option<ImageFormat> {
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/webp" => Some(ImageFormat::WebP),
        "image/gif" => Some(ImageFormat::Gif),
        "image/bmp" => Some(ImageFormat::Bmp),
        "image/tiff" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

/// Decode a blob into a freshly allocated RGBA buffer.
///
/// Nothing is shared between calls, so concurrent decodes never alias.
pub fn decode_blob(blob: &ImageBlob) -> ExtractionResult<RgbaImage> {
    let decode_failed = |reason: String| ExtractionError::DecodeFailed {
        name: blob.name.clone(),
        reason,
    };

    if blob.bytes.is_empty() {
        return Err(decode_failed("empty payload".into()));
    }

    let img = match format_for_media_type(&blob.media_type) {
        Some(fmt) => image::load_from_memory_with_format(&blob.bytes, fmt).or_else(|e| {
            tracing::debug!(
                "{} did not decode as declared {}: {e}; sniffing content",
                blob.name,
                blob.media_type
            );
            image::load_from_memory(&blob.bytes)
        }),
        None => image::load_from_memory(&blob.bytes),
    }
    .map_err(|e| decode_failed(e.to_string()))?;

    let rgba = img.to_rgba8();
    ensure_non_empty(&blob.name, &rgba)?;
    Ok(rgba)
}

/// Reject buffers with no pixels; every measurement needs `width, height > 0`.
pub(crate) fn ensure_non_empty(name: &str, rgba: &RgbaImage) -> ExtractionResult<()> {
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(ExtractionError::DecodeFailed {
            name: name.to_string(),
            reason: format!("image is {}x{}", rgba.width(), rgba.height()),
        });
    }
    Ok(())
}

/// Whether a path's extension names a format [`decode_blob`] understands.
pub fn is_supported_format(path: &str) -> bool {
    media_type_for_path(Path::new(path)) != OCTET_STREAM
}

/// Media type implied by a file extension.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{DynamicImage, Rgba};

    fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)));
        let mut buf = Vec::new();
        img.write_with_encoder(PngEncoder::new(&mut buf)).unwrap();
        buf
    }

    #[test]
    fn test_decode_png() {
        let blob = ImageBlob::new(png_bytes(3, 2, [10, 20, 30, 255]), "image/png", "a.png");
        let rgba = decode_blob(&blob).unwrap();
        assert_eq!(rgba.dimensions(), (3, 2));
        assert_eq!(rgba.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_wrong_media_type_falls_back_to_sniffing() {
        let blob = ImageBlob::new(png_bytes(2, 2, [0, 0, 0, 255]), "image/jpeg", "mislabeled");
        assert!(decode_blob(&blob).is_ok());
    }

    #[test]
    fn test_garbage_is_decode_failed() {
        let blob = ImageBlob::new(b"definitely not an image".to_vec(), "image/png", "bad.png");
        match decode_blob(&blob) {
            Err(ExtractionError::DecodeFailed { name, .. }) => assert_eq!(name, "bad.png"),
            other => panic!("expected DecodeFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_payload_is_decode_failed() {
        let blob = ImageBlob::new(Vec::new(), "image/png", "empty.png");
        assert!(matches!(
            decode_blob(&blob),
            Err(ExtractionError::DecodeFailed { .. })
        ));
    }

    #[test]
    fn test_from_base64_data_url() {
        use base64::Engine;
        let bytes = png_bytes(1, 1, [255, 0, 0, 255]);
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let url = format!("data:image/png;base64,{encoded}");

        let blob = ImageBlob::from_base64(&url, "application/octet-stream", "upload").unwrap();
        assert_eq!(blob.media_type, "image/png");
        assert_eq!(blob.bytes, bytes);
    }

    #[test]
    fn test_from_base64_rejects_invalid() {
        let result = ImageBlob::from_base64("!!!", "image/png", "x");
        assert!(matches!(result, Err(ExtractionError::InvalidInput(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("front.PNG");
        std::fs::write(&path, png_bytes(4, 4, [1, 2, 3, 255])).unwrap();

        let blob = ImageBlob::from_file(&path).unwrap();
        assert_eq!(blob.name, "front.PNG");
        assert_eq!(blob.media_type, "image/png");
        assert!(blob.byte_length() > 0);
    }

    #[test]
    fn test_extension_mapping_agrees_with_decoder() {
        let cases = [
            ("front.png", Some("image/png")),
            ("IMG_0001.JPG", Some("image/jpeg")),
            ("porch.jpeg", Some("image/jpeg")),
            ("yard.webp", Some("image/webp")),
            ("scan.TIF", Some("image/tiff")),
            ("listing.pdf", None),
            ("notes", None),
        ];
        for (path, expected) in cases {
            let media_type = media_type_for_path(Path::new(path));
            assert_eq!(is_supported_format(path), expected.is_some(), "{path}");
            match expected {
                Some(mime) => {
                    assert_eq!(media_type, mime, "{path}");
                    assert!(format_for_media_type(mime).is_some(), "{mime}");
                }
                None => assert_eq!(media_type, OCTET_STREAM, "{path}"),
            }
        }
    }

    #[test]
    fn test_zero_sized_buffer_rejected() {
        let err = ensure_non_empty("blank.png", &RgbaImage::new(0, 4)).unwrap_err();
        match err {
            ExtractionError::DecodeFailed { name, reason } => {
                assert_eq!(name, "blank.png");
                assert_eq!(reason, "image is 0x4");
            }
            other => panic!("expected DecodeFailed, got {other:?}"),
        }
        assert!(ensure_non_empty("one.png", &RgbaImage::new(1, 1)).is_ok());
    }
}
