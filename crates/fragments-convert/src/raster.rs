//! Image transcoding between the supported raster formats.
//!
//! The payload is decoded as the format its fragment declares and re-encoded
//! as the target. JPEG output drops the alpha channel; WebP output is
//! lossless. Either the whole transcode succeeds or an error is returned: no
//! partial output ever escapes.

use std::io::Cursor;

use bytes::Bytes;
use fragments_types::SupportedType;
use image::{DynamicImage, ImageFormat};

use crate::error::{ConversionError, ConvertResult};

fn image_format(t: SupportedType) -> Option<ImageFormat> {
    match t {
        SupportedType::ImagePng => Some(ImageFormat::Png),
        SupportedType::ImageJpeg => Some(ImageFormat::Jpeg),
        SupportedType::ImageWebp => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Transcode `payload` from `from` to `to`.
///
/// Both types must be images; anything else is [`ConversionError::CrossFamily`].
pub fn transcode(payload: &[u8], from: SupportedType, to: SupportedType) -> ConvertResult<Bytes> {
    let fail = |reason: String| ConversionError::TranscodeFailed { from, to, reason };

    let (Some(src), Some(dst)) = (image_format(from), image_format(to)) else {
        return Err(ConversionError::CrossFamily { from, to });
    };

    // Sniff the magic bytes so a mislabelled payload reports what it is.
    if let Some(kind) = infer::get(payload) {
        if kind.mime_type() != from.essence() {
            return Err(fail(format!(
                "payload is {}, not {}",
                kind.mime_type(),
                from.essence()
            )));
        }
    }

    let decoded = image::load_from_memory_with_format(payload, src)
        .map_err(|e| fail(format!("decode: {e}")))?;

    let prepared = match dst {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        ImageFormat::WebP => DynamicImage::ImageRgba8(decoded.to_rgba8()),
        _ => decoded,
    };

    let mut out = Cursor::new(Vec::new());
    prepared
        .write_to(&mut out, dst)
        .map_err(|e| fail(format!("encode: {e}")))?;

    tracing::debug!(%from, %to, in_bytes = payload.len(), out_bytes = out.get_ref().len(), "transcoded image");
    Ok(Bytes::from(out.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 3, Rgba([200, 30, 60, 128]));
        let img = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn png_to_jpeg_is_decodable() {
        let png = encode(ImageFormat::Png);
        let jpg = transcode(&png, SupportedType::ImagePng, SupportedType::ImageJpeg).unwrap();

        assert_eq!(infer::get(&jpg).unwrap().mime_type(), "image/jpeg");
        let back = image::load_from_memory_with_format(&jpg, ImageFormat::Jpeg).unwrap();
        assert_eq!(back.dimensions(), (4, 3));
    }

    #[test]
    fn jpeg_to_png_and_webp() {
        let jpg = encode(ImageFormat::Jpeg);

        let png = transcode(&jpg, SupportedType::ImageJpeg, SupportedType::ImagePng).unwrap();
        assert_eq!(infer::get(&png).unwrap().mime_type(), "image/png");

        let webp = transcode(&jpg, SupportedType::ImageJpeg, SupportedType::ImageWebp).unwrap();
        assert_eq!(infer::get(&webp).unwrap().mime_type(), "image/webp");
        let back = image::load_from_memory_with_format(&webp, ImageFormat::WebP).unwrap();
        assert_eq!(back.dimensions(), (4, 3));
    }

    #[test]
    fn garbage_payload_fails_cleanly() {
        let err = transcode(b"definitely not a png", SupportedType::ImagePng, SupportedType::ImageJpeg)
            .unwrap_err();
        assert!(matches!(err, ConversionError::TranscodeFailed { .. }));
    }

    #[test]
    fn mislabelled_payload_is_reported() {
        let jpg = encode(ImageFormat::Jpeg);
        let err = transcode(&jpg, SupportedType::ImagePng, SupportedType::ImageWebp).unwrap_err();
        match err {
            ConversionError::TranscodeFailed { reason, .. } => assert!(reason.contains("image/jpeg")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_image_types_are_cross_family() {
        let err = transcode(b"x", SupportedType::TextPlain, SupportedType::ImagePng).unwrap_err();
        assert!(matches!(err, ConversionError::CrossFamily { .. }));
    }
}
