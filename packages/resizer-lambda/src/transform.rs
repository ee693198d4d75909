use bytes::Bytes;
use image::DynamicImage;
use std::borrow::Cow;

use resizer_core::{
    encode_image, plan_resize, resize_image, DecodedImage, OutputFormat, TransformError,
    TransformParams, MAX_DIMENSION,
};

/// 1 バリアント分の変換結果
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    pub bytes: Bytes,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl RenderedVariant {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// デコード済み画像から 1 バリアントを生成する。
///
/// メタデータ (EXIF/XMP) はデコード・エンコードサイクルで削除される。
/// 寸法が変わらない場合もメタデータ削除とフォーマット変換のため必ずエンコードする。
pub fn render_variant(
    decoded: &DecodedImage,
    params: &TransformParams,
    format: OutputFormat,
) -> Result<RenderedVariant, TransformError> {
    let (src_w, src_h) = decoded.dimensions();
    let plan = plan_resize(src_w, src_h, params.width, params.height, params.fit);
    validate_output_dimensions(plan.width, plan.height)?;

    let resized: Cow<'_, DynamicImage> = if plan.is_identity(src_w, src_h) {
        Cow::Borrowed(&decoded.image)
    } else {
        Cow::Owned(resize_image(&decoded.image, &plan)?)
    };

    let output_bytes = encode_image(&resized, format, params.quality)?;

    Ok(RenderedVariant {
        bytes: Bytes::from(output_bytes),
        format,
        width: plan.width,
        height: plan.height,
    })
}

/// 出力画像のサイズを検証する
fn validate_output_dimensions(width: u32, height: u32) -> Result<(), TransformError> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(TransformError::ResolutionTooLarge { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use resizer_core::{decode_image, FitMode};
    use std::io::Cursor;

    fn decoded(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            image: DynamicImage::new_rgb8(width, height),
            format: Some(ImageFormat::Jpeg),
        }
    }

    #[test]
    fn test_fit_inside_400x200() {
        let params = TransformParams::new(Some(100), Some(100), FitMode::FitInside, None, None);
        let out = render_variant(&decoded(400, 200), &params, OutputFormat::Png).unwrap();

        assert_eq!((out.width, out.height), (100, 50));
        let image = decode_image(&out.bytes).unwrap();
        assert_eq!(image.dimensions(), (100, 50));
    }

    #[test]
    fn test_crop_to_fill_400x200() {
        let params = TransformParams::new(Some(100), Some(100), FitMode::CropToFill, None, None);
        let out = render_variant(&decoded(400, 200), &params, OutputFormat::Jpeg).unwrap();

        assert_eq!((out.width, out.height), (100, 100));
        assert_eq!(out.content_type(), "image/jpeg");
        let image = decode_image(&out.bytes).unwrap();
        assert_eq!(image.dimensions(), (100, 100));
        assert_eq!(image.format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_small_source_is_reencoded() {
        let params = TransformParams::new(Some(100), Some(100), FitMode::FitInside, None, None);
        let out = render_variant(&decoded(40, 30), &params, OutputFormat::WebP).unwrap();

        assert_eq!((out.width, out.height), (40, 30));
        assert_eq!(&out.bytes[0..4], b"RIFF");
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image::RgbImage::from_fn(320, 240, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
        let source = decode_image(buf.get_ref()).unwrap();

        let params = TransformParams::new(Some(64), Some(64), FitMode::CropToFill, None, Some(75));
        let first = render_variant(&source, &params, OutputFormat::Jpeg).unwrap();
        let second = render_variant(&source, &params, OutputFormat::Jpeg).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }
}
