use crate::constants::MAX_PIXELS;
use crate::errors::TransformError;
use crate::transform::orientation::Orientation;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// デコード済みの元画像
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// EXIF Orientation を適用済みの画像
    pub image: DynamicImage,
    /// マジックバイトから判定した元フォーマット
    pub format: Option<ImageFormat>,
}

impl DecodedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// 画像バイト列をデコードする
///
/// フォーマットは拡張子ではなく内容から判定する。判定できない・デコードできない・
/// 大きすぎる画像は UnsupportedFormat として扱う（再試行しても結果は変わらない）。
pub fn decode_image(input: &[u8]) -> Result<DecodedImage, TransformError> {
    decode_within(input, MAX_PIXELS)
}

fn decode_within(input: &[u8], max_pixels: u64) -> Result<DecodedImage, TransformError> {
    let reader = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| TransformError::UnsupportedFormat(format!("failed to guess format: {e}")))?;

    let Some(format) = reader.format() else {
        return Err(TransformError::UnsupportedFormat(
            "unrecognised image data".to_string(),
        ));
    };

    // ヘッダだけを読んで寸法を確認し、ピクセルを確保する前に弾く
    let (width, height) = ImageReader::with_format(Cursor::new(input), format)
        .into_dimensions()
        .map_err(|e| TransformError::UnsupportedFormat(format!("failed to read header: {e}")))?;
    if width as u64 * height as u64 > max_pixels {
        return Err(TransformError::UnsupportedFormat(format!(
            "source resolution {width}x{height} exceeds maximum pixel count"
        )));
    }

    let img = reader
        .decode()
        .map_err(|e| TransformError::UnsupportedFormat(format!("decode failed: {e}")))?;

    let image = Orientation::from_exif(input).apply(img);

    Ok(DecodedImage {
        image,
        format: Some(format),
    })
}
