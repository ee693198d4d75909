use crate::errors::TransformError;
use crate::transform::params::OutputFormat;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageResult};
use std::io::Cursor;

/// AVIF エンコード速度（1: 最遅・高圧縮 〜 10: 最速）
const AVIF_SPEED: u8 = 4;

/// 画像をエンコードする
///
/// 同じ画像・同じパラメータからは常に同じバイト列が得られる
/// （再実行時に同じキーへ同じ内容を書き戻すため）
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, TransformError> {
    let mut buf = Cursor::new(Vec::new());

    write_encoded(img, format, quality, &mut buf)
        .map_err(|e| TransformError::EncodeFailed(format!("{format:?} encode failed: {e}")))?;

    Ok(buf.into_inner())
}

fn write_encoded(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
    buf: &mut Cursor<Vec<u8>>,
) -> ImageResult<()> {
    match format {
        // JPEG はアルファを持てない
        OutputFormat::Jpeg => img
            .to_rgb8()
            .write_with_encoder(JpegEncoder::new_with_quality(buf, quality)),
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new_with_quality(
            buf,
            CompressionType::Best,
            FilterType::Adaptive,
        )),
        // ロスレスのみ（quality は使わない）
        OutputFormat::WebP => img.write_with_encoder(WebPEncoder::new_lossless(buf)),
        OutputFormat::Avif => {
            img.write_with_encoder(AvifEncoder::new_with_speed_quality(buf, AVIF_SPEED, quality))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(32, 32, |x, y| {
            Rgba([(x * 8) as u8, (y * 8) as u8, 128, 255])
        }))
    }

    #[test]
    fn test_encoded_signatures() {
        let cases: [(OutputFormat, &[u8]); 3] = [
            (OutputFormat::Jpeg, &[0xFF, 0xD8]),
            (OutputFormat::Png, &[0x89, b'P', b'N', b'G']),
            (OutputFormat::WebP, b"RIFF"),
        ];

        for (format, signature) in cases {
            // RGBA 入力でも JPEG は RGB に落として書ける
            let data = encode_image(&gradient(), format, 80).unwrap();
            assert!(data.starts_with(signature), "{format:?} signature mismatch");
        }
    }

    #[test]
    fn test_encode_avif() {
        let data = encode_image(&DynamicImage::new_rgb8(16, 16), OutputFormat::Avif, 60).unwrap();
        // ISO BMFF の ftyp ボックス
        assert_eq!(&data[4..8], b"ftyp");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let img = gradient();

        for format in [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::WebP] {
            let first = encode_image(&img, format, 80).unwrap();
            let second = encode_image(&img, format, 80).unwrap();
            assert_eq!(first, second, "{format:?} output differs between runs");
        }
    }

    #[test]
    fn test_lower_quality_produces_smaller_jpeg() {
        let img = gradient();
        let high = encode_image(&img, OutputFormat::Jpeg, 95).unwrap();
        let low = encode_image(&img, OutputFormat::Jpeg, 10).unwrap();
        assert!(low.len() < high.len());
    }
}
