use crate::constants::MAX_PIXELS;
use crate::errors::TransformError;
use crate::transform::dimensions::ResizePlan;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;

/// 画像をリサイズする
///
/// fast_image_resize の Lanczos3 畳み込みで高品質にリサンプルする。
/// 切り抜き領域がある場合は、その領域だけを出力サイズに拡縮する。
/// アルファチャンネルを持つ画像は RGBA のまま処理する。
pub fn resize_image(img: &DynamicImage, plan: &ResizePlan) -> Result<DynamicImage, TransformError> {
    let (target_w, target_h) = (plan.width, plan.height);

    // ピクセル数チェック
    let total_pixels = target_w as u64 * target_h as u64;
    if total_pixels > MAX_PIXELS {
        return Err(TransformError::ResolutionTooLarge {
            width: target_w,
            height: target_h,
        });
    }

    let has_alpha = img.color().has_alpha();
    let (width, height) = (img.width(), img.height());
    let (pixels, pixel_type) = if has_alpha {
        (img.to_rgba8().into_raw(), PixelType::U8x4)
    } else {
        (img.to_rgb8().into_raw(), PixelType::U8x3)
    };

    let src_image = Image::from_vec_u8(width, height, pixels, pixel_type)
        .map_err(|e| TransformError::ProcessingFailed(format!("failed to create source image: {e}")))?;

    let mut dst_image = Image::new(target_w, target_h, pixel_type);

    let mut options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    if let Some(region) = plan.crop {
        options = options.crop(region.left, region.top, region.width, region.height);
    }

    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| TransformError::ProcessingFailed(format!("resize failed: {e}")))?;

    let raw = dst_image.into_vec();
    let resized = if has_alpha {
        image::RgbaImage::from_raw(target_w, target_h, raw).map(DynamicImage::ImageRgba8)
    } else {
        image::RgbImage::from_raw(target_w, target_h, raw).map(DynamicImage::ImageRgb8)
    };

    resized.ok_or_else(|| TransformError::ProcessingFailed("failed to convert resized image".to_string()))
}
