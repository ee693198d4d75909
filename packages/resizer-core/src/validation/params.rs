use crate::constants::MAX_DIMENSION;
use crate::errors::TransformError;
use crate::transform::{FitMode, TransformParams};

/// 変換パラメータを検証する
pub fn validate_params(params: &TransformParams) -> Result<(), TransformError> {
    // 品質の検証
    let q = params.quality;
    if q == 0 || q > 100 {
        return Err(TransformError::InvalidParams(format!(
            "quality must be 1-100, got {q}"
        )));
    }

    // 幅の検証
    if let Some(w) = params.width
        && (w == 0 || w > MAX_DIMENSION)
    {
        return Err(TransformError::InvalidParams(format!(
            "width must be 1-{MAX_DIMENSION}, got {w}"
        )));
    }

    // 高さの検証
    if let Some(h) = params.height
        && (h == 0 || h > MAX_DIMENSION)
    {
        return Err(TransformError::InvalidParams(format!(
            "height must be 1-{MAX_DIMENSION}, got {h}"
        )));
    }

    match (params.fit, params.width, params.height) {
        (_, None, None) => Err(TransformError::InvalidParams(
            "at least one of width or height is required".to_string(),
        )),
        (FitMode::CropToFill, Some(_), None) | (FitMode::CropToFill, None, Some(_)) => Err(
            TransformError::InvalidParams("crop-to-fill requires both width and height".to_string()),
        ),
        _ => Ok(()),
    }
}
