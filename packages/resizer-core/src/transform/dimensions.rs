use crate::transform::params::FitMode;

/// FitInside で寸法を決める辺
enum BindingEdge {
    Width(u32),
    Height(u32),
}

/// `edge * num / den` を四捨五入する（最小 1px）
fn scale_edge(edge: u32, num: u32, den: u32) -> u32 {
    let den = den as u64;
    let scaled = (edge as u64 * num as u64 + den / 2) / den;
    scaled.max(1) as u32
}

/// FitInside モードの寸法を計算する
///
/// アスペクト比を維持したまま指定領域に収める。元画像より大きくはしない。
/// 比較は整数の交差乗算で行うため、割り切れる比率では誤差が出ない。
pub fn calculate_fit_inside_dimensions(
    src_w: u32,
    src_h: u32,
    target_w: Option<u32>,
    target_h: Option<u32>,
) -> (u32, u32) {
    let edge = match (target_w, target_h) {
        // target_w / src_w <= target_h / src_h なら幅で決まる
        (Some(w), Some(h)) if w as u64 * src_h as u64 <= h as u64 * src_w as u64 => {
            BindingEdge::Width(w)
        }
        (_, Some(h)) => BindingEdge::Height(h),
        (Some(w), None) => BindingEdge::Width(w),
        (None, None) => return (src_w, src_h),
    };

    match edge {
        BindingEdge::Width(w) if w < src_w => (w, scale_edge(src_h, w, src_w)),
        BindingEdge::Height(h) if h < src_h => (scale_edge(src_w, h, src_h), h),
        _ => (src_w, src_h),
    }
}

/// 元画像上の切り抜き領域（ピクセル座標、小数を許容）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// CropToFill モードの切り抜き領域を計算する
///
/// 出力が target_w x target_h をちょうど埋める倍率を選び、
/// その倍率ではみ出す部分を左右（または上下）均等に落とす
pub fn calculate_crop_to_fill_region(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> CropRegion {
    // 幅基準の倍率 >= 高さ基準の倍率 なら幅をそのまま使い、上下を落とす
    let width_bound = target_w as u64 * src_h as u64 >= target_h as u64 * src_w as u64;

    let (width, height) = if width_bound {
        (src_w as f64, src_w as f64 * target_h as f64 / target_w as f64)
    } else {
        (src_h as f64 * target_w as f64 / target_h as f64, src_h as f64)
    };

    CropRegion {
        left: (src_w as f64 - width) / 2.0,
        top: (src_h as f64 - height) / 2.0,
        width,
        height,
    }
}

/// リサイズ計画
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizePlan {
    pub width: u32,
    pub height: u32,
    pub crop: Option<CropRegion>,
}

impl ResizePlan {
    /// 元画像のまま出力できるか
    pub fn is_identity(&self, src_w: u32, src_h: u32) -> bool {
        self.crop.is_none() && self.width == src_w && self.height == src_h
    }
}

/// フィットモードに従って出力寸法を決める
///
/// CropToFill は幅・高さの両方が必要。片方しかない場合は FitInside と同じ扱いになる
pub fn plan_resize(
    src_w: u32,
    src_h: u32,
    target_w: Option<u32>,
    target_h: Option<u32>,
    fit: FitMode,
) -> ResizePlan {
    match (fit, target_w, target_h) {
        (FitMode::CropToFill, Some(w), Some(h)) => {
            let region = calculate_crop_to_fill_region(src_w, src_h, w, h);
            let untouched = region.width == src_w as f64 && region.height == src_h as f64;
            ResizePlan {
                width: w,
                height: h,
                crop: (!untouched).then_some(region),
            }
        }
        _ => {
            let (width, height) = calculate_fit_inside_dimensions(src_w, src_h, target_w, target_h);
            ResizePlan {
                width,
                height,
                crop: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_edge_rounds_and_clamps() {
        assert_eq!(scale_edge(1080, 800, 1920), 450);
        assert_eq!(scale_edge(1920, 600, 1080), 1067);
        // 最小 1px
        assert_eq!(scale_edge(10, 1, 1000), 1);
    }

    #[test]
    fn test_fit_inside_binding_edge() {
        // 横長画像を正方形に: 幅で決まる
        assert_eq!(calculate_fit_inside_dimensions(1000, 500, Some(400), Some(400)), (400, 200));
        // 縦長画像を正方形に: 高さで決まる
        assert_eq!(calculate_fit_inside_dimensions(500, 1000, Some(400), Some(400)), (200, 400));
        // 片方だけ大きい指定でも拡大しない
        assert_eq!(calculate_fit_inside_dimensions(100, 50, Some(200), None), (100, 50));
        assert_eq!(calculate_fit_inside_dimensions(100, 50, None, Some(100)), (100, 50));
    }

    #[test]
    fn test_calculate_fit_inside_dimensions() {
        // 両方指定
        let (w, h) = calculate_fit_inside_dimensions(1920, 1080, Some(800), Some(600));
        assert_eq!(w, 800);
        assert_eq!(h, 450);

        // 幅のみ
        let (w, h) = calculate_fit_inside_dimensions(1920, 1080, Some(800), None);
        assert_eq!(w, 800);
        assert_eq!(h, 450);

        // 高さのみ
        let (w, h) = calculate_fit_inside_dimensions(1920, 1080, None, Some(600));
        assert_eq!(w, 1067);
        assert_eq!(h, 600);

        // 指定なし
        let (w, h) = calculate_fit_inside_dimensions(1920, 1080, None, None);
        assert_eq!(w, 1920);
        assert_eq!(h, 1080);
    }

    #[test]
    fn test_fit_inside_never_upscales() {
        let plan = plan_resize(400, 200, Some(100), Some(100), FitMode::FitInside);
        assert_eq!((plan.width, plan.height), (100, 50));
        assert!(plan.crop.is_none());

        let plan = plan_resize(50, 40, Some(100), Some(100), FitMode::FitInside);
        assert_eq!((plan.width, plan.height), (50, 40));
        assert!(plan.is_identity(50, 40));
    }

    #[test]
    fn test_crop_to_fill_region_landscape() {
        // 横長 400x200 を正方形に: 中央の 200x200 を使う
        let region = calculate_crop_to_fill_region(400, 200, 100, 100);
        assert_eq!(region.left, 100.0);
        assert_eq!(region.top, 0.0);
        assert_eq!(region.width, 200.0);
        assert_eq!(region.height, 200.0);
    }

    #[test]
    fn test_crop_to_fill_region_portrait() {
        let region = calculate_crop_to_fill_region(300, 900, 200, 100);
        assert_eq!(region.width, 300.0);
        assert_eq!(region.height, 150.0);
        assert_eq!(region.left, 0.0);
        assert_eq!(region.top, 375.0);
    }

    #[test]
    fn test_crop_to_fill_exact_dimensions() {
        let plan = plan_resize(400, 200, Some(100), Some(100), FitMode::CropToFill);
        assert_eq!((plan.width, plan.height), (100, 100));
        assert!(plan.crop.is_some());

        // 拡大も許可する
        let plan = plan_resize(40, 20, Some(100), Some(100), FitMode::CropToFill);
        assert_eq!((plan.width, plan.height), (100, 100));
    }

    #[test]
    fn test_crop_to_fill_same_aspect_has_no_crop() {
        let plan = plan_resize(400, 200, Some(200), Some(100), FitMode::CropToFill);
        assert_eq!((plan.width, plan.height), (200, 100));
        assert!(plan.crop.is_none());
    }

    #[test]
    fn test_crop_to_fill_single_dimension_falls_back() {
        let plan = plan_resize(400, 200, Some(100), None, FitMode::CropToFill);
        assert_eq!((plan.width, plan.height), (100, 50));
        assert!(plan.crop.is_none());
    }
}
