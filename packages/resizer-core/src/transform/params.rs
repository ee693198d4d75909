use crate::constants::DEFAULT_QUALITY;
use image::ImageFormat;
use serde::Deserialize;

/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl OutputFormat {
    /// 文字列から OutputFormat を作成
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// デコード時に判定した元フォーマットから出力フォーマットを決める
    ///
    /// エンコーダを持たないフォーマット（GIF/BMP/TIFF など）はロスレスの PNG に寄せる。
    /// AVIF はエンコードのみ対応（デコーダを組み込んでいない）ので、元画像としては現れない。
    pub fn from_source(format: Option<ImageFormat>) -> Self {
        match format {
            Some(ImageFormat::Jpeg) => Self::Jpeg,
            Some(ImageFormat::WebP) => Self::WebP,
            _ => Self::Png,
        }
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    /// 出力キーに使う拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| format!("unknown output format `{value}`"))
    }
}

/// アスペクト比の合わせ方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// 指定領域に収まるよう縮小する（拡大しない）
    #[default]
    FitInside,
    /// 指定サイズを埋めるよう拡縮し、中央を切り抜く
    CropToFill,
}

/// 変換パラメータ
#[derive(Debug, Clone)]
pub struct TransformParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
    /// None の場合は元画像のフォーマットを維持する
    pub format: Option<OutputFormat>,
    pub quality: u8,
}

impl TransformParams {
    pub fn new(
        width: Option<u32>,
        height: Option<u32>,
        fit: FitMode,
        format: Option<OutputFormat>,
        quality: Option<u8>,
    ) -> Self {
        Self {
            width,
            height,
            fit,
            format,
            quality: quality.unwrap_or(DEFAULT_QUALITY),
        }
    }

    /// 実際に使う出力フォーマットを決定する
    pub fn output_format(&self, source: Option<ImageFormat>) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_source(source))
    }
}
