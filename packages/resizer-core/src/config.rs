use crate::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_STORAGE_TIMEOUT_MS, MAX_CONCURRENCY, MAX_INPUT_SIZE,
};
use crate::errors::ConfigError;
use crate::guard::SelfTriggerGuard;
use crate::template::KeyTemplate;
use crate::transform::{FitMode, OutputFormat, TransformParams};
use crate::validation::validate_params;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

const DEFAULT_VARIANTS: &str =
    r#"[{"name":"thumb","width":100,"height":100,"fit":"crop-to-fill"}]"#;

/// 出力バリアントの定義
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResizeSpec {
    pub name: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fit: FitMode,
    /// 未指定なら元画像のフォーマットを維持する
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default)]
    pub key_template: KeyTemplate,
}

impl ResizeSpec {
    pub fn params(&self) -> TransformParams {
        TransformParams::new(self.width, self.height, self.fit, self.format, self.quality)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidVariant {
            variant: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid("name may only contain [A-Za-z0-9_-]".to_string()));
        }

        validate_params(&self.params()).map_err(|e| invalid(e.to_string()))
    }
}

/// ハンドラ設定
///
/// コールドスタート時に一度だけ読み込み、以降は変更しない
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub variants: Vec<ResizeSpec>,
    /// 出力先バケット（未指定なら元バケット）
    pub output_bucket: Option<String>,
    pub guard: SelfTriggerGuard,
    pub concurrency: usize,
    pub storage_timeout: Duration,
    pub max_input_size: u64,
    /// 再試行可能なエラーを Lambda のエラーとして返すか
    pub fail_on_retryable: bool,
}

impl HandlerConfig {
    /// 環境変数から設定を読み込む
    ///
    /// - RESIZE_VARIANTS: バリアント定義の JSON 配列
    /// - OUTPUT_BUCKET
    /// - WATCH_PREFIXES: カンマ区切り
    /// - RESIZE_CONCURRENCY
    /// - STORAGE_TIMEOUT_MS
    /// - MAX_INPUT_BYTES
    /// - FAIL_ON_RETRYABLE
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let variants_json = get("RESIZE_VARIANTS");
        let variants = parse_variants(variants_json.as_deref().unwrap_or(DEFAULT_VARIANTS))?;

        let output_bucket = get("OUTPUT_BUCKET").map(|v| v.trim().to_string());

        let watched_prefixes: Vec<String> = get("WATCH_PREFIXES")
            .map(|v| v.split(',').map(|p| p.trim().to_string()).collect())
            .unwrap_or_default();

        let concurrency = parse_number(
            "RESIZE_CONCURRENCY",
            get("RESIZE_CONCURRENCY"),
            DEFAULT_CONCURRENCY,
        )?;
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidValue {
                name: "RESIZE_CONCURRENCY",
                reason: format!("must be 1-{MAX_CONCURRENCY}, got {concurrency}"),
            });
        }

        let timeout_ms = parse_number(
            "STORAGE_TIMEOUT_MS",
            get("STORAGE_TIMEOUT_MS"),
            DEFAULT_STORAGE_TIMEOUT_MS,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "STORAGE_TIMEOUT_MS",
                reason: "must be greater than 0".to_string(),
            });
        }

        let max_input_size = parse_number("MAX_INPUT_BYTES", get("MAX_INPUT_BYTES"), MAX_INPUT_SIZE)?;

        let fail_on_retryable = match get("FAIL_ON_RETRYABLE") {
            None => false,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(ConfigError::InvalidValue {
                        name: "FAIL_ON_RETRYABLE",
                        reason: format!("expected a boolean, got `{other}`"),
                    });
                }
            },
        };

        Ok(Self {
            variants,
            output_bucket,
            guard: SelfTriggerGuard::new(watched_prefixes),
            concurrency,
            storage_timeout: Duration::from_millis(timeout_ms),
            max_input_size,
            fail_on_retryable,
        })
    }

    /// バリアントだけを指定して、その他はデフォルトの設定を作る
    pub fn with_variants(variants: Vec<ResizeSpec>) -> Result<Self, ConfigError> {
        validate_variants(&variants)?;

        Ok(Self {
            variants,
            output_bucket: None,
            guard: SelfTriggerGuard::default(),
            concurrency: DEFAULT_CONCURRENCY,
            storage_timeout: Duration::from_millis(DEFAULT_STORAGE_TIMEOUT_MS),
            max_input_size: MAX_INPUT_SIZE,
            fail_on_retryable: false,
        })
    }

    /// 出力先バケットを決定する
    pub fn output_bucket_for<'a>(&'a self, source_bucket: &'a str) -> &'a str {
        self.output_bucket.as_deref().unwrap_or(source_bucket)
    }
}

/// バリアント定義の JSON 配列を解析する
pub fn parse_variants(json: &str) -> Result<Vec<ResizeSpec>, ConfigError> {
    let variants: Vec<ResizeSpec> =
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidValue {
            name: "RESIZE_VARIANTS",
            reason: e.to_string(),
        })?;

    validate_variants(&variants)?;
    Ok(variants)
}

fn validate_variants(variants: &[ResizeSpec]) -> Result<(), ConfigError> {
    if variants.is_empty() {
        return Err(ConfigError::NoVariants);
    }

    let mut names = HashSet::new();
    for spec in variants {
        spec.validate()?;
        if !names.insert(spec.name.as_str()) {
            return Err(ConfigError::InvalidVariant {
                variant: spec.name.clone(),
                reason: "duplicate variant name".to_string(),
            });
        }
    }

    Ok(())
}

fn parse_number<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            reason: e.to_string(),
        }),
    }
}
