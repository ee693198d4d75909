use thiserror::Error;

/// イベント解析エラー
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event payload is not a recognised notification: {0}")]
    InvalidPayload(String),

    #[error("event contains no records")]
    NoRecords,

    #[error("missing or empty field: {0}")]
    MissingField(&'static str),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("unsupported event type: {0}")]
    UnsupportedEvent(String),
}

/// ストレージアクセスエラー
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("access denied")]
    Forbidden,

    #[error("object too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("storage operation timed out after {0}ms")]
    Timeout(u64),

    #[error("storage error: {0}")]
    Internal(String),
}

/// 画像変換エラー
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("image resolution exceeds maximum ({width}x{height})")]
    ResolutionTooLarge { width: u32, height: u32 },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("encode failed: {0}")]
    EncodeFailed(String),

    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("invalid variant `{variant}`: {reason}")]
    InvalidVariant { variant: String, reason: String },

    #[error("no resize variants configured")]
    NoVariants,
}

