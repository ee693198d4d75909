use resizer_core::{EventError, StorageError, TransformError};
use thiserror::Error;

/// 呼び出し全体を中断するエラー
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] EventError),

    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("storage access failed: {0}")]
    StorageAccess(String),

    #[error("object too large: {size} bytes (max {max})")]
    ObjectTooLarge { size: u64, max: u64 },

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),
}

impl InvocationError {
    /// レスポンスに載せるエラー種別
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEvent(_) => "MalformedEventError",
            Self::ObjectNotFound { .. } => "ObjectNotFoundError",
            Self::StorageAccess(_) => "StorageAccessError",
            Self::ObjectTooLarge { .. } => "ObjectTooLargeError",
            Self::UnsupportedImageFormat(_) => "UnsupportedImageFormatError",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedEvent(_) => 400,
            Self::ObjectNotFound { .. } => 404,
            Self::ObjectTooLarge { .. } => 413,
            Self::UnsupportedImageFormat(_) => 415,
            Self::StorageAccess(_) => 502,
        }
    }

    /// 呼び出し元（プラットフォーム）が再試行すべきか
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageAccess(_))
    }

    /// 取得時のストレージエラーを分類する
    pub fn from_fetch(err: StorageError, bucket: &str, key: &str) -> Self {
        match err {
            StorageError::NotFound { .. } => {
                tracing::warn!(bucket = %bucket, key = %key, "object not found");
                Self::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            }
            StorageError::TooLarge { size, max } => {
                tracing::warn!(bucket = %bucket, key = %key, size = size, max = max, "object too large");
                Self::ObjectTooLarge { size, max }
            }
            StorageError::Forbidden => {
                tracing::error!(bucket = %bucket, key = %key, "access denied (check the function role)");
                Self::StorageAccess(err.to_string())
            }
            StorageError::Timeout(_) | StorageError::Internal(_) => {
                tracing::error!(bucket = %bucket, key = %key, error = %err, "storage error");
                Self::StorageAccess(err.to_string())
            }
        }
    }
}

impl From<TransformError> for InvocationError {
    fn from(err: TransformError) -> Self {
        tracing::warn!(error = %err, "image could not be decoded");
        Self::UnsupportedImageFormat(err.to_string())
    }
}

/// バリアント単位のエラー（他のバリアントは中断しない）
#[derive(Debug, Clone, Error)]
pub enum VariantError {
    #[error("{0}")]
    SelfTriggerGuard(String),

    #[error("{0}")]
    Resize(String),

    #[error("{0}")]
    Encode(String),

    #[error("{0}")]
    Write(String),
}

impl VariantError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SelfTriggerGuard(_) => "SelfTriggerGuardError",
            Self::Resize(_) => "ResizeError",
            Self::Encode(_) => "EncodeError",
            Self::Write(_) => "WriteError",
        }
    }

    /// `<種別>: <詳細>` 形式の説明
    pub fn describe(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

impl From<TransformError> for VariantError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::EncodeFailed(msg) => Self::Encode(msg),
            other => Self::Resize(other.to_string()),
        }
    }
}

impl From<StorageError> for VariantError {
    fn from(err: StorageError) -> Self {
        Self::Write(err.to_string())
    }
}
