use crate::error::{InvocationError, VariantError};
use resizer_core::NotificationEvent;
use serde::{Deserialize, Serialize};

const SUCCESS_BODY: &str = "Image resized successfully!";

/// 呼び出し全体の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    PartialSuccess,
    /// 自身が書き込んだオブジェクトの通知なので何もしていない
    Skipped,
    Error,
}

/// バリアント単位の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceObject {
    pub bucket: String,
    pub key: String,
}

/// バリアント単位の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantResult {
    pub name: String,
    pub output_key: String,
    pub status: VariantStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl VariantResult {
    pub fn succeeded(
        name: &str,
        output_key: &str,
        width: u32,
        height: u32,
        content_type: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            output_key: output_key.to_string(),
            status: VariantStatus::Succeeded,
            error: None,
            width: Some(width),
            height: Some(height),
            content_type: Some(content_type.to_string()),
        }
    }

    pub fn failed(name: &str, output_key: &str, err: &VariantError) -> Self {
        Self {
            name: name.to_string(),
            output_key: output_key.to_string(),
            status: VariantStatus::Failed,
            error: Some(err.describe()),
            width: None,
            height: None,
            content_type: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == VariantStatus::Succeeded
    }
}

/// ハンドラのレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub status: ResponseStatus,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceObject>,
    pub variants: Vec<VariantResult>,
}

impl HandlerResponse {
    /// バリアントの結果を集約する
    ///
    /// 全て成功なら 200、1 つでも失敗があれば 207 (partial_success)
    pub fn from_results(event: &NotificationEvent, variants: Vec<VariantResult>) -> Self {
        let failed = variants.iter().filter(|v| !v.is_success()).count();

        let (status_code, status, body) = if failed == 0 {
            (200, ResponseStatus::Success, SUCCESS_BODY.to_string())
        } else {
            (
                207,
                ResponseStatus::PartialSuccess,
                format!("{failed} of {} variants failed", variants.len()),
            )
        };

        Self {
            status_code,
            status,
            body,
            error_kind: None,
            retryable: false,
            source: Some(source_of(event)),
            variants,
        }
    }

    /// 生成物の通知を処理せずに終える
    pub fn skipped(event: &NotificationEvent, variant: &str) -> Self {
        Self {
            status_code: 200,
            status: ResponseStatus::Skipped,
            body: format!("skipped derived object (variant `{variant}`)"),
            error_kind: None,
            retryable: false,
            source: Some(source_of(event)),
            variants: Vec::new(),
        }
    }

    /// 呼び出し全体のエラーをレスポンスにする
    pub fn from_error(err: &InvocationError, event: Option<&NotificationEvent>) -> Self {
        Self {
            status_code: err.status_code(),
            status: ResponseStatus::Error,
            body: err.to_string(),
            error_kind: Some(err.kind().to_string()),
            retryable: err.is_retryable(),
            source: event.map(source_of),
            variants: Vec::new(),
        }
    }
}

fn source_of(event: &NotificationEvent) -> SourceObject {
    SourceObject {
        bucket: event.bucket.clone(),
        key: event.key.clone(),
    }
}
