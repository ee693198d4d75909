use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::pipeline::ImageTransformHandler;
use crate::response::HandlerResponse;

/// Lambda から呼ばれるエントリポイント
///
/// 失敗も構造化レスポンスとして返す。FAIL_ON_RETRYABLE が有効な場合のみ、
/// 再試行可能な失敗を Lambda のエラーにしてプラットフォームの再試行に任せる。
pub async fn function_handler(
    event: LambdaEvent<Value>,
    handler: &ImageTransformHandler,
) -> Result<HandlerResponse, Error> {
    let (payload, context) = event.into_parts();
    let remaining = remaining_time(context.deadline);

    tracing::info!(
        request_id = %context.request_id,
        remaining_ms = remaining.map(|d| d.as_millis() as u64),
        "invocation received"
    );

    let response = handler.handle_payload(payload, remaining).await;

    if response.retryable && handler.config().fail_on_retryable {
        let kind = response.error_kind.as_deref().unwrap_or("UnknownError");
        return Err(format!("{kind}: {}", response.body).into());
    }

    Ok(response)
}

/// Lambda の期限（エポックミリ秒）から残り時間を求める
fn remaining_time(deadline_ms: u64) -> Option<Duration> {
    if deadline_ms == 0 {
        return None;
    }

    let deadline = UNIX_EPOCH + Duration::from_millis(deadline_ms);
    Some(
        deadline
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_time() {
        assert_eq!(remaining_time(0), None);

        // 過去の期限は 0
        assert_eq!(remaining_time(1), Some(Duration::ZERO));

        let in_a_minute = SystemTime::now() + Duration::from_secs(60);
        let deadline_ms = in_a_minute.duration_since(UNIX_EPOCH).unwrap().as_millis() as u64;
        let remaining = remaining_time(deadline_ms).unwrap();
        assert!(remaining > Duration::from_secs(50));
        assert!(remaining <= Duration::from_secs(60));
    }
}
