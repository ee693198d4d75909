use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use resizer_core::{
    decode_image, DecodedImage, HandlerConfig, NotificationEvent, ObjectStorage, OutputFormat,
    ResizeSpec, StorageError, StoredObject,
};

use crate::error::{InvocationError, VariantError};
use crate::response::{HandlerResponse, VariantResult};
use crate::transform::render_variant;

/// 画像変換ハンドラ
///
/// 通知 1 件ごとに 取得 → デコード → バリアント生成（並行） → 集約 を行う。
/// ストレージと設定は構築時に注入し、呼び出し間で状態を持たない。
#[derive(Clone)]
pub struct ImageTransformHandler {
    storage: Arc<dyn ObjectStorage>,
    config: Arc<HandlerConfig>,
}

/// 1 件の通知を処理した結果
#[derive(Debug)]
pub enum Handled {
    /// バリアントを生成した（結果は設定順）
    Resized(Vec<VariantResult>),
    /// このハンドラが書き込んだオブジェクトだったので処理していない
    Skipped { variant: String },
}

/// 書き込み前に決まるバリアントの出力先
struct PlannedVariant<'a> {
    spec: &'a ResizeSpec,
    format: OutputFormat,
    output_key: String,
    blocked: Option<VariantError>,
}

impl ImageTransformHandler {
    pub fn new(storage: Arc<dyn ObjectStorage>, config: Arc<HandlerConfig>) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// 生の JSON ペイロードを処理し、常に構造化されたレスポンスを返す
    ///
    /// `remaining` は呼び出しの残り時間（分かる場合）
    pub async fn handle_payload(
        &self,
        payload: serde_json::Value,
        remaining: Option<Duration>,
    ) -> HandlerResponse {
        let event = match NotificationEvent::from_value(payload) {
            Ok(event) => event,
            Err(err) => {
                let err = InvocationError::from(err);
                tracing::warn!(kind = err.kind(), error = %err, "malformed event");
                return HandlerResponse::from_error(&err, None);
            }
        };

        match self.handle(&event, remaining).await {
            Ok(Handled::Skipped { variant }) => HandlerResponse::skipped(&event, &variant),
            Ok(Handled::Resized(variants)) => {
                let response = HandlerResponse::from_results(&event, variants);
                tracing::info!(
                    bucket = %event.bucket,
                    key = %event.key,
                    status = ?response.status,
                    "invocation aggregated"
                );
                response
            }
            Err(err) => {
                tracing::warn!(
                    bucket = %event.bucket,
                    key = %event.key,
                    kind = err.kind(),
                    error = %err,
                    "invocation failed"
                );
                HandlerResponse::from_error(&err, Some(&event))
            }
        }
    }

    /// 通知 1 件を処理する
    ///
    /// 取得・デコードの失敗は呼び出し全体のエラー、以降はバリアント単位の結果になる。
    /// 結果は設定順に並ぶ。
    pub async fn handle(
        &self,
        event: &NotificationEvent,
        remaining: Option<Duration>,
    ) -> Result<Handled, InvocationError> {
        let deadline = remaining.map(|remaining| Instant::now() + remaining);

        tracing::info!(bucket = %event.bucket, key = %event.key, "fetching object");
        let object = self.fetch(event, deadline).await?;

        // 生成物の作成通知で再び処理すると連鎖が止まらない
        if let Some(variant) = object.derived_from() {
            tracing::info!(
                bucket = %event.bucket,
                key = %event.key,
                variant = variant,
                "skipping derived object"
            );
            return Ok(Handled::Skipped {
                variant: variant.to_string(),
            });
        }

        tracing::info!(
            bucket = %event.bucket,
            key = %event.key,
            bytes = object.bytes.len(),
            content_type = ?object.content_type.as_deref().or(event.content_type.as_deref()),
            "decoding image"
        );
        let decoded = Arc::new(decode_image(&object.bytes)?);
        let (width, height) = decoded.dimensions();

        tracing::info!(
            bucket = %event.bucket,
            key = %event.key,
            width = width,
            height = height,
            format = ?decoded.format,
            variants = self.config.variants.len(),
            "resizing"
        );

        let output_bucket = self.config.output_bucket_for(&event.bucket);
        let planned = self.plan_variants(event, &decoded, output_bucket);

        let results = stream::iter(planned)
            .map(|plan| self.run_variant(plan, Arc::clone(&decoded), output_bucket, deadline))
            .buffered(self.config.concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(Handled::Resized(results))
    }

    /// ストレージ呼び出し 1 回分のタイムアウト（呼び出しの期限を超えない）
    fn storage_timeout(&self, deadline: Option<Instant>) -> Duration {
        match deadline {
            Some(deadline) => self
                .config
                .storage_timeout
                .min(deadline.saturating_duration_since(Instant::now())),
            None => self.config.storage_timeout,
        }
    }

    async fn fetch(
        &self,
        event: &NotificationEvent,
        deadline: Option<Instant>,
    ) -> Result<StoredObject, InvocationError> {
        let max = self.config.max_input_size;
        let too_large = |size: u64| {
            InvocationError::from_fetch(StorageError::TooLarge { size, max }, &event.bucket, &event.key)
        };

        // 通知にサイズがあれば取得前に弾く
        if let Some(size) = event.size
            && size > max
        {
            return Err(too_large(size));
        }

        let timeout = self.storage_timeout(deadline);
        let object = tokio::time::timeout(
            timeout,
            self.storage.get_object(&event.bucket, &event.key, max),
        )
        .await
            .unwrap_or_else(|_| Err(StorageError::Timeout(timeout.as_millis() as u64)))
            .map_err(|err| InvocationError::from_fetch(err, &event.bucket, &event.key))?;

        // 読み込み後にもサイズを確認
        let actual_size = object.bytes.len() as u64;
        if actual_size > max {
            return Err(too_large(actual_size));
        }

        Ok(object)
    }

    /// 出力キーを決め、自己トリガーと出力キーの重複を検査する
    fn plan_variants<'a>(
        &'a self,
        event: &NotificationEvent,
        decoded: &DecodedImage,
        output_bucket: &str,
    ) -> Vec<PlannedVariant<'a>> {
        let mut claimed: HashMap<String, &str> = HashMap::new();

        self.config
            .variants
            .iter()
            .map(|spec| {
                let format = spec.params().output_format(decoded.format);
                let output_key = spec.key_template.render(&event.key, &spec.name, format);

                let blocked = if let Err(reason) = self.config.guard.check(
                    &event.bucket,
                    &event.key,
                    output_bucket,
                    &output_key,
                ) {
                    Some(VariantError::SelfTriggerGuard(reason))
                } else if let Some(owner) = claimed.get(&output_key) {
                    Some(VariantError::Write(format!(
                        "output key `{output_key}` is already written by variant `{owner}`"
                    )))
                } else {
                    claimed.insert(output_key.clone(), &spec.name);
                    None
                };

                PlannedVariant {
                    spec,
                    format,
                    output_key,
                    blocked,
                }
            })
            .collect()
    }

    async fn run_variant(
        &self,
        plan: PlannedVariant<'_>,
        decoded: Arc<DecodedImage>,
        output_bucket: &str,
        deadline: Option<Instant>,
    ) -> VariantResult {
        let name = plan.spec.name.as_str();
        let output_key = plan.output_key.as_str();

        if let Some(err) = plan.blocked {
            tracing::warn!(
                variant = name,
                output_key = output_key,
                kind = err.kind(),
                error = %err,
                "variant skipped"
            );
            return VariantResult::failed(name, output_key, &err);
        }

        // CPU 処理はブロッキングスレッドで行い、他のバリアントと並行させる
        let params = plan.spec.params();
        let format = plan.format;
        let rendered =
            tokio::task::spawn_blocking(move || render_variant(&decoded, &params, format)).await;

        let rendered = match rendered {
            Ok(Ok(rendered)) => rendered,
            Ok(Err(err)) => {
                let err = VariantError::from(err);
                tracing::error!(variant = name, kind = err.kind(), error = %err, "variant render failed");
                return VariantResult::failed(name, output_key, &err);
            }
            Err(join_err) => {
                let err = VariantError::Resize(format!("render task failed: {join_err}"));
                tracing::error!(variant = name, error = %err, "variant render failed");
                return VariantResult::failed(name, output_key, &err);
            }
        };

        let (width, height) = (rendered.width, rendered.height);
        let content_type = rendered.content_type();
        let object = StoredObject::derived(rendered.bytes, content_type, name);
        let timeout = self.storage_timeout(deadline);
        let written = tokio::time::timeout(
            timeout,
            self.storage.put_object(output_bucket, output_key, object),
        )
        .await
        .unwrap_or_else(|_| Err(StorageError::Timeout(timeout.as_millis() as u64)));

        match written {
            Ok(()) => {
                tracing::info!(
                    variant = name,
                    bucket = %output_bucket,
                    output_key = output_key,
                    width = width,
                    height = height,
                    "variant written"
                );
                VariantResult::succeeded(name, output_key, width, height, content_type)
            }
            Err(err) => {
                let err = VariantError::from(err);
                tracing::error!(
                    variant = name,
                    bucket = %output_bucket,
                    output_key = output_key,
                    error = %err,
                    "variant write failed"
                );
                VariantResult::failed(name, output_key, &err)
            }
        }
    }
}
