use crate::errors::StorageError;
use crate::storage::{ObjectStorage, StoredObject};
use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

/// S3 クライアント
///
/// 認証情報・リージョン・エンドポイントは標準の AWS 環境変数から読み込む
/// （AWS_ENDPOINT_URL を指定すればローカルのエミュレータにも向けられる）
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 環境から S3Storage を作成する
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        max_size: u64,
    ) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(ctx) => {
                    let status = ctx.raw().status().as_u16();
                    let service_err = ctx.into_err();
                    if service_err.is_no_such_key() || status == 404 {
                        StorageError::NotFound {
                            key: key.to_string(),
                        }
                    } else if status == 403 {
                        tracing::error!(bucket = %bucket, key = %key, "access denied by S3");
                        StorageError::Forbidden
                    } else {
                        StorageError::Internal(DisplayErrorContext(service_err).to_string())
                    }
                }
                other => StorageError::Internal(DisplayErrorContext(other).to_string()),
            })?;

        // 本体を読む前に Content-Length で弾く
        if let Some(size) = output.content_length().and_then(|len| u64::try_from(len).ok())
            && size > max_size
        {
            return Err(StorageError::TooLarge { size, max: max_size });
        }

        let content_type = output.content_type().map(str::to_string);
        let metadata = output.metadata().cloned().unwrap_or_default();
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Internal(format!("failed to read object body: {e}")))?
            .into_bytes();

        Ok(StoredObject {
            bytes: data,
            content_type,
            metadata,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        object: StoredObject,
    ) -> Result<(), StorageError> {
        let metadata = (!object.metadata.is_empty()).then_some(object.metadata);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .set_content_type(object.content_type)
            .set_metadata(metadata)
            .body(ByteStream::from(object.bytes))
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(ctx) if ctx.raw().status().as_u16() == 403 => {
                    tracing::error!(bucket = %bucket, key = %key, "write denied by S3");
                    StorageError::Forbidden
                }
                other => StorageError::Internal(DisplayErrorContext(other).to_string()),
            })?;

        Ok(())
    }
}
