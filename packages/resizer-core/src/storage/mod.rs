pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

use crate::constants::DERIVED_MARKER_KEY;
pub use crate::errors::StorageError;
pub use memory::InMemoryStorage;
pub use s3::S3Storage;

/// ストレージ上のオブジェクト（本体・Content-Type・ユーザーメタデータ）
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl StoredObject {
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.map(str::to_string),
            metadata: HashMap::new(),
        }
    }

    /// バリアントとして生成したオブジェクト
    ///
    /// 生成物であることをメタデータに残し、その作成通知では処理しない
    pub fn derived(bytes: impl Into<Bytes>, content_type: &str, variant: &str) -> Self {
        let mut object = Self::new(bytes, Some(content_type));
        object
            .metadata
            .insert(DERIVED_MARKER_KEY.to_string(), variant.to_string());
        object
    }

    /// このハンドラが書き込んだオブジェクトなら、そのバリアント名
    pub fn derived_from(&self) -> Option<&str> {
        self.metadata.get(DERIVED_MARKER_KEY).map(String::as_str)
    }
}

/// ハンドラが依存するストレージ操作
///
/// 実装はタイムアウトを持たなくてよい（呼び出し側で制限する）
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// オブジェクトを取得する
    ///
    /// `max_size` を超えるオブジェクトは本体を読み込む前に `TooLarge` を返す
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        max_size: u64,
    ) -> Result<StoredObject, StorageError>;

    /// オブジェクトを書き込む（同じキーへの再書き込みは上書き）
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        object: StoredObject,
    ) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_marker() {
        let object = StoredObject::derived(Bytes::from_static(b"x"), "image/png", "thumb");
        assert_eq!(object.derived_from(), Some("thumb"));
        assert_eq!(object.content_type.as_deref(), Some("image/png"));

        let upload = StoredObject::new(Bytes::from_static(b"x"), None);
        assert_eq!(upload.derived_from(), None);
    }
}
