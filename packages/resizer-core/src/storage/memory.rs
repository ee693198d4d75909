use crate::errors::StorageError;
use crate::storage::{ObjectStorage, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

type ObjectKey = (String, String);

/// メモリ上のストレージ
///
/// テストとローカル実行用。書き込み失敗を注入できる。
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    objects: Arc<RwLock<HashMap<ObjectKey, StoredObject>>>,
    failing_writes: Arc<RwLock<HashSet<ObjectKey>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// オブジェクトを直接配置する
    pub fn insert(&self, bucket: &str, key: &str, bytes: impl Into<Bytes>, content_type: Option<&str>) {
        self.insert_object(bucket, key, StoredObject::new(bytes, content_type));
    }

    /// メタデータ付きのオブジェクトを直接配置する
    pub fn insert_object(&self, bucket: &str, key: &str, object: StoredObject) {
        write_lock(&self.objects).insert(object_key(bucket, key), object);
    }

    /// 保存済みのオブジェクトを参照する
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        read_lock(&self.objects).get(&object_key(bucket, key)).cloned()
    }

    /// 保存済みのキー一覧（バケット内、ソート済み）
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = read_lock(&self.objects)
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// 指定キーへの書き込みを失敗させる
    pub fn fail_writes_to(&self, bucket: &str, key: &str) {
        write_lock(&self.failing_writes).insert(object_key(bucket, key));
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        max_size: u64,
    ) -> Result<StoredObject, StorageError> {
        let object = self.object(bucket, key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;

        let size = object.bytes.len() as u64;
        if size > max_size {
            return Err(StorageError::TooLarge { size, max: max_size });
        }

        Ok(object)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        object: StoredObject,
    ) -> Result<(), StorageError> {
        if read_lock(&self.failing_writes).contains(&object_key(bucket, key)) {
            return Err(StorageError::Internal(format!(
                "injected write failure for {bucket}/{key}"
            )));
        }

        self.insert_object(bucket, key, object);
        Ok(())
    }
}

fn object_key(bucket: &str, key: &str) -> ObjectKey {
    (bucket.to_string(), key.to_string())
}

// ロック中にパニックしたテストがあっても中身はそのまま使う
fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let storage = InMemoryStorage::new();
        storage
            .put_object(
                "photos",
                "a/b.jpg",
                StoredObject::derived(Bytes::from_static(b"data"), "image/jpeg", "thumb"),
            )
            .await
            .unwrap();

        let object = storage.get_object("photos", "a/b.jpg", 1024).await.unwrap();
        assert_eq!(object.bytes, Bytes::from_static(b"data"));
        assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(object.derived_from(), Some("thumb"));
        assert_eq!(storage.keys("photos"), vec!["a/b.jpg".to_string()]);
        assert!(storage.keys("other").is_empty());
    }

    #[tokio::test]
    async fn test_missing_object() {
        let storage = InMemoryStorage::new();
        let err = storage.get_object("photos", "missing.jpg", 1024).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { key } if key == "missing.jpg"));
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let storage = InMemoryStorage::new();
        storage.fail_writes_to("photos", "broken.jpg");

        let result = storage
            .put_object("photos", "broken.jpg", StoredObject::new(Bytes::from_static(b"x"), None))
            .await;
        assert!(matches!(result, Err(StorageError::Internal(_))));
        assert!(storage.object("photos", "broken.jpg").is_none());

        // 他のキーには影響しない
        storage
            .put_object("photos", "ok.jpg", StoredObject::new(Bytes::from_static(b"x"), None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_size_limit_is_checked_on_get() {
        let storage = InMemoryStorage::new();
        storage.insert("photos", "big.jpg", vec![0u8; 2048], None);

        let err = storage.get_object("photos", "big.jpg", 1024).await.unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { size: 2048, max: 1024 }));

        assert!(storage.get_object("photos", "big.jpg", 2048).await.is_ok());
    }
}
