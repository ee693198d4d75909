//! 自己トリガー防止
//!
//! 出力を監視対象の場所に書き戻すと、その書き込みが再び作成通知を発火させて
//! 無限に呼び出しが連鎖する。書き込み前にその可能性がある出力先を検出する。
//! 元画像と同じ場所に書いた生成物は、取得時のメタデータ（`resized-by`）で見分けて処理しない。

/// 自己トリガー防止ガード
#[derive(Debug, Clone, Default)]
pub struct SelfTriggerGuard {
    watched_prefixes: Vec<String>,
}

impl SelfTriggerGuard {
    pub fn new(watched_prefixes: Vec<String>) -> Self {
        let watched_prefixes = watched_prefixes
            .into_iter()
            .filter(|prefix| !prefix.is_empty())
            .collect();
        Self { watched_prefixes }
    }

    pub fn watched_prefixes(&self) -> &[String] {
        &self.watched_prefixes
    }

    /// 出力先が通知を再発火させるかを検査する
    ///
    /// 衝突する場合は理由を返す
    pub fn check(
        &self,
        source_bucket: &str,
        source_key: &str,
        output_bucket: &str,
        output_key: &str,
    ) -> Result<(), String> {
        if output_bucket != source_bucket {
            return Ok(());
        }

        if output_key == source_key {
            return Err(format!(
                "output key `{output_key}` is the triggering object itself"
            ));
        }

        if let Some(prefix) = self
            .watched_prefixes
            .iter()
            .find(|prefix| output_key.starts_with(prefix.as_str()))
        {
            return Err(format!(
                "output key `{output_key}` is under watched prefix `{prefix}` of bucket `{output_bucket}`"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_is_rejected() {
        let guard = SelfTriggerGuard::default();
        assert!(guard
            .check("photos", "uploads/cat.jpg", "photos", "uploads/cat.jpg")
            .is_err());
    }

    #[test]
    fn test_same_key_in_other_bucket_is_allowed() {
        let guard = SelfTriggerGuard::new(vec!["uploads/".to_string()]);
        assert!(guard
            .check("photos", "uploads/cat.jpg", "thumbs", "uploads/cat.jpg")
            .is_ok());
    }

    #[test]
    fn test_watched_prefix_is_rejected() {
        let guard = SelfTriggerGuard::new(vec!["uploads/".to_string()]);

        let err = guard
            .check("photos", "uploads/cat.jpg", "photos", "uploads/cat-thumb.jpg")
            .unwrap_err();
        assert!(err.contains("uploads/"));

        assert!(guard
            .check("photos", "uploads/cat.jpg", "photos", "resized/cat-thumb.jpg")
            .is_ok());
    }

    #[test]
    fn test_empty_prefix_is_ignored() {
        let guard = SelfTriggerGuard::new(vec![String::new()]);
        assert!(guard.watched_prefixes().is_empty());
        assert!(guard
            .check("photos", "uploads/cat.jpg", "photos", "uploads/cat-thumb.jpg")
            .is_ok());
    }
}
