use crate::constants::MAX_KEY_LENGTH;

/// オブジェクトキーを検証する
///
/// S3 のキーは任意の UTF-8 を許すため、文字種は制限しない。
/// 空・長すぎる・制御文字を含むキーのみ拒否し、理由を返す。
pub fn validate_key(key: &str) -> Result<(), String> {
    // 空文字チェック
    if key.is_empty() {
        return Err("key is empty".to_string());
    }

    // 長さチェック（UTF-8 で 1024 バイトまで）
    if key.len() > MAX_KEY_LENGTH {
        return Err(format!("key is too long (max {MAX_KEY_LENGTH} bytes)"));
    }

    if key.chars().any(char::is_control) {
        return Err("key contains control characters".to_string());
    }

    Ok(())
}
