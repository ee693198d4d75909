//! ストレージ通知イベント
//!
//! S3 の通知（`Records[].s3.bucket.name` / `Records[].s3.object.key`）と、
//! バケットとキーだけを持つ正規化済みの形式の両方を受け付ける。

use crate::errors::EventError;
use crate::validation::validate_key;
use serde::Deserialize;

/// 作成されたオブジェクトの通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub bucket: String,
    pub key: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEvent {
    S3(S3Event),
    Normalized(NormalizedEvent),
}

#[derive(Debug, Deserialize)]
struct S3Event {
    #[serde(rename = "Records")]
    records: Vec<S3Record>,
}

#[derive(Debug, Deserialize)]
struct S3Record {
    #[serde(rename = "eventName", default)]
    event_name: Option<String>,
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedEvent {
    #[serde(default)]
    bucket: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    content_type: Option<String>,
}

impl NotificationEvent {
    /// JSON ペイロードから通知を取り出す
    pub fn from_value(payload: serde_json::Value) -> Result<Self, EventError> {
        let raw: RawEvent = serde_json::from_value(payload)
            .map_err(|e| EventError::InvalidPayload(e.to_string()))?;

        match raw {
            RawEvent::S3(event) => Self::from_s3(event),
            RawEvent::Normalized(event) => Self::from_normalized(event),
        }
    }

    fn from_s3(event: S3Event) -> Result<Self, EventError> {
        let record_count = event.records.len();
        let record = event.records.into_iter().next().ok_or(EventError::NoRecords)?;
        if record_count > 1 {
            tracing::warn!(
                records = record_count,
                "notification carries multiple records, processing only the first"
            );
        }

        if let Some(name) = record.event_name.as_deref()
            && !name.starts_with("ObjectCreated:")
        {
            return Err(EventError::UnsupportedEvent(name.to_string()));
        }

        let bucket = non_empty(record.s3.bucket.name, "bucket")?;
        let raw_key = non_empty(record.s3.object.key, "key")?;
        let key = decode_event_key(&raw_key)?;

        Ok(Self {
            bucket,
            key,
            size: record.s3.object.size,
            content_type: None,
        })
    }

    fn from_normalized(event: NormalizedEvent) -> Result<Self, EventError> {
        let bucket = non_empty(event.bucket, "bucket")?;
        let key = non_empty(event.key, "key")?;
        validate_key(&key).map_err(EventError::InvalidKey)?;

        Ok(Self {
            bucket,
            key,
            size: event.size,
            content_type: event.content_type,
        })
    }
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, EventError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(EventError::MissingField(field))
}

/// S3 通知のキーは URL エンコードされている（空白は `+`）
fn decode_event_key(raw: &str) -> Result<String, EventError> {
    let plus_decoded = raw.replace('+', " ");
    let decoded = urlencoding::decode(&plus_decoded)
        .map_err(|_| EventError::InvalidKey("invalid URL encoding".to_string()))?
        .into_owned();

    validate_key(&decoded).map_err(EventError::InvalidKey)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s3_event(bucket: &str, key: &str) -> serde_json::Value {
        json!({
            "Records": [{
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": { "name": bucket, "arn": format!("arn:aws:s3:::{bucket}") },
                    "object": { "key": key, "size": 1024, "eTag": "0123456789abcdef" }
                }
            }]
        })
    }

    #[test]
    fn test_extract_s3_event() {
        let event = NotificationEvent::from_value(s3_event("photos", "uploads/cat.jpg")).unwrap();

        assert_eq!(event.bucket, "photos");
        assert_eq!(event.key, "uploads/cat.jpg");
        assert_eq!(event.size, Some(1024));
        assert_eq!(event.content_type, None);
    }

    #[test]
    fn test_extract_decodes_key() {
        let event =
            NotificationEvent::from_value(s3_event("photos", "uploads/my+cat%281%29.jpg")).unwrap();
        assert_eq!(event.key, "uploads/my cat(1).jpg");
    }

    #[test]
    fn test_extract_normalized_event() {
        let payload = json!({
            "bucket": "photos",
            "key": "uploads/a+b.png",
            "contentType": "image/png"
        });
        let event = NotificationEvent::from_value(payload).unwrap();

        // 正規化形式のキーはそのまま使う
        assert_eq!(event.key, "uploads/a+b.png");
        assert_eq!(event.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_missing_fields() {
        let payload = json!({ "Records": [{ "s3": { "bucket": {}, "object": { "key": "a.jpg" } } }] });
        assert!(matches!(
            NotificationEvent::from_value(payload),
            Err(EventError::MissingField("bucket"))
        ));

        let payload = json!({ "Records": [{ "s3": { "bucket": { "name": "b" }, "object": { "key": "" } } }] });
        assert!(matches!(
            NotificationEvent::from_value(payload),
            Err(EventError::MissingField("key"))
        ));

        let payload = json!({ "bucket": "photos" });
        assert!(matches!(
            NotificationEvent::from_value(payload),
            Err(EventError::MissingField("key"))
        ));
    }

    #[test]
    fn test_empty_records() {
        let payload = json!({ "Records": [] });
        assert!(matches!(
            NotificationEvent::from_value(payload),
            Err(EventError::NoRecords)
        ));
    }

    #[test]
    fn test_not_an_event() {
        assert!(matches!(
            NotificationEvent::from_value(json!([1, 2, 3])),
            Err(EventError::InvalidPayload(_))
        ));
        assert!(matches!(
            NotificationEvent::from_value(json!("uploads/cat.jpg")),
            Err(EventError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_non_create_event_is_rejected() {
        let mut payload = s3_event("photos", "uploads/cat.jpg");
        payload["Records"][0]["eventName"] = json!("ObjectRemoved:Delete");
        assert!(matches!(
            NotificationEvent::from_value(payload),
            Err(EventError::UnsupportedEvent(_))
        ));
    }

    #[test]
    fn test_invalid_key_encoding() {
        assert!(matches!(
            NotificationEvent::from_value(s3_event("photos", "uploads/%FF%FE.jpg")),
            Err(EventError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_only_first_record_is_used() {
        let payload = json!({
            "Records": [
                { "s3": { "bucket": { "name": "a" }, "object": { "key": "first.jpg" } } },
                { "s3": { "bucket": { "name": "b" }, "object": { "key": "second.jpg" } } }
            ]
        });
        let event = NotificationEvent::from_value(payload).unwrap();
        assert_eq!((event.bucket.as_str(), event.key.as_str()), ("a", "first.jpg"));
    }
}
