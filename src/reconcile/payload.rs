//! Post payload extraction
//!
//! Move `u64` values arrive as JSON strings from the node, but fixtures
//! and older nodes use plain numbers, so every numeric field accepts both.

use serde_json::Value;
use thiserror::Error;

use crate::ledger::ObjectRecord;
use crate::post::Post;

/// Why a child record was left out of the post list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadRejection {
    #[error("record has no Move object content")]
    NotMoveObject,

    #[error("dynamic field has no value")]
    MissingValue,

    #[error("post has no author")]
    MissingAuthor,

    #[error("post has no content")]
    MissingContent,

    #[error("table key {0} is not an integer")]
    InvalidKey(String),
}

/// Parse a Move `u64` counter; anything unparseable counts as zero
pub fn parse_counter(value: &Value) -> u64 {
    parse_u64(value).unwrap_or(0)
}

/// Parse a table key into a post id
pub fn parse_post_key(key: &Value) -> Option<u64> {
    parse_u64(key)
}

fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty_str<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
    data.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Turn a fetched dynamic-field record into a post
///
/// The wrapper is `{ id, name, value: { type, fields } }`; the post lives
/// in `value.fields`, or in `value` itself when the node flattens it.
pub fn extract_post(key: &Value, record: &ObjectRecord) -> Result<Post, PayloadRejection> {
    let wrapper = record.move_fields().ok_or(PayloadRejection::NotMoveObject)?;

    let value = wrapper
        .get("value")
        .filter(|v| !v.is_null())
        .ok_or(PayloadRejection::MissingValue)?;
    let data = value.get("fields").filter(|f| f.is_object()).unwrap_or(value);

    let author = non_empty_str(data, "author").ok_or(PayloadRejection::MissingAuthor)?;
    let content = non_empty_str(data, "content").ok_or(PayloadRejection::MissingContent)?;
    let id = parse_post_key(key).ok_or_else(|| PayloadRejection::InvalidKey(key.to_string()))?;

    let timestamp = data.get("timestamp").map(parse_counter).unwrap_or(0);

    Ok(Post {
        id,
        author: author.to_string(),
        content: content.to_string(),
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_record(value: Value) -> ObjectRecord {
        ObjectRecord::move_object(
            "0xchild",
            "0x2::dynamic_field::Field<u64, 0xpkg::timeline::Post>",
            json!({ "id": { "id": "0xchild" }, "name": "0", "value": value }),
        )
    }

    #[test]
    fn test_parse_counter() {
        assert_eq!(parse_counter(&json!("0")), 0);
        assert_eq!(parse_counter(&json!(0)), 0);
        assert_eq!(parse_counter(&json!("17")), 17);
        assert_eq!(parse_counter(&json!(17)), 17);
        assert_eq!(parse_counter(&json!("many")), 0);
        assert_eq!(parse_counter(&json!(-3)), 0);
        assert_eq!(parse_counter(&Value::Null), 0);
    }

    #[test]
    fn test_parse_post_key() {
        assert_eq!(parse_post_key(&json!("12")), Some(12));
        assert_eq!(parse_post_key(&json!(12)), Some(12));
        assert_eq!(parse_post_key(&json!("twelve")), None);
        assert_eq!(parse_post_key(&json!({ "value": 1 })), None);
    }

    #[test]
    fn test_extract_nested_fields() {
        let record = field_record(json!({
            "type": "0xpkg::timeline::Post",
            "fields": { "author": "0xA", "content": "hi", "timestamp": "1700000000000" }
        }));

        let post = extract_post(&json!("3"), &record).unwrap();
        assert_eq!(
            post,
            Post {
                id: 3,
                author: "0xA".to_string(),
                content: "hi".to_string(),
                timestamp: 1_700_000_000_000,
            }
        );
    }

    #[test]
    fn test_extract_flat_value() {
        let record = field_record(json!({ "author": "0xB", "content": "flat", "timestamp": 5 }));
        let post = extract_post(&json!(1), &record).unwrap();
        assert_eq!(post.author, "0xB");
        assert_eq!(post.timestamp, 5);
    }

    #[test]
    fn test_missing_timestamp_defaults_to_zero() {
        let record = field_record(json!({ "fields": { "author": "0xA", "content": "hi" } }));
        assert_eq!(extract_post(&json!("0"), &record).unwrap().timestamp, 0);
    }

    #[test]
    fn test_rejections() {
        let record = field_record(json!({ "fields": { "author": "", "content": "bad" } }));
        assert_eq!(
            extract_post(&json!("0"), &record),
            Err(PayloadRejection::MissingAuthor)
        );

        let record = field_record(json!({ "fields": { "author": "0xA" } }));
        assert_eq!(
            extract_post(&json!("0"), &record),
            Err(PayloadRejection::MissingContent)
        );

        let record = field_record(Value::Null);
        assert_eq!(
            extract_post(&json!("0"), &record),
            Err(PayloadRejection::MissingValue)
        );

        let record = field_record(json!({ "fields": { "author": "0xA", "content": "hi" } }));
        assert!(matches!(
            extract_post(&json!("x1"), &record),
            Err(PayloadRejection::InvalidKey(_))
        ));
    }

    #[test]
    fn test_non_move_record_rejected() {
        let mut record = field_record(json!({}));
        record.content = None;
        assert_eq!(
            extract_post(&json!("0"), &record),
            Err(PayloadRejection::NotMoveObject)
        );
    }
}
