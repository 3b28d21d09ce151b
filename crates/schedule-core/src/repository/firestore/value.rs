//! Firestore REST value encoding.
//!
//! Documents travel as `{ "fields": { name: { "<type>Value": ... } } }`.
//! Only the scalar value kinds used by schedule documents are handled.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::domain::{ItemId, NewScheduleItem, ScheduleItem, ScheduleUpdate, UserId};
use crate::error::{StoreError, StoreResult};

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    /// Last path segment of the resource name
    pub fn id(&self) -> ItemId {
        ItemId::new(self.name.rsplit('/').next().unwrap_or_default())
    }
}

/// One element of a `runQuery` response stream
#[derive(Debug, Deserialize)]
pub struct QueryResult {
    pub document: Option<Document>,
}

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn null_value() -> Value {
    json!({ "nullValue": null })
}

fn optional<T>(value: Option<T>, encode: impl FnOnce(T) -> Value) -> Value {
    value.map(encode).unwrap_or_else(null_value)
}

fn timestamp_value(t: DateTime<Utc>) -> Value {
    json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Millis, true) })
}

fn integer_value(n: u32) -> Value {
    // int64 is a JSON string on the wire
    json!({ "integerValue": n.to_string() })
}

fn get_string(fields: &Fields, key: &str) -> Option<String> {
    fields.get(key)?.get("stringValue")?.as_str().map(str::to_string)
}

fn get_bool(fields: &Fields, key: &str) -> Option<bool> {
    fields.get(key)?.get("booleanValue")?.as_bool()
}

fn get_integer(fields: &Fields, key: &str) -> Option<u32> {
    let value = fields.get(key)?;
    if let Some(raw) = value.get("integerValue") {
        return match raw {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        };
    }
    // Some clients store minutes as doubles
    value
        .get("doubleValue")?
        .as_f64()
        .filter(|f| *f >= 0.0)
        .map(|f| f as u32)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn get_timestamp(fields: &Fields, key: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(fields.get(key)?.get("timestampValue")?.as_str()?)
}

/// Decode a stored document into a schedule item
pub fn decode_document(doc: &Document) -> StoreResult<ScheduleItem> {
    let fields = &doc.fields;
    let user_id = get_string(fields, "userId")
        .ok_or_else(|| StoreError::InvalidResponse(format!("document {} has no userId", doc.name)))?;

    let original_text = get_string(fields, "originalText").unwrap_or_default();
    let title = get_string(fields, "title")
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| original_text.clone());

    Ok(ScheduleItem {
        id: doc.id(),
        user_id: UserId::new(user_id),
        title,
        scheduled_date: get_timestamp(fields, "scheduledDate"),
        estimated_duration: get_integer(fields, "estimatedDuration"),
        location: get_string(fields, "location").filter(|l| !l.is_empty()),
        is_completed: get_bool(fields, "isCompleted").unwrap_or(false),
        is_from_image: get_bool(fields, "isFromImage").unwrap_or(false),
        parent_id: get_string(fields, "parentId")
            .filter(|p| !p.is_empty())
            .map(ItemId::new),
        original_text,
        created_at: get_timestamp(fields, "createdAt")
            .or_else(|| doc.create_time.as_deref().and_then(parse_timestamp)),
        updated_at: get_timestamp(fields, "updatedAt")
            .or_else(|| doc.update_time.as_deref().and_then(parse_timestamp)),
    })
}

/// Fields for a document create
pub fn encode_new_item(item: &NewScheduleItem, now: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert("userId".into(), string_value(item.user_id.as_str()));
    fields.insert("title".into(), string_value(&item.title));
    fields.insert("scheduledDate".into(), optional(item.scheduled_date, timestamp_value));
    fields.insert("estimatedDuration".into(), optional(item.estimated_duration, integer_value));
    fields.insert(
        "location".into(),
        optional(item.location.as_deref(), string_value),
    );
    fields.insert("isCompleted".into(), json!({ "booleanValue": item.is_completed }));
    fields.insert("isFromImage".into(), json!({ "booleanValue": item.is_from_image }));
    fields.insert(
        "parentId".into(),
        optional(item.parent_id.as_ref(), |p| string_value(p.as_str())),
    );
    fields.insert("originalText".into(), string_value(&item.original_text));
    fields.insert("createdAt".into(), timestamp_value(now));
    fields.insert("updatedAt".into(), timestamp_value(now));
    fields
}

/// Fields for a masked PATCH; pair with `update_mask`
pub fn encode_update(update: &ScheduleUpdate, now: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    if let Some(title) = &update.title {
        fields.insert("title".into(), string_value(title));
    }
    if let Some(date) = update.scheduled_date {
        fields.insert("scheduledDate".into(), optional(date, timestamp_value));
    }
    if let Some(duration) = update.estimated_duration {
        fields.insert("estimatedDuration".into(), optional(duration, integer_value));
    }
    if let Some(location) = &update.location {
        fields.insert("location".into(), optional(location.as_deref(), string_value));
    }
    if let Some(parent) = &update.parent_id {
        fields.insert(
            "parentId".into(),
            optional(parent.as_ref(), |p| string_value(p.as_str())),
        );
    }
    if let Some(done) = update.is_completed {
        fields.insert("isCompleted".into(), json!({ "booleanValue": done }));
    }
    fields.insert("updatedAt".into(), timestamp_value(now));
    fields
}

/// `updateMask.fieldPaths` entries matching `encode_update`
pub fn update_mask(update: &ScheduleUpdate) -> Vec<&'static str> {
    let mut paths = update.field_paths();
    paths.push("updatedAt");
    paths
}

/// `runQuery` body selecting one user's documents
pub fn user_query(collection: &str, user_id: &UserId) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "userId" },
                    "op": "EQUAL",
                    "value": string_value(user_id.as_str()),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn stored_doc() -> Document {
        serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/schedules/abc123",
            "fields": {
                "userId": { "stringValue": "u1" },
                "title": { "stringValue": "会議" },
                "scheduledDate": { "timestampValue": "2024-01-20T06:00:00Z" },
                "estimatedDuration": { "integerValue": "60" },
                "location": { "nullValue": null },
                "isCompleted": { "booleanValue": true },
                "parentId": { "stringValue": "root1" },
                "originalText": { "stringValue": "明日15時に会議" }
            },
            "createTime": "2024-01-19T00:00:00.123456Z",
            "updateTime": "2024-01-19T01:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_document() {
        let item = decode_document(&stored_doc()).unwrap();
        assert_eq!(item.id, ItemId::from("abc123"));
        assert_eq!(item.user_id, UserId::from("u1"));
        assert_eq!(item.scheduled_date, Some(Utc.with_ymd_and_hms(2024, 1, 20, 6, 0, 0).unwrap()));
        assert_eq!(item.estimated_duration, Some(60));
        assert_eq!(item.location, None);
        assert!(item.is_completed);
        assert!(!item.is_from_image);
        assert_eq!(item.parent_id, Some(ItemId::from("root1")));
        assert_eq!(item.updated_at, Some(Utc.with_ymd_and_hms(2024, 1, 19, 1, 0, 0).unwrap()));
    }

    #[test]
    fn test_decode_requires_owner() {
        let mut doc = stored_doc();
        doc.fields.remove("userId");
        assert!(matches!(decode_document(&doc), Err(StoreError::InvalidResponse(_))));
    }

    #[test]
    fn test_encode_update_matches_mask() {
        let now = Utc.with_ymd_and_hms(2024, 1, 19, 2, 0, 0).unwrap();
        let update = ScheduleUpdate {
            scheduled_date: Some(None),
            parent_id: Some(Some(ItemId::from("p"))),
            ..Default::default()
        };
        let fields = encode_update(&update, now);
        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort();
        let mut mask = update_mask(&update);
        mask.sort();
        assert_eq!(keys, mask);
        assert_eq!(fields["scheduledDate"], json!({ "nullValue": null }));
        assert_eq!(fields["parentId"], json!({ "stringValue": "p" }));
    }

    #[test]
    fn test_user_query_filters_on_owner() {
        let query = user_query("schedules", &UserId::from("u1"));
        let filter = &query["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["op"], "EQUAL");
        assert_eq!(filter["value"]["stringValue"], "u1");
    }
}
