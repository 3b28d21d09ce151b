//! Model output decoding.
//!
//! The model is asked for bare JSON but may wrap it in a Markdown fence or
//! return something only partly JSON. Decoding never fails: unusable output
//! degrades to whatever fields can be recovered, then to the raw input.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::domain::ParsedDraft;

static RE_CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid code fence regex"));
static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title"\s*:\s*"([^"]+)""#).expect("valid title regex"));
static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""scheduledDate"\s*:\s*"([^"]+)""#).expect("valid scheduledDate regex")
});
static RE_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""estimatedDurationMinutes"\s*:\s*(\d+)"#).expect("valid duration regex")
});
static RE_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""location"\s*:\s*"([^"]+)""#).expect("valid location regex"));

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Lenient shape of the model's JSON answer
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDraft {
    title: Option<String>,
    scheduled_date: Option<String>,
    #[serde(alias = "estimatedDuration")]
    estimated_duration_minutes: Option<Value>,
    location: Option<String>,
    subtasks: Option<Vec<RawDraft>>,
}

/// Body of a fenced block if there is one, else the whole text
pub fn strip_code_fence(text: &str) -> &str {
    RE_CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim()
}

/// Decode model output for `original` input text.
///
/// Dates without an offset are read in `offset`.
pub fn parse_model_output(text: &str, original: &str, offset: FixedOffset) -> ParsedDraft {
    let body = strip_code_fence(text);
    let raw = match serde_json::from_str::<RawDraft>(body) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("model output is not valid JSON, extracting fields: {}", e);
            extract_fields(text)
        }
    };
    into_draft(raw, original, offset)
}

fn extract_fields(text: &str) -> RawDraft {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };
    RawDraft {
        title: capture(&RE_TITLE),
        scheduled_date: capture(&RE_DATE),
        estimated_duration_minutes: capture(&RE_DURATION).map(Value::String),
        location: capture(&RE_LOCATION),
        subtasks: None,
    }
}

fn into_draft(raw: RawDraft, original: &str, offset: FixedOffset) -> ParsedDraft {
    let title = non_null(raw.title).unwrap_or_else(|| original.trim().to_string());
    let subtasks = raw
        .subtasks
        .unwrap_or_default()
        .into_iter()
        .filter_map(|sub| {
            let title = non_null(sub.title)?;
            Some(ParsedDraft {
                original_text: title.clone(),
                title,
                scheduled_date: sub.scheduled_date.as_deref().and_then(|d| parse_date(d, offset)),
                estimated_duration: sub.estimated_duration_minutes.as_ref().and_then(parse_minutes),
                location: non_null(sub.location),
                subtasks: Vec::new(),
            })
        })
        .collect();

    ParsedDraft {
        title,
        scheduled_date: raw.scheduled_date.as_deref().and_then(|d| parse_date(d, offset)),
        estimated_duration: raw.estimated_duration_minutes.as_ref().and_then(parse_minutes),
        location: non_null(raw.location),
        original_text: original.to_string(),
        subtasks,
    }
}

/// Empty strings and a literal "null" count as absent
fn non_null(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "null")
}

fn parse_minutes(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (minutes > 0.0 && minutes <= u32::MAX as f64).then_some(minutes.round() as u32)
}

/// Accepts RFC 3339, or a naive date/date-time read in `offset`
pub fn parse_date(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_plain_json_without_subtasks() {
        let text = r#"{"title":"会議","scheduledDate":"2024-01-20T15:00:00","estimatedDurationMinutes":60,"location":null,"subtasks":[]}"#;
        let draft = parse_model_output(text, "明日15時に会議", jst());
        assert_eq!(draft.title, "会議");
        assert_eq!(draft.scheduled_date, Some(Utc.with_ymd_and_hms(2024, 1, 20, 6, 0, 0).unwrap()));
        assert_eq!(draft.estimated_duration, Some(60));
        assert_eq!(draft.location, None);
        assert_eq!(draft.original_text, "明日15時に会議");
        assert!(draft.subtasks.is_empty());
    }

    #[test]
    fn test_fenced_json_with_subtasks() {
        let text = "```json\n{\"title\":\"引っ越し準備\",\"scheduledDate\":null,\"subtasks\":[{\"title\":\"箱を買う\",\"scheduledDate\":\"2024-01-20T01:00:00Z\"},{\"title\":\"荷造り\",\"location\":\"自宅\"}]}\n```";
        let draft = parse_model_output(text, "箱を買って荷造りする", jst());
        assert_eq!(draft.title, "引っ越し準備");
        assert_eq!(draft.scheduled_date, None);
        assert_eq!(draft.subtasks.len(), 2);
        assert_eq!(draft.subtasks[0].original_text, "箱を買う");
        assert_eq!(draft.subtasks[0].scheduled_date, Some(Utc.with_ymd_and_hms(2024, 1, 20, 1, 0, 0).unwrap()));
        assert_eq!(draft.subtasks[1].location.as_deref(), Some("自宅"));
    }

    #[test]
    fn test_broken_json_falls_back_to_field_extraction() {
        let text = r#"Sure! {"title": "歯医者", "scheduledDate": "2024-02-01T10:30:00", "estimatedDurationMinutes": 30, "location": "駅前クリニック", "#;
        let draft = parse_model_output(text, "来週歯医者", jst());
        assert_eq!(draft.title, "歯医者");
        assert_eq!(draft.estimated_duration, Some(30));
        assert_eq!(draft.location.as_deref(), Some("駅前クリニック"));
        assert_eq!(draft.scheduled_date, Some(Utc.with_ymd_and_hms(2024, 2, 1, 1, 30, 0).unwrap()));
    }

    #[test]
    fn test_garbage_keeps_input_as_title() {
        let draft = parse_model_output("I cannot help with that.", " 買い物 ", jst());
        assert_eq!(draft.title, "買い物");
        assert_eq!(draft.scheduled_date, None);
        assert!(draft.subtasks.is_empty());
    }

    #[test]
    fn test_null_strings_are_absent() {
        let text = r#"{"title":"散歩","scheduledDate":"null","location":"null","estimatedDurationMinutes":"45"}"#;
        let draft = parse_model_output(text, "散歩", jst());
        assert_eq!(draft.scheduled_date, None);
        assert_eq!(draft.location, None);
        assert_eq!(draft.estimated_duration, Some(45));
    }

    #[test]
    fn test_parse_date_forms() {
        assert_eq!(parse_date("2024-01-20", jst()), Some(Utc.with_ymd_and_hms(2024, 1, 19, 15, 0, 0).unwrap()));
        assert_eq!(parse_date("2024-01-20T15:00:00+09:00", jst()), Some(Utc.with_ymd_and_hms(2024, 1, 20, 6, 0, 0).unwrap()));
        assert_eq!(parse_date("来週", jst()), None);
    }
}
