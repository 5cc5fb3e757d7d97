//! Extracting and validating the model's JSON answer.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{Classification, ClassifyError, IssueAction};

/// Keys every classification answer must carry.
pub const REQUIRED_FIELDS: [&str; 5] =
    ["action", "tracker_id", "priority_id", "subject", "done_ratio"];

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fenced block pattern")
});

/// Finds a JSON object in model output.
///
/// Tries, in order: the whole text, the first fenced code block holding an
/// object, and the span from the first `{` to the last `}`.
#[must_use]
pub fn extract_json(text: &str) -> Option<Value> {
    let as_object = |candidate: &str| {
        serde_json::from_str::<Value>(candidate.trim()).ok().filter(Value::is_object)
    };

    if let Some(value) = as_object(text) {
        return Some(value);
    }
    if let Some(value) = FENCED.captures(text).and_then(|caps| as_object(&caps[1])) {
        return Some(value);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    as_object(&text[start..=end])
}

fn invalid(message: impl Into<String>) -> ClassifyError {
    ClassifyError::Validation(message.into())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn number(obj: &Map<String, Value>, key: &str) -> Result<Option<u64>, ClassifyError> {
    let parsed = match obj.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| invalid(format!("field '{key}' is not a non-negative integer")))
}

fn required_number(obj: &Map<String, Value>, key: &str) -> Result<u64, ClassifyError> {
    number(obj, key)?.ok_or_else(|| invalid(format!("missing required field '{key}'")))
}

fn percentage(value: u64) -> u8 {
    u8::try_from(value.min(100)).unwrap_or(100)
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// Checks an extracted answer against the classification contract.
///
/// # Errors
///
/// Returns [`ClassifyError::Validation`] when a required key is missing,
/// `action` is neither `create` nor `update`, an update names no issue, or
/// a numeric field is not a non-negative integer.
pub fn validate(value: &Value) -> Result<Classification, ClassifyError> {
    let obj = value.as_object().ok_or_else(|| invalid("answer is not a JSON object"))?;
    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| obj.get(**f).is_none_or(Value::is_null)) {
        return Err(invalid(format!("missing required field '{field}'")));
    }

    let action = match obj.get("action").and_then(Value::as_str) {
        Some("create") => IssueAction::Create,
        Some("update") => {
            let issue_id = match number(obj, "redmine_issue_id")? {
                Some(id) => Some(id),
                None => number(obj, "issue_id")?,
            };
            match issue_id {
                Some(issue_id) if issue_id > 0 => IssueAction::Update { issue_id },
                _ => return Err(invalid("action 'update' requires redmine_issue_id")),
            }
        }
        other => {
            let shown = other.map_or_else(|| obj["action"].to_string(), String::from);
            return Err(invalid(format!("invalid action '{shown}'")));
        }
    };

    let subject = obj
        .get("subject")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("field 'subject' is not a string"))?
        .trim()
        .to_string();

    Ok(Classification {
        action,
        subject,
        description: text(obj, "description"),
        tracker_id: required_number(obj, "tracker_id")?,
        priority_id: required_number(obj, "priority_id")?,
        done_ratio: percentage(required_number(obj, "done_ratio")?),
        confidence: number(obj, "confidence").ok().flatten().map(percentage),
        reasoning: text(obj, "reasoning"),
    })
}
