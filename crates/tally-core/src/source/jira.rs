//! Jira search-API documents and their conversion into [`RawItem`]s.
//!
//! Only the parts of an issue the metrics need are modelled: key, creation
//! time, current status, and the change log (`expand=changelog`). Unknown
//! JSON fields are ignored.
//!
//! Issues are decoded one at a time from raw JSON values, so an issue that
//! does not fit the model is dropped with a warning and the rest survive.

use chrono::DateTime;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::item::{HistoryEvent, RawItem, Timestamp};

/// One page of `GET /rest/api/2/search`.
///
/// Issues stay undecoded until [`decode_issues`] so one bad issue cannot
/// reject the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub start_at: usize,
    #[serde(default)]
    pub max_results: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    #[serde(default)]
    pub fields: JiraFields,
    #[serde(default)]
    pub changelog: JiraChangelog,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraFields {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub status: Option<JiraStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraStatus {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraChangelog {
    #[serde(default)]
    pub histories: Vec<JiraHistory>,
}

/// A change-log entry: one author action touching one or more fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraHistory {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub items: Vec<JiraChangeItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraChangeItem {
    /// Empty when the export omits it; such items are dropped on conversion.
    #[serde(default)]
    pub field: String,
    #[serde(rename = "fromString", default)]
    pub from_value: Option<String>,
    #[serde(rename = "toString", default)]
    pub to_value: Option<String>,
}

/// Decode an export: a search response or a bare issue array.
///
/// Issues that do not decode are dropped with a warning.
///
/// # Errors
///
/// Returns the decoder error when `content` is not JSON, or when it is
/// neither an array nor an object with an `issues` array.
pub fn parse_export(content: &str) -> Result<Vec<JiraIssue>, serde_json::Error> {
    let entries = match serde_json::from_str::<Value>(content)? {
        Value::Array(entries) => entries,
        Value::Object(mut document) => match document.remove("issues") {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return Err(serde_json::Error::custom(format!(
                    "`issues` must be an array, found {}",
                    json_kind(&other)
                )));
            }
            None => {
                return Err(serde_json::Error::custom(
                    "search response has no `issues` array",
                ));
            }
        },
        other => {
            return Err(serde_json::Error::custom(format!(
                "expected an issue array or a search response object, found {}",
                json_kind(&other)
            )));
        }
    };
    Ok(decode_issues(entries))
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode raw issue values, dropping (and logging) the ones that do not fit.
#[must_use]
pub fn decode_issues(entries: Vec<Value>) -> Vec<JiraIssue> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let key = entry
                .get("key")
                .and_then(Value::as_str)
                .map(str::to_string);
            serde_json::from_value::<JiraIssue>(entry)
                .map_err(|err| {
                    warn!(index, key = ?key, error = %err, "skipping undecodable issue");
                })
                .ok()
        })
        .collect()
}

/// Parse a Jira timestamp (`2024-01-01T00:00:00.000+0000`) or RFC 3339.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

/// Flatten one issue into a [`RawItem`].
///
/// Returns `None` (and logs) when the creation time is missing or
/// unparsable. History entries with a bad timestamp are dropped individually.
#[must_use]
pub fn convert_issue(issue: &JiraIssue) -> Option<RawItem> {
    let Some(created_at) = issue.fields.created.as_deref().and_then(parse_timestamp) else {
        warn!(
            key = %issue.key,
            created = ?issue.fields.created,
            "skipping issue without a parsable creation time"
        );
        return None;
    };

    let events = issue
        .changelog
        .histories
        .iter()
        .filter_map(|history| {
            let at = history.created.as_deref().and_then(parse_timestamp);
            if at.is_none() {
                warn!(
                    key = %issue.key,
                    created = ?history.created,
                    "dropping change-log entry without a parsable timestamp"
                );
            }
            at.map(|at| (at, history))
        })
        .flat_map(|(at, history)| history.items.iter().map(move |item| (at, item)))
        .filter(|(_, item)| {
            if item.field.is_empty() {
                warn!(key = %issue.key, "dropping change item without a field name");
            }
            !item.field.is_empty()
        })
        .map(|(at, item)| {
            HistoryEvent::new(
                item.field.clone(),
                item.from_value.clone().unwrap_or_default(),
                item.to_value.clone().unwrap_or_default(),
                at,
            )
        })
        .collect();

    Some(RawItem {
        key: issue.key.clone(),
        status: issue
            .fields
            .status
            .as_ref()
            .map(|status| status.name.clone())
            .unwrap_or_default(),
        created_at,
        events,
    })
}

/// Convert every issue, dropping the malformed ones.
#[must_use]
pub fn convert_issues(issues: &[JiraIssue]) -> Vec<RawItem> {
    issues.iter().filter_map(convert_issue).collect()
}
