use crate::feed_interface::code::WarningCode;
use crate::prelude::{WarnError, WarnResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Marker the feed uses, in either field, for a warning that has been lifted.
pub const CANCEL: &str = "CANCEL";

/// One entry of the `warnsum` feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub code: String,
    pub action_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl FeedRecord {
    pub fn new(code: impl Into<String>, action_code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            action_code: action_code.into(),
            name: None,
            kind: None,
            issue_time: None,
            update_time: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.action_code != CANCEL && self.code != CANCEL
    }

    pub fn tracked_code(&self) -> Option<WarningCode> {
        WarningCode::from_code(&self.code)
    }
}

/// Parses a raw feed value: an object whose values are records.
///
/// A single malformed record rejects the whole snapshot.
pub fn parse_records(value: &Value) -> WarnResult<Vec<FeedRecord>> {
    let entries = value.as_object().ok_or_else(|| {
        WarnError::FeedParse(format!("expected an object of records, got {}", kind_of(value)))
    })?;

    entries
        .iter()
        .map(|(key, entry)| {
            FeedRecord::deserialize(entry)
                .map_err(|err| WarnError::FeedParse(format!("record {key}: {err}")))
        })
        .collect()
}

/// Tracked codes that are currently in force.
pub fn active_codes(records: &[FeedRecord]) -> BTreeSet<WarningCode> {
    records
        .iter()
        .filter(|record| record.is_active())
        .filter_map(FeedRecord::tracked_code)
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_warnsum_payload() {
        let payload = json!({
            "WTCSGNL": {
                "name": "熱帶氣旋警告信號",
                "code": "TC8NE",
                "type": "八號東北烈風或暴風信號",
                "actionCode": "ISSUE",
                "issueTime": "2024-09-05T20:40:00+08:00",
                "updateTime": "2024-09-05T20:40:00+08:00"
            },
            "WHOT": { "name": "酷熱天氣警告", "code": "WHOT", "actionCode": "EXTEND" }
        });

        let records = parse_records(&payload).unwrap();
        assert_eq!(records.len(), 2);
        let codes = active_codes(&records);
        assert!(codes.contains(&WarningCode::Signal8NorthEast));
        assert!(codes.contains(&WarningCode::VeryHot));
    }

    #[test]
    fn cancelled_and_untracked_records_are_inactive() {
        let records = vec![
            FeedRecord::new("WRAINA", CANCEL),
            FeedRecord::new(CANCEL, "ISSUE"),
            FeedRecord::new("WFIRE", "ISSUE"),
            FeedRecord::new("WL", "ISSUE"),
        ];
        let codes = active_codes(&records);
        assert_eq!(codes.into_iter().collect::<Vec<_>>(), vec![WarningCode::Landslip]);
    }

    #[test]
    fn empty_object_is_a_valid_snapshot() {
        let records = parse_records(&json!({})).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn rejects_non_object_and_missing_fields() {
        assert!(matches!(
            parse_records(&json!([1, 2])),
            Err(WarnError::FeedParse(_))
        ));
        assert!(matches!(
            parse_records(&json!({"WHOT": {"code": "WHOT"}})),
            Err(WarnError::FeedParse(_))
        ));
    }
}
