//! Named coalesce ladders.
//!
//! Each canonical field lists the raw keys that may carry it, in priority
//! order. The first value that is present, non-null and not blank wins.

use serde_json::{Map, Value};

/// An ordered list of raw keys feeding one canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasLadder {
    pub field: &'static str,
    pub keys: &'static [&'static str],
}

impl AliasLadder {
    pub const fn new(field: &'static str, keys: &'static [&'static str]) -> Self {
        Self { field, keys }
    }

    /// First usable raw value along the ladder.
    pub fn coalesce<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a Value> {
        self.keys
            .iter()
            .filter_map(|key| record.get(*key))
            .find(|value| is_present(value))
    }

    /// First usable value rendered as trimmed text.
    pub fn text(&self, record: &Map<String, Value>) -> Option<String> {
        self.coalesce(record).and_then(value_text)
    }
}

/// Null, blank strings and nested structures do not count as present.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Render a scalar as text. Integral floats drop their fractional part so
/// `12.0` and `12` key the same node.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ladders for structural schedule rows.
pub mod schedule {
    use super::AliasLadder;

    pub const RING_ID: AliasLadder = AliasLadder::new("ring_id", &["ring_number", "ring_id", "ring"]);
    pub const RING_LABEL: AliasLadder = AliasLadder::new("ring_label", &["ringName", "ring_name", "ring_label"]);
    pub const GROUP_ID: AliasLadder = AliasLadder::new(
        "group_id",
        &["class_group_id", "group_id", "class_groupxclasses_id"],
    );
    pub const GROUP_LABEL: AliasLadder = AliasLadder::new(
        "group_label",
        &["group_name", "group_label", "class_group_name", "class_name"],
    );
    pub const CLASS_ID: AliasLadder = AliasLadder::new("class_id", &["class_id", "classId"]);
    pub const CLASS_NUMBER: AliasLadder = AliasLadder::new("class_number", &["class_number", "class_num", "number"]);
    pub const CLASS_LABEL: AliasLadder = AliasLadder::new("class_label", &["class_name", "class_label", "name"]);
    pub const SEQUENCE: AliasLadder = AliasLadder::new(
        "sequence",
        &["class_sequence", "sequence", "seq", "schedule_sequence", "order"],
    );
    pub const SCHEDULED_TIME: AliasLadder = AliasLadder::new(
        "scheduled_time",
        &[
            "latestStart",
            "time",
            "start_time",
            "scheduled_time",
            "estimated_start_time",
            "start_time_default",
            "estimated_go_time",
        ],
    );
    pub const STATUS: AliasLadder = AliasLadder::new("status", &["latestStatus", "status", "class_status"]);

    pub const ALL: &[AliasLadder] = &[
        RING_ID,
        RING_LABEL,
        GROUP_ID,
        GROUP_LABEL,
        CLASS_ID,
        CLASS_NUMBER,
        CLASS_LABEL,
        SEQUENCE,
        SCHEDULED_TIME,
        STATUS,
    ];
}

/// Ladders for live trip rows.
pub mod trip {
    use super::AliasLadder;

    pub const CLASS_ID: AliasLadder = AliasLadder::new("class_id", &["class_id", "classId"]);
    pub const RING_ID: AliasLadder = AliasLadder::new("ring_id", &["ring_number", "ring_id", "ring"]);
    pub const GROUP_ID: AliasLadder = AliasLadder::new(
        "group_id",
        &["class_group_id", "group_id", "class_groupxclasses_id"],
    );
    pub const CLASS_NUMBER: AliasLadder = AliasLadder::new("class_number", &["class_number", "class_num"]);
    pub const CLASS_LABEL: AliasLadder = AliasLadder::new("class_label", &["class_name", "class_label"]);
    pub const PARTICIPANT: AliasLadder = AliasLadder::new(
        "participant_name",
        &["horseName", "horse_name", "horse", "participant_name"],
    );
    pub const HANDLER: AliasLadder = AliasLadder::new(
        "handler_name",
        &["riderName", "rider_name", "rider", "handler_name"],
    );
    pub const TEAM: AliasLadder = AliasLadder::new("team_name", &["teamName", "team_name", "team"]);
    pub const ENTRY_NUMBER: AliasLadder = AliasLadder::new(
        "entry_number",
        &["entryNumber", "entry_number", "backNumber", "back_number"],
    );
    pub const ORDER_OF_GO: AliasLadder = AliasLadder::new(
        "order_of_go",
        &["lastOOG", "order_of_go", "oog", "latestOOG"],
    );
    pub const GO_TIME: AliasLadder = AliasLadder::new(
        "go_time",
        &["latestGO", "go_time", "estimated_go_time", "goTime"],
    );
    pub const RESULT_SCORE: AliasLadder = AliasLadder::new("result_score", &["lastScore", "score", "result_score"]);
    pub const PLACING: AliasLadder = AliasLadder::new("placing", &["latestPlacing", "placing", "place"]);
    pub const STATUS: AliasLadder = AliasLadder::new("status", &["latestStatus", "status", "class_status"]);

    pub const ALL: &[AliasLadder] = &[
        CLASS_ID,
        RING_ID,
        GROUP_ID,
        CLASS_NUMBER,
        CLASS_LABEL,
        PARTICIPANT,
        HANDLER,
        TEAM,
        ENTRY_NUMBER,
        ORDER_OF_GO,
        GO_TIME,
        RESULT_SCORE,
        PLACING,
        STATUS,
    ];
}

/// Ladders for feed metadata carried on records.
pub mod meta {
    use super::AliasLadder;

    pub const SHOW_DATE: AliasLadder = AliasLadder::new("dt", &["dt", "show_date", "date"]);
    pub const SHOW_ID: AliasLadder = AliasLadder::new("sid", &["sid", "show_id"]);
}
