//! Canonical record shapes produced by the normalizer.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::keys::{ClassKey, GroupKey, RingKey};

/// A numeric-looking field value.
///
/// Values that parse as numbers are kept as numbers; anything else keeps the
/// operator-supplied text instead of being discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexNumber {
    Number(f64),
    Text(String),
}

impl FlexNumber {
    /// Build from raw JSON. Null, blank strings and non-scalar values yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(FlexNumber::Number),
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Bool(b) => Some(FlexNumber::Text(b.to_string())),
            _ => None,
        }
    }

    /// Parse text, retaining it verbatim when it is not a finite number.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(FlexNumber::Number(n)),
            _ => Some(FlexNumber::Text(trimmed.to_string())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlexNumber::Number(n) => Some(*n),
            FlexNumber::Text(_) => None,
        }
    }

    /// Numbers compare numerically and sort before text; text compares lexicographically.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FlexNumber::Number(a), FlexNumber::Number(b)) => a.total_cmp(b),
            (FlexNumber::Number(_), FlexNumber::Text(_)) => Ordering::Less,
            (FlexNumber::Text(_), FlexNumber::Number(_)) => Ordering::Greater,
            (FlexNumber::Text(a), FlexNumber::Text(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for FlexNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexNumber::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            FlexNumber::Number(n) => write!(f, "{}", n),
            FlexNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Compare two optional values with `None` sorting last.
pub fn cmp_nulls_last<T, F>(a: Option<&T>, b: Option<&T>, cmp: F) -> Ordering
where
    F: FnOnce(&T, &T) -> Ordering,
{
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A structural schedule row: one class placed in a group on a ring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub ring_id: Option<RingKey>,
    pub ring_label: String,
    pub group_id: Option<GroupKey>,
    pub group_label: String,
    pub class_id: Option<ClassKey>,
    pub class_number: Option<FlexNumber>,
    pub class_label: String,
    /// Declared running order within the day, when the schedule carries one.
    pub sequence: Option<FlexNumber>,
    pub scheduled_time: Option<String>,
    /// `scheduled_time` in minutes since midnight, when it parses.
    pub scheduled_minutes: Option<u32>,
    pub status: Option<String>,
}

/// A live trip: one participant's go in one class.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TripRecord {
    pub class_id: Option<ClassKey>,
    pub ring_id: Option<RingKey>,
    pub group_id: Option<GroupKey>,
    pub class_number: Option<FlexNumber>,
    pub class_label: Option<String>,
    /// Horse.
    pub participant_name: Option<String>,
    /// Rider.
    pub handler_name: Option<String>,
    pub team_name: Option<String>,
    pub entry_number: Option<FlexNumber>,
    pub order_of_go: Option<FlexNumber>,
    pub go_time: Option<String>,
    pub go_minutes: Option<u32>,
    pub result_score: Option<FlexNumber>,
    pub placing: Option<FlexNumber>,
    pub status: Option<String>,
}

/// Which trip field identifies a followable participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowField {
    #[default]
    Horse,
    Rider,
}

impl std::str::FromStr for FollowField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horse" | "participant" => Ok(Self::Horse),
            "rider" | "handler" => Ok(Self::Rider),
            _ => Err(format!("Unknown follow field: {}", s)),
        }
    }
}

impl TripRecord {
    /// The identity this trip contributes to the follow set.
    pub fn identity(&self, field: FollowField) -> Option<&str> {
        match field {
            FollowField::Horse => self.participant_name.as_deref(),
            FollowField::Rider => self.handler_name.as_deref(),
        }
    }

    /// Order of go as a number. Text values count as unknown.
    pub fn order_of_go_value(&self) -> Option<f64> {
        self.order_of_go.as_ref().and_then(FlexNumber::as_f64)
    }
}
