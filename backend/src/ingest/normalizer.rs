//! Raw feed rows to canonical records.
//!
//! The normalizer never fails. Rows that are not JSON objects are skipped and
//! counted; missing fields become `None` and are counted per field so callers
//! can see what upstream left out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::aliases::{self, AliasLadder};
use crate::models::feed::{FeedDocument, FeedMeta};
use crate::models::keys::{ClassKey, GroupKey, RingKey};
use crate::models::records::{FlexNumber, ScheduleRecord, TripRecord};
use crate::models::time::parse_clock;

/// Label fallbacks applied when a feed leaves a label blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRules {
    /// `{id}` is replaced by the ring identifier.
    pub ring_label_template: String,
    pub group_label_fallback: String,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self {
            ring_label_template: "Ring {id}".to_string(),
            group_label_fallback: "(Group)".to_string(),
        }
    }
}

impl LabelRules {
    pub fn ring_label(&self, ring_id: Option<&RingKey>) -> String {
        match ring_id {
            Some(id) => self.ring_label_template.replace("{id}", id.as_str()),
            None => self.ring_label_template.replace("{id}", "?"),
        }
    }
}

/// Per-field gaps found in schedule rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStats {
    pub total_records: usize,
    pub skipped_non_objects: usize,
    pub missing_ring_id: usize,
    pub missing_group_id: usize,
    pub missing_class_id: usize,
    pub missing_scheduled_time: usize,
    pub unparsed_scheduled_time: usize,
    pub text_class_numbers: usize,
}

/// Per-field gaps found in trip rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripStats {
    pub total_records: usize,
    pub skipped_non_objects: usize,
    pub missing_class_id: usize,
    pub missing_ring_id: usize,
    pub missing_group_id: usize,
    pub missing_participant: usize,
    pub missing_handler: usize,
    pub missing_go_time: usize,
    pub unparsed_go_time: usize,
}

/// Diagnostics for one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub schedule: ScheduleStats,
    pub trips: TripStats,
    pub warnings: Vec<String>,
}

impl NormalizationReport {
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// True when no key field was missing anywhere.
    pub fn is_clean(&self) -> bool {
        let s = &self.schedule;
        let t = &self.trips;
        s.skipped_non_objects == 0
            && s.missing_ring_id == 0
            && s.missing_group_id == 0
            && s.missing_class_id == 0
            && t.skipped_non_objects == 0
            && t.missing_class_id == 0
    }
}

/// Output of [`Normalizer::normalize`].
#[derive(Debug, Clone, Default)]
pub struct NormalizedFeeds {
    pub schedule: Vec<ScheduleRecord>,
    pub trips: Vec<TripRecord>,
    pub meta: FeedMeta,
    pub report: NormalizationReport,
}

fn flex(ladder: &AliasLadder, record: &Map<String, Value>) -> Option<FlexNumber> {
    ladder.coalesce(record).and_then(FlexNumber::from_json)
}

/// Converts raw feed rows into canonical records.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    labels: LabelRules,
}

impl Normalizer {
    pub fn new(labels: LabelRules) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &LabelRules {
        &self.labels
    }

    /// Normalize both feeds and merge their metadata.
    pub fn normalize(&self, schedule: &FeedDocument, trips: &FeedDocument) -> NormalizedFeeds {
        let mut report = NormalizationReport::default();
        let schedule_records = self.normalize_schedule(&schedule.records, &mut report.schedule);
        let trip_records = self.normalize_trips(&trips.records, &mut report.trips);

        if report.schedule.skipped_non_objects > 0 {
            report.add_warning(format!(
                "{} schedule rows were not objects",
                report.schedule.skipped_non_objects
            ));
        }
        if report.trips.skipped_non_objects > 0 {
            report.add_warning(format!(
                "{} trip rows were not objects",
                report.trips.skipped_non_objects
            ));
        }

        NormalizedFeeds {
            schedule: schedule_records,
            trips: trip_records,
            meta: resolve_meta(schedule, trips),
            report,
        }
    }

    /// Normalize schedule rows, counting gaps into `stats`.
    pub fn normalize_schedule(&self, rows: &[Value], stats: &mut ScheduleStats) -> Vec<ScheduleRecord> {
        use aliases::schedule as s;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            stats.total_records += 1;
            let Some(record) = row.as_object() else {
                stats.skipped_non_objects += 1;
                continue;
            };

            let ring_id = s::RING_ID.text(record).map(RingKey::from);
            let group_id = s::GROUP_ID.text(record).map(GroupKey::from);
            let class_id = s::CLASS_ID.text(record).map(ClassKey::from);
            let class_number = flex(&s::CLASS_NUMBER, record);
            let scheduled_time = s::SCHEDULED_TIME.text(record);
            let scheduled_minutes = scheduled_time.as_deref().and_then(parse_clock);

            if ring_id.is_none() {
                stats.missing_ring_id += 1;
            }
            if group_id.is_none() {
                stats.missing_group_id += 1;
            }
            if class_id.is_none() {
                stats.missing_class_id += 1;
            }
            match (&scheduled_time, scheduled_minutes) {
                (None, _) => stats.missing_scheduled_time += 1,
                (Some(_), None) => stats.unparsed_scheduled_time += 1,
                _ => {}
            }
            if matches!(class_number, Some(FlexNumber::Text(_))) {
                stats.text_class_numbers += 1;
            }

            let class_label = s::CLASS_LABEL
                .text(record)
                .or_else(|| class_number.as_ref().map(|n| format!("Class {}", n)))
                .unwrap_or_default();
            let group_label = s::GROUP_LABEL
                .text(record)
                .unwrap_or_else(|| self.labels.group_label_fallback.clone());
            let ring_label = s::RING_LABEL
                .text(record)
                .unwrap_or_else(|| self.labels.ring_label(ring_id.as_ref()));

            out.push(ScheduleRecord {
                ring_id,
                ring_label,
                group_id,
                group_label,
                class_id,
                class_number,
                class_label,
                sequence: flex(&s::SEQUENCE, record),
                scheduled_time,
                scheduled_minutes,
                status: s::STATUS.text(record),
            });
        }
        out
    }

    /// Normalize trip rows, counting gaps into `stats`.
    pub fn normalize_trips(&self, rows: &[Value], stats: &mut TripStats) -> Vec<TripRecord> {
        use aliases::trip as t;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            stats.total_records += 1;
            let Some(record) = row.as_object() else {
                stats.skipped_non_objects += 1;
                continue;
            };

            let trip = TripRecord {
                class_id: t::CLASS_ID.text(record).map(ClassKey::from),
                ring_id: t::RING_ID.text(record).map(RingKey::from),
                group_id: t::GROUP_ID.text(record).map(GroupKey::from),
                class_number: flex(&t::CLASS_NUMBER, record),
                class_label: t::CLASS_LABEL.text(record),
                participant_name: t::PARTICIPANT.text(record),
                handler_name: t::HANDLER.text(record),
                team_name: t::TEAM.text(record),
                entry_number: flex(&t::ENTRY_NUMBER, record),
                order_of_go: flex(&t::ORDER_OF_GO, record),
                go_minutes: t::GO_TIME.text(record).as_deref().and_then(parse_clock),
                go_time: t::GO_TIME.text(record),
                result_score: flex(&t::RESULT_SCORE, record),
                placing: flex(&t::PLACING, record),
                status: t::STATUS.text(record),
            };

            if trip.class_id.is_none() {
                stats.missing_class_id += 1;
            }
            if trip.ring_id.is_none() {
                stats.missing_ring_id += 1;
            }
            if trip.group_id.is_none() {
                stats.missing_group_id += 1;
            }
            if trip.participant_name.is_none() {
                stats.missing_participant += 1;
            }
            if trip.handler_name.is_none() {
                stats.missing_handler += 1;
            }
            match (&trip.go_time, trip.go_minutes) {
                (None, _) => stats.missing_go_time += 1,
                (Some(_), None) => stats.unparsed_go_time += 1,
                _ => {}
            }

            out.push(trip);
        }
        out
    }
}

/// Show date and id: document meta first, then the first record carrying them.
/// The generation stamp is taken from the trips document, falling back to the
/// schedule document.
pub fn resolve_meta(schedule: &FeedDocument, trips: &FeedDocument) -> FeedMeta {
    let from_records = |ladder: &AliasLadder| {
        schedule
            .records
            .iter()
            .chain(trips.records.iter())
            .filter_map(Value::as_object)
            .find_map(|record| ladder.text(record))
    };

    FeedMeta {
        generated_at: trips
            .meta
            .generated_at
            .clone()
            .or_else(|| schedule.meta.generated_at.clone()),
        dt: schedule
            .meta
            .dt
            .clone()
            .or_else(|| trips.meta.dt.clone())
            .or_else(|| from_records(&aliases::meta::SHOW_DATE)),
        sid: schedule
            .meta
            .sid
            .clone()
            .or_else(|| trips.meta.sid.clone())
            .or_else(|| from_records(&aliases::meta::SHOW_ID)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(records: Value) -> FeedDocument {
        FeedDocument {
            meta: FeedMeta::default(),
            records: records.as_array().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_schedule_row_normalizes_aliases() {
        let normalizer = Normalizer::default();
        let mut stats = ScheduleStats::default();
        let rows = vec![json!({
            "ring_number": 2,
            "class_group_id": "g-10",
            "group_name": "Hunter Derby",
            "class_id": 501,
            "class_number": "12",
            "class_name": "Derby I",
            "estimated_start_time": "9:30 AM",
            "latestStatus": "Underway"
        })];
        let out = normalizer.normalize_schedule(&rows, &mut stats);
        assert_eq!(out.len(), 1);
        let row = &out[0];
        assert_eq!(row.ring_id, Some(RingKey::from("2")));
        assert_eq!(row.ring_label, "Ring 2");
        assert_eq!(row.group_id, Some(GroupKey::from("g-10")));
        assert_eq!(row.class_id, Some(ClassKey::from("501")));
        assert_eq!(row.class_number, Some(FlexNumber::Number(12.0)));
        assert_eq!(row.scheduled_minutes, Some(570));
        assert_eq!(row.status.as_deref(), Some("Underway"));
        assert_eq!(stats.missing_scheduled_time, 0);
    }

    #[test]
    fn test_missing_fields_are_counted_not_dropped() {
        let normalizer = Normalizer::default();
        let mut stats = ScheduleStats::default();
        let rows = vec![
            json!({ "class_id": 1, "time": "later" }),
            json!("not an object"),
            json!({ "ring": "A", "group_id": 4, "class_id": 2, "class_number": "12B" }),
        ];
        let out = normalizer.normalize_schedule(&rows, &mut stats);
        assert_eq!(out.len(), 2);
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.skipped_non_objects, 1);
        assert_eq!(stats.missing_ring_id, 1);
        assert_eq!(stats.missing_group_id, 1);
        assert_eq!(stats.unparsed_scheduled_time, 1);
        assert_eq!(stats.missing_scheduled_time, 1);
        assert_eq!(stats.text_class_numbers, 1);
        assert_eq!(out[0].group_label, "(Group)");
        assert_eq!(out[1].class_number, Some(FlexNumber::Text("12B".into())));
        assert_eq!(out[1].class_label, "Class 12B");
    }

    #[test]
    fn test_trip_row_normalizes_aliases() {
        let normalizer = Normalizer::default();
        let mut stats = TripStats::default();
        let rows = vec![json!({
            "class_id": 501,
            "ring_number": 2,
            "class_group_id": "g-10",
            "horseName": "Cassius",
            "riderName": "Ann Smith",
            "lastOOG": "3",
            "latestGO": "9:05 AM",
            "lastScore": "82.5",
            "entryNumber": 144
        })];
        let out = normalizer.normalize_trips(&rows, &mut stats);
        let trip = &out[0];
        assert_eq!(trip.participant_name.as_deref(), Some("Cassius"));
        assert_eq!(trip.handler_name.as_deref(), Some("Ann Smith"));
        assert_eq!(trip.order_of_go, Some(FlexNumber::Number(3.0)));
        assert_eq!(trip.go_minutes, Some(545));
        assert_eq!(trip.result_score, Some(FlexNumber::Number(82.5)));
        assert_eq!(trip.entry_number.as_ref().map(|n| n.to_string()).as_deref(), Some("144"));
        assert_eq!(stats, TripStats { total_records: 1, ..Default::default() });
    }

    #[test]
    fn test_meta_coalesces_from_records() {
        let schedule = doc(json!([{ "class_id": 1 }, { "class_id": 2, "dt": "2024-06-10", "sid": 812 }]));
        let mut trips = doc(json!([]));
        trips.meta.generated_at = Some("2024-06-10T12:00:00Z".into());
        let meta = resolve_meta(&schedule, &trips);
        assert_eq!(meta.dt.as_deref(), Some("2024-06-10"));
        assert_eq!(meta.sid.as_deref(), Some("812"));
        assert_eq!(meta.generated_at.as_deref(), Some("2024-06-10T12:00:00Z"));
    }

    #[test]
    fn test_custom_ring_template() {
        let normalizer = Normalizer::new(LabelRules {
            ring_label_template: "Arena {id}".into(),
            group_label_fallback: "Unnamed".into(),
        });
        let mut stats = ScheduleStats::default();
        let out = normalizer.normalize_schedule(&[json!({ "ring": 4, "class_id": 9 })], &mut stats);
        assert_eq!(out[0].ring_label, "Arena 4");
        assert_eq!(out[0].group_label, "Unnamed");
    }

    #[test]
    fn test_report_flags_non_objects() {
        let normalizer = Normalizer::default();
        let feeds = normalizer.normalize(&doc(json!([1, 2])), &doc(json!([])));
        assert_eq!(feeds.report.schedule.skipped_non_objects, 2);
        assert_eq!(feeds.report.warnings.len(), 1);
        assert!(!feeds.report.is_clean());
    }
}
