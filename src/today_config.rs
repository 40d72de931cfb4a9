//! The day's materialized schedule and how it is produced from a profile.

use crate::calculations::{Materializer, TimeGroupResolver};
use crate::profile::{Attachments, Profile};
use crate::time_format::local_datetime;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonEntry {
    pub name: String,
    pub short_name: String,
    pub teacher_name: String,
    #[serde(with = "local_datetime")]
    pub start_time: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub end_time: NaiveDateTime,
    #[serde(default, rename = "noDisplayedSeparately", alias = "noDisplaySeparately")]
    pub no_display_separately: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEntry {
    pub name: String,
    pub short_name: String,
    #[serde(with = "local_datetime")]
    pub start_time: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub end_time: NaiveDateTime,
    #[serde(default, rename = "noDisplayedSeparately", alias = "noDisplaySeparately")]
    pub no_display_separately: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividingLineEntry {
    #[serde(with = "local_datetime")]
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScheduleEntry {
    Lesson(LessonEntry),
    Break(BreakEntry),
    DividingLine(DividingLineEntry),
}

impl ScheduleEntry {
    pub fn start_time(&self) -> NaiveDateTime {
        match self {
            ScheduleEntry::Lesson(entry) => entry.start_time,
            ScheduleEntry::Break(entry) => entry.start_time,
            ScheduleEntry::DividingLine(entry) => entry.start_time,
        }
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        match self {
            ScheduleEntry::Lesson(entry) => Some(entry.end_time),
            ScheduleEntry::Break(entry) => Some(entry.end_time),
            ScheduleEntry::DividingLine(_) => None,
        }
    }

    /// Display name; dividing lines have none.
    pub fn name(&self) -> &str {
        match self {
            ScheduleEntry::Lesson(entry) => &entry.name,
            ScheduleEntry::Break(entry) => &entry.name,
            ScheduleEntry::DividingLine(_) => "",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleEntry::Lesson(_) => "lesson",
            ScheduleEntry::Break(_) => "break",
            ScheduleEntry::DividingLine(_) => "dividingLine",
        }
    }

    pub fn is_dividing_line(&self) -> bool {
        matches!(self, ScheduleEntry::DividingLine(_))
    }

    /// Display order: start time, then dividing lines before anything else
    /// starting at the same instant, then end time.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.start_time()
            .cmp(&other.start_time())
            .then_with(|| other.is_dividing_line().cmp(&self.is_dividing_line()))
            .then_with(|| self.end_time().cmp(&other.end_time()))
    }
}

/// Disposable artifact regenerated whenever the day rolls over or the profile changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayConfig {
    #[serde(with = "local_datetime")]
    pub generate_date: NaiveDateTime,
    pub schedule: BTreeMap<String, ScheduleEntry>,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

impl TodayConfig {
    pub fn empty(generate_date: NaiveDateTime) -> Self {
        Self {
            generate_date,
            schedule: BTreeMap::new(),
            attach: Attachments::new(),
        }
    }

    /// Whether this artifact was generated on `day`.
    pub fn is_for(&self, day: NaiveDate) -> bool {
        self.generate_date.date() == day
    }

    /// Entries in display order; remaining ties fall back to key order.
    pub fn sorted_entries(&self) -> Vec<(&str, &ScheduleEntry)> {
        let mut entries: Vec<(&str, &ScheduleEntry)> = self
            .schedule
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
            .collect();
        entries.sort_by(|(_, a), (_, b)| a.display_cmp(b));
        entries
    }
}

/// A freshly generated [`TodayConfig`] plus what the resolver walked through.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedToday {
    pub config: TodayConfig,
    pub curriculum_id: Option<String>,
    /// Visited time-group ids; for a loop the repeating id comes last.
    pub path: Vec<String>,
    pub is_loop: bool,
}

/// Resolves and materializes the schedule for the local day of `now`.
pub fn generate_today_config(profile: &Profile, now: NaiveDateTime) -> GeneratedToday {
    let today = now.date();
    debug!(%today, "generating today config");

    let resolution = TimeGroupResolver::new(profile).resolve_for_date(today);
    let path = resolution.path_ids();
    let is_loop = resolution.is_loop();
    if is_loop {
        error!(chain = ?path, "time groups form a loop, today's schedule is empty");
    }

    let schedule = Materializer::new(profile).materialize(resolution.curriculum(), today);
    let curriculum_id = resolution.curriculum_id().map(str::to_string);
    info!(
        %today,
        curriculum_id = curriculum_id.as_deref().unwrap_or("-"),
        entries = schedule.len(),
        "today config generated"
    );

    GeneratedToday {
        config: TodayConfig {
            generate_date: now,
            schedule,
            attach: Attachments::new(),
        },
        curriculum_id,
        path,
        is_loop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn lesson(start: NaiveDateTime, end: NaiveDateTime) -> ScheduleEntry {
        ScheduleEntry::Lesson(LessonEntry {
            name: "Math".into(),
            short_name: "M".into(),
            teacher_name: String::new(),
            start_time: start,
            end_time: end,
            no_display_separately: false,
        })
    }

    #[test]
    fn dividing_line_sorts_before_same_start() {
        let mut config = TodayConfig::empty(at(0, 0));
        config.schedule.insert("a".into(), lesson(at(10, 0), at(10, 45)));
        config.schedule.insert(
            "b".into(),
            ScheduleEntry::DividingLine(DividingLineEntry { start_time: at(10, 0) }),
        );
        config.schedule.insert("c".into(), lesson(at(8, 0), at(8, 45)));
        config.schedule.insert("d".into(), lesson(at(10, 0), at(10, 30)));

        let order: Vec<&str> = config.sorted_entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn entries_serialize_with_type_tag() {
        let json = serde_json::to_value(lesson(at(8, 0), at(8, 45))).unwrap();
        assert_eq!(json["type"], "lesson");
        assert_eq!(json["startTime"], "2024-04-01T08:00:00");
        assert_eq!(json["noDisplayedSeparately"], false);
    }
}
