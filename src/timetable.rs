use crate::profile::Attachments;
use crate::time_format::time_of_day;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A teaching slot. The subject is a default that a curriculum may override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonLayout {
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub subject_id: String,
    /// Only shown in its own position when the time fits, instead of alongside the lessons.
    #[serde(default, rename = "noDisplayedSeparately", alias = "noDisplaySeparately")]
    pub no_display_separately: bool,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakLayout {
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub break_name: String,
    #[serde(default)]
    pub break_short_name: String,
    #[serde(default, rename = "noDisplayedSeparately", alias = "noDisplaySeparately")]
    pub no_display_separately: bool,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

/// Visual marker; it has a start but no end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividingLineLayout {
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimetableLayout {
    Lesson(LessonLayout),
    Break(BreakLayout),
    DividingLine(DividingLineLayout),
}

impl TimetableLayout {
    pub fn lesson(start: NaiveTime, end: NaiveTime, subject_id: impl Into<String>) -> Self {
        TimetableLayout::Lesson(LessonLayout {
            start_time: start,
            end_time: end,
            subject_id: subject_id.into(),
            no_display_separately: false,
            attach: Attachments::new(),
        })
    }

    pub fn break_time(
        start: NaiveTime,
        end: NaiveTime,
        name: impl Into<String>,
        short_name: impl Into<String>,
    ) -> Self {
        TimetableLayout::Break(BreakLayout {
            start_time: start,
            end_time: end,
            break_name: name.into(),
            break_short_name: short_name.into(),
            no_display_separately: false,
            attach: Attachments::new(),
        })
    }

    pub fn dividing_line(start: NaiveTime) -> Self {
        TimetableLayout::DividingLine(DividingLineLayout {
            start_time: start,
            attach: Attachments::new(),
        })
    }

    pub fn start_time(&self) -> NaiveTime {
        match self {
            TimetableLayout::Lesson(layout) => layout.start_time,
            TimetableLayout::Break(layout) => layout.start_time,
            TimetableLayout::DividingLine(layout) => layout.start_time,
        }
    }

    pub fn end_time(&self) -> Option<NaiveTime> {
        match self {
            TimetableLayout::Lesson(layout) => Some(layout.end_time),
            TimetableLayout::Break(layout) => Some(layout.end_time),
            TimetableLayout::DividingLine(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TimetableLayout::Lesson(_) => "lesson",
            TimetableLayout::Break(_) => "break",
            TimetableLayout::DividingLine(_) => "dividingLine",
        }
    }
}

/// Reusable time-slot template, independent of what is taught in each slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub name: String,
    #[serde(default)]
    pub layouts: BTreeMap<String, TimetableLayout>,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

impl Timetable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, layout_id: impl Into<String>, layout: TimetableLayout) -> Self {
        self.layouts.insert(layout_id.into(), layout);
        self
    }

    pub fn lesson_ids(&self) -> impl Iterator<Item = &str> {
        self.layouts.iter().filter_map(|(id, layout)| match layout {
            TimetableLayout::Lesson(_) => Some(id.as_str()),
            _ => None,
        })
    }
}
