use crate::curriculum::Curriculum;
use crate::subject::Subject;
use crate::time_format::optional_date;
use crate::time_group::TimeGroup;
use crate::timetable::Timetable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace, warn};

/// Free-form extra data carried through load and save untouched.
pub type Attachments = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    Curriculum,
    #[serde(rename = "timegroup")]
    TimeGroup,
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKind::Curriculum => f.write_str("curriculum"),
            SelectionKind::TimeGroup => f.write_str("timegroup"),
        }
    }
}

/// Root of resolution: a curriculum used as-is, or a time group to walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(rename = "type")]
    pub kind: SelectionKind,
    pub id: String,
}

impl Selection {
    pub fn curriculum(id: impl Into<String>) -> Self {
        Self {
            kind: SelectionKind::Curriculum,
            id: id.into(),
        }
    }

    pub fn time_group(id: impl Into<String>) -> Self {
        Self {
            kind: SelectionKind::TimeGroup,
            id: id.into(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Day-granular override of [`EnableConfig::selected`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempSelection {
    #[serde(default)]
    pub enable: bool,
    #[serde(rename = "type")]
    pub kind: SelectionKind,
    #[serde(default)]
    pub id: String,
    #[serde(default, with = "optional_date")]
    pub start_time: Option<NaiveDate>,
    #[serde(default, with = "optional_date")]
    pub end_time: Option<NaiveDate>,
}

impl TempSelection {
    pub fn selection(&self) -> Selection {
        Selection {
            kind: self.kind,
            id: self.id.clone(),
        }
    }

    /// Whether the override applies on `date`. Both bounds are inclusive.
    pub fn covers(&self, date: NaiveDate) -> bool {
        if !self.enable {
            trace!("temporary selection disabled");
            return false;
        }
        let (Some(start), Some(end)) = (self.start_time, self.end_time) else {
            warn!("temporary selection enabled without a complete date range");
            return false;
        };
        let in_range = start <= date && date <= end;
        trace!(%start, %end, %date, in_range, "temporary selection range check");
        in_range
    }
}

impl Default for TempSelection {
    fn default() -> Self {
        Self {
            enable: false,
            kind: SelectionKind::Curriculum,
            id: String::new(),
            start_time: None,
            end_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableConfig {
    pub selected: Selection,
    #[serde(default)]
    pub temp_selected: TempSelection,
}

impl Default for EnableConfig {
    fn default() -> Self {
        Self {
            selected: Selection::time_group(""),
            temp_selected: TempSelection::default(),
        }
    }
}

impl EnableConfig {
    /// Picks the resolution root for `date`: the temporary override when it
    /// is enabled and covers the day, the permanent selection otherwise.
    pub fn active_root(&self, date: NaiveDate) -> Selection {
        if self.temp_selected.covers(date) {
            let root = self.temp_selected.selection();
            debug!(root = %root, "using temporary selection");
            root
        } else {
            debug!(root = %self.selected, "using permanent selection");
            self.selected.clone()
        }
    }
}

/// Everything the operator authors: reference data, cycles and the active selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub subjects: BTreeMap<String, Subject>,
    #[serde(default)]
    pub timetables: BTreeMap<String, Timetable>,
    #[serde(default)]
    pub curriculums: BTreeMap<String, Curriculum>,
    #[serde(default)]
    pub time_groups: BTreeMap<String, TimeGroup>,
    #[serde(default)]
    pub enable_config: EnableConfig,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, id: impl Into<String>, subject: Subject) -> Self {
        self.subjects.insert(id.into(), subject);
        self
    }

    pub fn with_timetable(mut self, id: impl Into<String>, timetable: Timetable) -> Self {
        self.timetables.insert(id.into(), timetable);
        self
    }

    pub fn with_curriculum(mut self, id: impl Into<String>, curriculum: Curriculum) -> Self {
        self.curriculums.insert(id.into(), curriculum);
        self
    }

    pub fn with_time_group(mut self, id: impl Into<String>, time_group: TimeGroup) -> Self {
        self.time_groups.insert(id.into(), time_group);
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.enable_config.selected = selection;
        self
    }

    pub fn active_root(&self, date: NaiveDate) -> Selection {
        self.enable_config.active_root(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config_with_override(enable: bool, start: Option<NaiveDate>, end: Option<NaiveDate>) -> EnableConfig {
        EnableConfig {
            selected: Selection::time_group("root"),
            temp_selected: TempSelection {
                enable,
                kind: SelectionKind::Curriculum,
                id: "C1".into(),
                start_time: start,
                end_time: end,
            },
        }
    }

    #[test]
    fn override_applies_inside_inclusive_window() {
        let config = config_with_override(true, Some(d(2024, 1, 1)), Some(d(2024, 1, 3)));
        assert_eq!(config.active_root(d(2024, 1, 1)), Selection::curriculum("C1"));
        assert_eq!(config.active_root(d(2024, 1, 3)), Selection::curriculum("C1"));
        assert_eq!(config.active_root(d(2024, 1, 4)), Selection::time_group("root"));
        assert_eq!(config.active_root(d(2023, 12, 31)), Selection::time_group("root"));
    }

    #[test]
    fn override_needs_both_bounds_and_enable() {
        let missing_end = config_with_override(true, Some(d(2024, 1, 1)), None);
        assert_eq!(missing_end.active_root(d(2024, 1, 1)), Selection::time_group("root"));

        let disabled = config_with_override(false, Some(d(2024, 1, 1)), Some(d(2024, 1, 3)));
        assert_eq!(disabled.active_root(d(2024, 1, 2)), Selection::time_group("root"));
    }

    #[test]
    fn selection_kind_serializes_like_profile_files() {
        let json = serde_json::to_value(Selection::time_group("g")).unwrap();
        assert_eq!(json["type"], "timegroup");
        let json = serde_json::to_value(Selection::curriculum("c")).unwrap();
        assert_eq!(json["type"], "curriculum");
    }
}
