use crate::calendar::Granularity;
use crate::profile::Attachments;
use crate::time_format::optional_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Preset cycles for day-granular groups.
///
/// `Week` maps Monday..Sunday onto `layout[0..7]`, `Month` maps the 1st..31st
/// onto `layout[0..31]`, `Custom` repeats `layout` every `cycle` days from the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayCycleGranularity {
    Week,
    Month,
    #[default]
    Custom,
}

/// One cell of a time group's cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimeGroupLayoutTarget {
    #[serde(rename = "curriculum")]
    ToCurriculum {
        id: String,
        #[serde(default, skip_serializing_if = "Attachments::is_empty")]
        attach: Attachments,
    },
    #[serde(rename = "timegroup")]
    ToTimeGroup {
        id: String,
        #[serde(default, skip_serializing_if = "Attachments::is_empty")]
        attach: Attachments,
    },
}

impl TimeGroupLayoutTarget {
    pub fn curriculum(id: impl Into<String>) -> Self {
        TimeGroupLayoutTarget::ToCurriculum {
            id: id.into(),
            attach: Attachments::new(),
        }
    }

    pub fn time_group(id: impl Into<String>) -> Self {
        TimeGroupLayoutTarget::ToTimeGroup {
            id: id.into(),
            attach: Attachments::new(),
        }
    }

    pub fn with_attach(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        match &mut self {
            TimeGroupLayoutTarget::ToCurriculum { attach, .. }
            | TimeGroupLayoutTarget::ToTimeGroup { attach, .. } => {
                attach.insert(key.into(), value);
            }
        }
        self
    }

    pub fn id(&self) -> &str {
        match self {
            TimeGroupLayoutTarget::ToCurriculum { id, .. }
            | TimeGroupLayoutTarget::ToTimeGroup { id, .. } => id,
        }
    }

    pub fn attach(&self) -> &Attachments {
        match self {
            TimeGroupLayoutTarget::ToCurriculum { attach, .. }
            | TimeGroupLayoutTarget::ToTimeGroup { attach, .. } => attach,
        }
    }
}

impl fmt::Display for TimeGroupLayoutTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeGroupLayoutTarget::ToCurriculum { id, .. } => write!(f, "curriculum:{id}"),
            TimeGroupLayoutTarget::ToTimeGroup { id, .. } => write!(f, "timegroup:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGroup {
    pub name: String,
    pub granularity: Granularity,
    /// Only meaningful when `granularity` is `day`.
    #[serde(default)]
    pub day_cycle_granularity: DayCycleGranularity,
    pub cycle: u32,
    /// Anchor of the cycle. `None` inherits the nearest ancestor's anchor.
    /// Week and month preset day groups ignore it.
    #[serde(default, with = "optional_date")]
    pub start_time: Option<NaiveDate>,
    #[serde(default)]
    pub layout: Vec<TimeGroupLayoutTarget>,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

impl TimeGroup {
    /// Day group indexed by weekday, Monday first.
    pub fn weekly(name: impl Into<String>, layout: Vec<TimeGroupLayoutTarget>) -> Self {
        Self {
            name: name.into(),
            granularity: Granularity::Day,
            day_cycle_granularity: DayCycleGranularity::Week,
            cycle: 7,
            start_time: None,
            layout,
            attach: Attachments::new(),
        }
    }

    /// Day group indexed by day of month.
    pub fn monthly(name: impl Into<String>, layout: Vec<TimeGroupLayoutTarget>) -> Self {
        Self {
            name: name.into(),
            granularity: Granularity::Day,
            day_cycle_granularity: DayCycleGranularity::Month,
            cycle: 31,
            start_time: None,
            layout,
            attach: Attachments::new(),
        }
    }

    /// Group that repeats `layout` every `layout.len()` units of `granularity`.
    pub fn cyclic(
        name: impl Into<String>,
        granularity: Granularity,
        start_time: Option<NaiveDate>,
        layout: Vec<TimeGroupLayoutTarget>,
    ) -> Self {
        Self {
            name: name.into(),
            granularity,
            day_cycle_granularity: DayCycleGranularity::Custom,
            cycle: layout.len() as u32,
            start_time,
            layout,
            attach: Attachments::new(),
        }
    }

    /// True when the index comes straight from the calendar position and no anchor is needed.
    pub fn uses_calendar_position(&self) -> bool {
        self.granularity == Granularity::Day
            && self.day_cycle_granularity != DayCycleGranularity::Custom
    }
}
