//! Walks the time-group graph from a resolution root down to a curriculum.
//!
//! Time groups live in an id-keyed map and reference each other by id, so
//! the authoring data may contain cycles. The walk carries the ordered list
//! of visited groups and stops with [`Resolution::Loop`] the moment a group
//! shows up a second time.

use crate::calendar::{self, Granularity};
use crate::curriculum::Curriculum;
use crate::profile::{Profile, Selection, SelectionKind};
use crate::time_group::{DayCycleGranularity, TimeGroup, TimeGroupLayoutTarget};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

/// A time group passed through on the way to the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGroupVisit<'a> {
    pub id: &'a str,
    pub time_group: &'a TimeGroup,
}

/// Why no curriculum applies on the requested date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnresolvedReason {
    #[error("time group '{id}' does not exist")]
    UnknownTimeGroup { id: String },
    #[error("curriculum '{id}' does not exist")]
    UnknownCurriculum { id: String },
    #[error("time group '{id}' has no start time and none is inherited")]
    NoAnchor { id: String },
    #[error("time group '{id}' starts on {anchor}, after {target}")]
    BeforeAnchor {
        id: String,
        anchor: NaiveDate,
        target: NaiveDate,
    },
    #[error("time group '{id}' has a cycle of zero")]
    EmptyCycle { id: String },
    #[error("time group '{id}' has no layout entry at index {index}")]
    NoLayoutEntry { id: String, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Resolved {
        curriculum_id: &'a str,
        curriculum: &'a Curriculum,
        path: Vec<TimeGroupVisit<'a>>,
    },
    /// Incomplete schedule for this date; materializes to an empty day.
    Unresolved {
        reason: UnresolvedReason,
        path: Vec<TimeGroupVisit<'a>>,
    },
    /// Circular time-group reference. The repeating group is the last element of `path`.
    Loop { path: Vec<TimeGroupVisit<'a>> },
}

impl<'a> Resolution<'a> {
    pub fn curriculum(&self) -> Option<&'a Curriculum> {
        match self {
            Resolution::Resolved { curriculum, .. } => Some(*curriculum),
            _ => None,
        }
    }

    pub fn curriculum_id(&self) -> Option<&'a str> {
        match self {
            Resolution::Resolved { curriculum_id, .. } => Some(*curriculum_id),
            _ => None,
        }
    }

    pub fn path(&self) -> &[TimeGroupVisit<'a>] {
        match self {
            Resolution::Resolved { path, .. }
            | Resolution::Unresolved { path, .. }
            | Resolution::Loop { path } => path,
        }
    }

    /// Visited time-group ids in walk order.
    pub fn path_ids(&self) -> Vec<String> {
        self.path().iter().map(|visit| visit.id.to_string()).collect()
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, Resolution::Loop { .. })
    }
}

/// Outcome of resolving a single time group's cell.
enum Step<'a> {
    Target(&'a TimeGroupLayoutTarget, Option<NaiveDate>),
    Stop(UnresolvedReason),
}

pub struct TimeGroupResolver<'a> {
    profile: &'a Profile,
}

impl<'a> TimeGroupResolver<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        Self { profile }
    }

    /// Resolves the curriculum for `target`, starting from the profile's active root.
    pub fn resolve_for_date(&self, target: NaiveDate) -> Resolution<'a> {
        let root = self.profile.active_root(target);
        self.resolve(target, &root)
    }

    pub fn resolve(&self, target: NaiveDate, root: &Selection) -> Resolution<'a> {
        match root.kind {
            SelectionKind::Curriculum => {
                debug!(curriculum_id = %root.id, "root is a curriculum");
                self.curriculum(&root.id, Vec::new())
            }
            SelectionKind::TimeGroup => {
                debug!(time_group_id = %root.id, %target, "walking time groups");
                self.walk(target, &root.id)
            }
        }
    }

    fn walk(&self, target: NaiveDate, root_id: &str) -> Resolution<'a> {
        let mut path: Vec<TimeGroupVisit<'a>> = Vec::new();
        let mut inherited_anchor: Option<NaiveDate> = None;
        let mut current = root_id.to_string();

        loop {
            let Some((id, time_group)) = self.profile.time_groups.get_key_value(current.as_str())
            else {
                let reason = UnresolvedReason::UnknownTimeGroup { id: current };
                warn!(%reason, "time group lookup failed");
                return Resolution::Unresolved { reason, path };
            };
            let visit = TimeGroupVisit {
                id: id.as_str(),
                time_group,
            };

            if path.iter().any(|seen| seen.id == visit.id) {
                path.push(visit);
                let chain: Vec<&str> = path.iter().map(|v| v.id).collect();
                error!(time_group_id = %id, ?chain, "circular time group reference");
                return Resolution::Loop { path };
            }
            path.push(visit);

            trace!(
                time_group_id = %id,
                granularity = %time_group.granularity,
                day_cycle = ?time_group.day_cycle_granularity,
                "visiting time group"
            );

            match self.step(id, time_group, target, inherited_anchor) {
                Step::Stop(reason) => {
                    warn!(%reason, "no curriculum resolved");
                    return Resolution::Unresolved { reason, path };
                }
                Step::Target(TimeGroupLayoutTarget::ToCurriculum { id, .. }, _) => {
                    return self.curriculum(id, path);
                }
                Step::Target(TimeGroupLayoutTarget::ToTimeGroup { id, .. }, anchor) => {
                    inherited_anchor = anchor;
                    current = id.clone();
                }
            }
        }
    }

    /// Picks the layout cell of one group and the anchor its children inherit.
    fn step(
        &self,
        id: &str,
        time_group: &'a TimeGroup,
        target: NaiveDate,
        inherited_anchor: Option<NaiveDate>,
    ) -> Step<'a> {
        // Preset day groups index by calendar position and hand the inherited
        // anchor down untouched. Only anchored cycles re-anchor their children.
        let (index, anchor) = match (time_group.granularity, time_group.day_cycle_granularity) {
            (Granularity::Day, DayCycleGranularity::Week) => {
                (calendar::weekday_index(target), inherited_anchor)
            }
            (Granularity::Day, DayCycleGranularity::Month) => {
                (calendar::month_day_index(target), inherited_anchor)
            }
            (granularity, _) => {
                let Some(anchor) = time_group.start_time.or(inherited_anchor) else {
                    return Step::Stop(UnresolvedReason::NoAnchor { id: id.to_string() });
                };
                if target < anchor {
                    return Step::Stop(UnresolvedReason::BeforeAnchor {
                        id: id.to_string(),
                        anchor,
                        target,
                    });
                }
                let Some(index) =
                    calendar::cycle_index(anchor, target, granularity, time_group.cycle)
                else {
                    return Step::Stop(UnresolvedReason::EmptyCycle { id: id.to_string() });
                };
                debug!(
                    time_group_id = %id,
                    %anchor,
                    %target,
                    periods = calendar::periods_elapsed(anchor, target, granularity),
                    cycle = time_group.cycle,
                    index,
                    "cycle position"
                );
                (index, Some(anchor))
            }
        };

        match time_group.layout.get(index) {
            Some(cell) => {
                trace!(time_group_id = %id, index, target = %cell, "layout cell");
                Step::Target(cell, anchor)
            }
            None => Step::Stop(UnresolvedReason::NoLayoutEntry {
                id: id.to_string(),
                index,
            }),
        }
    }

    fn curriculum(&self, id: &str, path: Vec<TimeGroupVisit<'a>>) -> Resolution<'a> {
        match self.profile.curriculums.get_key_value(id) {
            Some((curriculum_id, curriculum)) => Resolution::Resolved {
                curriculum_id: curriculum_id.as_str(),
                curriculum,
                path,
            },
            None => {
                let reason = UnresolvedReason::UnknownCurriculum { id: id.to_string() };
                warn!(%reason, "curriculum lookup failed");
                Resolution::Unresolved { reason, path }
            }
        }
    }
}
