use crate::graph::TimeGroupGraph;
use crate::profile::{Profile, Selection, SelectionKind};
use crate::time_group::TimeGroupLayoutTarget;
use crate::timetable::TimetableLayout;
use thiserror::Error;

/// Authoring mistake found in a profile. None of these stop resolution;
/// they explain why a day comes out empty or partial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileIssue {
    #[error("time group '{time_group}' has a cycle of zero")]
    ZeroCycle { time_group: String },
    #[error("time group '{time_group}' has cycle {cycle} but {layout_len} layout entries")]
    LayoutLengthMismatch {
        time_group: String,
        cycle: u32,
        layout_len: usize,
    },
    #[error("time group '{time_group}' points at missing curriculum '{curriculum}'")]
    UnknownCurriculumTarget {
        time_group: String,
        curriculum: String,
    },
    #[error("time group '{time_group}' points at missing time group '{target}'")]
    UnknownTimeGroupTarget { time_group: String, target: String },
    #[error("curriculum '{curriculum}' uses missing timetable '{timetable}'")]
    UnknownTimetable {
        curriculum: String,
        timetable: String,
    },
    #[error("timetable '{timetable}' slot '{layout}' defaults to missing subject '{subject}'")]
    UnknownDefaultSubject {
        timetable: String,
        layout: String,
        subject: String,
    },
    #[error("curriculum '{curriculum}' assigns missing subject '{subject}' to slot '{layout}'")]
    UnknownAssignedSubject {
        curriculum: String,
        layout: String,
        subject: String,
    },
    #[error("curriculum '{curriculum}' assigns slot '{layout}' which is not a lesson in its timetable")]
    UnknownClassSlot { curriculum: String, layout: String },
    #[error("curriculum '{curriculum}' leaves lesson slot '{layout}' unassigned")]
    UnassignedLesson { curriculum: String, layout: String },
    #[error("{which} selection {selection} does not exist")]
    UnknownSelection {
        which: &'static str,
        selection: Selection,
    },
    #[error("time groups reference each other in a loop: {}", .ids.join(" -> "))]
    TimeGroupCycle { ids: Vec<String> },
}

pub fn validate_profile(profile: &Profile) -> Vec<ProfileIssue> {
    let mut issues = Vec::new();
    check_time_groups(profile, &mut issues);
    check_timetables(profile, &mut issues);
    check_curriculums(profile, &mut issues);
    check_selections(profile, &mut issues);

    for ids in TimeGroupGraph::build(profile).cycles() {
        issues.push(ProfileIssue::TimeGroupCycle { ids });
    }
    issues
}

fn check_time_groups(profile: &Profile, issues: &mut Vec<ProfileIssue>) {
    for (id, time_group) in &profile.time_groups {
        if time_group.cycle == 0 && !time_group.uses_calendar_position() {
            issues.push(ProfileIssue::ZeroCycle {
                time_group: id.clone(),
            });
        } else if time_group.layout.len() != time_group.cycle as usize {
            issues.push(ProfileIssue::LayoutLengthMismatch {
                time_group: id.clone(),
                cycle: time_group.cycle,
                layout_len: time_group.layout.len(),
            });
        }

        for target in &time_group.layout {
            match target {
                TimeGroupLayoutTarget::ToCurriculum { id: curriculum, .. }
                    if !profile.curriculums.contains_key(curriculum) =>
                {
                    issues.push(ProfileIssue::UnknownCurriculumTarget {
                        time_group: id.clone(),
                        curriculum: curriculum.clone(),
                    });
                }
                TimeGroupLayoutTarget::ToTimeGroup { id: child, .. }
                    if !profile.time_groups.contains_key(child) =>
                {
                    issues.push(ProfileIssue::UnknownTimeGroupTarget {
                        time_group: id.clone(),
                        target: child.clone(),
                    });
                }
                _ => {}
            }
        }
    }
}

fn check_timetables(profile: &Profile, issues: &mut Vec<ProfileIssue>) {
    for (id, timetable) in &profile.timetables {
        for (layout_id, layout) in &timetable.layouts {
            if let TimetableLayout::Lesson(lesson) = layout {
                if !lesson.subject_id.is_empty() && !profile.subjects.contains_key(&lesson.subject_id) {
                    issues.push(ProfileIssue::UnknownDefaultSubject {
                        timetable: id.clone(),
                        layout: layout_id.clone(),
                        subject: lesson.subject_id.clone(),
                    });
                }
            }
        }
    }
}

fn check_curriculums(profile: &Profile, issues: &mut Vec<ProfileIssue>) {
    for (id, curriculum) in &profile.curriculums {
        for class in &curriculum.classes {
            if let Some(subject) = class.subject_override() {
                if !profile.subjects.contains_key(subject) {
                    issues.push(ProfileIssue::UnknownAssignedSubject {
                        curriculum: id.clone(),
                        layout: class.time_id.clone(),
                        subject: subject.to_string(),
                    });
                }
            }
        }

        let Some(timetable) = profile.timetables.get(&curriculum.timetable_id) else {
            issues.push(ProfileIssue::UnknownTimetable {
                curriculum: id.clone(),
                timetable: curriculum.timetable_id.clone(),
            });
            continue;
        };

        for class in &curriculum.classes {
            let is_lesson = matches!(
                timetable.layouts.get(&class.time_id),
                Some(TimetableLayout::Lesson(_))
            );
            if !is_lesson {
                issues.push(ProfileIssue::UnknownClassSlot {
                    curriculum: id.clone(),
                    layout: class.time_id.clone(),
                });
            }
        }
        for lesson_id in timetable.lesson_ids() {
            if curriculum.class_for(lesson_id).is_none() {
                issues.push(ProfileIssue::UnassignedLesson {
                    curriculum: id.clone(),
                    layout: lesson_id.to_string(),
                });
            }
        }
    }
}

fn check_selections(profile: &Profile, issues: &mut Vec<ProfileIssue>) {
    let config = &profile.enable_config;
    let mut check = |which: &'static str, selection: Selection| {
        // An empty id means nothing has been picked yet.
        if selection.id.is_empty() {
            return;
        }
        let exists = match selection.kind {
            SelectionKind::Curriculum => profile.curriculums.contains_key(&selection.id),
            SelectionKind::TimeGroup => profile.time_groups.contains_key(&selection.id),
        };
        if !exists {
            issues.push(ProfileIssue::UnknownSelection { which, selection });
        }
    };

    check("permanent", config.selected.clone());
    if config.temp_selected.enable {
        check("temporary", config.temp_selected.selection());
    }
}
