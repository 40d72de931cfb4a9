use crate::calendar;
use crate::curriculum::Curriculum;
use crate::profile::Profile;
use crate::timetable::{LessonLayout, TimetableLayout};
use crate::today_config::{BreakEntry, DividingLineEntry, LessonEntry, ScheduleEntry};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Expands a curriculum against its timetable into entries stamped on one day.
pub struct Materializer<'a> {
    profile: &'a Profile,
}

impl<'a> Materializer<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        Self { profile }
    }

    /// Entries keyed by fresh UUID v4 strings.
    pub fn materialize(
        &self,
        curriculum: Option<&Curriculum>,
        today: NaiveDate,
    ) -> BTreeMap<String, ScheduleEntry> {
        self.materialize_with_keys(curriculum, today, || Uuid::new_v4().to_string())
    }

    /// Same as [`Materializer::materialize`] with a caller-supplied key source.
    /// A key already used in this batch is discarded and a new one drawn.
    pub fn materialize_with_keys<F>(
        &self,
        curriculum: Option<&Curriculum>,
        today: NaiveDate,
        mut next_key: F,
    ) -> BTreeMap<String, ScheduleEntry>
    where
        F: FnMut() -> String,
    {
        let mut schedule = BTreeMap::new();
        let Some(curriculum) = curriculum else {
            debug!(%today, "no curriculum, empty schedule");
            return schedule;
        };
        let Some(timetable) = self.profile.timetables.get(&curriculum.timetable_id) else {
            warn!(
                curriculum = %curriculum.name,
                timetable_id = %curriculum.timetable_id,
                "timetable not found, empty schedule"
            );
            return schedule;
        };

        for (layout_id, layout) in &timetable.layouts {
            let Some(entry) = self.entry_for(curriculum, layout_id, layout, today) else {
                continue;
            };
            let mut key = next_key();
            while schedule.contains_key(&key) {
                warn!(%key, "duplicate schedule key, drawing another");
                key = next_key();
            }
            schedule.insert(key, entry);
        }

        debug!(
            curriculum = %curriculum.name,
            timetable = %timetable.name,
            entries = schedule.len(),
            "materialized schedule"
        );
        schedule
    }

    fn entry_for(
        &self,
        curriculum: &Curriculum,
        layout_id: &str,
        layout: &TimetableLayout,
        today: NaiveDate,
    ) -> Option<ScheduleEntry> {
        match layout {
            TimetableLayout::Break(layout) => Some(ScheduleEntry::Break(BreakEntry {
                name: layout.break_name.clone(),
                short_name: layout.break_short_name.clone(),
                start_time: calendar::at_time_of_day(today, layout.start_time),
                end_time: calendar::at_time_of_day(today, layout.end_time),
                no_display_separately: layout.no_display_separately,
            })),
            TimetableLayout::DividingLine(layout) => {
                Some(ScheduleEntry::DividingLine(DividingLineEntry {
                    start_time: calendar::at_time_of_day(today, layout.start_time),
                }))
            }
            TimetableLayout::Lesson(layout) => self.lesson_entry(curriculum, layout_id, layout, today),
        }
    }

    fn lesson_entry(
        &self,
        curriculum: &Curriculum,
        layout_id: &str,
        layout: &LessonLayout,
        today: NaiveDate,
    ) -> Option<ScheduleEntry> {
        let Some(class) = curriculum.class_for(layout_id) else {
            warn!(
                curriculum = %curriculum.name,
                layout_id,
                "no class assigned to lesson slot, skipping"
            );
            return None;
        };
        let subject_id = class.subject_override().unwrap_or(layout.subject_id.as_str());
        let Some(subject) = self.profile.subjects.get(subject_id) else {
            warn!(
                curriculum = %curriculum.name,
                layout_id,
                subject_id,
                "subject not found, skipping"
            );
            return None;
        };
        Some(ScheduleEntry::Lesson(LessonEntry {
            name: subject.name.clone(),
            short_name: subject.short_name.clone(),
            teacher_name: subject.teacher_name.clone(),
            start_time: calendar::at_time_of_day(today, layout.start_time),
            end_time: calendar::at_time_of_day(today, layout.end_time),
            no_display_separately: layout.no_display_separately,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::ClassAssignment;
    use crate::subject::Subject;
    use crate::timetable::Timetable;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn colliding_keys_are_redrawn() {
        let profile = Profile::new()
            .with_subject("math", Subject::new("Math"))
            .with_timetable(
                "tt",
                Timetable::new("Day")
                    .with_layout("p1", TimetableLayout::lesson(t(8, 0), t(8, 45), "math"))
                    .with_layout("p2", TimetableLayout::lesson(t(9, 0), t(9, 45), "math")),
            );
        let curriculum = Curriculum::new("C", "tt")
            .with_class(ClassAssignment::default_subject("p1"))
            .with_class(ClassAssignment::default_subject("p2"));

        let mut keys = vec!["a", "a", "b"].into_iter();
        let schedule = Materializer::new(&profile).materialize_with_keys(
            Some(&curriculum),
            NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            || keys.next().unwrap_or("z").to_string(),
        );

        assert_eq!(schedule.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
