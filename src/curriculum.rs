use crate::profile::Attachments;
use serde::{Deserialize, Serialize};

/// Fills one timetable slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAssignment {
    /// Layout id inside the curriculum's timetable.
    pub time_id: String,
    /// Empty means "use the layout's default subject".
    #[serde(default)]
    pub subject_id: String,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

impl ClassAssignment {
    pub fn new(time_id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            time_id: time_id.into(),
            subject_id: subject_id.into(),
            attach: Attachments::new(),
        }
    }

    /// Assignment that keeps the slot's default subject.
    pub fn default_subject(time_id: impl Into<String>) -> Self {
        Self::new(time_id, "")
    }

    pub fn subject_override(&self) -> Option<&str> {
        if self.subject_id.is_empty() {
            None
        } else {
            Some(&self.subject_id)
        }
    }
}

/// Binds subjects to the slots of one timetable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curriculum {
    pub name: String,
    pub timetable_id: String,
    #[serde(default)]
    pub classes: Vec<ClassAssignment>,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

impl Curriculum {
    pub fn new(name: impl Into<String>, timetable_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timetable_id: timetable_id.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, assignment: ClassAssignment) -> Self {
        self.classes.push(assignment);
        self
    }

    /// First assignment for the given layout id.
    pub fn class_for(&self, time_id: &str) -> Option<&ClassAssignment> {
        self.classes.iter().find(|class| class.time_id == time_id)
    }
}
