use crate::profile::Attachments;
use serde::{Deserialize, Serialize};

/// A course that can be placed into a lesson slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    /// Free text for what the name alone cannot express.
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attach: Attachments,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = short_name.into();
        self
    }

    pub fn with_teacher(mut self, teacher_name: impl Into<String>) -> Self {
        self.teacher_name = teacher_name.into();
        self
    }
}
