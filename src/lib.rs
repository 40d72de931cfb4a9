pub mod calendar;
pub mod time_format;
pub mod subject;
pub mod timetable;
pub mod curriculum;
pub mod time_group;
pub mod profile;
pub mod calculations;
pub mod today_config;
pub mod graph;
pub mod profile_validation;
pub mod persistence;
pub mod clock;
pub mod config;
pub mod scheduler;
pub mod context;

pub use calculations::{Materializer, Resolution, TimeGroupResolver, UnresolvedReason};
pub use calendar::Granularity;
pub use clock::{Clock, MockClock, SystemClock};
pub use config::EditorConfig;
pub use context::ScheduleEditor;
pub use curriculum::{ClassAssignment, Curriculum};
pub use profile::{EnableConfig, Profile, Selection, SelectionKind, TempSelection};
pub use profile_validation::{ProfileIssue, validate_profile};
pub use subject::Subject;
pub use time_group::{DayCycleGranularity, TimeGroup, TimeGroupLayoutTarget};
pub use timetable::{Timetable, TimetableLayout};
pub use today_config::{GeneratedToday, ScheduleEntry, TodayConfig, generate_today_config};
