use chrono::{NaiveDate, NaiveTime};
use lesson_schedule::persistence::{
    FileAccess, LocalFileAccess, MemoryFileAccess, PersistenceError, load_profile,
    load_today_config, profile_to_json, today_config_to_json,
};
use lesson_schedule::{
    ClassAssignment, Curriculum, Profile, Selection, Subject, TimeGroupLayoutTarget as Target,
    Timetable, TimetableLayout, generate_today_config,
};
use std::path::Path;
use tempfile::tempdir;

const PROFILE: &str = "profiles/scheduleEditor.profile.json";
const TODAY: &str = "scheduleEditor.todayConfig.json";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sample_profile() -> Profile {
    let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
    Profile::new()
        .with_subject("math", Subject::new("Math"))
        .with_timetable(
            "tt",
            Timetable::new("Day").with_layout("p1", TimetableLayout::lesson(t(8, 0), t(8, 45), "math")),
        )
        .with_curriculum(
            "mon",
            Curriculum::new("Monday", "tt").with_class(ClassAssignment::default_subject("p1")),
        )
        .with_selection(Selection::curriculum("mon"))
}

#[test]
fn profile_round_trips_through_local_files() {
    let dir = tempdir().unwrap();
    let fs = LocalFileAccess::new(dir.path());
    let profile = sample_profile();

    fs.write_file(Path::new(PROFILE), &profile_to_json(&profile).unwrap())
        .unwrap();
    assert!(dir.path().join(PROFILE).is_file());

    let loaded = load_profile(&fs, Path::new(PROFILE));
    assert!(!loaded.needs_save);
    assert_eq!(loaded.profile, profile);
}

#[test]
fn missing_profile_falls_back_to_defaults() {
    let fs = MemoryFileAccess::new();
    let loaded = load_profile(&fs, Path::new(PROFILE));
    assert!(loaded.needs_save);
    assert!(loaded.defaulted);
    assert_eq!(loaded.profile, Profile::default());
}

#[test]
fn malformed_profile_falls_back_to_defaults() {
    let fs = MemoryFileAccess::new().with_file(PROFILE, "{ not json");
    let loaded = load_profile(&fs, Path::new(PROFILE));
    assert!(loaded.needs_save);
    assert_eq!(loaded.profile, Profile::default());
}

#[test]
fn missing_keys_are_backfilled_and_flagged() {
    let fs = MemoryFileAccess::new().with_file(
        PROFILE,
        r#"{"subjects": {"art": {"name": "Art", "shortName": "A"}}, "enableConfig": null}"#,
    );
    let loaded = load_profile(&fs, Path::new(PROFILE));
    assert!(loaded.needs_save);
    assert_eq!(loaded.profile.subjects["art"].short_name, "A");
    assert!(loaded.profile.time_groups.is_empty());
    assert_eq!(loaded.profile.enable_config, Default::default());
}

#[test]
fn attachments_survive_a_round_trip() {
    let raw = r##"{
        "subjects": {"m": {"name": "Math", "attach": {"color": "#ff0000"}}},
        "timetables": {}, "curriculums": {}, "timeGroups": {},
        "enableConfig": {"selected": {"type": "timegroup", "id": ""}}
    }"##;
    let fs = MemoryFileAccess::new().with_file(PROFILE, raw);
    let loaded = load_profile(&fs, Path::new(PROFILE));

    let written: serde_json::Value =
        serde_json::from_str(&profile_to_json(&loaded.profile).unwrap()).unwrap();
    assert_eq!(written["subjects"]["m"]["attach"]["color"], "#ff0000");
}

#[test]
fn layout_cell_attachments_survive_a_round_trip() {
    let raw = r#"{
        "subjects": {}, "timetables": {}, "curriculums": {},
        "timeGroups": {"week": {
            "name": "Week", "granularity": "day", "dayCycleGranularity": "week", "cycle": 7,
            "layout": [{"type": "curriculum", "id": "c", "attach": {"color": "red"}},
                       {"type": "timegroup", "id": "g"}]
        }},
        "enableConfig": {"selected": {"type": "timegroup", "id": "week"}}
    }"#;
    let fs = MemoryFileAccess::new().with_file(PROFILE, raw);
    let loaded = load_profile(&fs, Path::new(PROFILE));
    let layout = &loaded.profile.time_groups["week"].layout;
    assert_eq!(layout[0].attach()["color"], "red");
    assert!(layout[1].attach().is_empty());

    let written: serde_json::Value =
        serde_json::from_str(&profile_to_json(&loaded.profile).unwrap()).unwrap();
    let cells = &written["timeGroups"]["week"]["layout"];
    assert_eq!(cells[0]["attach"]["color"], "red");
    assert_eq!(cells[0]["type"], "curriculum");
    assert!(cells[1].get("attach").is_none());
    assert_eq!(
        Target::curriculum("c").with_attach("color", "red".into()),
        layout[0]
    );
}

#[test]
fn one_unreadable_record_does_not_cost_the_others() {
    let raw = r#"{
        "subjects": {"math": {"name": "Math"}, "art": {"name": 7}},
        "timetables": {
            "tt": {"name": "Day", "layouts": {
                "p1": {"type": "lesson", "startTime": "08:00", "endTime": "08:45", "subjectId": "math"}
            }},
            "broken": {"name": "Broken", "layouts": {
                "p1": {"type": "lesson", "startTime": null, "endTime": "08:45", "subjectId": "math"}
            }}
        },
        "curriculums": {"mon": {"name": "Monday", "timetableId": "tt",
                                "classes": [{"timeId": "p1"}]}},
        "timeGroups": {"odd": {"name": "Odd", "granularity": "fortnight", "cycle": 2}},
        "enableConfig": {"selected": {"type": "curriculum", "id": "mon"}}
    }"#;
    let fs = MemoryFileAccess::new().with_file(PROFILE, raw);
    let loaded = load_profile(&fs, Path::new(PROFILE));

    assert!(!loaded.defaulted);
    assert!(!loaded.needs_save);
    let profile = &loaded.profile;
    assert_eq!(profile.subjects.keys().collect::<Vec<_>>(), vec!["math"]);
    assert_eq!(profile.timetables.keys().collect::<Vec<_>>(), vec!["tt"]);
    assert_eq!(profile.curriculums["mon"].timetable_id, "tt");
    assert!(profile.time_groups.is_empty());
    assert_eq!(profile.enable_config.selected, Selection::curriculum("mon"));

    let now = d(2024, 9, 2).and_hms_opt(7, 0, 0).unwrap();
    assert_eq!(generate_today_config(profile, now).config.schedule.len(), 1);
}

#[test]
fn only_missing_or_broken_text_counts_as_defaulted() {
    let fs = MemoryFileAccess::new().with_file(PROFILE, r#"{"subjects": {}}"#);
    let loaded = load_profile(&fs, Path::new(PROFILE));
    assert!(loaded.needs_save);
    assert!(!loaded.defaulted);

    let fs = MemoryFileAccess::new().with_file(PROFILE, "[1, 2]");
    let loaded = load_profile(&fs, Path::new(PROFILE));
    assert!(loaded.needs_save);
    assert!(loaded.defaulted);
}

#[test]
fn todays_config_is_reused() {
    let now = d(2024, 9, 2).and_hms_opt(7, 30, 0).unwrap();
    let generated = generate_today_config(&sample_profile(), now);
    let fs = MemoryFileAccess::new()
        .with_file(TODAY, today_config_to_json(&generated.config).unwrap());

    let loaded = load_today_config(&fs, Path::new(TODAY), d(2024, 9, 2)).unwrap();
    assert_eq!(loaded, generated.config);
    assert_eq!(loaded.schedule.len(), 1);
}

#[test]
fn stale_or_broken_today_config_is_rejected() {
    let now = d(2024, 9, 2).and_hms_opt(7, 30, 0).unwrap();
    let generated = generate_today_config(&sample_profile(), now);
    let fs = MemoryFileAccess::new()
        .with_file(TODAY, today_config_to_json(&generated.config).unwrap());
    assert!(load_today_config(&fs, Path::new(TODAY), d(2024, 9, 3)).is_none());

    let fs = MemoryFileAccess::new().with_file(TODAY, r#"{"schedule": {}}"#);
    assert!(load_today_config(&fs, Path::new(TODAY), d(2024, 9, 2)).is_none());

    let fs = MemoryFileAccess::new();
    assert!(load_today_config(&fs, Path::new(TODAY), d(2024, 9, 2)).is_none());
}

#[test]
fn today_config_from_older_editors_is_accepted() {
    let raw = r#"{
        "generateDate": "2024-09-02T06:00:00.000+08:00",
        "schedule": {
            "k1": {"type": "lesson", "name": "Math", "shortName": "M", "teacherName": "",
                   "startTime": "2024-09-02T08:00:00.000+08:00",
                   "endTime": "2024-09-02T08:45:00.000+08:00",
                   "noDisplayedSeparately": false},
            "k2": {"type": "dividingLine", "startTime": "2024-09-02T12:00:00.000+08:00"}
        }
    }"#;
    let fs = MemoryFileAccess::new().with_file(TODAY, raw);
    let loaded = load_today_config(&fs, Path::new(TODAY), d(2024, 9, 2)).unwrap();
    assert_eq!(loaded.schedule.len(), 2);
    assert_eq!(
        loaded.schedule["k1"].start_time(),
        d(2024, 9, 2).and_hms_opt(8, 0, 0).unwrap()
    );
}

#[test]
fn memory_store_reports_missing_files_and_injected_failures() {
    let fs = MemoryFileAccess::new();
    assert!(matches!(
        fs.read_file(Path::new("nope.json")),
        Err(PersistenceError::NotFound(_))
    ));

    fs.fail_next_writes(1);
    assert!(matches!(
        fs.write_file(Path::new("a.json"), "{}"),
        Err(PersistenceError::Io(_))
    ));
    fs.write_file(Path::new("a.json"), "{}").unwrap();
    assert_eq!(fs.contents("a.json").as_deref(), Some("{}"));
    assert_eq!(fs.write_count(), 2);
}
