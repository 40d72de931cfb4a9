#![cfg(feature = "cli")]

use assert_cmd::Command;
use chrono::NaiveTime;
use lesson_schedule::persistence::profile_to_json;
use lesson_schedule::{
    ClassAssignment, Curriculum, Profile, Selection, Subject, TimeGroup,
    TimeGroupLayoutTarget as Target, Timetable, TimetableLayout,
};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn weekly_profile() -> Profile {
    let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
    let mut layout = vec![Target::curriculum("bio-day"); 7];
    layout[0] = Target::curriculum("math-day");
    Profile::new()
        .with_subject("math", Subject::new("Math").with_short_name("Ma"))
        .with_subject("bio", Subject::new("Biology").with_short_name("Bi"))
        .with_timetable(
            "tt",
            Timetable::new("Day")
                .with_layout("p1", TimetableLayout::lesson(t(8, 0), t(8, 45), "math"))
                .with_layout("r", TimetableLayout::break_time(t(8, 45), t(8, 55), "Recess", "R")),
        )
        .with_curriculum(
            "math-day",
            Curriculum::new("Math day", "tt").with_class(ClassAssignment::default_subject("p1")),
        )
        .with_curriculum(
            "bio-day",
            Curriculum::new("Bio day", "tt").with_class(ClassAssignment::new("p1", "bio")),
        )
        .with_time_group("week", TimeGroup::weekly("Week", layout))
        .with_selection(Selection::time_group("week"))
}

fn data_dir_with(profile: &Profile) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profiles/scheduleEditor.profile.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, profile_to_json(profile).unwrap()).unwrap();
    dir
}

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cli").unwrap();
    cmd.env_remove("LESSON_SCHEDULE_DATA_DIR")
        .env("RUST_LOG", "error")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

#[test]
fn resolve_prints_the_walk() {
    let dir = data_dir_with(&weekly_profile());
    cli(dir.path())
        .args(["resolve", "--date", "2024-09-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("root: timegroup:week"))
        .stdout(predicate::str::contains("path: week"))
        .stdout(predicate::str::contains("curriculum: math-day (Math day)"));
}

#[test]
fn today_renders_a_table() {
    let dir = data_dir_with(&weekly_profile());
    cli(dir.path())
        .args(["today", "--date", "2024-09-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bio-day"))
        .stdout(predicate::str::contains("| 08:00:00 | 08:45:00 | lesson | Biology"))
        .stdout(predicate::str::contains("Recess"));
}

#[test]
fn today_json_is_a_today_config() {
    let dir = data_dir_with(&weekly_profile());
    let output = cli(dir.path())
        .args(["today", "--date", "2024-09-02", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: lesson_schedule::TodayConfig = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config.schedule.len(), 2);
    assert_eq!(config.generate_date.to_string(), "2024-09-02 00:00:00");
}

#[test]
fn check_fails_on_looping_groups() {
    let profile = weekly_profile()
        .with_time_group("a", TimeGroup::weekly("A", vec![Target::time_group("a"); 7]));
    let dir = data_dir_with(&profile);
    cli(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("loop: a"));

    let dir = data_dir_with(&weekly_profile());
    cli(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("profile ok"));
}

#[test]
fn bad_dates_are_rejected() {
    let dir = data_dir_with(&weekly_profile());
    cli(dir.path())
        .args(["resolve", "--date", "someday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date"));
}

#[test]
fn missing_and_partial_profiles_warn_differently() {
    let dir = tempfile::tempdir().unwrap();
    cli(dir.path())
        .env("RUST_LOG", "warn")
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("profile ok"))
        .stderr(
            predicate::str::contains("no usable profile stored")
                .and(predicate::str::contains("incomplete").not()),
        );

    let path = dir.path().join("profiles/scheduleEditor.profile.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{"subjects": {}}"#).unwrap();
    cli(dir.path())
        .env("RUST_LOG", "warn")
        .arg("check")
        .assert()
        .success()
        .stderr(
            predicate::str::contains("profile was incomplete")
                .and(predicate::str::contains("no usable profile").not()),
        );
}
