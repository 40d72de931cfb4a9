use super::{FileAccess, PersistenceError, PersistenceResult};
use crate::profile::{EnableConfig, Profile};
use crate::today_config::TodayConfig;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// A profile read from storage. `needs_save` is set when the stored text was
/// missing, unreadable or had to be patched, so the caller should write it back.
/// `defaulted` means nothing usable was stored and every value is a default.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLoad {
    pub profile: Profile,
    pub needs_save: bool,
    pub defaulted: bool,
}

impl ProfileLoad {
    fn fallback() -> Self {
        Self {
            profile: Profile::default(),
            needs_save: true,
            defaulted: true,
        }
    }
}

/// Reads the profile at `path`, backfilling missing or `null` top-level keys
/// from defaults. Text that is not a JSON object yields the default profile.
pub fn load_profile(fs: &dyn FileAccess, path: &Path) -> ProfileLoad {
    if !fs.exists(path) {
        info!(path = %path.display(), "no profile stored, starting from defaults");
        return ProfileLoad::fallback();
    }
    let text = match fs.read_file(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "profile unreadable, using defaults");
            return ProfileLoad::fallback();
        }
    };

    match parse_profile(&text) {
        Ok((profile, patched)) => {
            debug!(
                path = %path.display(),
                subjects = profile.subjects.len(),
                timetables = profile.timetables.len(),
                curriculums = profile.curriculums.len(),
                time_groups = profile.time_groups.len(),
                patched,
                "profile loaded"
            );
            ProfileLoad {
                profile,
                needs_save: patched,
                defaulted: false,
            }
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "profile malformed, using defaults");
            ProfileLoad::fallback()
        }
    }
}

/// Parses profile text; the flag reports whether any top-level key was backfilled.
///
/// Records are read one by one. A subject, timetable, curriculum or time group
/// that does not deserialize is dropped with a warning and the rest are kept.
/// Only text that is not a JSON object is an error.
pub fn parse_profile(text: &str) -> PersistenceResult<(Profile, bool)> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut object) = value else {
        return Err(PersistenceError::InvalidData(
            "profile is not a JSON object".to_string(),
        ));
    };

    let mut patched = false;
    let profile = Profile {
        subjects: records(&mut object, "subjects", &mut patched),
        timetables: records(&mut object, "timetables", &mut patched),
        curriculums: records(&mut object, "curriculums", &mut patched),
        time_groups: records(&mut object, "timeGroups", &mut patched),
        enable_config: enable_config(&mut object, &mut patched),
    };
    Ok((profile, patched))
}

fn records<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    key: &str,
    patched: &mut bool,
) -> BTreeMap<String, T> {
    let entries = match object.remove(key) {
        Some(Value::Object(entries)) => entries,
        None | Some(Value::Null) => {
            warn!(key, "profile key missing, filling in default");
            *patched = true;
            return BTreeMap::new();
        }
        Some(other) => {
            warn!(key, found = %other, "profile key is not an object, filling in default");
            *patched = true;
            return BTreeMap::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|(id, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some((id, record)),
            Err(err) => {
                warn!(key, %id, error = %err, "dropping unreadable profile record");
                None
            }
        })
        .collect()
}

/// The selection block, read field by field so one bad field keeps the other.
fn enable_config(object: &mut Map<String, Value>, patched: &mut bool) -> EnableConfig {
    let mut fields = match object.remove("enableConfig") {
        Some(Value::Object(fields)) => fields,
        None | Some(Value::Null) => {
            warn!(key = "enableConfig", "profile key missing, filling in default");
            *patched = true;
            return EnableConfig::default();
        }
        Some(other) => {
            warn!(key = "enableConfig", found = %other, "profile key is not an object, filling in default");
            *patched = true;
            return EnableConfig::default();
        }
    };

    let defaults = EnableConfig::default();
    EnableConfig {
        selected: field(&mut fields, "selected").unwrap_or(defaults.selected),
        temp_selected: field(&mut fields, "tempSelected").unwrap_or(defaults.temp_selected),
    }
}

fn field<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = fields.remove(key).filter(|value| !value.is_null())?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(key, error = %err, "enableConfig field unreadable, using default");
            None
        }
    }
}

pub fn profile_to_json(profile: &Profile) -> PersistenceResult<String> {
    Ok(serde_json::to_string_pretty(profile)?)
}

/// The stored today config if it is present, well formed and generated on `today`.
pub fn load_today_config(fs: &dyn FileAccess, path: &Path, today: NaiveDate) -> Option<TodayConfig> {
    if !fs.exists(path) {
        debug!(path = %path.display(), "no today config stored");
        return None;
    }
    let text = match fs.read_file(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "today config unreadable");
            return None;
        }
    };

    let config = match parse_today_config(&text) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "today config malformed");
            return None;
        }
    };

    if !config.is_for(today) {
        info!(
            generated = %config.generate_date,
            %today,
            "today config is stale"
        );
        return None;
    }
    Some(config)
}

pub fn parse_today_config(text: &str) -> PersistenceResult<TodayConfig> {
    let value: Value = serde_json::from_str(text)?;
    for key in ["generateDate", "schedule"] {
        if value.get(key).is_none_or(Value::is_null) {
            return Err(PersistenceError::InvalidData(format!(
                "today config is missing '{key}'"
            )));
        }
    }
    Ok(serde_json::from_value(value)?)
}

pub fn today_config_to_json(config: &TodayConfig) -> PersistenceResult<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_keys_are_backfilled() {
        let (profile, patched) =
            parse_profile(r#"{"subjects": {"m": {"name": "Math"}}, "timetables": null}"#).unwrap();
        assert!(patched);
        assert_eq!(profile.subjects["m"].name, "Math");
        assert!(profile.timetables.is_empty());
        assert_eq!(profile.enable_config, Default::default());
    }

    #[test]
    fn complete_profile_is_not_patched() {
        let text = profile_to_json(&Profile::default()).unwrap();
        let (profile, patched) = parse_profile(&text).unwrap();
        assert!(!patched);
        assert_eq!(profile, Profile::default());
    }

    #[test]
    fn enable_config_fields_fall_back_one_at_a_time() {
        let text = r#"{
            "subjects": {}, "timetables": {}, "curriculums": {}, "timeGroups": {},
            "enableConfig": {
                "selected": {"type": "curriculum"},
                "tempSelected": {"enable": true, "type": "timegroup", "id": "exam",
                                 "startTime": "2024-06-01", "endTime": "2024-06-07"}
            }
        }"#;
        let (profile, patched) = parse_profile(text).unwrap();
        assert!(!patched);
        assert_eq!(profile.enable_config.selected, EnableConfig::default().selected);
        assert!(profile.enable_config.temp_selected.enable);
        assert_eq!(profile.enable_config.temp_selected.id, "exam");
    }

    #[test]
    fn arrays_are_rejected() {
        assert!(matches!(
            parse_profile("[]"),
            Err(PersistenceError::InvalidData(_))
        ));
    }

    #[test]
    fn today_config_requires_both_fields() {
        assert!(parse_today_config(r#"{"schedule": {}}"#).is_err());
        assert!(parse_today_config(r#"{"generateDate": "2024-01-01T00:00:00"}"#).is_err());
        assert!(
            parse_today_config(r#"{"generateDate": "2024-01-01T00:00:00", "schedule": {}}"#)
                .is_ok()
        );
    }
}
