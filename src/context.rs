//! The editor's runtime: owns the profile and today's schedule, keeps both on
//! disk and rebuilds the schedule when the profile changes or the day rolls over.

use crate::calculations::TimeGroupResolver;
use crate::clock::Clock;
use crate::config::EditorConfig;
use crate::persistence::{
    DebouncedSaver, FileAccess, PersistenceResult, RetrySaver, SaveTask, load_profile,
    load_today_config, profile_to_json, today_config_to_json,
};
use crate::profile::Profile;
use crate::profile_validation::validate_profile;
use crate::scheduler::RegenerationTimer;
use crate::today_config::{GeneratedToday, TodayConfig, generate_today_config};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

struct EditorState {
    profile: RwLock<Profile>,
    today: RwLock<GeneratedToday>,
    clock: Arc<dyn Clock>,
}

impl EditorState {
    fn regenerate(&self) -> TodayConfig {
        let generated = {
            let profile = self.profile.read();
            generate_today_config(&profile, self.clock.now())
        };
        let config = generated.config.clone();
        *self.today.write() = generated;
        config
    }
}

pub struct ScheduleEditor {
    state: Arc<EditorState>,
    profile_saver: RetrySaver,
    today_saver: RetrySaver,
    profile_changes: DebouncedSaver,
    today_changes: DebouncedSaver,
    timer: RegenerationTimer,
}

impl ScheduleEditor {
    /// Loads or creates both artifacts and starts the midnight timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(config: &EditorConfig, fs: Arc<dyn FileAccess>, clock: Arc<dyn Clock>) -> Self {
        let loaded = load_profile(fs.as_ref(), &config.profile_file);
        for issue in validate_profile(&loaded.profile) {
            warn!(%issue, "profile issue");
        }

        let now = clock.now();
        let stored_today = load_today_config(fs.as_ref(), &config.today_config_file, now.date());
        let (today, today_needs_save) = match stored_today {
            Some(stored) => {
                // Rerun the walk so loop state is known without rebuilding entries.
                let resolution = TimeGroupResolver::new(&loaded.profile).resolve_for_date(now.date());
                let today = GeneratedToday {
                    curriculum_id: resolution.curriculum_id().map(str::to_string),
                    path: resolution.path_ids(),
                    is_loop: resolution.is_loop(),
                    config: stored,
                };
                (today, false)
            }
            None => (generate_today_config(&loaded.profile, now), true),
        };

        let state = Arc::new(EditorState {
            profile: RwLock::new(loaded.profile),
            today: RwLock::new(today),
            clock: Arc::clone(&clock),
        });

        let profile_saver = RetrySaver::new(
            "profile",
            profile_task(Arc::clone(&state), Arc::clone(&fs), config.profile_file.clone()),
            config.max_save_retries,
            config.retry_delay(),
        );
        let today_saver = RetrySaver::new(
            "todayConfig",
            today_task(Arc::clone(&state), Arc::clone(&fs), config.today_config_file.clone()),
            config.max_save_retries,
            config.retry_delay(),
        );

        if loaded.needs_save {
            profile_saver.request();
        }
        if today_needs_save {
            today_saver.request();
        }

        let timer = {
            let state = Arc::clone(&state);
            let today_saver = today_saver.clone();
            RegenerationTimer::start(clock, move || {
                state.regenerate();
                today_saver.request();
            })
        };

        info!(
            data_dir = %config.data_dir.display(),
            profile_needs_save = loaded.needs_save,
            today_needs_save,
            "schedule editor ready"
        );

        Self {
            profile_changes: DebouncedSaver::new(profile_saver.clone(), config.save_debounce()),
            today_changes: DebouncedSaver::new(today_saver.clone(), config.save_debounce()),
            state,
            profile_saver,
            today_saver,
            timer,
        }
    }

    pub fn profile(&self) -> Profile {
        self.state.profile.read().clone()
    }

    /// Applies `change` to the profile, then rebuilds today's schedule and
    /// schedules debounced saves of both artifacts.
    pub fn update_profile<R>(&self, change: impl FnOnce(&mut Profile) -> R) -> R {
        let result = {
            let mut profile = self.state.profile.write();
            change(&mut profile)
        };
        self.profile_changes.notify();
        self.state.regenerate();
        self.today_changes.notify();
        result
    }

    pub fn today_config(&self) -> TodayConfig {
        self.state.today.read().config.clone()
    }

    /// True when today's walk ran into a circular time-group reference.
    pub fn today_is_loop(&self) -> bool {
        self.state.today.read().is_loop
    }

    /// Time groups visited for today; on a loop the repeating id comes last.
    pub fn loop_chain(&self) -> Option<Vec<String>> {
        let today = self.state.today.read();
        today.is_loop.then(|| today.path.clone())
    }

    pub fn today_curriculum_id(&self) -> Option<String> {
        self.state.today.read().curriculum_id.clone()
    }

    /// Rebuilds today's schedule from the current profile and saves it. Called
    /// off the runtime, the save happens before this returns.
    pub fn regenerate_today(&self) -> TodayConfig {
        let config = self.state.regenerate();
        self.today_saver.request();
        config
    }

    /// Stops the timer, waits for running saves and writes both artifacts once more.
    pub async fn teardown(self) -> PersistenceResult<()> {
        self.timer.cancel();
        self.profile_changes.cancel();
        self.today_changes.cancel();
        self.profile_saver.flush().await;
        self.today_saver.flush().await;

        let profile = self.profile_saver.save_blocking();
        let today = self.today_saver.save_blocking();
        if let Err(err) = &profile {
            error!(error = %err, "profile not saved on teardown");
        }
        if let Err(err) = &today {
            error!(error = %err, "today config not saved on teardown");
        }
        info!("schedule editor stopped");
        profile.and(today)
    }
}

fn profile_task(state: Arc<EditorState>, fs: Arc<dyn FileAccess>, path: PathBuf) -> SaveTask {
    Arc::new(move || {
        let text = profile_to_json(&state.profile.read())?;
        fs.write_file(&path, &text)
    })
}

fn today_task(state: Arc<EditorState>, fs: Arc<dyn FileAccess>, path: PathBuf) -> SaveTask {
    Arc::new(move || {
        let text = today_config_to_json(&state.today.read().config)?;
        fs.write_file(&path, &text)
    })
}
