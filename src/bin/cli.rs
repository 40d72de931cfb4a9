use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use lesson_schedule::persistence::{LocalFileAccess, load_profile, today_config_to_json};
use lesson_schedule::time_format::{self, format_time};
use lesson_schedule::{
    Clock, EditorConfig, Profile, Resolution, ScheduleEditor, SystemClock, TimeGroupResolver,
    TodayConfig, generate_today_config, validate_profile,
};

/// Lesson schedule editor: resolve, inspect and keep today's schedule up to date.
#[derive(Debug, Parser)]
#[command(name = "lesson-schedule", long_about = None)]
struct Cli {
    /// Directory holding the profile and today config (overrides LESSON_SCHEDULE_DATA_DIR).
    #[arg(short = 'd', long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// JSON editor config file.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Profile file, relative to the data dir unless absolute.
    #[arg(short = 'p', long = "profile", global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show which curriculum applies on a date and the time groups walked to get there.
    Resolve {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Print the materialized schedule for a date.
    Today {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        /// Emit the today-config JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// List authoring problems in the profile. Exits non-zero when any are found.
    Check,
    /// Keep the today config fresh until interrupted.
    Run,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    time_format::parse_date(raw).ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn editor_config(cli: &Cli) -> Result<EditorConfig> {
    let mut config = match &cli.config {
        Some(path) => EditorConfig::from_json_file(path)?,
        None => EditorConfig::default(),
    }
    .apply_env(|key| std::env::var(key).ok());
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(profile) = &cli.profile {
        config.profile_file = profile.clone();
    }
    Ok(config)
}

fn read_profile(config: &EditorConfig) -> Profile {
    let fs = LocalFileAccess::new(&config.data_dir);
    let loaded = load_profile(&fs, &config.profile_file);
    if loaded.defaulted {
        warn!(path = %config.profile_file.display(), "no usable profile stored, showing defaults");
    } else if loaded.needs_save {
        warn!(path = %config.profile_file.display(), "profile was incomplete, showing defaults where missing");
    }
    loaded.profile
}

fn moment(date: Option<NaiveDate>) -> NaiveDateTime {
    match date {
        Some(date) => date.and_time(NaiveTime::MIN),
        None => SystemClock.now(),
    }
}

fn render_schedule_as_text_table(config: &TodayConfig) -> String {
    let header = ["start", "end", "type", "name", "short"];
    let rows: Vec<[String; 5]> = config
        .sorted_entries()
        .into_iter()
        .map(|(_, entry)| {
            let short = match entry {
                lesson_schedule::ScheduleEntry::Lesson(lesson) => lesson.short_name.clone(),
                lesson_schedule::ScheduleEntry::Break(brk) => brk.short_name.clone(),
                lesson_schedule::ScheduleEntry::DividingLine(_) => String::new(),
            };
            [
                format_time(entry.start_time().time()),
                entry
                    .end_time()
                    .map(|end| format_time(end.time()))
                    .unwrap_or_default(),
                entry.kind().to_string(),
                entry.name().to_string(),
                short,
            ]
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, cells: &[&str]| {
        out.push('|');
        for (ci, cell) in cells.iter().enumerate() {
            out.push(' ');
            out.push_str(cell);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(cell.chars().count())));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &header);
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut out, &cells);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn resolve(config: &EditorConfig, date: Option<NaiveDate>) -> Result<ExitCode> {
    let profile = read_profile(config);
    let target = moment(date).date();
    let root = profile.active_root(target);
    println!("date: {target}");
    println!("root: {root}");

    let resolution = TimeGroupResolver::new(&profile).resolve(target, &root);
    let path = resolution.path_ids();
    if !path.is_empty() {
        println!("path: {}", path.join(" -> "));
    }
    match resolution {
        Resolution::Resolved {
            curriculum_id,
            curriculum,
            ..
        } => {
            println!("curriculum: {curriculum_id} ({})", curriculum.name);
            Ok(ExitCode::SUCCESS)
        }
        Resolution::Unresolved { reason, .. } => {
            println!("unresolved: {reason}");
            Ok(ExitCode::SUCCESS)
        }
        Resolution::Loop { .. } => {
            println!("loop detected");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn today(config: &EditorConfig, date: Option<NaiveDate>, json: bool) -> Result<ExitCode> {
    let profile = read_profile(config);
    let generated = generate_today_config(&profile, moment(date));
    if json {
        println!("{}", today_config_to_json(&generated.config)?);
    } else {
        println!(
            "{} ({})",
            generated.config.generate_date.date(),
            generated.curriculum_id.as_deref().unwrap_or("no curriculum")
        );
        print!("{}", render_schedule_as_text_table(&generated.config));
    }
    Ok(if generated.is_loop {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn check(config: &EditorConfig) -> Result<ExitCode> {
    let issues = validate_profile(&read_profile(config));
    if issues.is_empty() {
        println!("profile ok");
        return Ok(ExitCode::SUCCESS);
    }
    for issue in &issues {
        println!("- {issue}");
    }
    println!("{} issue(s)", issues.len());
    Ok(ExitCode::FAILURE)
}

async fn run(config: &EditorConfig) -> Result<ExitCode> {
    let fs = Arc::new(LocalFileAccess::new(&config.data_dir));
    let editor = ScheduleEditor::init(config, fs, Arc::new(SystemClock));
    if let Some(chain) = editor.loop_chain() {
        warn!(chain = %chain.join(" -> "), "today's time groups loop");
    }
    info!(entries = editor.today_config().schedule.len(), "running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    editor
        .teardown()
        .await
        .map_err(|err| anyhow!("final save failed: {err}"))?;
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so command output stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = editor_config(&cli)?;

    match cli.command {
        Command::Resolve { date } => resolve(&config, date),
        Command::Today { date, json } => today(&config, date, json),
        Command::Check => check(&config),
        Command::Run => run(&config).await,
    }
}
