use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use runtrack_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "runtrack")]
#[command(about = "GPS run distance and time tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded fix log (.csv or .jsonl) as a run
    Replay {
        /// Fix log to replay
        file: PathBuf,

        /// Activity profile (walk, run, cycle)
        #[arg(long)]
        activity: Option<String>,

        /// Do not write the report or record the run in history
        #[arg(long)]
        no_export: bool,

        /// Fail on unreadable rows instead of skipping them
        #[arg(long)]
        strict: bool,

        /// Only print the final report
        #[arg(short, long)]
        quiet: bool,
    },

    /// List recorded runs, newest first
    History {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        runtrack_core::logging::init_with_level("debug");
    } else {
        runtrack_core::logging::init();
    }

    let config = match cli.config_file {
        Some(ref path) => {
            tracing::info!("Loading configuration from {:?}", path);
            Config::load_from(path)?
        }
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Commands::Replay {
            file,
            activity,
            no_export,
            strict,
            quiet,
        } => cmd_replay(
            &data_dir,
            &config,
            &file,
            activity.as_deref(),
            no_export,
            strict,
            quiet,
        ),
        Commands::History { limit } => cmd_history(&data_dir, limit),
        Commands::Config => cmd_config(&config, &data_dir),
    }
}

fn cmd_replay(
    data_dir: &Path,
    config: &Config,
    file: &Path,
    activity: Option<&str>,
    no_export: bool,
    strict: bool,
    quiet: bool,
) -> Result<()> {
    let filter = config.filter_for(activity)?;
    let activity_name = activity.or(config.activity.default.as_deref());

    let mut session = RunSession::new(filter)?;
    if let Some(name) = activity_name {
        session = session.with_activity(name.trim().to_lowercase());
    }

    let events = read_events(file, strict)?;

    let report = replay(&mut session, &events, |session, event, decision| {
        if quiet {
            return;
        }
        let now = i64::try_from(event.timestamp_millis())
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_default();
        let outcome = match (event, decision) {
            (FixEvent::Pause { .. }, _) => "paused".to_string(),
            (FixEvent::Resume { .. }, _) => "resumed".to_string(),
            (FixEvent::SensorError { error, .. }, _) => format!("sensor error: {}", error),
            (FixEvent::Fix(_), Some(FilterDecision::Anchor)) => "anchor".to_string(),
            (FixEvent::Fix(_), Some(FilterDecision::Accept { segment_meters })) => {
                format!("+{:.1}m", segment_meters)
            }
            (FixEvent::Fix(_), Some(FilterDecision::Reject(reason))) => {
                format!("rejected ({})", describe_rejection(&reason))
            }
            (FixEvent::Fix(_), None) => "ignored".to_string(),
        };
        println!(
            "[{}] {} mi  signal: {:<9}  {}",
            format_elapsed(session.current_elapsed_seconds(now)),
            format_miles(session.current_distance_meters()),
            session.signal_quality().label(),
            outcome
        );
    })?;

    println!();
    print!("{}", report.render_text());
    println!(
        "Fixes: {} accepted, {} rejected",
        report.accepted_fixes, report.rejected_fixes
    );

    if no_export {
        println!("\n[No export - run not recorded]");
        return Ok(());
    }

    let mut exporter = TextExporter::new(data_dir.join("reports"));
    exporter.export(&report)?;
    let mut history = JsonlHistory::new(data_dir.join("history.jsonl"));
    history.export(&report)?;
    tracing::info!("Recorded run {} in {:?}", report.id, history.path());

    if let Some(path) = exporter.last_written() {
        println!("\n✓ Report saved to {}", path.display());
    }
    Ok(())
}

fn describe_rejection(reason: &RejectReason) -> String {
    match reason {
        RejectReason::LowAccuracy { accuracy_meters } => {
            format!("accuracy {:.0}m", accuracy_meters)
        }
        RejectReason::NonMonotonic { elapsed_millis } => {
            format!("out of order by {}ms", elapsed_millis)
        }
        RejectReason::ImpliedSpeed { meters_per_second } => {
            format!("{:.1} m/s", meters_per_second)
        }
    }
}

fn cmd_history(data_dir: &Path, limit: usize) -> Result<()> {
    let reports = recent_reports(&data_dir.join("history.jsonl"), limit)?;

    if reports.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }

    println!("{:<20}  {:>8}  {:>8}  {}", "Date", "Miles", "Time", "Activity");
    for report in &reports {
        println!(
            "{:<20}  {:>8}  {:>8}  {}",
            report.started_at.format("%Y-%m-%d %H:%M").to_string(),
            format_miles(report.distance_meters),
            format_elapsed(report.duration_seconds),
            report.activity.as_deref().unwrap_or("-")
        );
    }

    let totals = HistoryTotals::from_reports(&reports);
    println!(
        "\nTotal: {} runs, {} miles, {}",
        totals.runs,
        format_miles(totals.distance_meters),
        format_elapsed(totals.duration_seconds)
    );
    Ok(())
}

fn cmd_config(config: &Config, data_dir: &Path) -> Result<()> {
    let mut effective = config.clone();
    effective.data.data_dir = data_dir.to_path_buf();
    print!("{}", effective.to_toml()?);

    println!("\n# Activity profiles");
    for profile in ActivityProfile::all() {
        println!(
            "#   {:<6} speed <= {:.2} m/s, accuracy <= {:.0} m",
            profile.name, profile.speed_threshold_meters_per_second, profile.accuracy_threshold_meters
        );
    }
    Ok(())
}
