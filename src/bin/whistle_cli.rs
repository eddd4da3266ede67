use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast;
use whistle_counter::calibration::CalibrationSample;
use whistle_counter::clock::StubTimeSource;
use whistle_counter::error::ErrorCode;
use whistle_counter::{
    AppConfig, CalibrationError, FrameOutcome, PcmSpectrumSource, ProfileStore, WhistleCounter,
    WhistleEvent, WhistleProfile,
};

/// Silence inserted between recordings on the session clock
const RECORDING_GAP_MS: u64 = 1_000;

#[derive(Parser, Debug)]
#[command(
    name = "whistle_cli",
    about = "Calibrate and count pressure-cooker whistles from WAV recordings"
)]
struct Cli {
    /// Profile collection file (defaults to the configured store path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// JSON config file (defaults to assets/whistle_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a whistle profile from recordings and manual frequencies
    Calibrate {
        /// Mono WAV with one whistle; repeat for each sample
        #[arg(long = "recording")]
        recordings: Vec<PathBuf>,
        /// Known whistle frequency in Hz; repeat for each sample
        #[arg(long = "manual-frequency")]
        manual_frequencies: Vec<f32>,
        /// Save the profile under this name
        #[arg(long)]
        save: Option<String>,
    },
    /// Count whistles in a recording
    Count {
        #[arg(long)]
        input: PathBuf,
        /// Saved profile name
        #[arg(long, conflicts_with = "profile_file", required_unless_present = "profile_file")]
        profile: Option<String>,
        /// Profile JSON file, as printed by `calibrate`
        #[arg(long)]
        profile_file: Option<PathBuf>,
        /// Stop once this many whistles are counted
        #[arg(long)]
        target: Option<u32>,
    },
    /// Manage saved profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// List saved profile names
    List,
    /// Print one saved profile
    Show { name: String },
    /// Delete one saved profile
    Delete { name: String },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli
        .config
        .as_deref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);
    let store_path = cli.store.clone().unwrap_or_else(|| config.store.path.clone());
    let store = ProfileStore::open_file(&store_path);

    let clock = Arc::new(StubTimeSource::new());
    let counter = WhistleCounter::new(config, store).with_clock(clock.clone());

    match cli.command {
        Commands::Calibrate {
            recordings,
            manual_frequencies,
            save,
        } => run_calibrate(&counter, &clock, &recordings, &manual_frequencies, save),
        Commands::Count {
            input,
            profile,
            profile_file,
            target,
        } => run_count(&counter, &clock, &input, profile, profile_file, target),
        Commands::Profiles { action } => run_profiles(&counter, action),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // stdout carries the JSON output
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_calibrate(
    counter: &WhistleCounter,
    clock: &StubTimeSource,
    recordings: &[PathBuf],
    manual_frequencies: &[f32],
    save: Option<String>,
) -> Result<ExitCode> {
    if recordings.is_empty() && manual_frequencies.is_empty() {
        return Err(anyhow!("Pass at least one --recording or --manual-frequency"));
    }

    counter.start_calibration()?;
    let mut samples = Vec::new();
    let mut offset_ms = 0;

    for path in recordings {
        let source = PcmSpectrumSource::from_wav(path, &counter.config().audio)?
            .starting_at(offset_ms);
        let duration_ms = source.duration_ms();
        let sample = record_sample(counter, clock, source, offset_ms)
            .with_context(|| format!("recording {}", path.display()))?;
        match sample {
            Some(sample) => samples.push(SampleReport::recorded(path, sample)),
            None => {
                log::warn!("No clear whistle in {}, sample skipped", path.display());
                samples.push(SampleReport::rejected(path));
            }
        }

        offset_ms += duration_ms.max(counter.config().calibration.recording_window_ms)
            + RECORDING_GAP_MS;
        clock.set_ms(offset_ms);
    }

    for &frequency in manual_frequencies {
        let sample = counter
            .add_manual_sample(frequency)
            .with_context(|| format!("manual frequency {frequency} Hz"))?;
        samples.push(SampleReport {
            source: format!("manual:{frequency}"),
            sample: Some(sample),
        });
    }

    let profile = match counter.finish_calibration() {
        Ok(profile) => profile,
        Err(err) => {
            emit_failure(&err, &samples)?;
            return Ok(ExitCode::from(2));
        }
    };

    let saved_as = match save {
        Some(name) => {
            counter.save_profile(&name)?;
            Some(name.trim().to_string())
        }
        None => None,
    };

    let report = CalibrationReport {
        profile: &profile,
        samples: &samples,
        saved_as: saved_as.as_deref(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

/// Play one recording into the running calibration
///
/// The recording stops on its own once the window elapses; shorter files are
/// stopped when they run out.
fn record_sample(
    counter: &WhistleCounter,
    clock: &StubTimeSource,
    source: PcmSpectrumSource,
    start_ms: u64,
) -> Result<Option<CalibrationSample>> {
    clock.set_ms(start_ms);
    counter.start_recording()?;

    for frame in source {
        clock.set_ms(frame.timestamp_ms);
        if let FrameOutcome::SampleRecorded(sample) = counter.process_frame(&frame)? {
            return Ok(sample);
        }
    }

    match counter.stop_recording() {
        Ok(sample) => Ok(Some(sample)),
        Err(CalibrationError::NoSignalDetected) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn run_count(
    counter: &WhistleCounter,
    clock: &StubTimeSource,
    input: &Path,
    profile: Option<String>,
    profile_file: Option<PathBuf>,
    target: Option<u32>,
) -> Result<ExitCode> {
    match (profile, profile_file) {
        (Some(name), _) => {
            counter.load_profile(&name)?;
        }
        (None, Some(path)) => {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let profile = parse_profile(&json)
                .with_context(|| format!("parsing profile {}", path.display()))?;
            counter.set_active_profile(profile)?;
        }
        (None, None) => return Err(anyhow!("Pass --profile or --profile-file")),
    }

    let source = PcmSpectrumSource::from_wav(input, &counter.config().audio)?;
    let duration_ms = source.duration_ms();
    let mut events = counter
        .subscribe_events()
        .ok_or_else(|| anyhow!("event channel unavailable"))?;

    clock.set_ms(0);
    counter.start_detection(target)?;

    let mut target_reached = false;
    let mut frames = 0usize;
    for frame in source {
        clock.set_ms(frame.timestamp_ms);
        frames += 1;
        let outcome = counter.process_frame(&frame)?;
        print_events(&mut events)?;
        if let FrameOutcome::WhistleCounted {
            target_reached: true,
            ..
        } = outcome
        {
            target_reached = true;
            break;
        }
    }
    counter.stop_detection()?;

    let summary = CountSummary {
        whistles: counter.count()?,
        target: counter.target()?,
        target_reached,
        frames,
        duration_ms,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(ExitCode::from(0))
}

fn print_events(events: &mut broadcast::Receiver<WhistleEvent>) -> Result<()> {
    loop {
        match events.try_recv() {
            Ok(event) => println!("{}", serde_json::to_string(&event)?),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                log::warn!("{} events dropped", skipped);
            }
            Err(_) => return Ok(()),
        }
    }
}

/// Accept either a bare profile or the full `calibrate` report
fn parse_profile(json: &str) -> Result<WhistleProfile> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let profile = match value.get("profile") {
        Some(inner) => inner.clone(),
        None => value,
    };
    Ok(serde_json::from_value(profile)?)
}

fn run_profiles(counter: &WhistleCounter, action: ProfileAction) -> Result<ExitCode> {
    if let Some(err) = counter.store().load_error() {
        return Err(anyhow!(err.clone()).context("profile store unreadable"));
    }

    match action {
        ProfileAction::List => {
            let names = counter.profile_names()?;
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
        ProfileAction::Show { name } => match counter.store().get(&name)? {
            Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
            None => {
                eprintln!("No saved profile named \"{}\"", name);
                return Ok(ExitCode::from(1));
            }
        },
        ProfileAction::Delete { name } => {
            counter.delete_profile(&name)?;
            println!("{}", serde_json::json!({ "deleted": name.trim() }));
        }
    }
    Ok(ExitCode::from(0))
}

fn emit_failure(err: &CalibrationError, samples: &[SampleReport]) -> Result<()> {
    let payload = serde_json::json!({
        "error": err.message(),
        "code": err.code(),
        "samples": samples,
    });
    eprintln!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

#[derive(Serialize)]
struct SampleReport {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample: Option<CalibrationSample>,
}

impl SampleReport {
    fn recorded(path: &Path, sample: CalibrationSample) -> Self {
        Self {
            source: path.display().to_string(),
            sample: Some(sample),
        }
    }

    fn rejected(path: &Path) -> Self {
        Self {
            source: path.display().to_string(),
            sample: None,
        }
    }
}

#[derive(Serialize)]
struct CalibrationReport<'a> {
    profile: &'a WhistleProfile,
    samples: &'a [SampleReport],
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_as: Option<&'a str>,
}

#[derive(Serialize)]
struct CountSummary {
    whistles: u32,
    target: Option<u32>,
    target_reached: bool,
    frames: usize,
    duration_ms: u64,
}
