//! pupiltrack CLI — pupil detection on single images and recorded sequences.

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use pupiltrack::preprocess::prepare_frame;
use pupiltrack::{SessionError, TrackerConfig, TrackerSession};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Parser)]
#[command(name = "pupiltrack")]
#[command(about = "Locate the pupil in eye images and alert on gaze drift")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the pupil in a single image.
    Detect(CliDetectArgs),

    /// Track a directory of frames as one live session.
    Track(CliTrackArgs),

    /// Print the default configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Tracker configuration (JSON). Missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the frame result (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliTrackArgs {
    /// Directory of frames, processed in file-name order.
    #[arg(long)]
    frames: PathBuf,

    /// Tracker configuration (JSON). Missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write one JSON result per line. Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Toggle lock mode before these frame indices.
    #[arg(long, num_args = 1..)]
    lock_at: Vec<u64>,

    /// Serial device of the actuator.
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long, default_value_t = 115200)]
    baud: u32,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Track(args) => run_track(&args),
        Commands::DefaultConfig => run_default_config(),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<TrackerConfig> {
    match path {
        Some(p) => {
            tracing::info!("Loading config: {}", p.display());
            TrackerConfig::from_json_file(p)
                .map_err(|e| -> CliError { format!("Failed to load config {}: {}", p.display(), e).into() })
        }
        None => Ok(TrackerConfig::default()),
    }
}

fn load_frame(path: &Path, config: &TrackerConfig) -> CliResult<image::GrayImage> {
    let img = image::open(path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", path.display(), e).into()
    })?;
    Ok(prepare_frame(&img, &config.preprocess))
}

fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(std::io::BufWriter::new(std::fs::File::create(p)?)),
        None => Box::new(std::io::stdout().lock()),
    })
}

// ── detect ─────────────────────────────────────────────────────────────

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    tracing::info!("Loading image: {}", args.image.display());
    let gray = load_frame(&args.image, &config)?;
    let (w, h) = gray.dimensions();
    tracing::info!("Frame size: {}x{}", w, h);

    let mut session = TrackerSession::new(config)?;
    let result = session.process_frame(&gray)?;

    if result.pupil.valid {
        tracing::info!(
            "Pupil at ({:.1}, {:.1}), axes {:.1} x {:.1}, angle {:.1} deg",
            result.pupil.center.0,
            result.pupil.center.1,
            result.pupil.axes.0,
            result.pupil.axes.1,
            result.pupil.angle_deg,
        );
    } else {
        tracing::info!("No pupil found");
    }

    let json = serde_json::to_string_pretty(&result)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Result written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ── track ──────────────────────────────────────────────────────────────

fn list_frames(dir: &Path) -> CliResult<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    frames.sort();
    Ok(frames)
}

fn open_session(args: &CliTrackArgs, config: TrackerConfig) -> CliResult<TrackerSession> {
    match &args.port {
        Some(port) => {
            let port = pupiltrack::open_serial(port, args.baud)
                .map_err(|e| -> CliError { format!("Failed to open serial port {}: {}", port, e).into() })?;
            Ok(TrackerSession::with_actuator(config, Box::new(port))?)
        }
        None => Ok(TrackerSession::new(config)?),
    }
}

fn run_track(args: &CliTrackArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let frames = list_frames(&args.frames)?;
    if frames.is_empty() {
        return Err(format!("No frames found in {}", args.frames.display()).into());
    }
    tracing::info!("Tracking {} frames from {}", frames.len(), args.frames.display());

    let mut session = open_session(args, config)?;
    let mut out = open_output(args.out.as_deref())?;

    let mut n_valid = 0usize;
    let mut n_processed = 0usize;
    for (i, path) in frames.iter().enumerate() {
        let gray = load_frame(path, session.config())?;
        if args.lock_at.contains(&(i as u64)) {
            let engaged = session.toggle_lock();
            tracing::info!("Frame {}: lock {}", i, if engaged { "on" } else { "off" });
        }

        let result = match session.process_frame(&gray) {
            Ok(result) => result,
            Err(SessionError::RemoteTerminate) => {
                tracing::info!("Actuator requested shutdown at frame {}", i);
                break;
            }
            Err(e) => return Err(e.into()),
        };
        n_processed += 1;
        if result.pupil.valid {
            n_valid += 1;
        }
        if let Some(cmd) = result.command_sent {
            tracing::info!("Frame {}: sent '{}'", i, cmd);
        }
        writeln!(out, "{}", serde_json::to_string(&result)?)?;
    }
    out.flush()?;

    session.shutdown()?;
    tracing::info!("Processed {} frames, {} with a valid pupil", n_processed, n_valid);
    if let Some(path) = &args.out {
        tracing::info!("Results written to {}", path.display());
    }
    Ok(())
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    let json = serde_json::to_string_pretty(&TrackerConfig::default())?;
    println!("{}", json);
    Ok(())
}
