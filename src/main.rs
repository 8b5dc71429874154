mod raster;
mod script;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use canvas::config::{ConfigError, EngineConfig};
use canvas::engine::{EngineCore, EngineError};
use canvas::pixmap::Pixmap;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::raster::RasterError;
use crate::script::ScriptError;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("io error on {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("invalid viewport `{0}`; expected WIDTHxHEIGHT")]
    InvalidViewport(String),
    #[error("script {0}")]
    Script(#[from] ScriptError),
}

#[derive(Parser, Debug)]
#[command(name = "pastel", about = "Headless host for the pastel image editor engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay recorded editor events against an image.
    Replay(ReplayArgs),
    /// Print image dimensions and size.
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    #[arg(long)]
    image: PathBuf,

    #[arg(long, default_value = "-", help = "Event script path, or - for stdin")]
    script: String,

    #[arg(long, help = "Output PNG path")]
    out: PathBuf,

    #[arg(long, env = "PASTEL_CONFIG", help = "Engine config JSON file")]
    config: Option<PathBuf>,

    #[arg(long, default_value = "1280x800", help = "Viewport size in CSS pixels")]
    viewport: Viewport,
}

#[derive(Args, Debug)]
struct InfoArgs {
    #[arg(long)]
    image: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    width: f64,
    height: f64,
}

impl FromStr for Viewport {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CliError::InvalidViewport(s.to_owned());
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: f64 = w.trim().parse().map_err(|_| invalid())?;
        let height: f64 = h.trim().parse().map_err(|_| invalid())?;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Serialize)]
struct ReplaySummary {
    width: u32,
    height: u32,
    size_label: String,
    events: usize,
    history_len: usize,
    history_cursor: Option<usize>,
    can_undo: bool,
    can_redo: bool,
    brush_size: f64,
    brush_color: String,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    image_rendering: &'static str,
}

#[derive(Debug, Serialize)]
struct InfoSummary {
    width: u32,
    height: u32,
    size_bytes: u64,
    size_label: String,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay(args) => run_replay(args),
        Command::Info(args) => run_info(args),
    }
}

fn run_replay(args: ReplayArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json(&read_text(path)?)?,
        None => EngineConfig::default(),
    };
    let (pixmap, size_bytes) = load_pixmap(&args.image)?;
    let text = if args.script == "-" { read_stdin()? } else { read_text(Path::new(&args.script))? };
    let events = script::parse(&text)?;
    tracing::info!(events = events.len(), image = %args.image.display(), "replaying script");

    let mut core: EngineCore<Pixmap> = EngineCore::new(config);
    core.set_viewport(args.viewport.width, args.viewport.height);
    core.load_image(pixmap, size_bytes)?;

    let count = events.len();
    for (idx, event) in events.into_iter().enumerate() {
        let actions = core.dispatch(event);
        tracing::debug!(event = idx, ?actions, "dispatched");
    }

    let summary = summarize(&core, count);
    let Some(edited) = core.into_surface() else {
        return Err(CliError::Engine(EngineError::Surface("session has no raster".to_owned())));
    };
    raster::save_png(&edited, &args.out)?;
    tracing::info!(out = %args.out.display(), "wrote edited image");

    print_json(&summary)
}

fn run_info(args: InfoArgs) -> Result<(), CliError> {
    let (pixmap, size_bytes) = load_pixmap(&args.image)?;
    let mut core: EngineCore<Pixmap> = EngineCore::default();
    core.load_image(pixmap, size_bytes)?;
    let Some(info) = core.image_info() else {
        return Err(CliError::Engine(EngineError::Surface("session has no image".to_owned())));
    };
    print_json(&InfoSummary {
        width: info.width,
        height: info.height,
        size_bytes: info.size_bytes,
        size_label: info.size_label(),
    })
}

fn summarize(core: &EngineCore<Pixmap>, events: usize) -> ReplaySummary {
    let info = core.image_info();
    let camera = core.camera();
    let brush = core.brush();
    ReplaySummary {
        width: info.map_or(0, |i| i.width),
        height: info.map_or(0, |i| i.height),
        size_label: info.map(|i| i.size_label()).unwrap_or_default(),
        events,
        history_len: core.history_len(),
        history_cursor: core.history_cursor(),
        can_undo: core.can_undo(),
        can_redo: core.can_redo(),
        brush_size: brush.size(),
        brush_color: brush.color().to_string(),
        scale: camera.scale,
        offset_x: camera.offset_x,
        offset_y: camera.offset_y,
        image_rendering: core.image_rendering().css_value(),
    }
}

fn load_pixmap(path: &Path) -> Result<(Pixmap, u64), CliError> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    let pixmap = raster::decode(&bytes)?;
    Ok((pixmap, bytes.len() as u64))
}

fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| io_error(path, source))
}

fn read_stdin() -> Result<String, CliError> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .map_err(|source| io_error(Path::new("<stdin>"), source))?;
    Ok(text)
}

fn io_error(path: &Path, source: io::Error) -> CliError {
    CliError::Io { path: path.display().to_string(), source }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
