use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};

use snapmark::capture::CaptureService;
use snapmark::config::{AppConfig, StrokeColor};
use snapmark::domain::{DisplayGeometry, ImageReference, Stroke};
use snapmark::render::CanvasFactory;
use snapmark::screen::{AnnotationScreen, ScreenContext, ScreenResult, ScreenUpdate};
use snapmark::session::{Command, ConfirmChoice};

#[derive(Parser)]
#[command(name = "snapmark")]
#[command(about = "Annotate an image and save a copy next to earlier ones", long_about = None)]
struct Cli {
    /// Image to annotate (path or file:// URI)
    image: Option<String>,

    /// JSON array of strokes to draw
    #[arg(long)]
    strokes: Option<PathBuf>,

    /// Display size as WIDTHxHEIGHT
    #[arg(long, default_value = "1080x1920", value_parser = parse_display)]
    display: DisplayGeometry,

    /// Destination directory (defaults to the configured cache subdirectory)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leave without saving
    #[arg(long)]
    discard: bool,
}

/// Stroke as written in the strokes file; missing fields use the pen config
#[derive(Deserialize)]
struct StrokeInput {
    points: Vec<(f32, f32)>,
    color: Option<StrokeColor>,
    width: Option<f32>,
}

fn parse_display(s: &str) -> Result<DisplayGeometry, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let height = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    Ok(DisplayGeometry::new(width, height))
}

fn load_strokes(path: Option<&PathBuf>, config: &AppConfig) -> Result<Vec<Stroke>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let inputs: Vec<StrokeInput> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(inputs
        .into_iter()
        .map(|input| {
            Stroke::new(
                input.points,
                input.color.unwrap_or(config.pen_color),
                input.width.unwrap_or(config.pen_width),
            )
        })
        .collect())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    let destination = match cli.out.clone() {
        Some(dir) => dir,
        None => config
            .destination_dir()
            .context("no cache directory available; pass --out")?,
    };
    let mut strokes = load_strokes(cli.strokes.as_ref(), &config)?;
    let image = cli
        .image
        .as_deref()
        .map(ImageReference::parse)
        .transpose()?;

    let (tx, mut completions) = mpsc::unbounded_channel();
    let (reply_tx, reply) = oneshot::channel();
    let mut display = cli.display;
    let mut screen = AnnotationScreen::start(
        image,
        CanvasFactory,
        ScreenContext {
            display,
            destination,
            capture: CaptureService::from_config(&config),
            completions: tx,
            reply: Some(reply_tx),
        },
    )?;

    while let Some(completion) = completions.recv().await {
        match screen.handle(completion) {
            ScreenUpdate::RenderSkipped { requested } => {
                display = display.rotated_to(requested);
                log::info!("Rotating display to {requested:?}");
                screen.configuration_changed(display);
            }
            ScreenUpdate::SessionReady(_) => {
                for stroke in strokes.drain(..) {
                    screen.commit_stroke(stroke);
                }
                let update = if cli.discard {
                    match screen.exit_attempt() {
                        ScreenUpdate::Prompt => screen.choose(ConfirmChoice::Discard),
                        other => other,
                    }
                } else {
                    screen.command(Command::Save)
                };
                if let ScreenUpdate::SaveFailed(err) = update {
                    return Err(err).context("saving annotated image");
                }
            }
            ScreenUpdate::StartFailed(err) => {
                return Err(err).context("starting annotation screen");
            }
            ScreenUpdate::SaveFailed(err) => {
                return Err(err).context("saving annotated image");
            }
            _ => {}
        }
        if screen.is_finished() {
            break;
        }
    }

    match reply.await.context("screen ended without a result")? {
        ScreenResult::Saved(path) => println!("{}", path.display()),
        ScreenResult::Cancelled => println!("cancelled"),
    }
    Ok(())
}
