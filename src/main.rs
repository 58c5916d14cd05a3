// src/main.rs
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gesture_pilot::app::{recipe_page, AssistantState, CookingAssistant, Recipe};
use gesture_pilot::camera::VirtualCamera;
use gesture_pilot::page::PageEvent;
use gesture_pilot::recording::LandmarkRecording;
use gesture_pilot::session::{GestureSession, SessionInfo};
use gesture_pilot::source::ReplaySource;
use gesture_pilot::synthetic::{script_recording, Script};
use gesture_pilot::tracking::PerformanceMetrics;
use gesture_pilot::{Gesture, GestureConfig, Viewport};

#[derive(Parser, Debug)]
#[command(name = "gesture_pilot", about = "Hands-free gesture control engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a landmark recording against the demo recipe page.
    Replay {
        recording: PathBuf,
        /// JSON config file; defaults to the platform config dir.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 720.0)]
        height: f64,
        /// Disable the fingertip pointer and click-through.
        #[arg(long)]
        no_pointer: bool,
    },
    /// Write a synthetic landmark recording.
    Synth {
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = ScriptKind::Tour)]
        script: ScriptKind,
        /// Click target in normalized coordinates (click script only).
        #[arg(long, default_value_t = 0.5)]
        x: f64,
        #[arg(long, default_value_t = 0.5)]
        y: f64,
        #[arg(long, default_value_t = 30)]
        fps: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScriptKind {
    Tour,
    Scroll,
    Click,
}

#[derive(Serialize)]
struct ReplayReport {
    session: SessionInfo,
    gestures: Vec<String>,
    assistant: AssistantState,
    page_events: Vec<PageEvent>,
    final_scroll_y: f64,
    metrics: PerformanceMetrics,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay {
            recording,
            config,
            width,
            height,
            no_pointer,
        } => replay(recording, config, Viewport::new(width, height), no_pointer).await,
        Command::Synth {
            output,
            script,
            x,
            y,
            fps,
        } => synth(output, script, x, y, fps),
    }
}

async fn replay(
    path: PathBuf,
    config_path: Option<PathBuf>,
    viewport: Viewport,
    no_pointer: bool,
) -> Result<()> {
    let mut config = GestureConfig::load(config_path.as_deref()).context("loading config")?;
    if no_pointer {
        config.enable_pointer = false;
    }
    let recording = LandmarkRecording::load_csv(&path)
        .with_context(|| format!("reading recording {}", path.display()))?;
    info!(
        "Loaded {} frames ({} with a hand) from {}",
        recording.len(),
        recording.hand_frames(),
        path.display()
    );
    let run_for = recording.duration() + config.dwell() + Duration::from_millis(200);

    let recipe = Recipe::sample();
    let page = recipe_page(&recipe, viewport);
    let journal = page.journal();
    let assistant = CookingAssistant::new(recipe);

    let gestures = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&gestures);
    let mut forward = assistant.handler();
    let handler = Box::new(move |gesture: Gesture| {
        println!("{:>12}  {}", gesture.as_str(), gesture.label());
        if let Ok(mut log) = log.lock() {
            log.push(gesture.as_str().to_string());
        }
        forward(gesture);
    });

    let mut session = GestureSession::new(
        config,
        Box::new(VirtualCamera::new(viewport.width as u32, viewport.height as u32)),
        Box::new(ReplaySource::new(recording)),
        Box::new(page),
        handler,
    );

    let info = session.activate().await.context("activating gesture control")?;
    tokio::time::sleep(run_for).await;
    let metrics = session.snapshot().metrics;
    session.deactivate().await;

    let report = ReplayReport {
        session: info,
        gestures: gestures.lock().map(|g| g.clone()).unwrap_or_default(),
        assistant: assistant.state(),
        final_scroll_y: journal.scroll_y(),
        page_events: journal.events(),
        metrics,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn synth(output: PathBuf, kind: ScriptKind, x: f64, y: f64, fps: u32) -> Result<()> {
    let script = match kind {
        ScriptKind::Tour => Script::Tour,
        ScriptKind::Scroll => Script::Scroll,
        ScriptKind::Click => Script::Click { x, y },
    };
    let recording = script_recording(script, fps);
    recording
        .save_csv(&output)
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "Wrote {} frames ({:.1}s) to {}",
        recording.len(),
        recording.duration().as_secs_f64(),
        output.display()
    );
    Ok(())
}
