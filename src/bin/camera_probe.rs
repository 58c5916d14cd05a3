// src/bin/camera_probe.rs
//
// Opens the webcam the way a gesture session would and reports the outcome.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gesture_pilot::camera::{CameraDevice, NokhwaCamera};
use gesture_pilot::ActivationError;

#[derive(Parser, Debug)]
#[command(name = "camera_probe", about = "Check camera access for gesture control")]
struct Args {
    /// Camera index as enumerated by the platform.
    #[arg(long, default_value_t = 0)]
    index: u32,
    /// Save the first captured frame as PNG.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let mut camera = NokhwaCamera::new(args.index);
    let mut stream = match camera.open() {
        Ok(stream) => stream,
        Err(ActivationError::PermissionDenied(reason)) => {
            println!("✗ Camera permission denied: {reason}");
            println!("  Grant camera access to this terminal and try again.");
            std::process::exit(2);
        }
        Err(e) => {
            println!("✗ {e}");
            println!("  Is another application using the camera, or is none connected?");
            std::process::exit(1);
        }
    };
    println!("✓ Stream opened: {}", stream.describe());

    let frame = stream.grab().context("capturing a frame")?;
    println!("✓ Frame captured ({}x{})", frame.width(), frame.height());

    if let Some(path) = args.snapshot {
        frame
            .save(&path)
            .with_context(|| format!("saving {}", path.display()))?;
        println!("✓ Saved {}", path.display());
    }

    stream.release();
    Ok(())
}
