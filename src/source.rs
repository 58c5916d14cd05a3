// src/source.rs
//! Landmark sources.
//!
//! A source turns an open media stream into a sequence of
//! `Option<LandmarkFrame>` values (`None` = no hand) pushed into the
//! session's frame channel. Exactly one source runs per active session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::camera::SharedStream;
use crate::landmarker::{HandLandmarker, LandmarkerFactory};
use crate::landmarks::LandmarkFrame;
use crate::recording::LandmarkRecording;

pub type FrameSender = mpsc::Sender<Option<LandmarkFrame>>;

pub trait LandmarkSource: Send {
    /// Begins pushing frames. An error means the source could not start at
    /// all; the stream stays usable.
    fn start(&mut self, stream: SharedStream, frames: FrameSender) -> Result<()>;
    /// Stops pushing frames. No frame is sent after this returns.
    ///
    /// May block while a worker finishes its current frame; sessions call
    /// it from the blocking pool.
    fn stop(&mut self);
}

/// First hand only; malformed landmark sets count as no hand.
fn first_hand(hands: Vec<Vec<[f64; 3]>>) -> Option<LandmarkFrame> {
    hands
        .into_iter()
        .next()
        .and_then(|points| LandmarkFrame::from_points(&points))
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Box<dyn HandLandmarker>>,
}

/// Camera frames through the landmark model, on a dedicated thread.
///
/// A frame is dropped rather than queued when the session has not yet
/// consumed the previous one.
pub struct ModelSource {
    factory: Option<LandmarkerFactory>,
    landmarker: Option<Box<dyn HandLandmarker>>,
    frame_interval: Duration,
    worker: Option<Worker>,
}

impl ModelSource {
    pub fn new(factory: LandmarkerFactory) -> Self {
        Self {
            factory: Some(factory),
            landmarker: None,
            frame_interval: Duration::from_millis(33),
            worker: None,
        }
    }

    /// Pause between capture iterations; the stream's own pacing comes on top.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn load_landmarker(&mut self) -> Result<Box<dyn HandLandmarker>> {
        if let Some(landmarker) = self.landmarker.take() {
            return Ok(landmarker);
        }
        let factory = self
            .factory
            .take()
            .ok_or_else(|| anyhow!("hand landmark model failed to load earlier"))?;
        info!("Loading hand landmark model");
        factory().context("failed to load hand landmark model")
    }
}

impl LandmarkSource for ModelSource {
    fn start(&mut self, stream: SharedStream, frames: FrameSender) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        let mut landmarker = self.load_landmarker()?;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let interval = self.frame_interval;

        let handle = thread::Builder::new()
            .name("landmark-source".into())
            .spawn(move || {
                while !stop_flag.load(Ordering::SeqCst) {
                    let grabbed = stream
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .grab();

                    let frame = match grabbed {
                        Ok(image) => match landmarker.detect(&image) {
                            Ok(hands) => first_hand(hands),
                            Err(e) => {
                                debug!("Landmark detection failed: {:#}", e);
                                None
                            }
                        },
                        Err(e) => {
                            debug!("Frame grab failed: {:#}", e);
                            None
                        }
                    };

                    if stop_flag.load(Ordering::SeqCst) {
                        break;
                    }
                    match frames.try_send(frame) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => debug!("Session busy, dropping frame"),
                        Err(TrySendError::Closed(_)) => break,
                    }

                    thread::sleep(interval);
                }
                landmarker
            })
            .context("failed to spawn landmark source thread")?;

        self.worker = Some(Worker { stop, handle });
        Ok(())
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::SeqCst);
        match worker.handle.join() {
            Ok(landmarker) => self.landmarker = Some(landmarker),
            Err(_) => warn!("Landmark source thread panicked"),
        }
    }
}

impl Drop for ModelSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Plays a recording back in real time, ignoring the camera.
pub struct ReplaySource {
    recording: Arc<LandmarkRecording>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(recording: LandmarkRecording) -> Self {
        Self {
            recording: Arc::new(recording),
            task: None,
        }
    }

    /// Not replaying: never started, stopped, or ran off the end.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl LandmarkSource for ReplaySource {
    /// Must be called from within a Tokio runtime.
    fn start(&mut self, _stream: SharedStream, frames: FrameSender) -> Result<()> {
        if !self.is_finished() {
            return Ok(());
        }
        let runtime = tokio::runtime::Handle::try_current()
            .context("replay needs a running tokio runtime")?;
        let recording = Arc::clone(&self.recording);

        info!(
            "Replaying {} frames ({:.1}s)",
            recording.len(),
            recording.duration().as_secs_f64()
        );
        self.task = Some(runtime.spawn(async move {
            let origin = tokio::time::Instant::now();
            for recorded in recording.frames() {
                tokio::time::sleep_until(origin + recorded.offset).await;
                if frames.send(recorded.frame.clone()).await.is_err() {
                    return;
                }
            }
            debug!("Replay finished");
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}
