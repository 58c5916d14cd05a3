// src/session.rs
//! Activation lifecycle.
//!
//! `activate` opens the camera, starts the landmark source and spawns the
//! driver task that owns the [`GestureTracker`]. The driver is the only code
//! that mutates gesture state: it processes frames in arrival order and
//! sleeps until the dwell deadline in between. Readers get snapshots through
//! a watch channel.
//!
//! `deactivate` tears down in a fixed order: source, driver, stream.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{self, JoinHandle};
use tokio::time::{sleep_until, Instant as TokioInstant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::camera::{share, CameraDevice, SharedStream};
use crate::config::GestureConfig;
use crate::error::ActivationError;
use crate::gesture::Gesture;
use crate::landmarks::LandmarkFrame;
use crate::pointer::PointerState;
use crate::source::LandmarkSource;
use crate::tracking::{GestureHandler, GestureTracker, Snapshot};
use crate::ui::ActionTarget;

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub started_at: DateTime<Local>,
    pub stream: String,
    /// Camera is on but the landmark model could not start; no gestures.
    pub degraded: bool,
}

struct Driver {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<GestureTracker>,
}

struct Active {
    info: SessionInfo,
    stream: SharedStream,
    driver: Option<Driver>,
}

pub struct GestureSession {
    camera: Box<dyn CameraDevice>,
    /// Gone only if it panicked while stopping.
    source: Option<Box<dyn LandmarkSource>>,
    /// Engine state while no driver owns it.
    parked: Option<GestureTracker>,
    active: Option<Active>,
    snapshots: Arc<watch::Sender<Snapshot>>,
}

impl GestureSession {
    pub fn new(
        config: GestureConfig,
        camera: Box<dyn CameraDevice>,
        source: Box<dyn LandmarkSource>,
        target: Box<dyn ActionTarget>,
        on_gesture: GestureHandler,
    ) -> Self {
        let tracker = GestureTracker::new(config, target, on_gesture);
        let (snapshots, _) = watch::channel(tracker.snapshot());
        Self {
            camera,
            source: Some(source),
            parked: Some(tracker),
            active: None,
            snapshots: Arc::new(snapshots),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn info(&self) -> Option<&SessionInfo> {
        self.active.as_ref().map(|a| &a.info)
    }

    /// Turns gesture control on. Calling it again while active returns the
    /// running session's info.
    ///
    /// A camera failure leaves the session inactive with nothing held. A
    /// landmark source that will not start leaves the camera on and the
    /// session active but degraded.
    pub async fn activate(&mut self) -> Result<SessionInfo, ActivationError> {
        if let Some(active) = &self.active {
            return Ok(active.info.clone());
        }
        if self.parked.is_none() {
            return Err(ActivationError::EngineLost(
                "previous frame driver did not shut down cleanly".into(),
            ));
        }
        let Some(source) = self.source.as_mut() else {
            return Err(ActivationError::EngineLost(
                "landmark source panicked while stopping".into(),
            ));
        };

        let stream = self
            .camera
            .open()
            .inspect_err(|e| warn!("Camera activation failed: {}", e))?;
        let description = stream.describe();
        let stream = share(stream);

        let (frames_tx, frames_rx) = mpsc::channel(1);
        let driver = match source.start(Arc::clone(&stream), frames_tx) {
            Ok(()) => self.parked.take().map(|tracker| {
                let (shutdown, shutdown_rx) = oneshot::channel();
                let handle = tokio::spawn(drive(
                    tracker,
                    frames_rx,
                    shutdown_rx,
                    Arc::clone(&self.snapshots),
                ));
                Driver { shutdown, handle }
            }),
            Err(e) => {
                warn!("Landmark source unavailable, gesture control degraded: {:#}", e);
                None
            }
        };

        let info = SessionInfo {
            id: Uuid::new_v4(),
            started_at: Local::now(),
            stream: description,
            degraded: driver.is_none(),
        };
        info!(
            "Gesture control active (session {}, {}{})",
            info.id,
            info.stream,
            if info.degraded { ", degraded" } else { "" }
        );

        self.active = Some(Active {
            info: info.clone(),
            stream,
            driver,
        });
        Ok(info)
    }

    /// Turns gesture control off. A no-op when inactive.
    pub async fn deactivate(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        // stopping may join a worker thread mid-inference
        if let Some(mut source) = self.source.take() {
            let stopped = task::spawn_blocking(move || {
                source.stop();
                source
            })
            .await;
            match stopped {
                Ok(source) => self.source = Some(source),
                Err(e) => warn!("Landmark source failed to stop: {}", e),
            }
        }

        if let Some(driver) = active.driver.take() {
            // the driver may already be gone if it panicked
            let _ = driver.shutdown.send(());
            match driver.handle.await {
                Ok(tracker) => self.parked = Some(tracker),
                Err(e) => warn!("Gesture driver ended abnormally: {}", e),
            }
        }
        if let Some(tracker) = self.parked.as_mut() {
            tracker.reset();
            self.snapshots.send_replace(tracker.snapshot());
        }

        let stream = active.stream;
        let released = task::spawn_blocking(move || {
            stream
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .release();
        })
        .await;
        if let Err(e) = released {
            warn!("Media stream release failed: {}", e);
        }

        info!("Gesture control deactivated (session {})", active.info.id);
    }

    pub fn pointer(&self) -> PointerState {
        self.snapshots.borrow().pointer
    }

    pub fn current_gesture(&self) -> Option<Gesture> {
        self.snapshots.borrow().gesture
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that sees every published snapshot; meant for render loops.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }
}

async fn drive(
    mut tracker: GestureTracker,
    mut frames: mpsc::Receiver<Option<LandmarkFrame>>,
    mut shutdown: oneshot::Receiver<()>,
    snapshots: Arc<watch::Sender<Snapshot>>,
) -> GestureTracker {
    let mut source_done = false;

    loop {
        let dwell = tracker.dwell_deadline().map(TokioInstant::from_std);

        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            // expiry goes ahead of a frame arriving in the same tick
            _ = sleep_until(dwell.unwrap_or_else(TokioInstant::now)), if dwell.is_some() => {
                tracker.expire(TokioInstant::now().into_std());
            }
            frame = frames.recv(), if !source_done => match frame {
                Some(frame) => {
                    tracker.process_frame(frame.as_ref(), TokioInstant::now().into_std());
                }
                None => {
                    debug!("Landmark source finished");
                    source_done = true;
                    continue;
                }
            },
        }

        snapshots.send_replace(tracker.snapshot());
    }

    tracker
}
