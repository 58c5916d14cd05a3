// src/camera.rs
//
// Camera access. A `CameraDevice` is asked for a stream once per activation;
// the stream is shared between the landmark source (which grabs frames) and
// the session (which releases it last).
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use image::RgbImage;
use tracing::debug;

use crate::error::ActivationError;

pub trait MediaStream: Send {
    /// Human-readable name, e.g. the device and resolution.
    fn describe(&self) -> String;
    /// Next video frame. Blocks until one is available.
    fn grab(&mut self) -> Result<RgbImage>;
    /// Stops capture and frees the device. Further grabs fail. May block.
    fn release(&mut self);
}

pub type SharedStream = Arc<Mutex<Box<dyn MediaStream>>>;

pub fn share(stream: Box<dyn MediaStream>) -> SharedStream {
    Arc::new(Mutex::new(stream))
}

pub trait CameraDevice: Send {
    fn open(&mut self) -> Result<Box<dyn MediaStream>, ActivationError>;
}

#[derive(Debug, Clone)]
enum VirtualOutcome {
    Ready,
    Denied(String),
    Unavailable(String),
}

/// Camera without hardware: hands out blank frames of a fixed size, or
/// refuses to open. Clones share their counters.
#[derive(Debug, Clone)]
pub struct VirtualCamera {
    width: u32,
    height: u32,
    outcome: VirtualOutcome,
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicBool>,
}

impl VirtualCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            outcome: VirtualOutcome::Ready,
            opened: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn denied(reason: &str) -> Self {
        Self {
            outcome: VirtualOutcome::Denied(reason.to_string()),
            ..Self::new(640, 480)
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            outcome: VirtualOutcome::Unavailable(reason.to_string()),
            ..Self::new(640, 480)
        }
    }

    /// Successful opens so far.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// A stream from this camera is open and not yet released.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl CameraDevice for VirtualCamera {
    fn open(&mut self) -> Result<Box<dyn MediaStream>, ActivationError> {
        match &self.outcome {
            VirtualOutcome::Denied(reason) => {
                Err(ActivationError::PermissionDenied(reason.clone()))
            }
            VirtualOutcome::Unavailable(reason) => {
                Err(ActivationError::CameraUnavailable(reason.clone()))
            }
            VirtualOutcome::Ready => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                self.live.store(true, Ordering::SeqCst);
                Ok(Box::new(VirtualStream {
                    width: self.width,
                    height: self.height,
                    live: Arc::clone(&self.live),
                }))
            }
        }
    }
}

struct VirtualStream {
    width: u32,
    height: u32,
    live: Arc<AtomicBool>,
}

impl MediaStream for VirtualStream {
    fn describe(&self) -> String {
        format!("virtual camera {}x{}", self.width, self.height)
    }

    fn grab(&mut self) -> Result<RgbImage> {
        if !self.live.load(Ordering::SeqCst) {
            bail!("virtual camera stream released");
        }
        Ok(RgbImage::new(self.width, self.height))
    }

    fn release(&mut self) {
        debug!("Releasing {}", self.describe());
        self.live.store(false, Ordering::SeqCst);
    }
}

#[cfg(feature = "camera")]
pub use native::NokhwaCamera;

#[cfg(feature = "camera")]
mod native {
    use std::sync::mpsc;
    use std::thread;

    use anyhow::{anyhow, Context, Result};
    use image::RgbImage;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
    use nokhwa::Camera;
    use tracing::{debug, warn};

    use super::{CameraDevice, MediaStream};
    use crate::error::ActivationError;

    /// Webcam through nokhwa. The device lives on its own capture thread;
    /// the stream talks to it over channels.
    #[derive(Debug, Clone)]
    pub struct NokhwaCamera {
        index: u32,
    }

    impl NokhwaCamera {
        pub fn new(index: u32) -> Self {
            Self { index }
        }
    }

    fn classify(message: String) -> ActivationError {
        let lower = message.to_lowercase();
        if ["permission", "denied", "not authorized", "unauthorized"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            ActivationError::PermissionDenied(message)
        } else {
            ActivationError::CameraUnavailable(message)
        }
    }

    impl CameraDevice for NokhwaCamera {
        fn open(&mut self) -> Result<Box<dyn MediaStream>, ActivationError> {
            let index = self.index;
            let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<String, String>>(1);
            let (request_tx, request_rx) = mpsc::channel::<()>();
            let (frame_tx, frame_rx) = mpsc::sync_channel::<Result<RgbImage>>(1);

            let capture = thread::Builder::new()
                .name(format!("camera-{index}"))
                .spawn(move || {
                    let requested = RequestedFormat::new::<RgbFormat>(
                        RequestedFormatType::AbsoluteHighestFrameRate,
                    );
                    let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
                        Ok(camera) => camera,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };
                    if let Err(e) = camera.open_stream() {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }

                    let resolution = camera.resolution();
                    let description = format!(
                        "{} {}x{}@{}",
                        camera.info().human_name(),
                        resolution.width(),
                        resolution.height(),
                        camera.frame_rate()
                    );
                    if ready_tx.send(Ok(description)).is_err() {
                        return;
                    }

                    // one frame per request until the stream side hangs up
                    while request_rx.recv().is_ok() {
                        let frame = camera
                            .frame()
                            .map_err(|e| anyhow!("failed to capture frame: {e}"))
                            .and_then(|buffer| {
                                buffer
                                    .decode_image::<RgbFormat>()
                                    .map_err(|e| anyhow!("failed to decode frame: {e}"))
                            });
                        if frame_tx.send(frame).is_err() {
                            break;
                        }
                    }

                    if let Err(e) = camera.stop_stream() {
                        warn!("Failed to stop camera stream: {}", e);
                    }
                    debug!("Camera {} closed", index);
                })
                .map_err(|e| ActivationError::CameraUnavailable(e.to_string()))?;

            let description = match ready_rx.recv() {
                Ok(Ok(description)) => description,
                Ok(Err(message)) => {
                    let _ = capture.join();
                    return Err(classify(message));
                }
                Err(_) => {
                    return Err(ActivationError::CameraUnavailable(
                        "camera thread exited during startup".into(),
                    ))
                }
            };

            Ok(Box::new(NokhwaStream {
                description,
                requests: Some(request_tx),
                frames: frame_rx,
                capture: Some(capture),
            }))
        }
    }

    struct NokhwaStream {
        description: String,
        requests: Option<mpsc::Sender<()>>,
        frames: mpsc::Receiver<Result<RgbImage>>,
        capture: Option<thread::JoinHandle<()>>,
    }

    impl MediaStream for NokhwaStream {
        fn describe(&self) -> String {
            self.description.clone()
        }

        fn grab(&mut self) -> Result<RgbImage> {
            let requests = self
                .requests
                .as_ref()
                .context("camera stream released")?;
            requests
                .send(())
                .map_err(|_| anyhow!("camera thread is gone"))?;
            self.frames
                .recv()
                .map_err(|_| anyhow!("camera thread is gone"))?
        }

        fn release(&mut self) {
            // dropping the request side ends the capture loop
            self.requests = None;
            if let Some(capture) = self.capture.take() {
                if capture.join().is_err() {
                    warn!("Camera thread panicked");
                }
            }
        }
    }

    impl Drop for NokhwaStream {
        fn drop(&mut self) {
            self.release();
        }
    }

}
