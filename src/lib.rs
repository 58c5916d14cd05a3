// src/lib.rs
//! Hands-free control from hand landmarks.
//!
//! A landmark source feeds 21-point hand frames into a per-session engine
//! that classifies static poses, detects swipes, tracks an index-fingertip
//! pointer and turns the resulting gestures into scrolls, clicks and
//! application callbacks.

pub mod app;
pub mod arbiter;
pub mod camera;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gesture;
pub mod landmarker;
pub mod landmarks;
pub mod motion;
pub mod page;
pub mod pointer;
pub mod recording;
pub mod session;
pub mod source;
pub mod synthetic;
pub mod timer;
pub mod tracking;
pub mod ui;

pub use config::GestureConfig;
pub use error::{ActivationError, ConfigError, RecordingError};
pub use gesture::Gesture;
pub use landmarks::LandmarkFrame;
pub use pointer::{PointerState, Viewport};
pub use session::{GestureSession, SessionInfo};
