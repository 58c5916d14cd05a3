// src/tracking.rs
//
// Per-frame engine. One `GestureTracker` owns every piece of mutable gesture
// state for a session; the session driver is its only caller.
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::arbiter::GestureArbiter;
use crate::config::GestureConfig;
use crate::dispatch::{ActionDispatcher, Dispatched};
use crate::gesture::Gesture;
use crate::landmarks::LandmarkFrame;
use crate::pointer::{PointerMode, PointerState, PointerTracker};
use crate::ui::ActionTarget;

const METRICS_WINDOW: usize = 30;

/// Application callback, called once per gesture transition.
pub type GestureHandler = Box<dyn FnMut(Gesture) + Send>;

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub avg_fps: f32,
    pub avg_processing_ms: f32,
    /// Share of recent frames that contained a hand.
    pub hand_presence: f32,
    pub frames: u64,
    #[serde(skip)]
    arrivals: VecDeque<Instant>,
    #[serde(skip)]
    processing_ms: VecDeque<f32>,
    #[serde(skip)]
    presence: VecDeque<bool>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            avg_fps: 0.0,
            avg_processing_ms: 0.0,
            hand_presence: 0.0,
            frames: 0,
            arrivals: VecDeque::with_capacity(METRICS_WINDOW),
            processing_ms: VecDeque::with_capacity(METRICS_WINDOW),
            presence: VecDeque::with_capacity(METRICS_WINDOW),
        }
    }

    pub fn record(&mut self, arrival: Instant, processing: Duration, hand: bool) {
        self.frames += 1;

        self.arrivals.push_back(arrival);
        self.processing_ms.push_back(processing.as_secs_f32() * 1000.0);
        self.presence.push_back(hand);
        if self.arrivals.len() > METRICS_WINDOW {
            self.arrivals.pop_front();
            self.processing_ms.pop_front();
            self.presence.pop_front();
        }

        let n = self.processing_ms.len() as f32;
        self.avg_processing_ms = self.processing_ms.iter().sum::<f32>() / n;
        self.hand_presence = self.presence.iter().filter(|&&h| h).count() as f32 / n;

        self.avg_fps = match (self.arrivals.front(), self.arrivals.back()) {
            (Some(first), Some(last)) if self.arrivals.len() > 1 => {
                let span = last.saturating_duration_since(*first).as_secs_f32();
                if span > 0.0 {
                    (self.arrivals.len() - 1) as f32 / span
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// What render-side readers see.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub gesture: Option<Gesture>,
    pub pointer: PointerState,
    pub pointer_mode: PointerMode,
    pub metrics: PerformanceMetrics,
}

pub struct GestureTracker {
    config: GestureConfig,
    arbiter: GestureArbiter,
    pointer: PointerTracker,
    dispatcher: ActionDispatcher,
    target: Box<dyn ActionTarget>,
    handler: GestureHandler,
    metrics: PerformanceMetrics,
}

impl GestureTracker {
    pub fn new(
        config: GestureConfig,
        target: Box<dyn ActionTarget>,
        handler: GestureHandler,
    ) -> Self {
        let pointer = PointerTracker::new(target.viewport());
        Self {
            arbiter: GestureArbiter::new(&config),
            dispatcher: ActionDispatcher::new(&config),
            pointer,
            target,
            handler,
            metrics: PerformanceMetrics::new(),
            config,
        }
    }

    /// Processes one source frame. `None` means no hand was visible.
    ///
    /// Returns the gesture emitted by this frame, if any.
    pub fn process_frame(
        &mut self,
        frame: Option<&LandmarkFrame>,
        now: Instant,
    ) -> Option<Gesture> {
        if !self.config.enabled {
            return None;
        }
        let started = Instant::now();

        let Some(frame) = frame else {
            self.metrics.record(now, started.elapsed(), false);
            return None;
        };

        // the pointer moves first so a click lands where the fingertip is now
        if self.config.enable_pointer {
            self.pointer.track(frame, self.target.viewport());
        }

        let step = self.arbiter.step(frame, now);
        self.pointer.set_pinching(step.reading.pinching());
        if let Some(pointing) = step.reading.pointing {
            self.pointer.set_pointing(pointing);
        }

        if let Some(gesture) = step.transition {
            let pointer = self.pointer.state();
            let action = self
                .dispatcher
                .dispatch(gesture, &pointer, self.target.as_mut(), now);
            if action != Dispatched::Forwarded {
                debug!("{} -> {:?}", gesture, action);
            }
            (self.handler)(gesture);
        }

        self.metrics.record(now, started.elapsed(), true);
        step.transition
    }

    /// Runs the dwell check. True when the current gesture was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        self.arbiter.expire(now)
    }

    pub fn dwell_deadline(&self) -> Option<Instant> {
        self.arbiter.dwell_deadline()
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer.state()
    }

    pub fn current_gesture(&self) -> Option<Gesture> {
        self.arbiter.current()
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn snapshot(&self) -> Snapshot {
        let pointer = self.pointer.state();
        Snapshot {
            gesture: self.arbiter.current(),
            pointer,
            pointer_mode: pointer.mode(),
            metrics: self.metrics.clone(),
        }
    }

    /// Back to a blank slate, keeping the pointer position.
    pub fn reset(&mut self) {
        self.arbiter.reset();
        self.dispatcher.reset();
        self.pointer.release();
        self.metrics = PerformanceMetrics::new();
    }
}
