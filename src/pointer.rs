// src/pointer.rs
use serde::Serialize;

use crate::landmarks::LandmarkFrame;

/// Screen size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointerMode {
    Idle,
    Ready,
    Clicking,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointerState {
    pub x: f64,
    pub y: f64,
    pub is_pointing: bool,
    pub is_pinching: bool,
}

impl PointerState {
    pub fn centered(viewport: Viewport) -> Self {
        let (x, y) = viewport.center();
        Self {
            x,
            y,
            is_pointing: false,
            is_pinching: false,
        }
    }

    /// Cursor look: pinching on screen is a click in progress, pointing is
    /// aiming, anything else idles. Coordinates at the origin count as no hand.
    pub fn mode(&self) -> PointerMode {
        let on_screen = self.x > 0.0 && self.y > 0.0;
        if !on_screen {
            PointerMode::Idle
        } else if self.is_pinching {
            PointerMode::Clicking
        } else if self.is_pointing {
            PointerMode::Ready
        } else {
            PointerMode::Idle
        }
    }
}

/// Index-fingertip pointer. Keeps its last value whenever no hand is seen.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    state: PointerState,
}

impl PointerTracker {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: PointerState::centered(viewport),
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    /// Direct mapping, no mirroring.
    pub fn track(&mut self, frame: &LandmarkFrame, viewport: Viewport) {
        let tip = frame.index_tip();
        self.state.x = viewport.width * tip.x;
        self.state.y = viewport.height * tip.y;
    }

    pub fn set_pinching(&mut self, pinching: bool) {
        self.state.is_pinching = pinching;
    }

    pub fn set_pointing(&mut self, pointing: bool) {
        self.state.is_pointing = pointing;
    }

    /// Flags drop on deactivation; the position stays where it was.
    pub fn release(&mut self) {
        self.state.is_pointing = false;
        self.state.is_pinching = false;
    }
}
