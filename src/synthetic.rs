// src/synthetic.rs
//! Synthetic hand frames.
//!
//! Produces geometrically plausible 21-point frames for the handful of poses
//! the classifier knows about, positioned anywhere in camera space. Used by
//! the `synth` command to write demo recordings and by the tests.

use std::time::Duration;

use nalgebra::Vector3;

use crate::landmarks::{
    Landmark, LandmarkFrame, INDEX_MCP, INDEX_TIP, LANDMARK_COUNT, MIDDLE_MCP, MIDDLE_TIP,
    PINKY_MCP, PINKY_TIP, RING_MCP, RING_TIP, THUMB_TIP, WRIST,
};
use crate::recording::LandmarkRecording;

// Hand geometry, in normalized units relative to the wrist.
const KNUCKLE_RISE: f64 = 0.15;
const FINGER_LENGTH: f64 = 0.12;
const CURL_DROP: f64 = 0.05;
const KNUCKLE_X: [f64; 4] = [-0.03, -0.01, 0.01, 0.03];
const THUMB_OUT: (f64, f64) = (-0.14, -0.06);
const THUMB_TUCKED: (f64, f64) = (0.03, -0.02);
const PINCH_GAP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Palm,
    Fist,
    Point,
    ThumbsUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    fn slot(self) -> usize {
        match self {
            Finger::Index => 0,
            Finger::Middle => 1,
            Finger::Ring => 2,
            Finger::Pinky => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HandBuilder {
    wrist: (f64, f64),
    extended: [bool; 4],
    thumb_out: bool,
    pinch: bool,
    overrides: Vec<(usize, [f64; 3])>,
}

impl HandBuilder {
    pub fn new(shape: Shape) -> Self {
        let (extended, thumb_out) = match shape {
            Shape::Palm => ([true; 4], false),
            Shape::Fist => ([false; 4], false),
            Shape::Point => ([true, false, false, false], false),
            Shape::ThumbsUp => ([false; 4], true),
        };
        Self {
            wrist: (0.5, 0.75),
            extended,
            thumb_out,
            pinch: false,
            overrides: Vec::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.wrist = (x, y);
        self
    }

    pub fn thumb_out(mut self, out: bool) -> Self {
        self.thumb_out = out;
        self
    }

    pub fn pinch(mut self, pinch: bool) -> Self {
        self.pinch = pinch;
        self
    }

    pub fn finger(mut self, finger: Finger, extended: bool) -> Self {
        self.extended[finger.slot()] = extended;
        self
    }

    /// Pins one landmark to an exact position after the pose is laid out.
    /// Out-of-range indices and non-finite points are ignored.
    pub fn set(mut self, index: usize, point: [f64; 3]) -> Self {
        if index < LANDMARK_COUNT && point.iter().all(|v| v.is_finite()) {
            self.overrides.push((index, point));
        }
        self
    }

    pub fn build(&self) -> LandmarkFrame {
        let (wx, wy) = self.wrist;
        let mut pts = [Vector3::zeros(); LANDMARK_COUNT];
        pts[WRIST] = Vector3::new(wx, wy, 0.0);

        let fingers = [
            (INDEX_MCP, INDEX_TIP),
            (MIDDLE_MCP, MIDDLE_TIP),
            (RING_MCP, RING_TIP),
            (PINKY_MCP, PINKY_TIP),
        ];
        for (slot, (mcp, tip)) in fingers.into_iter().enumerate() {
            let knuckle = Vector3::new(wx + KNUCKLE_X[slot], wy - KNUCKLE_RISE, 0.0);
            let tip_y = if self.extended[slot] {
                knuckle.y - FINGER_LENGTH
            } else {
                knuckle.y + CURL_DROP
            };
            let end = Vector3::new(knuckle.x, tip_y, -0.02);
            pts[mcp] = knuckle;
            // PIP and DIP sit between knuckle and tip
            pts[mcp + 1] = lerp(&knuckle, &end, 1.0 / 3.0);
            pts[mcp + 2] = lerp(&knuckle, &end, 2.0 / 3.0);
            pts[tip] = end;
        }

        let thumb_tip = if self.pinch {
            let index_tip = pts[INDEX_TIP];
            Vector3::new(index_tip.x + PINCH_GAP, index_tip.y + PINCH_GAP, -0.02)
        } else {
            let (dx, dy) = if self.thumb_out { THUMB_OUT } else { THUMB_TUCKED };
            Vector3::new(wx + dx, wy + dy, -0.02)
        };
        let wrist = pts[WRIST];
        for (i, t) in [(1, 0.25), (2, 0.5), (3, 0.75)] {
            pts[i] = lerp(&wrist, &thumb_tip, t);
        }
        pts[THUMB_TIP] = thumb_tip;

        for (index, [x, y, z]) in &self.overrides {
            pts[*index] = Vector3::new(*x, *y, *z);
        }

        LandmarkFrame::trusted(pts)
    }
}

fn lerp(a: &Landmark, b: &Landmark, t: f64) -> Landmark {
    a + (b - a) * t
}

/// Canned gesture sequences for demo recordings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Script {
    /// Swipe down twice, then up.
    Scroll,
    /// Aim at a point, pinch and release.
    Click { x: f64, y: f64 },
    /// Every gesture once, with pauses in between.
    Tour,
}

/// Builds a recording of `script` at `fps` frames per second.
pub fn script_recording(script: Script, fps: u32) -> LandmarkRecording {
    let mut timeline = Timeline::new(fps.max(1));

    match script {
        Script::Scroll => scroll_segment(&mut timeline),
        Script::Click { x, y } => click_segment(&mut timeline, x, y),
        Script::Tour => {
            timeline.hold(Shape::Palm, 20);
            timeline.gap(10);
            timeline.hold(Shape::Fist, 20);
            timeline.hold(Shape::ThumbsUp, 20);
            timeline.gap(10);
            timeline.glide((0.3, 0.7), Shape::Palm);
            timeline.jump((0.7, 0.7), 10);
            timeline.gap(30);
            // the first hand frame after a gap is compared with the last one before it
            timeline.jump((0.3, 0.7), 10);
            timeline.gap(30);
            scroll_segment(&mut timeline);
            click_segment(&mut timeline, 0.5, 0.5);
        }
    }

    timeline.finish()
}

fn scroll_segment(timeline: &mut Timeline) {
    timeline.glide((0.5, 0.4), Shape::Palm);
    timeline.jump((0.5, 0.8), 10);
    timeline.glide((0.5, 0.4), Shape::Palm);
    // long enough for the scroll throttle to let the upward swipe through
    timeline.jump((0.5, 0.8), 15);
    timeline.jump((0.5, 0.4), 10);
    timeline.gap(30);
}

fn click_segment(timeline: &mut Timeline, x: f64, y: f64) {
    // put the index fingertip on (x, y); the wrist sits below it
    let wrist = (x - KNUCKLE_X[0], y + KNUCKLE_RISE + FINGER_LENGTH);
    timeline.glide(wrist, Shape::Point);
    timeline.hold(Shape::Point, 15);
    timeline.pinch(6);
    timeline.hold(Shape::Point, 15);
    timeline.gap(30);
}

/// Largest per-frame wrist step a glide takes; well under any swipe threshold.
const GLIDE_STEP: f64 = 0.03;

struct Timeline {
    step: Duration,
    next: Duration,
    wrist: (f64, f64),
    recording: LandmarkRecording,
}

impl Timeline {
    fn new(fps: u32) -> Self {
        Self {
            step: Duration::from_secs(1) / fps,
            next: Duration::ZERO,
            wrist: (0.5, 0.75),
            recording: LandmarkRecording::new(),
        }
    }

    fn push(&mut self, frame: Option<LandmarkFrame>) {
        self.recording.push(self.next, frame);
        self.next += self.step;
    }

    fn hold(&mut self, shape: Shape, frames: usize) {
        let frame = HandBuilder::new(shape).at(self.wrist.0, self.wrist.1).build();
        for _ in 0..frames {
            self.push(Some(frame.clone()));
        }
    }

    fn pinch(&mut self, frames: usize) {
        let frame = HandBuilder::new(Shape::Point)
            .at(self.wrist.0, self.wrist.1)
            .pinch(true)
            .build();
        for _ in 0..frames {
            self.push(Some(frame.clone()));
        }
    }

    fn gap(&mut self, frames: usize) {
        for _ in 0..frames {
            self.push(None);
        }
    }

    /// Moves the wrist slowly enough that no frame reads as a swipe.
    fn glide(&mut self, to: (f64, f64), shape: Shape) {
        let (fx, fy) = self.wrist;
        let dist = (to.0 - fx).abs().max((to.1 - fy).abs());
        let steps = (dist / GLIDE_STEP).ceil().max(1.0) as usize;
        for i in 1..=steps {
            let t = i as f64 / steps as f64;
            self.wrist = (fx + (to.0 - fx) * t, fy + (to.1 - fy) * t);
            self.hold(shape, 1);
        }
    }

    /// One-frame jump to `to` with an open palm, then hold it.
    fn jump(&mut self, to: (f64, f64), hold: usize) {
        self.wrist = to;
        self.hold(Shape::Palm, hold.max(1));
    }

    fn finish(self) -> LandmarkRecording {
        self.recording
    }
}
