// src/motion.rs
use crate::gesture::Gesture;
use crate::landmarks::LandmarkFrame;

/// Swipe from the wrist displacement between two consecutive hand frames.
/// Horizontal motion wins when both axes exceed the threshold.
pub fn detect_swipe(
    current: &LandmarkFrame,
    previous: Option<&LandmarkFrame>,
    threshold: f64,
) -> Option<Gesture> {
    let previous = previous?;
    let delta = current.wrist() - previous.wrist();
    swipe_from_delta(delta.x, delta.y, threshold)
}

pub fn swipe_from_delta(dx: f64, dy: f64, threshold: f64) -> Option<Gesture> {
    if dx.abs() > threshold {
        return Some(if dx > 0.0 {
            Gesture::SwipeRight
        } else {
            Gesture::SwipeLeft
        });
    }

    if dy.abs() > threshold {
        // camera y grows downward
        return Some(if dy > 0.0 {
            Gesture::SwipeDown
        } else {
            Gesture::SwipeUp
        });
    }

    None
}
