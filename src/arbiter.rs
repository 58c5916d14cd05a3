// src/arbiter.rs
//! Per-frame gesture arbitration.
//!
//! Combines the swipe detector and the pose classifier, prefers a swipe over a
//! static pose, suppresses re-emission while a gesture is held, and clears
//! the current gesture once the dwell window passes without a new one.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::GestureConfig;
use crate::gesture::{Gesture, PoseClassifier, PoseReading};
use crate::landmarks::LandmarkFrame;
use crate::motion::detect_swipe;
use crate::timer::DwellTimer;

/// What one processed frame produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbiterStep {
    /// Set only when the current gesture changed to a new label this frame.
    pub transition: Option<Gesture>,
    pub swipe: Option<Gesture>,
    pub reading: PoseReading,
}

#[derive(Debug, Clone)]
pub struct GestureArbiter {
    classifier: PoseClassifier,
    previous: Option<LandmarkFrame>,
    current: Option<Gesture>,
    dwell: DwellTimer,
    dwell_duration: Duration,
    swipe_threshold: f64,
}

impl GestureArbiter {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            classifier: PoseClassifier::new(config.pinch_threshold, config.click_cooldown()),
            previous: None,
            current: None,
            dwell: DwellTimer::new(),
            dwell_duration: config.dwell(),
            swipe_threshold: config.swipe_threshold,
        }
    }

    pub fn current(&self) -> Option<Gesture> {
        self.current
    }

    pub fn dwell_deadline(&self) -> Option<Instant> {
        self.dwell.deadline()
    }

    /// Runs one frame with a visible hand.
    pub fn step(&mut self, frame: &LandmarkFrame, now: Instant) -> ArbiterStep {
        // a frame landing on or past the deadline sees the cleared state
        self.expire(now);

        let swipe = detect_swipe(frame, self.previous.as_ref(), self.swipe_threshold);
        let reading = self.classifier.classify(frame, now);

        // a swipe beats whatever pose the hand is in
        let winner = swipe.or(reading.gesture);

        let transition = match winner {
            Some(gesture) if Some(gesture) != self.current => {
                debug!("Gesture {:?} -> {}", self.current, gesture);
                self.current = Some(gesture);
                self.dwell.arm(now, self.dwell_duration);
                Some(gesture)
            }
            _ => None,
        };

        self.previous = Some(frame.clone());

        ArbiterStep {
            transition,
            swipe,
            reading,
        }
    }

    /// Clears the current gesture if its dwell window has run out.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.dwell.fire_if_due(now) {
            debug!("Gesture {:?} dwell expired", self.current);
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Drops every piece of per-session state and cancels the dwell timer.
    pub fn reset(&mut self) {
        self.classifier.reset();
        self.previous = None;
        self.current = None;
        self.dwell.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{HandBuilder, Shape};

    struct FakeClock {
        t0: Instant,
    }

    impl FakeClock {
        fn new() -> Self {
            Self { t0: Instant::now() }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }
    }

    fn arbiter() -> GestureArbiter {
        GestureArbiter::new(&GestureConfig::default())
    }

    #[test]
    fn held_pose_emits_once() {
        let clock = FakeClock::new();
        let mut arb = arbiter();
        let fist = HandBuilder::new(Shape::Fist).build();

        let emitted: Vec<_> = (0..30)
            .filter_map(|i| arb.step(&fist, clock.at(i * 20)).transition)
            .collect();
        assert_eq!(emitted, vec![Gesture::Fist]);
    }

    #[test]
    fn dwell_clears_back_to_none() {
        let clock = FakeClock::new();
        let mut arb = arbiter();
        let palm = HandBuilder::new(Shape::Palm).build();

        assert_eq!(arb.step(&palm, clock.at(0)).transition, Some(Gesture::Palm));
        assert_eq!(arb.dwell_deadline(), Some(clock.at(800)));

        assert!(!arb.expire(clock.at(799)));
        assert_eq!(arb.current(), Some(Gesture::Palm));
        assert!(arb.expire(clock.at(801)));
        assert_eq!(arb.current(), None);
        assert_eq!(arb.dwell_deadline(), None);

        // the same pose held past the dwell is a fresh transition
        assert_eq!(arb.step(&palm, clock.at(820)).transition, Some(Gesture::Palm));
    }

    #[test]
    fn held_pose_re_emits_once_the_dwell_has_lapsed() {
        let clock = FakeClock::new();
        let mut arb = arbiter();
        let palm = HandBuilder::new(Shape::Palm).build();

        assert_eq!(arb.step(&palm, clock.at(0)).transition, Some(Gesture::Palm));
        // nobody called expire; the late frame alone has to notice
        assert_eq!(arb.step(&palm, clock.at(900)).transition, Some(Gesture::Palm));
        assert_eq!(arb.dwell_deadline(), Some(clock.at(1700)));

        // exactly on the deadline counts as lapsed
        assert_eq!(arb.step(&palm, clock.at(1700)).transition, Some(Gesture::Palm));
    }

    #[test]
    fn new_gesture_rearms_the_dwell_timer() {
        let clock = FakeClock::new();
        let mut arb = arbiter();

        arb.step(&HandBuilder::new(Shape::Palm).build(), clock.at(0));
        arb.step(&HandBuilder::new(Shape::Fist).build(), clock.at(500));

        assert!(!arb.expire(clock.at(900)));
        assert_eq!(arb.current(), Some(Gesture::Fist));
        assert!(arb.expire(clock.at(1300)));
    }

    #[test]
    fn swipe_wins_over_static_pose() {
        let clock = FakeClock::new();
        let mut arb = arbiter();

        let first = arb.step(&HandBuilder::new(Shape::Fist).at(0.3, 0.7).build(), clock.at(0));
        assert_eq!(first.transition, Some(Gesture::Fist));

        let moved = arb.step(&HandBuilder::new(Shape::Fist).at(0.6, 0.7).build(), clock.at(33));
        assert_eq!(moved.reading.gesture, Some(Gesture::Fist));
        assert_eq!(moved.swipe, Some(Gesture::SwipeRight));
        assert_eq!(moved.transition, Some(Gesture::SwipeRight));

        // standing still again: the pose comes back as a new transition
        let still = arb.step(&HandBuilder::new(Shape::Fist).at(0.6, 0.7).build(), clock.at(66));
        assert_eq!(still.transition, Some(Gesture::Fist));
    }

    #[test]
    fn unrecognised_pose_does_not_clear_current() {
        let clock = FakeClock::new();
        let mut arb = arbiter();
        arb.step(&HandBuilder::new(Shape::Palm).build(), clock.at(0));

        let peace = HandBuilder::new(Shape::Palm)
            .finger(crate::synthetic::Finger::Ring, false)
            .finger(crate::synthetic::Finger::Pinky, false)
            .build();
        let step = arb.step(&peace, clock.at(33));
        assert_eq!(step.transition, None);
        assert_eq!(arb.current(), Some(Gesture::Palm));
    }

    #[test]
    fn pinch_release_yields_a_single_click() {
        let clock = FakeClock::new();
        let mut arb = arbiter();
        let pinched = HandBuilder::new(Shape::Point).pinch(true).build();
        let point = HandBuilder::new(Shape::Point).build();

        let mut emitted = Vec::new();
        let mut t = 0;
        for frame in [&point, &pinched, &pinched, &point, &point] {
            emitted.extend(arb.step(frame, clock.at(t)).transition);
            t += 33;
        }
        assert_eq!(
            emitted,
            vec![Gesture::Point, Gesture::Pinch, Gesture::Click, Gesture::Point]
        );

        // a second release inside the cooldown does not click
        arb.step(&pinched, clock.at(200));
        let release = arb.step(&point, clock.at(233));
        assert_eq!(release.reading.gesture, Some(Gesture::Point));
    }

    #[test]
    fn swipe_on_release_frame_swallows_the_click() {
        let clock = FakeClock::new();
        let mut arb = arbiter();

        arb.step(&HandBuilder::new(Shape::Point).at(0.3, 0.7).pinch(true).build(), clock.at(0));
        let step = arb.step(&HandBuilder::new(Shape::Point).at(0.6, 0.7).build(), clock.at(33));

        assert_eq!(step.reading.gesture, Some(Gesture::Click));
        assert_eq!(step.transition, Some(Gesture::SwipeRight));
    }

    #[test]
    fn reset_forgets_previous_frame_and_gesture() {
        let clock = FakeClock::new();
        let mut arb = arbiter();
        arb.step(&HandBuilder::new(Shape::Palm).at(0.2, 0.5).build(), clock.at(0));

        arb.reset();
        assert_eq!(arb.current(), None);
        assert_eq!(arb.dwell_deadline(), None);

        // without a previous frame a big jump is not a swipe
        let step = arb.step(&HandBuilder::new(Shape::Palm).at(0.8, 0.5).build(), clock.at(10));
        assert_eq!(step.transition, Some(Gesture::Palm));
    }
}
