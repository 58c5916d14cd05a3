// src/gesture.rs
//! Gesture labels and the static-pose classifier.
//!
//! [`HandPose::measure`] is a pure read of one frame. [`PoseClassifier`] adds
//! the only temporal bit the classifier needs: a pinch latch so that a pinch
//! release becomes a `click`, rate-limited by a cooldown.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::landmarks::{
    planar_distance, LandmarkFrame, INDEX_MCP, INDEX_TIP, MIDDLE_MCP, MIDDLE_TIP, PINKY_MCP,
    PINKY_TIP, RING_MCP, RING_TIP,
};
use crate::timer::Throttle;

/// A semantic gesture. "No gesture" is `Option::<Gesture>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    Pinch,
    Click,
    Point,
    Fist,
    Palm,
    ThumbsUp,
}

impl Gesture {
    pub const ALL: [Gesture; 10] = [
        Gesture::SwipeLeft,
        Gesture::SwipeRight,
        Gesture::SwipeUp,
        Gesture::SwipeDown,
        Gesture::Pinch,
        Gesture::Click,
        Gesture::Point,
        Gesture::Fist,
        Gesture::Palm,
        Gesture::ThumbsUp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::SwipeUp => "swipe_up",
            Self::SwipeDown => "swipe_down",
            Self::Pinch => "pinch",
            Self::Click => "click",
            Self::Point => "point",
            Self::Fist => "fist",
            Self::Palm => "palm",
            Self::ThumbsUp => "thumbs_up",
        }
    }

    /// Short text for an on-screen gesture indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SwipeLeft => "Previous",
            Self::SwipeRight => "Next",
            Self::SwipeUp => "Scroll Up",
            Self::SwipeDown => "Scroll Down",
            Self::Pinch => "Pinch to Click",
            Self::Click => "Clicking!",
            Self::Point => "Point to Aim",
            Self::Fist => "Fist",
            Self::Palm => "Palm",
            Self::ThumbsUp => "Thumbs Up",
        }
    }

    pub fn is_swipe(&self) -> bool {
        matches!(
            self,
            Self::SwipeLeft | Self::SwipeRight | Self::SwipeUp | Self::SwipeDown
        )
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.as_str() == s)
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-finger extension and pinch measurement for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandPose {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
    pub pinch_distance: f64,
    pub pinching: bool,
}

impl HandPose {
    pub fn measure(frame: &LandmarkFrame, pinch_threshold: f64) -> Self {
        // y grows downward: a tip above its knuckle is extended
        let extended = |tip: usize, mcp: usize| frame.get(tip).y < frame.get(mcp).y;
        let pinch_distance = planar_distance(frame.thumb_tip(), frame.index_tip());

        Self {
            thumb: frame.thumb_tip().x < frame.wrist().x,
            index: extended(INDEX_TIP, INDEX_MCP),
            middle: extended(MIDDLE_TIP, MIDDLE_MCP),
            ring: extended(RING_TIP, RING_MCP),
            pinky: extended(PINKY_TIP, PINKY_MCP),
            pinch_distance,
            pinching: pinch_distance < pinch_threshold,
        }
    }

    /// Index, middle, ring and pinky all curled. Thumb not considered.
    pub fn fingers_retracted(&self) -> bool {
        !self.index && !self.middle && !self.ring && !self.pinky
    }

    pub fn fingers_extended(&self) -> bool {
        self.index && self.middle && self.ring && self.pinky
    }
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseReading {
    pub gesture: Option<Gesture>,
    pub pose: HandPose,
    /// `Some` only when the point test was actually evaluated this frame.
    pub pointing: Option<bool>,
}

impl PoseReading {
    pub fn pinching(&self) -> bool {
        self.pose.pinching
    }
}

#[derive(Debug, Clone)]
pub struct PoseClassifier {
    pinch_threshold: f64,
    was_pinching: bool,
    click_cooldown: Throttle,
}

impl PoseClassifier {
    pub fn new(pinch_threshold: f64, click_cooldown: Duration) -> Self {
        Self {
            pinch_threshold,
            was_pinching: false,
            click_cooldown: Throttle::new(click_cooldown),
        }
    }

    pub fn was_pinching(&self) -> bool {
        self.was_pinching
    }

    pub fn reset(&mut self) {
        self.was_pinching = false;
        self.click_cooldown.reset();
    }

    /// First match wins: click, pinch, thumbs_up, point, fist, palm.
    pub fn classify(&mut self, frame: &LandmarkFrame, now: Instant) -> PoseReading {
        let pose = HandPose::measure(frame, self.pinch_threshold);
        let reading = |gesture, pointing| PoseReading {
            gesture,
            pose,
            pointing,
        };

        if self.was_pinching && !pose.pinching && self.click_cooldown.try_acquire(now) {
            self.was_pinching = false;
            return reading(Some(Gesture::Click), None);
        }
        self.was_pinching = pose.pinching;

        if pose.pinching {
            return reading(Some(Gesture::Pinch), None);
        }

        if pose.thumb && pose.fingers_retracted() {
            return reading(Some(Gesture::ThumbsUp), None);
        }

        if pose.index && !pose.middle && !pose.ring && !pose.pinky {
            return reading(Some(Gesture::Point), Some(true));
        }

        if pose.fingers_retracted() {
            return reading(Some(Gesture::Fist), Some(false));
        }

        if pose.fingers_extended() {
            return reading(Some(Gesture::Palm), Some(false));
        }

        reading(None, Some(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{Finger, HandBuilder, Shape};

    const THRESHOLD: f64 = 0.08;

    fn classifier() -> PoseClassifier {
        PoseClassifier::new(THRESHOLD, Duration::from_millis(300))
    }

    #[test]
    fn point_when_only_index_extended() {
        let t0 = Instant::now();
        let frame = HandBuilder::new(Shape::Point).build();
        let pose = HandPose::measure(&frame, THRESHOLD);
        assert!(pose.pinch_distance >= THRESHOLD);

        let reading = classifier().classify(&frame, t0);
        assert_eq!(reading.gesture, Some(Gesture::Point));
        assert_eq!(reading.pointing, Some(true));
    }

    #[test]
    fn point_ignores_thumb() {
        let frame = HandBuilder::new(Shape::Point).thumb_out(true).build();
        let reading = classifier().classify(&frame, Instant::now());
        assert_eq!(reading.gesture, Some(Gesture::Point));
    }

    #[test]
    fn pinch_overrides_every_pose() {
        let t0 = Instant::now();
        for shape in [Shape::Palm, Shape::Fist, Shape::Point, Shape::ThumbsUp] {
            let frame = HandBuilder::new(shape).pinch(true).build();
            let reading = classifier().classify(&frame, t0);
            assert_eq!(reading.gesture, Some(Gesture::Pinch), "{shape:?}");
            assert!(reading.pinching());
            assert_eq!(reading.pointing, None);
        }
    }

    #[test]
    fn thumbs_up_before_fist() {
        let t0 = Instant::now();
        let thumbs = HandBuilder::new(Shape::Fist).thumb_out(true).build();
        assert_eq!(
            classifier().classify(&thumbs, t0).gesture,
            Some(Gesture::ThumbsUp)
        );

        let fist = HandBuilder::new(Shape::Fist).build();
        let reading = classifier().classify(&fist, t0);
        assert_eq!(reading.gesture, Some(Gesture::Fist));
        assert_eq!(reading.pointing, Some(false));
    }

    #[test]
    fn palm_when_all_four_fingers_extended() {
        let frame = HandBuilder::new(Shape::Palm).build();
        assert_eq!(
            classifier().classify(&frame, Instant::now()).gesture,
            Some(Gesture::Palm)
        );
    }

    #[test]
    fn mixed_fingers_classify_as_none() {
        // index + middle up, ring + pinky down ("peace sign")
        let frame = HandBuilder::new(Shape::Palm)
            .finger(Finger::Ring, false)
            .finger(Finger::Pinky, false)
            .build();
        let reading = classifier().classify(&frame, Instant::now());
        assert_eq!(reading.gesture, None);
        assert_eq!(reading.pointing, Some(false));
    }

    #[test]
    fn pinch_release_clicks_once_per_cooldown() {
        let t0 = Instant::now();
        let ms = |n| t0 + Duration::from_millis(n);
        let pinched = HandBuilder::new(Shape::Palm).pinch(true).build();
        let open = HandBuilder::new(Shape::Palm).build();
        let mut c = classifier();

        assert_eq!(c.classify(&pinched, ms(0)).gesture, Some(Gesture::Pinch));
        assert!(c.was_pinching());
        assert_eq!(c.classify(&open, ms(33)).gesture, Some(Gesture::Click));
        assert!(!c.was_pinching());

        // second release inside the cooldown window falls through to the pose
        assert_eq!(c.classify(&pinched, ms(100)).gesture, Some(Gesture::Pinch));
        assert_eq!(c.classify(&open, ms(200)).gesture, Some(Gesture::Palm));
        assert!(!c.was_pinching());

        // and a later release clicks again
        c.classify(&pinched, ms(400));
        assert_eq!(c.classify(&open, ms(433)).gesture, Some(Gesture::Click));
    }

    #[test]
    fn no_click_without_prior_pinch() {
        let open = HandBuilder::new(Shape::Palm).build();
        let mut c = classifier();
        assert_eq!(c.classify(&open, Instant::now()).gesture, Some(Gesture::Palm));
    }

    #[test]
    fn labels_round_trip_through_parse() {
        for g in Gesture::ALL {
            assert_eq!(Gesture::parse(g.as_str()), Some(g));
        }
        assert_eq!(Gesture::parse("spread"), None);
        assert_eq!(
            serde_json::to_string(&Gesture::ThumbsUp).expect("serialize"),
            "\"thumbs_up\""
        );
    }
}
