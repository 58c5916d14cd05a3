// src/landmarker.rs
//
// Boundary to the external hand-landmark model. The model itself is not part
// of this crate; anything that turns an RGB frame into per-hand landmark
// lists can be plugged in.
use anyhow::Result;
use image::RgbImage;

use crate::recording::LandmarkRecording;

/// Landmarks of one hand as the model reports them, normalized to [0,1].
pub type HandLandmarks = Vec<[f64; 3]>;

pub trait HandLandmarker: Send {
    /// All hands found in `image`, most confident first.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<HandLandmarks>>;
}

/// Loads a landmarker on first activation. Model loading is slow and may
/// fail; the source calls this at most once.
pub type LandmarkerFactory = Box<dyn FnOnce() -> Result<Box<dyn HandLandmarker>> + Send>;

/// Stand-in model that ignores the image and plays back a recording, one
/// frame per call. Returns no hands once the recording is exhausted.
#[derive(Debug, Clone)]
pub struct RecordedLandmarker {
    recording: LandmarkRecording,
    cursor: usize,
}

impl RecordedLandmarker {
    pub fn new(recording: LandmarkRecording) -> Self {
        Self {
            recording,
            cursor: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.recording.len().saturating_sub(self.cursor)
    }
}

impl HandLandmarker for RecordedLandmarker {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<HandLandmarks>> {
        let hands = match self.recording.frames().get(self.cursor) {
            Some(recorded) => recorded.frame.iter().map(|f| f.to_rows()).collect(),
            None => Vec::new(),
        };
        self.cursor += 1;
        Ok(hands)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::synthetic::{HandBuilder, Shape};

    #[test]
    fn plays_back_then_runs_dry() {
        let mut recording = LandmarkRecording::new();
        recording.push(Duration::ZERO, Some(HandBuilder::new(Shape::Fist).build()));
        recording.push(Duration::from_millis(33), None);

        let mut model = RecordedLandmarker::new(recording);
        let image = RgbImage::new(4, 4);

        let first = model.detect(&image).expect("detect");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].len(), 21);
        assert!(model.detect(&image).expect("detect").is_empty());
        assert_eq!(model.remaining(), 0);
        assert!(model.detect(&image).expect("detect").is_empty());
    }
}
