// src/landmarks.rs
use nalgebra::{Vector2, Vector3};

// Hand landmark indices (MediaPipe hand model)
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

pub const LANDMARK_COUNT: usize = 21;

/// A single tracked point in normalized camera space. `y` grows downward.
pub type Landmark = Vector3<f64>;

/// The 21 landmarks of one detected hand at one instant.
///
/// Only constructible from exactly 21 finite points, so code holding a
/// `LandmarkFrame` never has to bounds-check an anatomical index.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    /// Returns `None` for partial, oversized or non-finite input; callers treat
    /// that the same as "no hand visible".
    pub fn from_points(points: &[[f64; 3]]) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            return None;
        }
        if points.iter().flatten().any(|v| !v.is_finite()) {
            return None;
        }

        let mut out = [Vector3::zeros(); LANDMARK_COUNT];
        for (slot, p) in out.iter_mut().zip(points) {
            *slot = Vector3::new(p[0], p[1], p[2]);
        }
        Some(Self { points: out })
    }

    /// For builders that only ever produce finite coordinates.
    pub(crate) fn trusted(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn wrist(&self) -> &Landmark {
        &self.points[WRIST]
    }

    pub fn thumb_tip(&self) -> &Landmark {
        &self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> &Landmark {
        &self.points[INDEX_TIP]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn to_rows(&self) -> Vec<[f64; 3]> {
        self.points.iter().map(|p| [p.x, p.y, p.z]).collect()
    }
}

/// Distance in the image plane; depth is ignored.
pub fn planar_distance(a: &Landmark, b: &Landmark) -> f64 {
    (Vector2::new(a.x, a.y) - Vector2::new(b.x, b.y)).norm()
}
