//! Stroke type committed to an annotation session
//!
//! Points are stored in image pixel coordinates.

use serde::{Deserialize, Serialize};

use crate::config::StrokeColor;

/// A single continuous pen mark
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Polyline through the touched points
    pub points: Vec<(f32, f32)>,
    /// Color of this stroke
    #[serde(default)]
    pub color: StrokeColor,
    /// Line width in image pixels
    #[serde(default = "default_stroke_width")]
    pub width: f32,
}

fn default_stroke_width() -> f32 {
    6.0
}

impl Stroke {
    pub fn new(points: Vec<(f32, f32)>, color: StrokeColor, width: f32) -> Self {
        Self {
            points,
            color,
            width,
        }
    }

    /// A stroke with nothing to draw
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() || !(self.width.is_finite() && self.width > 0.0)
    }
}
