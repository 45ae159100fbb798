//! Display orientation and geometry

/// Orientation a surface must be shown in to render an image correctly
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Orientation implied by a width/height pair (square counts as portrait)
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Current size of the display hosting the screen, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
}

impl DisplayGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_dimensions(self.width, self.height)
    }

    /// Same display turned to `orientation`
    pub fn rotated_to(self, orientation: Orientation) -> Self {
        if self.orientation() == orientation {
            self
        } else {
            Self {
                width: self.height,
                height: self.width,
            }
        }
    }
}
