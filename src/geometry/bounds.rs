//! Axis-aligned rectangles and the fixed membrane layout.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::MembraneGeometry;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds2 {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: DVec2::new(min_x, min_y),
            max: DVec2::new(max_x, max_y),
        }
    }

    /// Rectangle of the given size centered on `center`
    pub fn from_center(center: DVec2, size: DVec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap test (touching edges do not count)
    pub fn intersects(&self, other: &Bounds2) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Shrink every edge inward by `amount` (per axis)
    pub fn eroded(&self, amount: DVec2) -> Self {
        Self {
            min: self.min + amount,
            max: self.max - amount,
        }
    }
}

/// Half-plane relative to the membrane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Extracellular space, y > 0
    Outside,
    /// Cytoplasm, y < 0
    Inside,
}

impl Side {
    /// Side of the membrane a y coordinate lies on
    ///
    /// The center line itself counts as outside so that every coordinate has
    /// exactly one side.
    pub fn of_y(y: f64) -> Self {
        if y >= 0.0 {
            Side::Outside
        } else {
            Side::Inside
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Outside => Side::Inside,
            Side::Inside => Side::Outside,
        }
    }

    /// +1 for outside, -1 for inside
    pub fn sign(self) -> f64 {
        match self {
            Side::Outside => 1.0,
            Side::Inside => -1.0,
        }
    }
}

/// Direction of travel across the membrane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossingDirection {
    /// Toward negative y (into the cell)
    Inward,
    /// Toward positive y (out of the cell)
    Outward,
}

impl CrossingDirection {
    /// Direction that carries a particle away from `side`
    pub fn leaving(side: Side) -> Self {
        match side {
            Side::Outside => CrossingDirection::Inward,
            Side::Inside => CrossingDirection::Outward,
        }
    }

    /// Sign of the y velocity
    pub fn sign(self) -> f64 {
        match self {
            CrossingDirection::Inward => -1.0,
            CrossingDirection::Outward => 1.0,
        }
    }

    /// Side the particle ends up on
    pub fn destination(self) -> Side {
        match self {
            CrossingDirection::Inward => Side::Inside,
            CrossingDirection::Outward => Side::Outside,
        }
    }

    /// Side the particle starts from
    pub fn origin(self) -> Side {
        self.destination().opposite()
    }
}

/// Fixed geometry shared by every mode: membrane band plus both compartments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MembraneLayout {
    /// The membrane band, |y| <= thickness / 2
    pub band: Bounds2,
    /// Extracellular compartment, above the band
    pub outside: Bounds2,
    /// Cytoplasm, below the band
    pub inside: Bounds2,
}

impl MembraneLayout {
    pub fn new(geometry: &MembraneGeometry) -> Self {
        let half = geometry.membrane_thickness / 2.0;
        let w = geometry.compartment_half_width;
        let depth = geometry.compartment_depth;
        Self {
            band: Bounds2::new(-w, -half, w, half),
            outside: Bounds2::new(-w, half, w, half + depth),
            inside: Bounds2::new(-w, -half - depth, w, -half),
        }
    }

    pub fn half_thickness(&self) -> f64 {
        self.band.max.y
    }

    pub fn compartment(&self, side: Side) -> &Bounds2 {
        match side {
            Side::Outside => &self.outside,
            Side::Inside => &self.inside,
        }
    }
}
