//! Geometry module for the membrane band and the two compartments.
//!
//! The world is split by a horizontal membrane band centered on y = 0:
//! extracellular space above, cytoplasm below.

mod bounds;

pub use bounds::{Bounds2, CrossingDirection, MembraneLayout, Side};
