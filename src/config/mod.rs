//! Configuration module for loading simulation parameters.
//!
//! Geometry and kinematics are tunable; protein timing constants live next
//! to the protein state machines that use them.

mod parameters;

pub use parameters::{Kinematics, MembraneGeometry, TransportParameters};
