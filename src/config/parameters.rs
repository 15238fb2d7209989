//! Tunable geometry and kinematics for the transport engine.
//!
//! Distances are in model units (the membrane band is a few tens of units
//! thick); times are in seconds of simulation time.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level parameters container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportParameters {
    /// Membrane and compartment layout
    pub geometry: MembraneGeometry,
    /// Particle speeds and capture ranges
    pub kinematics: Kinematics,
    /// Number of star and triangle ligands placed by `add_ligands`
    pub ligands_per_type: usize,
    /// Seed for the model's random source
    pub seed: u64,
}

impl TransportParameters {
    /// Load parameters from a JSON file, or use defaults if it doesn't exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded transport parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse transport parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Transport parameters file not found, using defaults");
                Self::default()
            }
        }
    }

    /// X coordinate of the slot with the given index
    ///
    /// Slots are spaced evenly and centered on x = 0.
    pub fn slot_position(&self, index: usize) -> f64 {
        let center = (self.geometry.slot_count as f64 - 1.0) / 2.0;
        (index as f64 - center) * self.geometry.slot_spacing
    }
}

impl Default for TransportParameters {
    fn default() -> Self {
        Self {
            geometry: MembraneGeometry::default(),
            kinematics: Kinematics::default(),
            ligands_per_type: 10,
            seed: 0x5eed,
        }
    }
}

/// Membrane band and compartment boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembraneGeometry {
    /// Number of protein slots along the membrane
    pub slot_count: usize,
    /// Horizontal distance between neighbouring slots
    pub slot_spacing: f64,
    /// Thickness of the membrane band (centered on y = 0)
    pub membrane_thickness: f64,
    /// Half-width of both compartments (x runs from -w to +w)
    pub compartment_half_width: f64,
    /// Depth of each compartment measured from the membrane face
    pub compartment_depth: f64,
}

impl Default for MembraneGeometry {
    fn default() -> Self {
        Self {
            slot_count: 7,
            slot_spacing: 28.0,
            membrane_thickness: 20.0,
            compartment_half_width: 100.0,
            compartment_depth: 60.0,
        }
    }
}

/// Speeds, jitter and capture distances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Random-walk speed (units/s)
    pub random_walk_speed: f64,
    /// Species-independent speed for directional crossings (units/s)
    pub crossing_speed: f64,
    /// Speed used when steering to a channel, binding location or site (units/s)
    pub steering_speed: f64,
    /// Maximum lateral jitter speed during a crossing (units/s)
    pub lateral_jitter_speed: f64,
    /// Maximum lateral excursion from the channel axis while moving through
    pub max_lateral_offset: f64,
    /// Probability that a passively diffusing species crosses on contact
    pub passive_diffusion_probability: f64,
    /// Horizontal distance from a slot within which a particle can be captured
    pub channel_capture_half_width: f64,
    /// Distance from a ligand binding position within which ligands are captured
    pub ligand_capture_distance: f64,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            random_walk_speed: 12.0,
            crossing_speed: 15.0,
            steering_speed: 20.0,
            lateral_jitter_speed: 2.0,
            max_lateral_offset: 2.5,
            passive_diffusion_probability: 0.90,
            channel_capture_half_width: 9.0,
            ligand_capture_distance: 18.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_slot_layout_is_centered() {
        let params = TransportParameters::default();
        assert_eq!(params.geometry.slot_count, 7);
        assert_eq!(params.slot_position(3), 0.0);
        assert_eq!(params.slot_position(0), -params.slot_position(6));
        assert!((params.slot_position(1) - params.slot_position(0) - 28.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_passive_probability() {
        let params = Kinematics::default();
        assert!((params.passive_diffusion_probability - 0.90).abs() < 1e-12);
    }

    #[test]
    fn test_serialization() {
        let params = TransportParameters::default();
        let json = serde_json::to_string_pretty(&params).unwrap();
        let parsed: TransportParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let params = TransportParameters::load_or_default("does/not/exist.json");
        assert_eq!(params, TransportParameters::default());
    }
}
