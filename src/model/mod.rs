//! The simulation model.
//!
//! Owns the fixed row of slots, the live particles and the membrane
//! potential, and drives one tick per `step(dt)`.

mod events;
mod reservations;
mod simulation;
mod slot;
mod snapshot;

pub use events::TransportEvent;
pub use reservations::{BindingSite, SiteReservations};
pub use simulation::MembraneTransportModel;
pub use slot::{Slot, SlotId};
pub use snapshot::Snapshot;
