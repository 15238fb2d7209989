use serde::{Deserialize, Serialize};

use crate::proteins::TransportProtein;

/// Index of a slot along the membrane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub usize);

/// Fixed position in the membrane holding at most one protein
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    id: SlotId,
    position: f64,
    protein: Option<TransportProtein>,
}

impl Slot {
    pub fn new(id: SlotId, position: f64) -> Self {
        Self {
            id,
            position,
            protein: None,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    /// X coordinate of the slot
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn protein(&self) -> Option<&TransportProtein> {
        self.protein.as_ref()
    }

    pub fn protein_mut(&mut self) -> Option<&mut TransportProtein> {
        self.protein.as_mut()
    }

    pub fn is_filled(&self) -> bool {
        self.protein.is_some()
    }

    pub(crate) fn replace_protein(&mut self, protein: Option<TransportProtein>) -> Option<TransportProtein> {
        std::mem::replace(&mut self.protein, protein)
    }
}
