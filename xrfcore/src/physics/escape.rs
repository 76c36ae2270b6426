use serde::{Deserialize, Serialize};

use crate::physics::transition::Transition;

/// Detector material for escape-peak modeling.
///
/// An escape peak appears when a detector-material fluorescence photon
/// carries energy out of the detector, shifting part of a line's signal
/// down by the material's own emission energy. The offsets carry the
/// fraction of parent-line intensity that escapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscapeType {
    #[default]
    None,
    Silicon,
    Germanium,
}

impl EscapeType {
    pub fn has_offset(&self) -> bool {
        !matches!(self, EscapeType::None)
    }

    /// The escape lines of the detector material: energy offset (keV) and
    /// escape fraction relative to the parent line.
    pub fn offsets(&self) -> Vec<Transition> {
        match self {
            EscapeType::None => Vec::new(),
            EscapeType::Silicon => vec![Transition::new(1.740, 0.01)],
            EscapeType::Germanium => vec![
                Transition::new(9.886, 0.028),
                Transition::new(10.982, 0.004),
            ],
        }
    }
}
