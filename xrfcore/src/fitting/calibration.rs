use serde::{Deserialize, Serialize};

use crate::data::range::Range;

/// Bidirectional mapping between detector channel index and energy (keV).
///
/// Channel queries are clamped to `[0, data_width - 1]`; energy queries
/// are linear extrapolations and never clamped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnergyCalibration {
    min_energy: f32,
    max_energy: f32,
    data_width: usize,
}

impl EnergyCalibration {
    /// Constructs a new `EnergyCalibration`.
    ///
    /// # Panics
    ///
    /// Panics if `data_width` is zero or the energy window is inverted;
    /// a calibration over no channels cannot support any downstream
    /// computation.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::fitting::calibration::EnergyCalibration;
    /// let cal = EnergyCalibration::new(0.0, 20.0, 2000);
    /// assert_eq!(cal.channel_from_energy(6.404), 640);
    /// assert_eq!(cal.channel_from_energy(25.0), 1999);
    /// ```
    pub fn new(min_energy: f32, max_energy: f32, data_width: usize) -> Self {
        assert!(data_width > 0, "data width cannot be 0");
        assert!(
            max_energy > min_energy,
            "max energy ({}) must exceed min energy ({})",
            max_energy,
            min_energy
        );
        EnergyCalibration { min_energy, max_energy, data_width }
    }

    pub fn min_energy(&self) -> f32 {
        self.min_energy
    }

    pub fn max_energy(&self) -> f32 {
        self.max_energy
    }

    pub fn data_width(&self) -> usize {
        self.data_width
    }

    pub fn energy_per_channel(&self) -> f32 {
        (self.max_energy - self.min_energy) / self.data_width as f32
    }

    /// Energy at the given channel index.
    pub fn energy_from_channel(&self, channel: usize) -> f32 {
        self.min_energy + channel as f32 * self.energy_per_channel()
    }

    /// Channel index for the given energy, clamped to `[0, data_width - 1]`.
    pub fn channel_from_energy(&self, energy: f32) -> usize {
        let raw = ((energy - self.min_energy) / self.energy_per_channel()).round();
        let max_channel = (self.data_width - 1) as f32;
        raw.clamp(0.0, max_channel) as usize
    }

    /// The clamped channel interval covering `[low_energy, high_energy]`.
    pub fn channel_range_from_energy_range(&self, low_energy: f32, high_energy: f32) -> Range {
        Range::new(
            self.channel_from_energy(low_energy) as i32,
            self.channel_from_energy(high_energy) as i32,
        )
    }
}
