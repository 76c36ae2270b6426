use std::fmt;
use std::fmt::{Display, Formatter};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Represents a dense detector spectrum: one intensity value per channel.
///
/// Channel index 0..N-1 maps to energy through an
/// [`EnergyCalibration`](crate::fitting::calibration::EnergyCalibration).
/// Arithmetic is elementwise and allocates a new spectrum; the `_assign`
/// and `_into` variants write into existing buffers for hot loops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Spectrum {
    pub intensities: Vec<f32>,
}

impl Spectrum {
    /// Constructs a new `Spectrum` from a vector of channel intensities.
    ///
    /// # Arguments
    ///
    /// * `intensities` - A vector of intensity values, one per channel.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::data::spectrum::Spectrum;
    /// let spectrum = Spectrum::new(vec![10.0, 20.0, 5.0]);
    /// assert_eq!(spectrum.len(), 3);
    /// assert_eq!(spectrum.max(), 20.0);
    /// ```
    pub fn new(intensities: Vec<f32>) -> Self {
        Spectrum { intensities }
    }

    /// Constructs an all-zero `Spectrum` with the given number of channels.
    pub fn zeros(size: usize) -> Self {
        Spectrum { intensities: vec![0.0; size] }
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    #[inline]
    pub fn get(&self, channel: usize) -> f32 {
        self.intensities[channel]
    }

    #[inline]
    pub fn set(&mut self, channel: usize, value: f32) {
        self.intensities[channel] = value;
    }

    /// Sum over all channels.
    pub fn sum(&self) -> f32 {
        self.intensities.iter().sum()
    }

    /// Maximum channel intensity, 0.0 for an empty spectrum.
    pub fn max(&self) -> f32 {
        if self.intensities.is_empty() {
            return 0.0;
        }
        self.intensities.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Elementwise division by a scalar, allocating a new spectrum.
    ///
    /// Callers must special-case a zero divisor themselves; normalization
    /// code paths check the maximum before dividing.
    pub fn divide_by(&self, divisor: f32) -> Spectrum {
        Spectrum::new(self.intensities.iter().map(|v| v / divisor).collect())
    }

    /// Writes `self * factor` into `target` without allocating.
    ///
    /// # Panics
    ///
    /// Panics if `target` has a different channel count.
    pub fn scale_by_into(&self, factor: f32, target: &mut Spectrum) {
        assert_eq!(self.len(), target.len(), "channel counts must match");
        for (t, v) in target.intensities.iter_mut().zip(self.intensities.iter()) {
            *t = v * factor;
        }
    }

    /// Adds `other` into `self` elementwise without allocating.
    ///
    /// # Panics
    ///
    /// Panics if the channel counts differ.
    pub fn add_assign_spectrum(&mut self, other: &Spectrum) {
        assert_eq!(self.len(), other.len(), "channel counts must match");
        for (a, b) in self.intensities.iter_mut().zip(other.intensities.iter()) {
            *a += b;
        }
    }

    /// Subtracts `other` from `self` elementwise without allocating.
    ///
    /// # Panics
    ///
    /// Panics if the channel counts differ.
    pub fn subtract_assign_spectrum(&mut self, other: &Spectrum) {
        assert_eq!(self.len(), other.len(), "channel counts must match");
        for (a, b) in self.intensities.iter_mut().zip(other.intensities.iter()) {
            *a -= b;
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.intensities.iter()
    }
}

impl Display for Spectrum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Spectrum(channels: {}, max: {})", self.len(), self.max())
    }
}

impl std::ops::Add for &Spectrum {
    type Output = Spectrum;
    /// Combines two spectra by summing intensities channel by channel.
    ///
    /// # Example
    /// ```
    /// # use xrfcore::data::spectrum::Spectrum;
    /// let a = Spectrum::new(vec![1.0, 2.0]);
    /// let b = Spectrum::new(vec![3.0, 4.0]);
    /// assert_eq!((&a + &b).intensities, vec![4.0, 6.0]);
    /// ```
    fn add(self, other: &Spectrum) -> Spectrum {
        assert_eq!(self.len(), other.len(), "channel counts must match");
        Spectrum::new(
            self.intensities
                .iter()
                .zip(other.intensities.iter())
                .map(|(a, b)| a + b)
                .collect(),
        )
    }
}

impl std::ops::Sub for &Spectrum {
    type Output = Spectrum;
    fn sub(self, other: &Spectrum) -> Spectrum {
        assert_eq!(self.len(), other.len(), "channel counts must match");
        Spectrum::new(
            self.intensities
                .iter()
                .zip(other.intensities.iter())
                .map(|(a, b)| a - b)
                .collect(),
        )
    }
}

impl std::ops::Mul<f32> for &Spectrum {
    type Output = Spectrum;
    fn mul(self, scale: f32) -> Spectrum {
        Spectrum::new(self.intensities.iter().map(|v| v * scale).collect())
    }
}
