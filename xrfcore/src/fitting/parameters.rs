use serde::{Deserialize, Serialize};

use crate::fitting::calibration::EnergyCalibration;
use crate::fitting::functions::{FittingFunction, FittingFunctionShape, SIGMA_TO_FWHM};
use crate::physics::escape::EscapeType;
use crate::physics::transition::Transition;

// Mean energy to create one electron-hole pair in silicon, keV
const PAIR_ENERGY: f32 = 3.85e-3;

/// Everything needed to turn a transition series into a model curve: the
/// energy calibration, the detector resolution (FWHM) model, the line
/// shape, and the escape-peak model.
///
/// Shared read-only across all curves of an analysis session; cheap to
/// clone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittingParameters {
    pub calibration: EnergyCalibration,
    /// Electronic noise contribution to peak width, keV FWHM.
    pub electronic_noise: f32,
    /// Fano factor of the detector material.
    pub fano_factor: f32,
    pub shape: FittingFunctionShape,
    pub escape: EscapeType,
}

impl FittingParameters {
    const DEFAULT_NOISE: f32 = 0.12;
    const DEFAULT_FANO: f32 = 0.115;

    /// Constructs parameters with the default silicon-detector resolution
    /// model, Gaussian line shape and no escape peaks.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::fitting::calibration::EnergyCalibration;
    /// # use xrfcore::fitting::parameters::FittingParameters;
    /// # use xrfcore::physics::transition::Transition;
    /// let params = FittingParameters::new(EnergyCalibration::new(0.0, 20.48, 2048));
    /// let fwhm = params.get_fwhm(&Transition::new(6.404, 1.0));
    /// assert!(fwhm > 0.12 && fwhm < 0.25);
    /// ```
    pub fn new(calibration: EnergyCalibration) -> Self {
        FittingParameters {
            calibration,
            electronic_noise: Self::DEFAULT_NOISE,
            fano_factor: Self::DEFAULT_FANO,
            shape: FittingFunctionShape::default(),
            escape: EscapeType::default(),
        }
    }

    pub fn with_escape(mut self, escape: EscapeType) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_shape(mut self, shape: FittingFunctionShape) -> Self {
        self.shape = shape;
        self
    }

    /// Peak width (keV FWHM) at the transition's energy: electronic noise
    /// in quadrature with Fano-limited charge statistics.
    pub fn get_fwhm(&self, transition: &Transition) -> f32 {
        let statistical = (SIGMA_TO_FWHM * SIGMA_TO_FWHM) as f32
            * self.fano_factor
            * PAIR_ENERGY
            * transition.energy;
        (self.electronic_noise * self.electronic_noise + statistical.max(0.0)).sqrt()
    }

    /// Builds the fitting function modeling one transition.
    pub fn for_transition(&self, transition: &Transition) -> Box<dyn FittingFunction> {
        self.shape.build(
            transition.energy,
            self.get_fwhm(transition),
            transition.relative_intensity,
        )
    }

    /// Builds the fitting function modeling the escape artifact of a
    /// transition: shifted down by the escape line's energy, attenuated by
    /// its escape fraction.
    pub fn for_escape(
        &self,
        transition: &Transition,
        escape_line: &Transition,
    ) -> Box<dyn FittingFunction> {
        let shifted = Transition::new(
            transition.energy - escape_line.energy,
            transition.relative_intensity * escape_line.relative_intensity,
        );
        self.shape
            .build(shifted.energy, self.get_fwhm(&shifted), shifted.relative_intensity)
    }
}
