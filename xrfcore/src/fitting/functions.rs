use serde::{Deserialize, Serialize};
use statrs::distribution::{Cauchy, Continuous, Normal};

/// FWHM of a unit Gaussian in units of sigma, 2 * sqrt(2 * ln 2).
pub const SIGMA_TO_FWHM: f64 = 2.354_820_045_030_949;

/// A continuous model of a single emission line: maps an energy (keV) to
/// the line's contribution at that energy.
pub trait FittingFunction {
    fn for_energy(&self, energy: f32) -> f32;
}

/// Gaussian line shape.
pub struct GaussianFunction {
    dist: Normal,
    relative_intensity: f64,
}

impl GaussianFunction {
    pub fn new(mean: f32, fwhm: f32, relative_intensity: f32) -> Self {
        let sigma = (fwhm as f64 / SIGMA_TO_FWHM).max(f64::MIN_POSITIVE);
        GaussianFunction {
            dist: Normal::new(mean as f64, sigma).unwrap(),
            relative_intensity: relative_intensity as f64,
        }
    }
}

impl FittingFunction for GaussianFunction {
    fn for_energy(&self, energy: f32) -> f32 {
        (self.relative_intensity * self.dist.pdf(energy as f64)) as f32
    }
}

/// Lorentzian (Cauchy) line shape; heavier tails than the Gaussian.
pub struct LorentzianFunction {
    dist: Cauchy,
    relative_intensity: f64,
}

impl LorentzianFunction {
    pub fn new(mean: f32, fwhm: f32, relative_intensity: f32) -> Self {
        // Cauchy scale parameter is the half width at half maximum
        let scale = (fwhm as f64 / 2.0).max(f64::MIN_POSITIVE);
        LorentzianFunction {
            dist: Cauchy::new(mean as f64, scale).unwrap(),
            relative_intensity: relative_intensity as f64,
        }
    }
}

impl FittingFunction for LorentzianFunction {
    fn for_energy(&self, energy: f32) -> f32 {
        (self.relative_intensity * self.dist.pdf(energy as f64)) as f32
    }
}

/// Linear blend of Gaussian and Lorentzian shapes of the same width.
pub struct PseudoVoigtFunction {
    gaussian: GaussianFunction,
    lorentzian: LorentzianFunction,
    mixing: f32,
}

impl PseudoVoigtFunction {
    // Lorentzian fraction of the blend
    const MIXING: f32 = 0.3;

    pub fn new(mean: f32, fwhm: f32, relative_intensity: f32) -> Self {
        PseudoVoigtFunction {
            gaussian: GaussianFunction::new(mean, fwhm, relative_intensity),
            lorentzian: LorentzianFunction::new(mean, fwhm, relative_intensity),
            mixing: Self::MIXING,
        }
    }
}

impl FittingFunction for PseudoVoigtFunction {
    fn for_energy(&self, energy: f32) -> f32 {
        self.mixing * self.lorentzian.for_energy(energy)
            + (1.0 - self.mixing) * self.gaussian.for_energy(energy)
    }
}

/// Selects the line-shape model used when building per-transition fitting
/// functions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FittingFunctionShape {
    #[default]
    Gaussian,
    Lorentzian,
    PseudoVoigt,
}

impl FittingFunctionShape {
    pub fn build(&self, mean: f32, fwhm: f32, relative_intensity: f32) -> Box<dyn FittingFunction> {
        match self {
            FittingFunctionShape::Gaussian => {
                Box::new(GaussianFunction::new(mean, fwhm, relative_intensity))
            }
            FittingFunctionShape::Lorentzian => {
                Box::new(LorentzianFunction::new(mean, fwhm, relative_intensity))
            }
            FittingFunctionShape::PseudoVoigt => {
                Box::new(PseudoVoigtFunction::new(mean, fwhm, relative_intensity))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_peaks_at_mean() {
        let f = GaussianFunction::new(6.4, 0.15, 1.0);
        let at_mean = f.for_energy(6.4);
        assert!(at_mean > f.for_energy(6.3));
        assert!(at_mean > f.for_energy(6.5));
        // symmetric
        assert!((f.for_energy(6.3) - f.for_energy(6.5)).abs() < 1e-5);
    }

    #[test]
    fn test_half_maximum_at_half_width() {
        let fwhm = 0.2_f32;
        for shape in [FittingFunctionShape::Gaussian, FittingFunctionShape::Lorentzian] {
            let f = shape.build(5.0, fwhm, 1.0);
            let peak = f.for_energy(5.0);
            let at_hwhm = f.for_energy(5.0 + fwhm / 2.0);
            assert!(
                (at_hwhm / peak - 0.5).abs() < 1e-3,
                "{:?}: {} vs {}",
                shape,
                at_hwhm,
                peak
            );
        }
    }

    #[test]
    fn test_intensity_scales_linearly() {
        let strong = GaussianFunction::new(6.4, 0.15, 1.0);
        let weak = GaussianFunction::new(6.4, 0.15, 0.5);
        assert!((weak.for_energy(6.4) / strong.for_energy(6.4) - 0.5).abs() < 1e-5);
    }
}
