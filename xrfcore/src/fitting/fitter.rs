use crate::data::spectrum::Spectrum;
use crate::fitting::curve::Curve;
use crate::fitting::set::FittingResult;

/// Computes the single scalar scale that best fits a [`Curve`] against
/// measured data.
pub trait CurveFitter {
    /// The best-fit scale for `curve` against `data`. 0.0 is a valid
    /// outcome meaning "this series doesn't fit here".
    fn fit_scale(&self, data: &Spectrum, curve: &Curve) -> f32;

    /// Fits `curve` against `data`, producing the scaled curve.
    fn fit(&self, data: &Spectrum, curve: &Curve) -> FittingResult {
        let scale = self.fit_scale(data, curve);
        FittingResult::new(curve.series().clone(), curve.scale(scale), scale)
    }
}

/// Ratio-under-curve fitter: scales the curve by the smallest observed
/// data/model ratio over the curve's significant channels, so the scaled
/// curve never exceeds the data at any considered channel.
///
/// Single pass, no matrix solve; one pathological channel can only
/// shrink the fit, never inflate it. Runs once per series per pixel when
/// generating elemental maps.
pub struct UnderCurveFitter;

impl UnderCurveFitter {
    fn ratio_under_data(&self, data: &Spectrum, curve: &Curve) -> f32 {
        // seeded with the smallest positive value, not the most negative;
        // an all-negative window therefore keeps a positive-tiny top and
        // takes the cutoff path for positive tops
        let mut top_intensity = f32::MIN_POSITIVE;
        let mut data_considered = false;

        for channel in curve.intense_ranges().iter_channels() {
            if channel < 0 || channel as usize >= data.len() {
                continue;
            }
            let intensity = data.get(channel as usize);
            if intensity > top_intensity {
                top_intensity = intensity;
            }
            data_considered = true;
        }
        if !data_considered {
            return 0.0;
        }

        // cut-off below which model channels are too weak to trust for
        // ratio estimation, expressed relative to the strongest signal
        let cutoff = if top_intensity > 0.0 {
            (top_intensity * 2.0).ln() / top_intensity
        } else {
            0.0
        };

        let mut smallest_factor = f32::MAX;
        let mut ratios_considered = false;

        for channel in curve.intense_ranges().iter_channels() {
            if channel < 0 || channel as usize >= data.len() {
                continue;
            }
            let model = curve.get().get(channel as usize);
            if model >= cutoff {
                let factor = data.get(channel as usize) / model;
                if factor < smallest_factor && !factor.is_nan() {
                    smallest_factor = factor;
                    ratios_considered = true;
                }
            }
        }

        if !ratios_considered {
            return 0.0;
        }
        smallest_factor
    }
}

impl CurveFitter for UnderCurveFitter {
    fn fit_scale(&self, data: &Spectrum, curve: &Curve) -> f32 {
        self.ratio_under_data(data, curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::calibration::EnergyCalibration;
    use crate::fitting::parameters::FittingParameters;
    use crate::physics::element::Element;
    use crate::physics::series::{SeriesMode, TransitionSeries};
    use crate::physics::transition::Transition;

    fn params() -> FittingParameters {
        FittingParameters::new(EnergyCalibration::new(0.0, 20.0, 2000))
    }

    fn fe_curve() -> Curve {
        Curve::new(
            TransitionSeries::new(
                Element::from_symbol("Fe").unwrap(),
                SeriesMode::K,
                vec![Transition::new(6.404, 1.0), Transition::new(7.058, 0.17)],
            ),
            &params(),
        )
    }

    #[test]
    fn test_recovers_scale_of_synthetic_data() {
        let curve = fe_curve();
        let data = curve.scale(250.0);

        let scale = UnderCurveFitter.fit_scale(&data, &curve);
        assert!((scale - 250.0).abs() < 1.0, "scale was {}", scale);
    }

    #[test]
    fn test_scaled_fit_never_exceeds_data() {
        let curve = fe_curve();
        // data: the model plus a dip at the peak channel, forcing the
        // conservative estimate down
        let mut data = curve.scale(100.0);
        let peak_channel = params().calibration.channel_from_energy(6.404);
        data.set(peak_channel, 40.0);

        let result = UnderCurveFitter.fit(&data, &curve);
        for channel in curve.intense_ranges().iter_channels() {
            let ch = channel as usize;
            assert!(
                result.fit.get(ch) <= data.get(ch) + 1e-3,
                "overshoot at channel {}",
                ch
            );
        }
    }

    #[test]
    fn test_zero_data_fits_at_zero() {
        let curve = fe_curve();
        let data = Spectrum::zeros(2000);
        assert_eq!(UnderCurveFitter.fit_scale(&data, &curve), 0.0);
    }

    #[test]
    fn test_out_of_bounds_ranges_fit_at_zero() {
        let curve = fe_curve();
        // data much shorter than the curve's significant channels
        let data = Spectrum::zeros(10);
        assert_eq!(UnderCurveFitter.fit_scale(&data, &curve), 0.0);
    }

    #[test]
    fn test_degenerate_curve_fits_at_zero() {
        let empty = TransitionSeries::new(
            Element::from_symbol("Fe").unwrap(),
            SeriesMode::K,
            Vec::new(),
        );
        let curve = Curve::new(empty, &params());
        let data = Spectrum::new(vec![5.0; 2000]);
        // no intense ranges at all: nothing to consider
        assert_eq!(UnderCurveFitter.fit_scale(&data, &curve), 0.0);
    }
}
