use rayon::prelude::*;

use crate::data::spectrum::Spectrum;
use crate::fitting::fitter::CurveFitter;
use crate::fitting::set::{FittingResult, FittingResultSet, FittingSet};

/// Solves a whole [`FittingSet`] against a spectrum.
pub trait FittingSolver {
    fn solve(
        &self,
        data: &Spectrum,
        fittings: &FittingSet,
        fitter: &dyn CurveFitter,
    ) -> FittingResultSet;
}

/// Fits every curve independently against the *original* input spectrum,
/// never against a shrinking residual; only the final residual aggregates
/// all fits. Individual scales therefore do not depend on the arbitrary
/// order of the set.
pub struct IndependentSolver;

impl FittingSolver for IndependentSolver {
    fn solve(
        &self,
        data: &Spectrum,
        fittings: &FittingSet,
        fitter: &dyn CurveFitter,
    ) -> FittingResultSet {
        let fits: Vec<FittingResult> = fittings
            .curves()
            .iter()
            .map(|curve| fitter.fit(data, curve))
            .collect();

        let mut residual = data.clone();
        for fit in &fits {
            residual.subtract_assign_spectrum(&fit.fit);
        }

        FittingResultSet { fits, residual }
    }
}

/// Per-pixel map support: solves every spectrum of a scan row (or a whole
/// flattened scan) independently, producing one row of per-series scales
/// per pixel. Pixels are data-parallel; scheduling and cancellation
/// policy stay with the caller.
pub fn solve_scales_batch(
    spectra: &[Spectrum],
    fittings: &FittingSet,
    fitter: &(dyn CurveFitter + Sync),
) -> Vec<Vec<f32>> {
    spectra
        .par_iter()
        .map(|data| {
            fittings
                .curves()
                .iter()
                .map(|curve| fitter.fit_scale(data, curve))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::calibration::EnergyCalibration;
    use crate::fitting::fitter::UnderCurveFitter;
    use crate::fitting::parameters::FittingParameters;
    use crate::physics::element::Element;
    use crate::physics::series::{SeriesMode, TransitionSeries};
    use crate::physics::transition::Transition;

    fn params() -> FittingParameters {
        FittingParameters::new(EnergyCalibration::new(0.0, 20.0, 2000))
    }

    fn series(symbol: &str, energy: f32) -> TransitionSeries {
        TransitionSeries::new(
            Element::from_symbol(symbol).unwrap(),
            SeriesMode::K,
            vec![Transition::new(energy, 1.0)],
        )
    }

    fn synthetic(set: &FittingSet, scales: &[f32]) -> Spectrum {
        let mut data = Spectrum::zeros(set.parameters().calibration.data_width());
        for (curve, &scale) in set.curves().iter().zip(scales) {
            data.add_assign_spectrum(&curve.scale(scale));
        }
        data
    }

    #[test]
    fn test_residual_is_data_minus_sum_of_fits() {
        let mut set = FittingSet::new(params());
        set.add_series(series("Fe", 6.404));
        set.add_series(series("Mo", 17.479));
        let data = synthetic(&set, &[300.0, 120.0]);

        let results = IndependentSolver.solve(&data, &set, &UnderCurveFitter);

        let mut expected = data.clone();
        for fit in &results.fits {
            expected.subtract_assign_spectrum(&fit.fit);
        }
        assert_eq!(results.residual, expected);
    }

    #[test]
    fn test_scales_are_order_independent() {
        let fe = series("Fe", 6.404);
        let co = series("Co", 6.930); // overlaps Fe; order must still not matter

        let mut forward = FittingSet::new(params());
        forward.add_series(fe.clone());
        forward.add_series(co.clone());

        let mut backward = FittingSet::new(params());
        backward.add_series(co.clone());
        backward.add_series(fe.clone());

        let data = synthetic(&forward, &[200.0, 80.0]);

        let fwd = IndependentSolver.solve(&data, &forward, &UnderCurveFitter);
        let bwd = IndependentSolver.solve(&data, &backward, &UnderCurveFitter);

        let mut fwd_scales: Vec<(String, f32)> = fwd
            .fits
            .iter()
            .map(|f| (f.series.identifier(), f.scale))
            .collect();
        let mut bwd_scales: Vec<(String, f32)> = bwd
            .fits
            .iter()
            .map(|f| (f.series.identifier(), f.scale))
            .collect();
        fwd_scales.sort_by(|a, b| a.0.cmp(&b.0));
        bwd_scales.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(fwd_scales, bwd_scales);
        for (a, b) in fwd.residual.iter().zip(bwd.residual.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_empty_set_solves_to_identity_residual() {
        let set = FittingSet::new(params());
        let data = Spectrum::new(vec![3.0; 2000]);
        let results = IndependentSolver.solve(&data, &set, &UnderCurveFitter);
        assert!(results.fits.is_empty());
        assert_eq!(results.residual, data);
    }

    #[test]
    fn test_batch_solving_matches_single_pixel_solves() {
        let mut set = FittingSet::new(params());
        set.add_series(series("Fe", 6.404));
        set.add_series(series("Cu", 8.048));

        let pixels = vec![
            synthetic(&set, &[10.0, 0.0]),
            synthetic(&set, &[0.0, 25.0]),
            Spectrum::zeros(2000),
        ];

        let rows = solve_scales_batch(&pixels, &set, &UnderCurveFitter);
        assert_eq!(rows.len(), 3);

        for (pixel, row) in pixels.iter().zip(&rows) {
            let single = IndependentSolver.solve(pixel, &set, &UnderCurveFitter);
            let scales: Vec<f32> = single.fits.iter().map(|f| f.scale).collect();
            assert_eq!(*row, scales);
        }

        // all-zero pixel fits everything at zero
        assert!(rows[2].iter().all(|&s| s == 0.0));
    }
}
