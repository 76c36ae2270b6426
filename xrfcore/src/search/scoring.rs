use crate::data::spectrum::Spectrum;
use crate::fitting::calibration::EnergyCalibration;
use crate::fitting::curve::Curve;
use crate::fitting::fitter::{CurveFitter, UnderCurveFitter};
use crate::fitting::parameters::FittingParameters;
use crate::physics::series::TransitionSeries;

/// Scores a candidate series against some fixed context; higher is
/// better. Implementations are pure functions of (candidate, context):
/// one scorer instance is reused across every candidate for a channel,
/// so no shared state may be mutated.
pub trait FittingScorer: Send + Sync {
    fn score(&self, candidate: &TransitionSeries) -> f32;
}

/// How close the candidate's nearest line sits to the target energy, with
/// a Lorentzian falloff in units of that line's FWHM. 1.0 on the line,
/// 0.5 one FWHM away.
pub struct EnergyProximityScorer {
    energy: f32,
    parameters: FittingParameters,
}

impl EnergyProximityScorer {
    pub fn new(energy: f32, parameters: FittingParameters) -> Self {
        EnergyProximityScorer { energy, parameters }
    }
}

impl FittingScorer for EnergyProximityScorer {
    fn score(&self, candidate: &TransitionSeries) -> f32 {
        let Some(closest) = candidate.closest_transition(self.energy) else {
            return 0.0;
        };
        let fwhm = self.parameters.get_fwhm(closest);
        let distance = (closest.energy - self.energy).abs() / fwhm;
        1.0 / (1.0 + distance * distance)
    }
}

/// How much of the local signal the candidate explains: fits the
/// candidate's curve against the residual and scores the explained
/// fraction of (positive) signal under the curve's significant ranges.
pub struct FastFittingScorer {
    residual: Spectrum,
    parameters: FittingParameters,
}

impl FastFittingScorer {
    pub fn new(residual: Spectrum, parameters: FittingParameters) -> Self {
        FastFittingScorer { residual, parameters }
    }
}

impl FittingScorer for FastFittingScorer {
    fn score(&self, candidate: &TransitionSeries) -> f32 {
        let curve = Curve::new(candidate.clone(), &self.parameters);
        let scale = UnderCurveFitter.fit_scale(&self.residual, &curve);
        if scale <= 0.0 {
            return 0.0;
        }

        let mut observed = 0.0f32;
        let mut explained = 0.0f32;
        for channel in curve.intense_ranges().iter_channels() {
            if channel < 0 || channel as usize >= self.residual.len() {
                continue;
            }
            let ch = channel as usize;
            observed += self.residual.get(ch).max(0.0);
            explained += curve.get().get(ch) * scale;
        }

        if observed <= 0.0 {
            return 0.0;
        }
        (explained / observed).clamp(0.0, 1.0)
    }
}

/// Flat penalty against summation hypotheses: a plain series scores 1.0,
/// a composite 0.0, so pileup only wins when the other scorers favor it
/// decisively over every simple explanation.
pub struct NoComplexPileupScorer;

impl FittingScorer for NoComplexPileupScorer {
    fn score(&self, candidate: &TransitionSeries) -> f32 {
        if candidate.is_composite() { 0.0 } else { 1.0 }
    }
}

/// Plausibility of a pileup hypothesis against the real data: a pileup
/// peak cannot out-shine the parents that produce it. Scores the ratio of
/// the weakest parent amplitude to the would-be pileup amplitude, capped
/// at 1.0; plain series always score 1.0.
pub struct ProportionalPileupScorer {
    data: Spectrum,
    calibration: EnergyCalibration,
}

impl ProportionalPileupScorer {
    pub fn new(data: Spectrum, calibration: EnergyCalibration) -> Self {
        ProportionalPileupScorer { data, calibration }
    }

    fn amplitude_at_strongest_line(&self, series: &TransitionSeries) -> Option<f32> {
        let strongest = series.strongest_transition()?;
        let channel = self.calibration.channel_from_energy(strongest.energy);
        if channel >= self.data.len() {
            return None;
        }
        Some(self.data.get(channel))
    }
}

impl FittingScorer for ProportionalPileupScorer {
    fn score(&self, candidate: &TransitionSeries) -> f32 {
        if !candidate.is_composite() {
            return 1.0;
        }

        let Some(pileup) = self.amplitude_at_strongest_line(candidate) else {
            return 0.0;
        };
        let weakest_parent = candidate
            .components()
            .iter()
            .filter_map(|c| self.amplitude_at_strongest_line(c))
            .fold(f32::MAX, f32::min);
        if weakest_parent == f32::MAX || weakest_parent <= 0.0 {
            return 0.0;
        }

        if pileup <= weakest_parent {
            1.0
        } else {
            (weakest_parent / pileup).clamp(0.0, 1.0)
        }
    }
}

/// Weighted sum of component scorers. The compound score keeps "higher is
/// better"; ranking callers sort ascending on the negated value.
#[derive(Default)]
pub struct CompoundFittingScorer {
    scorers: Vec<(f32, Box<dyn FittingScorer>)>,
}

impl CompoundFittingScorer {
    pub fn new() -> Self {
        CompoundFittingScorer { scorers: Vec::new() }
    }

    pub fn add(&mut self, weight: f32, scorer: Box<dyn FittingScorer>) {
        self.scorers.push((weight, scorer));
    }
}

impl FittingScorer for CompoundFittingScorer {
    fn score(&self, candidate: &TransitionSeries) -> f32 {
        self.scorers
            .iter()
            .map(|(weight, scorer)| weight * scorer.score(candidate))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::element::Element;
    use crate::physics::series::SeriesMode;
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

    #[test]
    fn test_proximity_prefers_closer_series() {
        let scorer = EnergyProximityScorer::new(6.404, params());
        let fe = series("Fe", 6.404);
        let cu = series("Cu", 8.048);

        assert_eq!(scorer.score(&fe), 1.0);
        assert!(scorer.score(&fe) > scorer.score(&cu));

        let empty = TransitionSeries::new(
            Element::from_symbol("Fe").unwrap(),
            SeriesMode::K,
            Vec::new(),
        );
        assert_eq!(scorer.score(&empty), 0.0);
    }

    #[test]
    fn test_fast_fitting_prefers_matching_series() {
        let p = params();
        let fe = series("Fe", 6.404);
        let data = Curve::new(fe.clone(), &p).scale(500.0);

        let scorer = FastFittingScorer::new(data, p);
        let fe_score = scorer.score(&fe);
        let mo_score = scorer.score(&series("Mo", 17.479));

        assert!(fe_score > 0.5, "fe_score {}", fe_score);
        assert!(fe_score > mo_score);
    }

    #[test]
    fn test_fast_fitting_scores_zero_on_empty_data() {
        let scorer = FastFittingScorer::new(Spectrum::zeros(2000), params());
        assert_eq!(scorer.score(&series("Fe", 6.404)), 0.0);
    }

    #[test]
    fn test_pileup_penalties() {
        let fe = series("Fe", 6.404);
        let pileup = fe.summation(&fe);

        assert_eq!(NoComplexPileupScorer.score(&fe), 1.0);
        assert_eq!(NoComplexPileupScorer.score(&pileup), 0.0);
    }

    #[test]
    fn test_proportional_pileup_rejects_implausible_summation() {
        let p = params();
        let fe = series("Fe", 6.404);
        let pileup = fe.summation(&fe);

        // pileup line towers over its parent: implausible
        let mut data = Spectrum::zeros(2000);
        data.set(p.calibration.channel_from_energy(6.404), 10.0);
        data.set(p.calibration.channel_from_energy(12.808), 100.0);
        let scorer = ProportionalPileupScorer::new(data, p.calibration);
        assert!(scorer.score(&pileup) <= 0.1);
        assert_eq!(scorer.score(&fe), 1.0);

        // pileup line well below its parent: plausible
        let mut data = Spectrum::zeros(2000);
        data.set(p.calibration.channel_from_energy(6.404), 100.0);
        data.set(p.calibration.channel_from_energy(12.808), 2.0);
        let scorer = ProportionalPileupScorer::new(data, p.calibration);
        assert_eq!(scorer.score(&pileup), 1.0);
    }

    #[test]
    fn test_compound_score_is_weighted_sum() {
        struct Constant(f32);
        impl FittingScorer for Constant {
            fn score(&self, _: &TransitionSeries) -> f32 {
                self.0
            }
        }

        let mut compound = CompoundFittingScorer::new();
        compound.add(10.0, Box::new(Constant(0.5)));
        compound.add(2.0, Box::new(Constant(1.0)));

        let fe = series("Fe", 6.404);
        assert!((compound.score(&fe) - 7.0).abs() < 1e-6);
    }
}
