use std::collections::HashMap;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::data::spectrum::Spectrum;
use crate::fitting::fitter::CurveFitter;
use crate::fitting::set::FittingSet;
use crate::fitting::solver::FittingSolver;
use crate::physics::series::TransitionSeries;
use crate::physics::table::PeakTable;
use crate::search::peaks::PeakSearcher;
use crate::search::scoring::{
    CompoundFittingScorer, EnergyProximityScorer, FastFittingScorer, FittingScorer,
    NoComplexPileupScorer, ProportionalPileupScorer,
};

/// Length of a per-peak candidate list.
const MAX_SUGGESTIONS: usize = 15;

/// Candidates whose proximity score falls below this floor cannot explain
/// the peak at all and are kept out of the list. The elimination step of
/// [`PeakProposal::search`] treats list membership as "this series would
/// explain that peak too", so lists must carry plausible explanations
/// only.
const PROXIMITY_FLOOR: f32 = 0.1;

/// Proposes new transition series that explain unexplained peaks in a
/// spectrum: generates ranked per-peak candidate lists, then greedily
/// accepts candidates, letting each acceptance cover every peak it
/// explains and re-ranking the remainder so pileup introduced by earlier
/// acceptances is accounted for.
pub struct PeakProposal;

impl PeakProposal {
    /// Searches `data` for transition series not yet present in `fits`.
    ///
    /// Returns the newly proposed series in acceptance order. Peaks
    /// already explained by a fitted transition (within half its FWHM)
    /// are dropped up front; the greedy loop visits the remaining peaks
    /// in the searcher's order, which is strongest first.
    pub fn search(
        data: &Spectrum,
        searcher: &dyn PeakSearcher,
        fits: &FittingSet,
        fitter: &dyn CurveFitter,
        solver: &dyn FittingSolver,
        table: &dyn PeakTable,
    ) -> Vec<TransitionSeries> {
        let parameters = *fits.parameters();
        let calibration = parameters.calibration;

        // scratch set holding proposals, same parameters as the real set
        let mut proposals = FittingSet::new(parameters);

        let mut peaks = searcher.search(data);

        // drop peaks the accepted set already explains
        peaks.retain(|&peak| {
            let energy = calibration.energy_from_channel(peak);
            !fits.fitted_series().iter().any(|ts| {
                ts.transitions().iter().any(|t| {
                    let hwhm = parameters.get_fwhm(t) / 2.0;
                    (energy - t.energy).abs() < hwhm
                })
            })
        });

        let mut guesses =
            Self::make_guesses(data, &peaks, fits, &mut proposals, fitter, solver, table);

        let mut new_fits: Vec<TransitionSeries> = Vec::new();
        for &channel in &peaks {
            let Some(list) = guesses.get(&channel) else { continue };
            let Some(guess) = list.first().cloned() else { continue };

            if !fits.contains(&guess) {
                new_fits.push(guess.clone());
                proposals.add_series(guess.clone());
            }

            // the accepted guess also explains every other peak whose
            // candidate list carries it
            guesses.retain(|_, list| !list.contains(&guess));

            // regenerate guesses for the remaining peaks against the
            // combined set, so pileup of earlier acceptances is
            // considered in later rounds
            let remaining: Vec<usize> = peaks
                .iter()
                .copied()
                .filter(|c| guesses.contains_key(c))
                .collect();
            guesses =
                Self::make_guesses(data, &remaining, fits, &mut proposals, fitter, solver, table);
        }

        new_fits
    }

    fn make_guesses(
        data: &Spectrum,
        peaks: &[usize],
        fits: &FittingSet,
        proposals: &mut FittingSet,
        fitter: &dyn CurveFitter,
        solver: &dyn FittingSolver,
        table: &dyn PeakTable,
    ) -> HashMap<usize, Vec<TransitionSeries>> {
        peaks
            .iter()
            .map(|&channel| {
                let list = Self::from_channel(
                    data, fits, proposals, fitter, solver, table, channel, None,
                );
                (channel, list)
            })
            .collect()
    }

    /// Generates the ranked candidate list for one channel: the series
    /// which best explain the signal there, best first, at most
    /// [`MAX_SUGGESTIONS`] long.
    ///
    /// `current` carries a previously-suggested series through
    /// re-suggestion flows: it is removed from `proposed` for the
    /// residual computation (so a stale copy of itself cannot consume
    /// its signal) and restored on every exit path.
    pub fn from_channel(
        data: &Spectrum,
        fits: &FittingSet,
        proposed: &mut FittingSet,
        fitter: &dyn CurveFitter,
        solver: &dyn FittingSolver,
        table: &dyn PeakTable,
        channel: usize,
        current: Option<&TransitionSeries>,
    ) -> Vec<TransitionSeries> {
        let parameters = *fits.parameters();
        let calibration = parameters.calibration;

        // double residual: what is left after both the accepted fits and
        // the other proposals have taken their share; candidates are
        // scored against this so explained signal never competes with
        // new hypotheses
        let (current_used, proposed_without_current, double_residual) = {
            let guard = proposed.remove_scoped(current);
            let fit_results = solver.solve(data, fits, fitter);
            let proposed_results = solver.solve(&fit_results.residual, guard.set(), fitter);
            (
                guard.was_removed(),
                guard.set().fitted_series(),
                proposed_results.residual,
            )
        };

        let energy = calibration.energy_from_channel(channel);

        // every series the system knows about...
        let mut pool = table.get_all();

        // ...plus every pairwise summation of fitted and proposed series;
        // this is where pileup hypotheses come from
        let mut summation_sources = fits.fitted_series();
        summation_sources.extend(proposed_without_current);
        for ts1 in &summation_sources {
            for ts2 in &summation_sources {
                pool.push(ts1.summation(ts2));
            }
        }

        // remove whatever is already fitted or proposed, summations included
        let fitted = fits.fitted_series();
        let proposed_now = proposed.fitted_series();
        pool.retain(|ts| !fitted.contains(ts) && !proposed_now.contains(ts));

        // re-add the current selection so it can be re-suggested
        if current_used {
            if let Some(ts) = current {
                pool.push(ts.clone());
            }
        }

        let pool: Vec<TransitionSeries> = pool.into_iter().unique().collect();

        // only series with a line near the channel can explain the peak
        let proximity = EnergyProximityScorer::new(energy, parameters);
        let pool: Vec<TransitionSeries> = pool
            .into_iter()
            .filter(|ts| proximity.score(ts) >= PROXIMITY_FLOOR)
            .collect();

        // fixed scorer weights; the ratios are part of the output contract
        let mut scorer = CompoundFittingScorer::new();
        scorer.add(10.0, Box::new(EnergyProximityScorer::new(energy, parameters)));
        scorer.add(10.0, Box::new(FastFittingScorer::new(double_residual, parameters)));
        scorer.add(2.0, Box::new(NoComplexPileupScorer));
        scorer.add(1.0, Box::new(ProportionalPileupScorer::new(data.clone(), calibration)));

        // negated scores so an ascending sort puts the best fit first
        let mut ranked: Vec<(TransitionSeries, OrderedFloat<f32>)> = pool
            .into_par_iter()
            .map(|ts| {
                let score = scorer.score(&ts);
                (ts, OrderedFloat(-score))
            })
            .collect();
        ranked.sort_by_key(|(_, key)| *key);
        ranked.truncate(MAX_SUGGESTIONS);

        ranked.into_iter().map(|(ts, _)| ts).collect()
    }
}
