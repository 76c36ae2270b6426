use crate::data::spectrum::Spectrum;
use crate::fitting::curve::Curve;
use crate::fitting::parameters::FittingParameters;
use crate::physics::series::TransitionSeries;

/// One fitted series: the curve scaled to match the data, and the scale
/// that got it there.
#[derive(Clone, Debug)]
pub struct FittingResult {
    pub series: TransitionSeries,
    pub fit: Spectrum,
    pub scale: f32,
}

impl FittingResult {
    pub fn new(series: TransitionSeries, fit: Spectrum, scale: f32) -> Self {
        FittingResult { series, fit, scale }
    }
}

/// The outcome of solving a [`FittingSet`] against a spectrum: one
/// [`FittingResult`] per series, in set order, plus the residual
/// `data - Σ fits`. The residual may go negative; over-fit stays visible
/// downstream.
#[derive(Clone, Debug)]
pub struct FittingResultSet {
    pub fits: Vec<FittingResult>,
    pub residual: Spectrum,
}

/// A mutable, ordered collection of (series, curve) pairs sharing one set
/// of [`FittingParameters`].
///
/// Cloning gives the scratch-copy semantics callers need to test
/// hypothetical additions without touching the real set.
#[derive(Clone, Debug)]
pub struct FittingSet {
    curves: Vec<Curve>,
    parameters: FittingParameters,
}

impl FittingSet {
    /// Constructs an empty set.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::fitting::calibration::EnergyCalibration;
    /// # use xrfcore::fitting::parameters::FittingParameters;
    /// # use xrfcore::fitting::set::FittingSet;
    /// let params = FittingParameters::new(EnergyCalibration::new(0.0, 20.0, 2000));
    /// let set = FittingSet::new(params);
    /// assert!(set.is_empty());
    /// ```
    pub fn new(parameters: FittingParameters) -> Self {
        FittingSet { curves: Vec::new(), parameters }
    }

    pub fn parameters(&self) -> &FittingParameters {
        &self.parameters
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn contains(&self, series: &TransitionSeries) -> bool {
        self.curves.iter().any(|c| c.series() == series)
    }

    /// Appends a series, building its curve. Duplicates are ignored.
    pub fn add_series(&mut self, series: TransitionSeries) {
        if self.contains(&series) {
            return;
        }
        self.curves.push(Curve::new(series, &self.parameters));
    }

    /// Removes a series by value equality. Returns whether it was present.
    pub fn remove_series(&mut self, series: &TransitionSeries) -> bool {
        let before = self.curves.len();
        self.curves.retain(|c| c.series() != series);
        before != self.curves.len()
    }

    pub fn clear(&mut self) {
        self.curves.clear();
    }

    /// The currently fitted series, in set order.
    pub fn fitted_series(&self) -> Vec<TransitionSeries> {
        self.curves.iter().map(|c| c.series().clone()).collect()
    }

    /// Temporarily removes `series` (when present), restoring it when the
    /// returned guard drops. Every exit path of the caller restores the
    /// set, so suggestion flows can re-score a series without a stale copy
    /// of itself consuming its own signal.
    pub fn remove_scoped(&mut self, series: Option<&TransitionSeries>) -> ScopedRemoval<'_> {
        let removed = match series {
            Some(ts) if self.remove_series(ts) => Some(ts.clone()),
            _ => None,
        };
        ScopedRemoval { set: self, removed }
    }
}

/// Guard for [`FittingSet::remove_scoped`]; re-adds the removed series on
/// drop.
pub struct ScopedRemoval<'a> {
    set: &'a mut FittingSet,
    removed: Option<TransitionSeries>,
}

impl ScopedRemoval<'_> {
    pub fn set(&self) -> &FittingSet {
        self.set
    }

    /// Whether the series was actually present and removed.
    pub fn was_removed(&self) -> bool {
        self.removed.is_some()
    }
}

impl Drop for ScopedRemoval<'_> {
    fn drop(&mut self) {
        if let Some(series) = self.removed.take() {
            self.set.add_series(series);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::calibration::EnergyCalibration;
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
    fn test_add_remove_contains() {
        let mut set = FittingSet::new(params());
        let fe = series("Fe", 6.404);

        set.add_series(fe.clone());
        set.add_series(fe.clone()); // duplicate ignored
        assert_eq!(set.len(), 1);
        assert!(set.contains(&fe));

        assert!(set.remove_series(&fe));
        assert!(!set.remove_series(&fe));
        assert!(set.is_empty());
    }

    #[test]
    fn test_clone_is_independent_scratch_copy() {
        let mut set = FittingSet::new(params());
        set.add_series(series("Fe", 6.404));

        let mut scratch = set.clone();
        scratch.add_series(series("Cu", 8.048));

        assert_eq!(set.len(), 1);
        assert_eq!(scratch.len(), 2);
    }

    #[test]
    fn test_scoped_removal_restores_on_drop() {
        let mut set = FittingSet::new(params());
        let fe = series("Fe", 6.404);
        set.add_series(fe.clone());

        {
            let guard = set.remove_scoped(Some(&fe));
            assert!(guard.was_removed());
            assert!(!guard.set().contains(&fe));
        }
        assert!(set.contains(&fe));

        // absent series: nothing removed, nothing restored twice
        let cu = series("Cu", 8.048);
        {
            let guard = set.remove_scoped(Some(&cu));
            assert!(!guard.was_removed());
        }
        assert_eq!(set.len(), 1);
    }
}
