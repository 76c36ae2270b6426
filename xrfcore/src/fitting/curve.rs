use crate::data::range::RangeSet;
use crate::data::spectrum::Spectrum;
use crate::fitting::functions::FittingFunction;
use crate::fitting::parameters::FittingParameters;
use crate::physics::series::TransitionSeries;

/// How broad an area around each transition to consider significant, in
/// units of FWHM. The default of 0.5 makes the half width at half maximum
/// the significant window.
pub const DEFAULT_RANGE_MULTIPLIER: f32 = 0.5;

/// The normalized model curve for one [`TransitionSeries`] under a set of
/// [`FittingParameters`].
///
/// A curve is fully recomputed whenever its series changes: the
/// significant channel ranges, the footprint size used as a breadth
/// penalty in scoring, and the curve itself, scaled so its peak value is
/// 1.0 (or all-zero when the theoretical peak is zero).
#[derive(Debug, Clone)]
pub struct Curve {
    series: TransitionSeries,
    parameters: FittingParameters,
    range_multiplier: f32,
    normalized_curve: Spectrum,
    normalization_scale: f32,
    intense_ranges: RangeSet,
    base_size: i32,
}

impl Curve {
    /// Builds the curve for `series`; the model is computed immediately.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::fitting::calibration::EnergyCalibration;
    /// # use xrfcore::fitting::curve::Curve;
    /// # use xrfcore::fitting::parameters::FittingParameters;
    /// # use xrfcore::physics::element::Element;
    /// # use xrfcore::physics::series::{SeriesMode, TransitionSeries};
    /// # use xrfcore::physics::transition::Transition;
    /// let params = FittingParameters::new(EnergyCalibration::new(0.0, 20.0, 2000));
    /// let fe_k = TransitionSeries::new(Element::from_symbol("Fe").unwrap(), SeriesMode::K,
    ///     vec![Transition::new(6.404, 1.0)]);
    /// let curve = Curve::new(fe_k, &params);
    /// assert_eq!(curve.get().max(), 1.0);
    /// ```
    pub fn new(series: TransitionSeries, parameters: &FittingParameters) -> Self {
        let mut curve = Curve {
            series: series.clone(),
            parameters: *parameters,
            range_multiplier: DEFAULT_RANGE_MULTIPLIER,
            normalized_curve: Spectrum::zeros(parameters.calibration.data_width()),
            normalization_scale: 0.0,
            intense_ranges: RangeSet::new(),
            base_size: 0,
        };
        curve.set_transition_series(series);
        curve
    }

    /// Rebinds the curve to a new series and recomputes everything.
    pub fn set_transition_series(&mut self, series: TransitionSeries) {
        self.series = series;
        self.calculate_intense_ranges();
        self.calculate_normalized_curve();
    }

    pub fn series(&self) -> &TransitionSeries {
        &self.series
    }

    pub fn parameters(&self) -> &FittingParameters {
        &self.parameters
    }

    /// The normalized curve: peak value 1.0, or all-zero when the
    /// theoretical peak was zero.
    pub fn get(&self) -> &Spectrum {
        &self.normalized_curve
    }

    /// The pre-normalization peak height.
    pub fn normalization_scale(&self) -> f32 {
        self.normalization_scale
    }

    /// Total channel width covered by the significant ranges. L and M
    /// series are typically broader than K series; scoring uses this as a
    /// breadth penalty proxy.
    pub fn base_size(&self) -> i32 {
        self.base_size
    }

    pub fn intense_ranges(&self) -> &RangeSet {
        &self.intense_ranges
    }

    /// Returns the normalized curve scaled by `scale`.
    pub fn scale(&self, scale: f32) -> Spectrum {
        &self.normalized_curve * scale
    }

    /// Writes the scaled curve into `target` without allocating.
    pub fn scale_into(&self, scale: f32, target: &mut Spectrum) {
        self.normalized_curve.scale_by_into(scale, target);
    }

    /// True iff the significant ranges of both curves collide; such pairs
    /// are candidates for pileup correction.
    pub fn is_overlapping(&self, other: &Curve) -> bool {
        self.intense_ranges.is_touching(other.intense_ranges())
    }

    // Marks the channel interval within range_multiplier * FWHM of every
    // transition as significant and accumulates the footprint size.
    fn calculate_intense_ranges(&mut self) {
        self.intense_ranges.clear();
        self.base_size = 0;

        let calibration = &self.parameters.calibration;
        for transition in self.series.transitions() {
            let range = self.parameters.get_fwhm(transition) * self.range_multiplier;
            let mean = transition.energy;

            let channels =
                calibration.channel_range_from_energy_range(mean - range, mean + range);
            self.base_size += channels.width();
            self.intense_ranges.add_range(channels);
        }
    }

    // Generates the unscaled model from per-transition fitting functions,
    // then normalizes it to a peak value of 1.0.
    fn calculate_normalized_curve(&mut self) {
        let calibration = &self.parameters.calibration;

        let mut functions: Vec<Box<dyn FittingFunction>> = Vec::new();
        for transition in self.series.transitions() {
            functions.push(self.parameters.for_transition(transition));

            // Escape modeling is skipped for composite series to avoid
            // compounding artifacts onto artifacts.
            if !self.series.is_composite() && self.parameters.escape.has_offset() {
                for escape_line in self.parameters.escape.offsets() {
                    if transition.energy > escape_line.energy {
                        functions.push(self.parameters.for_escape(transition, &escape_line));
                    }
                }
            }
        }

        let mut fit = Spectrum::zeros(calibration.data_width());
        for channel in 0..calibration.data_width() {
            let energy = calibration.energy_from_channel(channel);
            let value: f32 = functions.iter().map(|f| f.for_energy(energy)).sum();
            fit.set(channel, value);
        }

        self.normalization_scale = fit.max();
        // a zero peak must not become a division by zero
        self.normalized_curve = if self.normalization_scale == 0.0 {
            Spectrum::zeros(calibration.data_width())
        } else {
            fit.divide_by(self.normalization_scale)
        };
    }
}
