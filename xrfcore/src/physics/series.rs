use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::physics::element::Element;
use crate::physics::table::PeakTable;
use crate::physics::transition::Transition;

/// The shell family a series of emission lines belongs to, or `Composite`
/// for the synthetic summation of two series used to model pileup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeriesMode {
    K,
    L,
    M,
    Composite,
}

impl Display for SeriesMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SeriesMode::K => write!(f, "K"),
            SeriesMode::L => write!(f, "L"),
            SeriesMode::M => write!(f, "M"),
            SeriesMode::Composite => write!(f, "Composite"),
        }
    }
}

/// An ordered, deduplicated set of [`Transition`]s for one element and
/// shell family, e.g. "Fe K".
///
/// Immutable value type: equality and hashing cover (element, mode,
/// transitions), so a series is safe to use as a map or set key and the
/// set-algebra steps of candidate generation behave as value operations.
/// For `Composite` series the two source series are retained for
/// plausibility scoring but do not participate in identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionSeries {
    element: Element,
    mode: SeriesMode,
    transitions: Vec<Transition>,
    components: Vec<TransitionSeries>,
}

impl TransitionSeries {
    /// Constructs a new `TransitionSeries`, sorting and deduplicating the
    /// given transitions.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::physics::element::Element;
    /// # use xrfcore::physics::series::{SeriesMode, TransitionSeries};
    /// # use xrfcore::physics::transition::Transition;
    /// let fe_k = TransitionSeries::new(
    ///     Element::from_symbol("Fe").unwrap(),
    ///     SeriesMode::K,
    ///     vec![Transition::new(6.404, 1.0), Transition::new(7.058, 0.17)],
    /// );
    /// assert_eq!(fe_k.identifier(), "Fe:K");
    /// assert_eq!(fe_k.transitions().len(), 2);
    /// ```
    pub fn new(element: Element, mode: SeriesMode, transitions: Vec<Transition>) -> Self {
        let mut transitions = transitions;
        transitions.sort();
        transitions.dedup();
        TransitionSeries { element, mode, transitions, components: Vec::new() }
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn mode(&self) -> SeriesMode {
        self.mode
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Source series of a `Composite`; empty for plain series.
    pub fn components(&self) -> &[TransitionSeries] {
        &self.components
    }

    pub fn is_composite(&self) -> bool {
        self.mode == SeriesMode::Composite
    }

    /// The line with the largest relative intensity.
    pub fn strongest_transition(&self) -> Option<&Transition> {
        self.transitions.iter().max_by(|a, b| {
            a.relative_intensity
                .partial_cmp(&b.relative_intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// The line closest in energy to `energy`.
    pub fn closest_transition(&self, energy: f32) -> Option<&Transition> {
        self.transitions.iter().min_by(|a, b| {
            (a.energy - energy)
                .abs()
                .partial_cmp(&(b.energy - energy).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Distance in keV from the closest line of this series to `energy`.
    /// Returns `f32::MAX` for a series with no lines.
    pub fn proximity_to_energy(&self, energy: f32) -> f32 {
        self.closest_transition(energy)
            .map(|t| (t.energy - energy).abs())
            .unwrap_or(f32::MAX)
    }

    /// Produces the `Composite` series representing simultaneous detection
    /// of this series and `other` (pileup): the cross-product of both line
    /// sets with summed energies and multiplied intensities.
    ///
    /// Commutative as a value: `a.summation(b) == b.summation(a)`, since
    /// components are stored in canonical order.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::physics::element::Element;
    /// # use xrfcore::physics::series::{SeriesMode, TransitionSeries};
    /// # use xrfcore::physics::transition::Transition;
    /// let fe = TransitionSeries::new(Element::from_symbol("Fe").unwrap(), SeriesMode::K,
    ///     vec![Transition::new(6.404, 1.0)]);
    /// let cu = TransitionSeries::new(Element::from_symbol("Cu").unwrap(), SeriesMode::K,
    ///     vec![Transition::new(8.048, 1.0)]);
    /// assert_eq!(fe.summation(&cu), cu.summation(&fe));
    /// assert_eq!(fe.summation(&cu).transitions()[0].energy, 6.404 + 8.048);
    /// ```
    pub fn summation(&self, other: &TransitionSeries) -> TransitionSeries {
        let mut summed = Vec::with_capacity(self.transitions.len() * other.transitions.len());
        for a in &self.transitions {
            for b in &other.transitions {
                summed.push(Transition::new(
                    a.energy + b.energy,
                    a.relative_intensity * b.relative_intensity,
                ));
            }
        }

        let mut components = vec![self.clone(), other.clone()];
        components.sort_by(|a, b| a.identifier().cmp(&b.identifier()));

        let element = self.element.min(other.element);
        let mut series = TransitionSeries::new(element, SeriesMode::Composite, summed);
        series.components = components;
        series
    }

    /// Canonical descriptor, e.g. `"Fe:K"` or `"Cu:K+Fe:K"` for pileup.
    pub fn identifier(&self) -> String {
        if self.is_composite() && !self.components.is_empty() {
            return self
                .components
                .iter()
                .map(|c| c.identifier())
                .collect::<Vec<_>>()
                .join("+");
        }
        format!("{}:{}", self.element.symbol(), self.mode)
    }

    /// Resolves a descriptor like `"Fe:K"` or `"Fe:K+Cu:K"` against a peak
    /// table. Returns `None` for malformed descriptors or series the table
    /// does not carry.
    pub fn from_identifier(identifier: &str, table: &dyn PeakTable) -> Option<TransitionSeries> {
        let part_re = Regex::new(r"^\s*([A-Z][a-z]?)\s*:\s*([KLM])\s*$").unwrap();

        let mut parts = identifier.split('+').map(|part| {
            let caps = part_re.captures(part)?;
            let element = Element::from_symbol(caps.get(1).unwrap().as_str())?;
            let mode = match caps.get(2).unwrap().as_str() {
                "K" => SeriesMode::K,
                "L" => SeriesMode::L,
                "M" => SeriesMode::M,
                _ => return None,
            };
            table.get(element, mode)
        });

        let first = parts.next()??;
        parts.try_fold(first, |acc, part| Some(acc.summation(&part?)))
    }
}

impl PartialEq for TransitionSeries {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element
            && self.mode == other.mode
            && self.transitions == other.transitions
    }
}

impl Eq for TransitionSeries {}

impl Hash for TransitionSeries {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element.hash(state);
        self.mode.hash(state);
        self.transitions.hash(state);
    }
}

impl Display for TransitionSeries {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::table::SeriesLibrary;

    fn series(symbol: &str, mode: SeriesMode, lines: &[(f32, f32)]) -> TransitionSeries {
        TransitionSeries::new(
            Element::from_symbol(symbol).unwrap(),
            mode,
            lines.iter().map(|&(e, i)| Transition::new(e, i)).collect(),
        )
    }

    #[test]
    fn test_value_equality() {
        let a = series("Fe", SeriesMode::K, &[(6.404, 1.0), (7.058, 0.17)]);
        let b = series("Fe", SeriesMode::K, &[(7.058, 0.17), (6.404, 1.0)]);
        let c = series("Fe", SeriesMode::L, &[(6.404, 1.0), (7.058, 0.17)]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_summation_is_commutative() {
        let fe = series("Fe", SeriesMode::K, &[(6.404, 1.0), (6.391, 0.5)]);
        let cu = series("Cu", SeriesMode::K, &[(8.048, 1.0)]);

        let ab = fe.summation(&cu);
        let ba = cu.summation(&fe);

        assert_eq!(ab, ba);
        assert_eq!(ab.identifier(), ba.identifier());
        assert!(ab.is_composite());
        assert_eq!(ab.transitions().len(), 2);
    }

    #[test]
    fn test_proximity_uses_closest_line() {
        let fe = series("Fe", SeriesMode::K, &[(6.404, 1.0), (7.058, 0.17)]);
        assert!((fe.proximity_to_energy(7.0) - 0.058).abs() < 1e-4);
        assert!((fe.proximity_to_energy(6.4) - 0.004).abs() < 1e-4);
    }

    #[test]
    fn test_identifier_round_trip() {
        let table = SeriesLibrary::standard();
        let fe = TransitionSeries::from_identifier("Fe:K", &table).unwrap();
        assert_eq!(fe.identifier(), "Fe:K");

        let pileup = TransitionSeries::from_identifier("Fe:K+Cu:K", &table).unwrap();
        assert!(pileup.is_composite());
        assert_eq!(pileup.identifier(), "Cu:K+Fe:K");

        assert!(TransitionSeries::from_identifier("Fe", &table).is_none());
        assert!(TransitionSeries::from_identifier("Xx:K", &table).is_none());
    }
}
