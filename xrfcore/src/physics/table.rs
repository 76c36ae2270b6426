use crate::physics::element::Element;
use crate::physics::series::{SeriesMode, TransitionSeries};
use crate::physics::transition::Transition;

/// Source of all [`TransitionSeries`] known to the system for the active
/// element database.
pub trait PeakTable {
    fn get_all(&self) -> Vec<TransitionSeries>;

    /// Looks up one series by element and shell family.
    fn get(&self, element: Element, mode: SeriesMode) -> Option<TransitionSeries> {
        self.get_all()
            .into_iter()
            .find(|ts| ts.element() == element && ts.mode() == mode)
    }
}

// K series lines (keV, relative intensity), Ka1 / Ka2 / Kb1.
// Light elements below Ca have unresolved Ka doublets and carry a single
// Ka line plus Kb.
pub fn k_series_lines() -> Vec<(&'static str, Vec<(f32, f32)>)> {
    vec![
        ("Na", vec![(1.041, 1.0), (1.071, 0.02)]),
        ("Mg", vec![(1.254, 1.0), (1.302, 0.03)]),
        ("Al", vec![(1.487, 1.0), (1.557, 0.04)]),
        ("Si", vec![(1.740, 1.0), (1.836, 0.05)]),
        ("P", vec![(2.014, 1.0), (2.139, 0.06)]),
        ("S", vec![(2.308, 1.0), (2.464, 0.08)]),
        ("Cl", vec![(2.622, 1.0), (2.816, 0.09)]),
        ("Ar", vec![(2.958, 1.0), (3.191, 0.10)]),
        ("K", vec![(3.314, 1.0), (3.590, 0.11)]),
        ("Ca", vec![(3.692, 1.0), (3.688, 0.5), (4.013, 0.13)]),
        ("Ti", vec![(4.511, 1.0), (4.505, 0.5), (4.932, 0.15)]),
        ("V", vec![(4.952, 1.0), (4.945, 0.5), (5.427, 0.15)]),
        ("Cr", vec![(5.415, 1.0), (5.406, 0.5), (5.947, 0.15)]),
        ("Mn", vec![(5.899, 1.0), (5.888, 0.5), (6.490, 0.16)]),
        ("Fe", vec![(6.404, 1.0), (6.391, 0.5), (7.058, 0.17)]),
        ("Co", vec![(6.930, 1.0), (6.915, 0.5), (7.649, 0.17)]),
        ("Ni", vec![(7.478, 1.0), (7.461, 0.5), (8.265, 0.17)]),
        ("Cu", vec![(8.048, 1.0), (8.028, 0.5), (8.905, 0.17)]),
        ("Zn", vec![(8.639, 1.0), (8.616, 0.5), (9.572, 0.17)]),
        ("Ga", vec![(9.252, 1.0), (9.225, 0.5), (10.264, 0.17)]),
        ("Ge", vec![(9.886, 1.0), (9.855, 0.5), (10.982, 0.17)]),
        ("As", vec![(10.544, 1.0), (10.508, 0.5), (11.726, 0.18)]),
        ("Se", vec![(11.222, 1.0), (11.181, 0.5), (12.496, 0.18)]),
        ("Br", vec![(11.924, 1.0), (11.878, 0.5), (13.291, 0.18)]),
        ("Rb", vec![(13.395, 1.0), (13.336, 0.5), (14.961, 0.19)]),
        ("Sr", vec![(14.165, 1.0), (14.098, 0.5), (15.835, 0.19)]),
        ("Zr", vec![(15.775, 1.0), (15.691, 0.5), (17.668, 0.20)]),
        ("Mo", vec![(17.479, 1.0), (17.374, 0.5), (19.608, 0.21)]),
    ]
}

// L series lines (keV, relative intensity), La1 / Lb1 / Lg1.
pub fn l_series_lines() -> Vec<(&'static str, Vec<(f32, f32)>)> {
    vec![
        ("W", vec![(8.398, 1.0), (9.672, 0.70), (11.286, 0.08)]),
        ("Pt", vec![(9.442, 1.0), (11.071, 0.70), (12.942, 0.08)]),
        ("Au", vec![(9.713, 1.0), (11.442, 0.70), (13.382, 0.08)]),
        ("Hg", vec![(9.989, 1.0), (11.823, 0.70), (13.830, 0.08)]),
        ("Pb", vec![(10.552, 1.0), (12.614, 0.70), (14.764, 0.08)]),
        ("Bi", vec![(10.839, 1.0), (13.024, 0.70), (15.248, 0.09)]),
        ("U", vec![(13.615, 1.0), (17.220, 0.70), (20.167, 0.10)]),
    ]
}

/// The bundled element database: K series for the common light and
/// transition elements, L series for the heavy ones.
#[derive(Clone, Debug, Default)]
pub struct SeriesLibrary {
    series: Vec<TransitionSeries>,
}

impl SeriesLibrary {
    /// Builds the standard bundled library.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::physics::element::Element;
    /// # use xrfcore::physics::series::SeriesMode;
    /// # use xrfcore::physics::table::{PeakTable, SeriesLibrary};
    /// let table = SeriesLibrary::standard();
    /// let fe_k = table.get(Element::from_symbol("Fe").unwrap(), SeriesMode::K).unwrap();
    /// assert_eq!(fe_k.strongest_transition().unwrap().energy, 6.404);
    /// ```
    pub fn standard() -> Self {
        let mut series = Vec::new();

        for (symbol, lines) in k_series_lines() {
            series.push(build_series(symbol, SeriesMode::K, &lines));
        }
        for (symbol, lines) in l_series_lines() {
            series.push(build_series(symbol, SeriesMode::L, &lines));
        }

        SeriesLibrary { series }
    }

    /// Builds a library from an explicit list of series, e.g. a subset
    /// restricted to the elements a sample can contain.
    pub fn from_series(series: Vec<TransitionSeries>) -> Self {
        SeriesLibrary { series }
    }
}

fn build_series(symbol: &str, mode: SeriesMode, lines: &[(f32, f32)]) -> TransitionSeries {
    let element = Element::from_symbol(symbol)
        .unwrap_or_else(|| panic!("unknown element symbol in line table: {}", symbol));
    TransitionSeries::new(
        element,
        mode,
        lines.iter().map(|&(e, i)| Transition::new(e, i)).collect(),
    )
}

impl PeakTable for SeriesLibrary {
    fn get_all(&self) -> Vec<TransitionSeries> {
        self.series.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_library_lookup() {
        let table = SeriesLibrary::standard();
        let all = table.get_all();
        assert!(all.len() > 30);

        let pb = Element::from_symbol("Pb").unwrap();
        let pb_l = table.get(pb, SeriesMode::L).unwrap();
        assert_eq!(pb_l.strongest_transition().unwrap().energy, 10.552);
        assert!(table.get(pb, SeriesMode::K).is_none());
    }

    #[test]
    fn test_lines_are_sorted_by_energy() {
        let table = SeriesLibrary::standard();
        for ts in table.get_all() {
            let energies: Vec<f32> = ts.transitions().iter().map(|t| t.energy).collect();
            let mut sorted = energies.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(energies, sorted, "unsorted lines in {}", ts);
        }
    }
}
