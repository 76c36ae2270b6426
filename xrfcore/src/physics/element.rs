use serde::{Deserialize, Serialize};

/// A chemical element, identified by atomic number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Element {
    pub atomic_number: u8,
}

// Element Symbols, indexed by atomic number - 1
pub fn element_symbols() -> Vec<&'static str> {
    vec![
        "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
        "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
        "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
        "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
        "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
        "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
        "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
        "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
        "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
        "Pa", "U",
    ]
}

impl Element {
    /// Constructs an `Element` from an atomic number.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xrfcore::physics::element::Element;
    /// let iron = Element::new(26);
    /// assert_eq!(iron.symbol(), "Fe");
    /// ```
    pub fn new(atomic_number: u8) -> Self {
        Element { atomic_number }
    }

    /// Looks up an element by symbol, e.g. `"Fe"`.
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        element_symbols()
            .iter()
            .position(|&s| s == symbol)
            .map(|idx| Element { atomic_number: (idx + 1) as u8 })
    }

    /// The element symbol, or `"?"` for atomic numbers outside the table.
    pub fn symbol(&self) -> &'static str {
        let symbols = element_symbols();
        let idx = self.atomic_number as usize;
        if idx == 0 || idx > symbols.len() {
            return "?";
        }
        symbols[idx - 1]
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
