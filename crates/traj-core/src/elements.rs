//! Element symbol lookup.
//!
//! The lookup is a read-only service handed to topology readers, so callers
//! can swap the built-in [`PeriodicTable`] for a restricted table.

pub const UNKNOWN_ATOMIC_NUMBER: i32 = -1;
pub const UNKNOWN_MASS: f64 = 0.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementInfo {
    pub symbol: &'static str,
    pub number: i32,
    pub mass: f64,
}

pub trait ElementLookup {
    fn by_symbol(&self, symbol: &str) -> Option<ElementInfo>;
    fn by_number(&self, number: i32) -> Option<ElementInfo>;

    /// Atomic number and mass for `symbol`, or the sentinels when unknown.
    fn number_and_mass(&self, symbol: &str) -> (i32, f64) {
        match self.by_symbol(symbol) {
            Some(info) => (info.number, info.mass),
            None => (UNKNOWN_ATOMIC_NUMBER, UNKNOWN_MASS),
        }
    }
}

/// All 118 elements with standard atomic weights (g/mol).
#[derive(Clone, Copy, Debug, Default)]
pub struct PeriodicTable;

impl ElementLookup for PeriodicTable {
    fn by_symbol(&self, symbol: &str) -> Option<ElementInfo> {
        let symbol = symbol.trim();
        ELEMENTS
            .iter()
            .position(|(s, _)| s.eq_ignore_ascii_case(symbol))
            .map(element_at)
    }

    fn by_number(&self, number: i32) -> Option<ElementInfo> {
        if number < 1 || number as usize > ELEMENTS.len() {
            return None;
        }
        Some(element_at(number as usize - 1))
    }
}

fn element_at(idx: usize) -> ElementInfo {
    let (symbol, mass) = ELEMENTS[idx];
    ElementInfo {
        symbol,
        number: idx as i32 + 1,
        mass,
    }
}

/// Canonical capitalisation (`CL` -> `Cl`) if `raw` names a known element.
pub fn normalize_element(raw: &str) -> Option<String> {
    PeriodicTable
        .by_symbol(raw)
        .map(|info| info.symbol.to_string())
}

pub fn mass_for_element(symbol: &str) -> f64 {
    PeriodicTable
        .by_symbol(symbol)
        .map(|info| info.mass)
        .unwrap_or(UNKNOWN_MASS)
}

const ION_NAMES: [&str; 11] = [
    "NA", "CL", "MG", "ZN", "FE", "CU", "MN", "LI", "BR", "CS", "RB",
];

/// Guesses the element of a force-field atom name (`OW` -> O, `HW1` -> H).
///
/// Two-letter elements are only taken from mixed-case names (`Cl`) or bare
/// ion names (`NA`, `CL`); otherwise the first letter decides, so `CA` in a
/// residue is carbon.
pub fn infer_element_from_atom_name(name: &str) -> Option<String> {
    let letters: String = name
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let mut chars = letters.chars();
    let first = chars.next()?;
    if let Some(second) = chars.next() {
        let pair: String = [first, second].iter().collect();
        let bare_ion = letters.len() == 2
            && name.trim().len() == 2
            && ION_NAMES.contains(&pair.to_ascii_uppercase().as_str());
        if second.is_ascii_lowercase() || bare_ion {
            if let Some(symbol) = normalize_element(&pair) {
                return Some(symbol);
            }
        }
    }
    normalize_element(&first.to_string())
}

const ELEMENTS: [(&str, f64); 118] = [
    ("H", 1.008),
    ("He", 4.002602),
    ("Li", 6.94),
    ("Be", 9.0121831),
    ("B", 10.81),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("F", 18.998403163),
    ("Ne", 20.1797),
    ("Na", 22.98976928),
    ("Mg", 24.305),
    ("Al", 26.9815385),
    ("Si", 28.085),
    ("P", 30.973761998),
    ("S", 32.06),
    ("Cl", 35.45),
    ("Ar", 39.948),
    ("K", 39.0983),
    ("Ca", 40.078),
    ("Sc", 44.955908),
    ("Ti", 47.867),
    ("V", 50.9415),
    ("Cr", 51.9961),
    ("Mn", 54.938044),
    ("Fe", 55.845),
    ("Co", 58.933194),
    ("Ni", 58.6934),
    ("Cu", 63.546),
    ("Zn", 65.38),
    ("Ga", 69.723),
    ("Ge", 72.630),
    ("As", 74.921595),
    ("Se", 78.971),
    ("Br", 79.904),
    ("Kr", 83.798),
    ("Rb", 85.4678),
    ("Sr", 87.62),
    ("Y", 88.90584),
    ("Zr", 91.224),
    ("Nb", 92.90637),
    ("Mo", 95.95),
    ("Tc", 98.0),
    ("Ru", 101.07),
    ("Rh", 102.90550),
    ("Pd", 106.42),
    ("Ag", 107.8682),
    ("Cd", 112.414),
    ("In", 114.818),
    ("Sn", 118.710),
    ("Sb", 121.760),
    ("Te", 127.60),
    ("I", 126.90447),
    ("Xe", 131.293),
    ("Cs", 132.90545196),
    ("Ba", 137.327),
    ("La", 138.90547),
    ("Ce", 140.116),
    ("Pr", 140.90766),
    ("Nd", 144.242),
    ("Pm", 145.0),
    ("Sm", 150.36),
    ("Eu", 151.964),
    ("Gd", 157.25),
    ("Tb", 158.92535),
    ("Dy", 162.500),
    ("Ho", 164.93033),
    ("Er", 167.259),
    ("Tm", 168.93422),
    ("Yb", 173.045),
    ("Lu", 174.9668),
    ("Hf", 178.49),
    ("Ta", 180.94788),
    ("W", 183.84),
    ("Re", 186.207),
    ("Os", 190.23),
    ("Ir", 192.217),
    ("Pt", 195.084),
    ("Au", 196.966569),
    ("Hg", 200.592),
    ("Tl", 204.38),
    ("Pb", 207.2),
    ("Bi", 208.98040),
    ("Po", 209.0),
    ("At", 210.0),
    ("Rn", 222.0),
    ("Fr", 223.0),
    ("Ra", 226.0),
    ("Ac", 227.0),
    ("Th", 232.0377),
    ("Pa", 231.03588),
    ("U", 238.02891),
    ("Np", 237.0),
    ("Pu", 244.0),
    ("Am", 243.0),
    ("Cm", 247.0),
    ("Bk", 247.0),
    ("Cf", 251.0),
    ("Es", 252.0),
    ("Fm", 257.0),
    ("Md", 258.0),
    ("No", 259.0),
    ("Lr", 262.0),
    ("Rf", 267.0),
    ("Db", 270.0),
    ("Sg", 269.0),
    ("Bh", 270.0),
    ("Hs", 270.0),
    ("Mt", 278.0),
    ("Ds", 281.0),
    ("Rg", 281.0),
    ("Cn", 285.0),
    ("Nh", 286.0),
    ("Fl", 289.0),
    ("Mc", 289.0),
    ("Lv", 293.0),
    ("Ts", 293.0),
    ("Og", 294.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_symbol_is_case_insensitive() {
        let table = PeriodicTable;
        assert_eq!(table.by_symbol("H").unwrap().number, 1);
        assert_eq!(table.by_symbol("he").unwrap().number, 2);
        assert_eq!(table.by_symbol("ZN").unwrap().number, 30);
        assert_eq!(table.by_symbol("Og").unwrap().number, 118);
        assert!(table.by_symbol("").is_none());
        assert!(table.by_symbol("Xyz").is_none());
    }

    #[test]
    fn lookup_by_number_matches_symbol() {
        let table = PeriodicTable;
        let carbon = table.by_number(6).unwrap();
        assert_eq!(carbon.symbol, "C");
        assert!((carbon.mass - 12.011).abs() < 1e-9);
        assert!(table.by_number(0).is_none());
        assert!(table.by_number(119).is_none());
    }

    #[test]
    fn unknown_symbol_yields_sentinels() {
        assert_eq!(
            PeriodicTable.number_and_mass("Qq"),
            (UNKNOWN_ATOMIC_NUMBER, UNKNOWN_MASS)
        );
        assert_eq!(mass_for_element("Qq"), 0.0);
    }

    #[test]
    fn infer_element_from_force_field_names() {
        assert_eq!(infer_element_from_atom_name("OW").as_deref(), Some("O"));
        assert_eq!(infer_element_from_atom_name("HW1").as_deref(), Some("H"));
        assert_eq!(infer_element_from_atom_name("CA").as_deref(), Some("C"));
        assert_eq!(infer_element_from_atom_name("Cl").as_deref(), Some("Cl"));
        assert_eq!(infer_element_from_atom_name("NA").as_deref(), Some("Na"));
        assert_eq!(infer_element_from_atom_name("1HB").as_deref(), Some("H"));
        assert_eq!(infer_element_from_atom_name("").as_deref(), None);
    }
}
