use crate::elements::{ElementLookup, UNKNOWN_ATOMIC_NUMBER, UNKNOWN_MASS};
use crate::error::{TrajError, TrajResult};

/// Time-invariant description of the atoms in a trajectory.
///
/// Per-atom vectors are either empty (the format carries no such data) or
/// exactly `n_atoms` long; constructors enforce this.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topology {
    n_atoms: usize,
    symbols: Vec<String>,
    atomic_numbers: Vec<i32>,
    masses: Vec<f64>,
    resids: Option<Vec<i32>>,
    resnames: Option<Vec<String>>,
}

impl Topology {
    /// Atom count only, as reported by binary formats without names.
    pub fn with_atom_count(n_atoms: usize) -> Self {
        Self {
            n_atoms,
            ..Self::default()
        }
    }

    /// Derives atomic numbers and masses from `symbols`; unknown symbols get sentinels.
    pub fn from_symbols(symbols: Vec<String>, table: &dyn ElementLookup) -> Self {
        let mut atomic_numbers = Vec::with_capacity(symbols.len());
        let mut masses = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            let (number, mass) = table.number_and_mass(symbol);
            if number == UNKNOWN_ATOMIC_NUMBER {
                log::debug!("unknown element symbol '{symbol}', using sentinel values");
            }
            atomic_numbers.push(number);
            masses.push(mass);
        }
        Self {
            n_atoms: symbols.len(),
            symbols,
            atomic_numbers,
            masses,
            resids: None,
            resnames: None,
        }
    }

    /// Symbols with explicitly known atomic numbers; masses are looked up by number.
    pub fn from_numbered_symbols(
        symbols: Vec<String>,
        atomic_numbers: Vec<i32>,
        table: &dyn ElementLookup,
    ) -> TrajResult<Self> {
        if symbols.len() != atomic_numbers.len() {
            return Err(TrajError::Shape(format!(
                "{} symbols but {} atomic numbers",
                symbols.len(),
                atomic_numbers.len()
            )));
        }
        let masses = atomic_numbers
            .iter()
            .map(|&z| table.by_number(z).map(|e| e.mass).unwrap_or(UNKNOWN_MASS))
            .collect();
        Ok(Self {
            n_atoms: symbols.len(),
            symbols,
            atomic_numbers,
            masses,
            resids: None,
            resnames: None,
        })
    }

    pub fn with_residues(
        mut self,
        resids: Option<Vec<i32>>,
        resnames: Option<Vec<String>>,
    ) -> TrajResult<Self> {
        if let Some(ids) = &resids {
            if ids.len() != self.n_atoms {
                return Err(TrajError::Shape(format!(
                    "expected {} residue ids, got {}",
                    self.n_atoms,
                    ids.len()
                )));
            }
        }
        if let Some(names) = &resnames {
            if names.len() != self.n_atoms {
                return Err(TrajError::Shape(format!(
                    "expected {} residue names, got {}",
                    self.n_atoms,
                    names.len()
                )));
            }
        }
        self.resids = resids;
        self.resnames = resnames;
        Ok(self)
    }

    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn atomic_numbers(&self) -> &[i32] {
        &self.atomic_numbers
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn resids(&self) -> Option<&[i32]> {
        self.resids.as_deref()
    }

    pub fn resnames(&self) -> Option<&[String]> {
        self.resnames.as_deref()
    }
}
