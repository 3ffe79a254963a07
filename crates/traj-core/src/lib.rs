#![forbid(unsafe_code)]

pub mod elements;
pub mod error;
pub mod frame;
pub mod pbc;
pub mod topology;
pub mod units;

pub use elements::{
    infer_element_from_atom_name, mass_for_element, normalize_element, ElementInfo,
    ElementLookup, PeriodicTable, UNKNOWN_ATOMIC_NUMBER, UNKNOWN_MASS,
};
pub use error::{TrajError, TrajResult};
pub use frame::{Box3, Frame};
pub use pbc::PbcBox;
pub use topology::Topology;
pub use units::{LengthUnit, BOHR_TO_ANGSTROM, NM_TO_ANGSTROM};
