use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TrajError, TrajResult};

pub const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_903;
pub const NM_TO_ANGSTROM: f64 = 10.0;

/// Linear length unit of the numbers stored in a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "angs")]
    Angstrom,
    #[serde(rename = "bohr")]
    Bohr,
    #[serde(rename = "nm")]
    Nanometer,
}

impl LengthUnit {
    /// Multiplier taking a value in this unit to Angstrom.
    pub fn to_angstrom(self) -> f64 {
        match self {
            Self::Angstrom => 1.0,
            Self::Bohr => BOHR_TO_ANGSTROM,
            Self::Nanometer => NM_TO_ANGSTROM,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Angstrom => "angs",
            Self::Bohr => "bohr",
            Self::Nanometer => "nm",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthUnit {
    type Err = TrajError;

    fn from_str(s: &str) -> TrajResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "angs" => Ok(Self::Angstrom),
            "bohr" => Ok(Self::Bohr),
            "nm" => Ok(Self::Nanometer),
            other => Err(TrajError::State(format!(
                "unknown unit '{other}'; supported units are: angs, bohr, nm"
            ))),
        }
    }
}
