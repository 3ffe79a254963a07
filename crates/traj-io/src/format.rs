use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use traj_core::error::{TrajError, TrajResult};
use traj_core::units::LengthUnit;

const MOLDEN_MAGIC: &str = "[molden format]";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Xyz,
    Molden,
    Gro,
    Xtc,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xyz => "XYZ",
            Self::Molden => "MOLDEN",
            Self::Gro => "GRO",
            Self::Xtc => "XTC",
        }
    }

    pub fn default_unit(self) -> LengthUnit {
        match self {
            Self::Xyz | Self::Molden => LengthUnit::Angstrom,
            Self::Gro | Self::Xtc => LengthUnit::Nanometer,
        }
    }

    /// Whether frames of this format carry their own periodic box.
    pub fn carries_box(self) -> bool {
        matches!(self, Self::Gro | Self::Xtc)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Self::Xyz | Self::Gro)
    }

    fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xyz" => Some(Self::Xyz),
            "gro" => Some(Self::Gro),
            "xtc" => Some(Self::Xtc),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = TrajError;

    fn from_str(s: &str) -> TrajResult<Self> {
        match parse_format_hint(s)? {
            Some(format) => Ok(format),
            None => Err(TrajError::State(
                "GUESS is a detection request, not a format".into(),
            )),
        }
    }
}

/// Parses a caller format string; `GUESS` maps to `None`.
pub fn parse_format_hint(hint: &str) -> TrajResult<Option<Format>> {
    match hint.trim().to_ascii_uppercase().as_str() {
        "XYZ" => Ok(Some(Format::Xyz)),
        "MOLDEN" => Ok(Some(Format::Molden)),
        "GRO" => Ok(Some(Format::Gro)),
        "XTC" => Ok(Some(Format::Xtc)),
        "GUESS" => Ok(None),
        other => Err(TrajError::State(format!(
            "unknown format '{other}'; supported formats are: XYZ, MOLDEN, GRO, XTC, GUESS"
        ))),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenMode {
    #[default]
    #[serde(rename = "r")]
    Read,
    #[serde(rename = "w")]
    Write,
    #[serde(rename = "a")]
    Append,
}

impl OpenMode {
    pub fn as_char(self) -> char {
        match self {
            Self::Read => 'r',
            Self::Write => 'w',
            Self::Append => 'a',
        }
    }

    pub fn is_write(self) -> bool {
        !matches!(self, Self::Read)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for OpenMode {
    type Err = TrajError;

    fn from_str(s: &str) -> TrajResult<Self> {
        match s.trim() {
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            "a" => Ok(Self::Append),
            other => Err(TrajError::State(format!(
                "mode must be 'r', 'w' or 'a', got '{other}'"
            ))),
        }
    }
}

/// Resolves the format of `path`.
///
/// An explicit hint wins. Otherwise the extension decides, and for readable
/// modes the first line is checked for the Molden magic header.
pub fn detect_format(path: &Path, mode: OpenMode, hint: Option<Format>) -> TrajResult<Format> {
    if let Some(format) = hint {
        return Ok(format);
    }
    if let Some(format) = Format::from_extension(path) {
        return Ok(format);
    }
    if mode != OpenMode::Write && path.exists() {
        let mut first = Vec::new();
        BufReader::new(File::open(path)?).read_until(b'\n', &mut first)?;
        if String::from_utf8_lossy(&first)
            .trim()
            .eq_ignore_ascii_case(MOLDEN_MAGIC)
        {
            return Ok(Format::Molden);
        }
    }
    Err(TrajError::FormatUnresolved(format!(
        "cannot guess the format of '{}'",
        path.display()
    )))
}
