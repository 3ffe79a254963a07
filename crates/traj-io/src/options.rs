use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use traj_core::error::{TrajError, TrajResult};
use traj_core::units::LengthUnit;

use crate::format::{Format, OpenMode};

/// Everything a caller can decide when opening a trajectory.
///
/// `format: None` asks for detection; `unit: None` takes the format default.
/// Symbols and residues are only meaningful for writing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrajectoryOptions {
    pub mode: OpenMode,
    pub format: Option<Format>,
    pub unit: Option<LengthUnit>,
    pub symbols: Option<Vec<String>>,
    pub resids: Option<Vec<i32>>,
    pub resnames: Option<Vec<String>>,
}

impl TrajectoryOptions {
    pub fn read() -> Self {
        Self::default()
    }

    pub fn write<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            mode: OpenMode::Write,
            symbols: Some(symbols.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn append<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            mode: OpenMode::Append,
            ..Self::write(symbols)
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_unit(mut self, unit: LengthUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_resids(mut self, resids: Vec<i32>) -> Self {
        self.resids = Some(resids);
        self
    }

    pub fn with_resnames<S: Into<String>>(mut self, resnames: impl IntoIterator<Item = S>) -> Self {
        self.resnames = Some(resnames.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_json_str(text: &str) -> TrajResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| TrajError::Parse(format!("invalid trajectory options: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TrajResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}
