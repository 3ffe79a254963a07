use crate::error::{TrajError, TrajResult};

const ORTHO_TOL: f64 = 1e-5;

/// Periodic cell of one frame, in Angstrom.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Box3 {
    #[default]
    None,
    Orthorhombic { lx: f64, ly: f64, lz: f64 },
    /// Row-major cell vectors.
    Triclinic { m: [f64; 9] },
}

impl Box3 {
    /// Classifies a 3x3 cell matrix; an all-zero matrix means "no box".
    pub fn from_matrix(cell: [[f64; 3]; 3]) -> Self {
        let m = [
            cell[0][0], cell[0][1], cell[0][2], cell[1][0], cell[1][1], cell[1][2], cell[2][0],
            cell[2][1], cell[2][2],
        ];
        if m.iter().all(|v| *v == 0.0) {
            return Box3::None;
        }
        let is_orth = m[1].abs() < ORTHO_TOL
            && m[2].abs() < ORTHO_TOL
            && m[3].abs() < ORTHO_TOL
            && m[5].abs() < ORTHO_TOL
            && m[6].abs() < ORTHO_TOL
            && m[7].abs() < ORTHO_TOL;
        if is_orth {
            Box3::Orthorhombic {
                lx: m[0],
                ly: m[4],
                lz: m[8],
            }
        } else {
            Box3::Triclinic { m }
        }
    }

    pub fn matrix(&self) -> Option<[[f64; 3]; 3]> {
        match *self {
            Box3::None => None,
            Box3::Orthorhombic { lx, ly, lz } => {
                Some([[lx, 0.0, 0.0], [0.0, ly, 0.0], [0.0, 0.0, lz]])
            }
            Box3::Triclinic { m } => Some([[m[0], m[1], m[2]], [m[3], m[4], m[5]], [m[6], m[7], m[8]]]),
        }
    }

    /// Edge lengths used for wrapping; triclinic cells contribute their diagonal.
    pub fn lengths(&self) -> TrajResult<[f64; 3]> {
        match *self {
            Box3::Orthorhombic { lx, ly, lz } => Ok([lx, ly, lz]),
            Box3::Triclinic { m } => Ok([m[0], m[4], m[8]]),
            Box3::None => Err(TrajError::State(
                "requested PBC, but box information is missing".into(),
            )),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Box3::None)
    }
}

/// One time step. Coordinates are in Angstrom whatever the file unit was.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub coords: Vec<[f64; 3]>,
    pub velocities: Option<Vec<[f64; 3]>>,
    pub box_: Box3,
    /// Per-atom scalar from a fourth column (usually partial charges).
    pub extra: Option<Vec<f64>>,
    pub comment: Option<String>,
    pub step: Option<i64>,
    pub time_ps: Option<f32>,
    pub energy: Option<f64>,
}

impl Frame {
    pub fn with_coords(coords: Vec<[f64; 3]>) -> Self {
        Self {
            coords,
            ..Self::default()
        }
    }

    pub fn n_atoms(&self) -> usize {
        self.coords.len()
    }
}
