use crate::error::{TrajError, TrajResult};

/// Orthogonal periodic box with its origin at zero; wrapped points land in `[0, length)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PbcBox {
    pub length: [f64; 3],
}

impl PbcBox {
    pub fn from_size(size: [f64; 3]) -> TrajResult<Self> {
        if size.iter().any(|&v| !v.is_finite() || v <= 0.0) {
            return Err(TrajError::State(format!(
                "pbc box size must be positive, got {size:?}"
            )));
        }
        Ok(Self { length: size })
    }

    pub fn wrap(&self, point: [f64; 3]) -> [f64; 3] {
        [
            point[0].rem_euclid(self.length[0]),
            point[1].rem_euclid(self.length[1]),
            point[2].rem_euclid(self.length[2]),
        ]
    }

    pub fn wrap_all(&self, coords: &mut [[f64; 3]]) {
        for point in coords.iter_mut() {
            *point = self.wrap(*point);
        }
    }
}
