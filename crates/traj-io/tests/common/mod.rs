#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Scratch directory removed when the test ends.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create scratch dir"),
        }
    }

    pub fn temp_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn with_text(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path(name);
        write_text(&path, contents);
        path
    }
}

pub fn write_text(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write temp file");
}

pub fn assert_close(a: [f64; 3], b: [f64; 3], tol: f64) {
    for k in 0..3 {
        assert!(
            (a[k] - b[k]).abs() <= tol,
            "component {k}: {} vs {} (tol {tol})",
            a[k],
            b[k]
        );
    }
}

pub const WATER_XYZ: &str = "3\nframe0\nO 0.000 0.000 0.000\nH 0.957 0.000 0.000\nH -0.240 0.927 0.000\n";

pub const WATER_GRO: &str = "water t= 0.0\n    3\n    1SOL     OW    1   0.126   1.624   1.679  0.1000 -0.2000  0.3000\n    1SOL    HW1    2   0.190   1.661   1.747  0.0100  0.0200  0.0300\n    1SOL    HW2    3   0.177   1.568   1.613 -0.0100 -0.0200 -0.0300\n   1.86206   1.86206   1.86206\n";

pub const MOLDEN_OPT: &str = "[Molden Format]\n[GEOCONV]\nenergy\n-76.0100\n-76.0200\nmax-force\n0.1\n0.01\n[GEOMETRIES] XYZ\n2\nstep 1\nO 0.0 0.0 0.0\nH 0.0 0.0 1.0\n2\nstep 2\nO 0.0 0.0 0.0\nH 0.0 0.0 0.97\n[ATOMS] AU\nO 1 8 0.0 0.0 0.0\nH 2 1 0.0 0.0 1.8\n";
