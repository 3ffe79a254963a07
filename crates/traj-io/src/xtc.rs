//! Compressed binary (XTC) frames through a pluggable codec.

use std::path::Path;

use traj_core::error::{TrajError, TrajResult};
use traj_core::frame::{Box3, Frame};

/// One decoded frame in file units, borrowed from the codec's buffer.
pub struct RawFrame<'a> {
    pub step: i64,
    pub time_ps: f32,
    pub box_vector: [[f32; 3]; 3],
    pub coords: &'a [[f32; 3]],
}

pub trait CompressedBackend {
    fn n_atoms(&self) -> usize;
    /// Next frame, or `None` at end of file.
    fn read_next(&mut self) -> TrajResult<Option<RawFrame<'_>>>;
}

#[cfg(feature = "xtc")]
pub fn open_backend(path: &Path) -> TrajResult<Box<dyn CompressedBackend>> {
    Ok(Box::new(XdrBackend::open(path)?))
}

#[cfg(not(feature = "xtc"))]
pub fn open_backend(path: &Path) -> TrajResult<Box<dyn CompressedBackend>> {
    Err(TrajError::Unsupported(format!(
        "cannot open '{}': built without XTC support",
        path.display()
    )))
}

/// Converts the next codec frame; coordinates and box are scaled by `factor`.
pub fn read_frame(
    backend: &mut dyn CompressedBackend,
    n_atoms: usize,
    factor: f64,
) -> TrajResult<Option<Frame>> {
    let Some(raw) = backend.read_next()? else {
        return Ok(None);
    };
    if raw.coords.len() != n_atoms {
        return Err(TrajError::CorruptFrame(format!(
            "frame has {} atoms, expected {n_atoms}",
            raw.coords.len()
        )));
    }
    let coords = raw
        .coords
        .iter()
        .map(|p| {
            [
                p[0] as f64 * factor,
                p[1] as f64 * factor,
                p[2] as f64 * factor,
            ]
        })
        .collect();
    let cell = raw
        .box_vector
        .map(|row| row.map(|v| v as f64 * factor));
    Ok(Some(Frame {
        coords,
        box_: Box3::from_matrix(cell),
        step: Some(raw.step),
        time_ps: Some(raw.time_ps),
        ..Frame::default()
    }))
}

#[cfg(feature = "xtc")]
pub use xdr::XdrBackend;

#[cfg(feature = "xtc")]
mod xdr {
    use std::io::{Seek, SeekFrom};
    use std::path::Path;

    use traj_core::error::{TrajError, TrajResult};
    use xdrfile::{Frame, Trajectory, XTCTrajectory};

    use super::{CompressedBackend, RawFrame};

    pub struct XdrBackend {
        traj: XTCTrajectory,
        n_atoms: usize,
        frame: Frame,
    }

    impl XdrBackend {
        /// Opens the file and decodes the first frame as a sanity check, then rewinds.
        pub fn open(path: &Path) -> TrajResult<Self> {
            let mut traj = XTCTrajectory::open_read(path).map_err(map_xtc_err)?;
            let n_atoms = traj.get_num_atoms().map_err(map_xtc_err)?;
            let mut frame = Frame::with_len(n_atoms);
            traj.read(&mut frame).map_err(|err| {
                TrajError::CorruptFrame(format!("could not read first XTC frame: {err}"))
            })?;
            traj.seek(SeekFrom::Start(0))?;
            log::debug!("opened XTC '{}' with {n_atoms} atoms", path.display());
            Ok(Self {
                traj,
                n_atoms,
                frame,
            })
        }
    }

    impl CompressedBackend for XdrBackend {
        fn n_atoms(&self) -> usize {
            self.n_atoms
        }

        fn read_next(&mut self) -> TrajResult<Option<RawFrame<'_>>> {
            match self.traj.read(&mut self.frame) {
                Ok(()) => Ok(Some(RawFrame {
                    step: self.frame.step as i64,
                    time_ps: self.frame.time,
                    box_vector: self.frame.box_vector,
                    coords: &self.frame.coords,
                })),
                Err(err) if err.is_eof() => Ok(None),
                Err(err) => Err(TrajError::CorruptFrame(format!("xtc error: {err}"))),
            }
        }
    }

    fn map_xtc_err(err: xdrfile::Error) -> TrajError {
        TrajError::Parse(format!("xtc error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays frames from memory.
    struct Scripted {
        frames: Vec<(i64, Vec<[f32; 3]>)>,
        next: usize,
    }

    impl CompressedBackend for Scripted {
        fn n_atoms(&self) -> usize {
            self.frames.first().map_or(0, |(_, c)| c.len())
        }

        fn read_next(&mut self) -> TrajResult<Option<RawFrame<'_>>> {
            let Some((step, coords)) = self.frames.get(self.next) else {
                return Ok(None);
            };
            self.next += 1;
            Ok(Some(RawFrame {
                step: *step,
                time_ps: *step as f32 * 0.5,
                box_vector: [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]],
                coords,
            }))
        }
    }

    #[test]
    fn frames_are_scaled_and_stamped() {
        let mut backend = Scripted {
            frames: vec![(0, vec![[0.1, 0.2, 0.3]]), (10, vec![[0.4, 0.5, 0.6]])],
            next: 0,
        };
        let first = read_frame(&mut backend, 1, 10.0).unwrap().unwrap();
        assert_eq!(first.step, Some(0));
        assert!((first.coords[0][2] - 3.0).abs() < 1e-5);
        assert_eq!(
            first.box_,
            Box3::Orthorhombic {
                lx: 10.0,
                ly: 20.0,
                lz: 30.0
            }
        );
        let second = read_frame(&mut backend, 1, 10.0).unwrap().unwrap();
        assert_eq!(second.time_ps, Some(5.0));
        assert!(read_frame(&mut backend, 1, 10.0).unwrap().is_none());
    }

    #[test]
    fn atom_count_change_is_corrupt() {
        let mut backend = Scripted {
            frames: vec![(0, vec![[0.0; 3]; 2])],
            next: 0,
        };
        assert!(matches!(
            read_frame(&mut backend, 3, 10.0).unwrap_err(),
            TrajError::CorruptFrame(_)
        ));
    }

    #[cfg(feature = "xtc")]
    #[test]
    fn xdr_backend_starts_at_first_frame() {
        use xdrfile::{FileMode, Frame as XdrFrame, Trajectory, XTCTrajectory};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.xtc");
        let mut traj = XTCTrajectory::open(path.clone(), FileMode::Write).unwrap();
        let mut frame = XdrFrame::with_len(1);
        frame.box_vector = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        frame.coords[0] = [0.1, 0.0, 0.0];
        traj.write(&frame).unwrap();
        frame.step = 1;
        frame.time = 1.0;
        frame.coords[0] = [0.2, 0.0, 0.0];
        traj.write(&frame).unwrap();
        traj.flush().unwrap();
        drop(traj);

        let mut backend = open_backend(&path).unwrap();
        assert_eq!(backend.n_atoms(), 1);
        let first = read_frame(backend.as_mut(), 1, 10.0).unwrap().unwrap();
        assert!((first.coords[0][0] - 1.0).abs() < 1e-5);
        let second = read_frame(backend.as_mut(), 1, 10.0).unwrap().unwrap();
        assert_eq!(second.step, Some(1));
        assert!(read_frame(backend.as_mut(), 1, 10.0).unwrap().is_none());
    }
}
