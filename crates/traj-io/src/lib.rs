//! Readers and writers for molecular trajectories: XYZ, Molden, GRO and XTC.
//!
//! [`Trajectory`] is the entry point. Coordinates always come out in Angstrom;
//! the file unit only matters on disk.

pub mod format;
pub mod gro;
pub mod molden;
pub mod options;
pub mod sections;
pub mod text;
pub mod trajectory;
pub mod xtc;
pub mod xyz;

pub use format::{detect_format, parse_format_hint, Format, OpenMode};
pub use options::TrajectoryOptions;
pub use sections::{MoldenStyle, Section, SectionIndex};
pub use trajectory::{Frames, Trajectory};
pub use xtc::CompressedBackend;

pub use traj_core::{Box3, Frame, LengthUnit, TrajError, TrajResult};
