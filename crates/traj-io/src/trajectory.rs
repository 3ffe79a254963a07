use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use traj_core::elements::{ElementLookup, PeriodicTable};
use traj_core::error::{TrajError, TrajResult};
use traj_core::frame::Frame;
use traj_core::pbc::PbcBox;
use traj_core::topology::Topology;
use traj_core::units::LengthUnit;

use crate::format::{detect_format, Format, OpenMode};
use crate::options::TrajectoryOptions;
use crate::sections::{MoldenStyle, Section, SectionIndex};
use crate::text::LineReader;
use crate::xtc::{self, CompressedBackend};
use crate::{gro, molden, xyz};

enum Handle {
    Text(LineReader<BufReader<File>>),
    Compressed(Box<dyn CompressedBackend>),
    Writer(BufWriter<File>),
}

/// An open trajectory file, either read frame by frame or appended to.
///
/// Text formats keep explicit byte cursors: `cursor1` points at the next frame
/// and, for Molden geometry optimisations, `cursor2` at the next energy in the
/// `[GEOCONV]` list. Every read seeks to them first and only moves them once
/// the frame is complete.
pub struct Trajectory {
    path: PathBuf,
    format: Format,
    unit: LengthUnit,
    mode: OpenMode,
    handle: Handle,
    cursor1: u64,
    cursor2: Option<u64>,
    sections: Option<SectionIndex>,
    topology: Topology,
    last_frame: i64,
}

impl Trajectory {
    pub fn open(path: impl AsRef<Path>, options: TrajectoryOptions) -> TrajResult<Self> {
        Self::open_with_table(path, options, &PeriodicTable)
    }

    /// Opens `path` resolving element symbols through `table`.
    pub fn open_with_table(
        path: impl AsRef<Path>,
        options: TrajectoryOptions,
        table: &dyn ElementLookup,
    ) -> TrajResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mode = options.mode;
        match (mode, options.symbols.is_some()) {
            (OpenMode::Read, true) => {
                return Err(TrajError::State(
                    "cannot set symbols in read mode".into(),
                ));
            }
            (OpenMode::Write | OpenMode::Append, false) => {
                return Err(TrajError::State(
                    "symbols must be provided in write or append mode".into(),
                ));
            }
            _ => {}
        }

        let format = detect_format(&path, mode, options.format)?;
        let traj = if mode.is_write() {
            Self::open_for_writing(path, format, options, table)?
        } else {
            Self::open_for_reading(path, format, options.unit, table)?
        };
        log::debug!(
            "opened {} as {} (mode {}, units {}, {} atoms)",
            traj.path.display(),
            traj.format,
            traj.mode,
            traj.unit,
            traj.n_atoms()
        );
        Ok(traj)
    }

    fn open_for_reading(
        path: PathBuf,
        format: Format,
        unit_hint: Option<LengthUnit>,
        table: &dyn ElementLookup,
    ) -> TrajResult<Self> {
        let mut unit = unit_hint.unwrap_or_else(|| format.default_unit());
        let mut cursor1 = 0;
        let mut cursor2 = None;
        let mut sections = None;

        let (handle, topology) = match format {
            Format::Xtc => {
                let backend = xtc::open_backend(&path)?;
                let topology = Topology::with_atom_count(backend.n_atoms());
                (Handle::Compressed(backend), topology)
            }
            Format::Xyz | Format::Gro => {
                let mut reader = LineReader::open(&path)?;
                let topology = match format {
                    Format::Gro => gro::read_topology(&mut reader, table)?,
                    _ => xyz::read_topology(&mut reader, table)?,
                };
                reader.rewind()?;
                (Handle::Text(reader), topology)
            }
            Format::Molden => {
                let mut reader = LineReader::open(&path)?;
                let index = SectionIndex::scan(&mut reader)?;
                let found = molden::read_topology(&mut reader, &index, unit_hint, table)?;
                unit = found.unit;
                cursor1 = found.data_start;
                cursor2 = found.energy_cursor;
                sections = Some(index);
                (Handle::Text(reader), found.topology)
            }
        };

        Ok(Self {
            path,
            format,
            unit,
            mode: OpenMode::Read,
            handle,
            cursor1,
            cursor2,
            sections,
            topology,
            last_frame: -1,
        })
    }

    fn open_for_writing(
        path: PathBuf,
        format: Format,
        options: TrajectoryOptions,
        table: &dyn ElementLookup,
    ) -> TrajResult<Self> {
        if !format.is_writable() {
            return Err(TrajError::Unsupported(format!(
                "writing {format} files is not supported"
            )));
        }
        let symbols = options.symbols.unwrap_or_default();
        let topology = Topology::from_symbols(symbols, table)
            .with_residues(options.resids, options.resnames)?;

        let file = match options.mode {
            OpenMode::Append => OpenOptions::new().append(true).create(true).open(&path)?,
            _ => OpenOptions::new().write(true).create_new(true).open(&path)?,
        };

        Ok(Self {
            path,
            format,
            unit: options.unit.unwrap_or_else(|| format.default_unit()),
            mode: options.mode,
            handle: Handle::Writer(BufWriter::new(file)),
            cursor1: 0,
            cursor2: None,
            sections: None,
            topology,
            last_frame: -1,
        })
    }

    /// Reads the next frame, or `Ok(None)` once the data is exhausted.
    ///
    /// With `wrap`, coordinates are folded into the box given by `box_lengths`,
    /// or into the frame's own box for formats that store one.
    ///
    /// An XTC frame whose own box cannot be used for wrapping is still consumed
    /// by the decoder: the error is returned and the next call yields the
    /// following frame. Text formats do not advance on error.
    pub fn read(&mut self, wrap: bool, box_lengths: Option<[f64; 3]>) -> TrajResult<Option<Frame>> {
        if self.mode != OpenMode::Read {
            return Err(TrajError::State(
                "trajectory is not opened for reading".into(),
            ));
        }
        let explicit_box = match (wrap, box_lengths) {
            (true, Some(lengths)) => Some(PbcBox::from_size(lengths)?),
            (true, None) if !self.format.carries_box() => {
                return Err(TrajError::State(
                    "requested PBC, but box information is missing".into(),
                ));
            }
            _ => None,
        };

        let n_atoms = self.topology.n_atoms();
        let factor = self.unit.to_angstrom();
        let format = self.format;
        let style = self.molden_style();

        let (mut frame, cursor1, cursor2) = match &mut self.handle {
            Handle::Compressed(backend) => {
                match xtc::read_frame(backend.as_mut(), n_atoms, factor)? {
                    Some(frame) => (frame, self.cursor1, self.cursor2),
                    None => return Ok(None),
                }
            }
            Handle::Text(reader) => {
                reader.seek_to(self.cursor1)?;
                // GRO titles and XYZ comments may be blank, so only EOF ends those.
                let at_end = match reader.peek_line()? {
                    None => true,
                    Some(line) => match style {
                        Some(MoldenStyle::Geometries) => line.trim_start().starts_with('['),
                        Some(_) => molden::is_block_end(&line),
                        None => false,
                    },
                };
                if at_end {
                    return Ok(None);
                }
                let mut frame = match (format, style) {
                    (Format::Gro, _) => gro::read_frame(reader, n_atoms, factor)?,
                    (Format::Molden, Some(style)) => {
                        molden::read_frame(reader, style, n_atoms, factor)?
                    }
                    _ => xyz::read_frame(reader, n_atoms, xyz::AtomLineLayout::XYZ, factor)?,
                };
                let cursor1 = reader.position()?;
                let cursor2 = match self.cursor2 {
                    Some(at) if style == Some(MoldenStyle::Geometries) => {
                        let (energy, next) = molden::read_energy(reader, at)?;
                        frame.energy = energy;
                        Some(next)
                    }
                    other => other,
                };
                (frame, cursor1, cursor2)
            }
            Handle::Writer(_) => {
                return Err(TrajError::State(
                    "trajectory is not opened for reading".into(),
                ))
            }
        };

        if wrap {
            let pbc = match explicit_box {
                Some(pbc) => pbc,
                None => PbcBox::from_size(frame.box_.lengths()?)?,
            };
            pbc.wrap_all(&mut frame.coords);
        }

        self.cursor1 = cursor1;
        self.cursor2 = cursor2;
        self.last_frame += 1;
        log::trace!(
            "read frame {} from {} ({} atoms)",
            self.last_frame,
            self.path.display(),
            frame.n_atoms()
        );
        Ok(Some(frame))
    }

    pub fn next_frame(&mut self) -> TrajResult<Option<Frame>> {
        self.read(false, None)
    }

    /// Iterates over the remaining frames; stops after the first error.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames {
            traj: self,
            done: false,
        }
    }

    /// Appends one frame.
    ///
    /// `coords` are in Angstrom; `velocities` are written as given and only
    /// stored by GRO. `cell` rows are box vectors in Angstrom.
    pub fn write(
        &mut self,
        coords: &[[f64; 3]],
        velocities: Option<&[[f64; 3]]>,
        cell: Option<&[[f64; 3]; 3]>,
        comment: Option<&str>,
    ) -> TrajResult<()> {
        if !self.mode.is_write() {
            return Err(TrajError::State(
                "trajectory is not opened for writing".into(),
            ));
        }
        let n_atoms = self.topology.n_atoms();
        if coords.len() != n_atoms {
            return Err(TrajError::Shape(format!(
                "expected {n_atoms} coordinate rows, got {}",
                coords.len()
            )));
        }
        if let Some(v) = velocities {
            if v.len() != n_atoms {
                return Err(TrajError::Shape(format!(
                    "expected {n_atoms} velocity rows, got {}",
                    v.len()
                )));
            }
        }
        if comment.is_some_and(|c| c.contains(['\n', '\r'])) {
            return Err(TrajError::State(
                "comment must fit on a single line".into(),
            ));
        }

        let factor = self.unit.to_angstrom();
        let Handle::Writer(out) = &mut self.handle else {
            return Err(TrajError::State(
                "trajectory is not opened for writing".into(),
            ));
        };
        match self.format {
            Format::Xyz => xyz::write_frame(out, self.topology.symbols(), coords, comment, factor)?,
            Format::Gro => {
                let atoms = gro::GroAtoms {
                    names: self.topology.symbols(),
                    resids: self.topology.resids(),
                    resnames: self.topology.resnames(),
                };
                gro::write_frame(out, &atoms, coords, velocities, cell, comment, factor)?;
            }
            other => {
                return Err(TrajError::Unsupported(format!(
                    "writing {other} files is not supported"
                )))
            }
        }
        out.flush()?;
        self.last_frame += 1;
        log::trace!("wrote frame {} to {}", self.last_frame, self.path.display());
        Ok(())
    }

    /// Writes a frame obtained from [`read`](Self::read), box and velocities included.
    pub fn write_frame(&mut self, frame: &Frame) -> TrajResult<()> {
        let cell = frame.box_.matrix();
        self.write(
            &frame.coords,
            frame.velocities.as_deref(),
            cell.as_ref(),
            frame.comment.as_deref(),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn n_atoms(&self) -> usize {
        self.topology.n_atoms()
    }

    /// Index of the last frame read or written; -1 before the first.
    pub fn last_frame(&self) -> i64 {
        self.last_frame
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn symbols(&self) -> &[String] {
        self.topology.symbols()
    }

    pub fn atomic_numbers(&self) -> &[i32] {
        self.topology.atomic_numbers()
    }

    pub fn masses(&self) -> &[f64] {
        self.topology.masses()
    }

    pub fn resids(&self) -> Option<&[i32]> {
        self.topology.resids()
    }

    pub fn resnames(&self) -> Option<&[String]> {
        self.topology.resnames()
    }

    pub fn molden_style(&self) -> Option<MoldenStyle> {
        self.sections.as_ref().map(SectionIndex::style)
    }

    pub fn sections(&self) -> Option<&[Section]> {
        self.sections.as_ref().map(SectionIndex::sections)
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trajectory('{}', format='{}', mode='{}', units='{}')",
            self.path.display(),
            self.format,
            self.mode,
            self.unit
        )
    }
}

impl fmt::Debug for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trajectory")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("unit", &self.unit)
            .field("mode", &self.mode)
            .field("n_atoms", &self.topology.n_atoms())
            .field("last_frame", &self.last_frame)
            .finish()
    }
}

pub struct Frames<'a> {
    traj: &'a mut Trajectory,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = TrajResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.traj.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
