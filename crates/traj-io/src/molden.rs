//! Molden files: `[GEOMETRIES]`, `[Atoms]` and `[FR-COORD]` coordinate sections.

use std::io::{BufRead, Seek};

use traj_core::elements::ElementLookup;
use traj_core::error::{TrajError, TrajResult};
use traj_core::frame::Frame;
use traj_core::topology::Topology;
use traj_core::units::LengthUnit;

use crate::sections::{MoldenStyle, Section, SectionIndex};
use crate::text::LineReader;
use crate::xyz::{self, AtomLineLayout};

pub struct MoldenTopology {
    pub topology: Topology,
    /// Offset of the first frame.
    pub data_start: u64,
    /// Offset of the first value in the `[GEOCONV]` energy list, if any.
    pub energy_cursor: Option<u64>,
    pub unit: LengthUnit,
}

pub fn read_topology<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    index: &SectionIndex,
    unit_hint: Option<LengthUnit>,
    table: &dyn ElementLookup,
) -> TrajResult<MoldenTopology> {
    let style = index.style();
    let section = index.coordinate_section()?;
    log::debug!(
        "reading Molden topology from [{}] at byte {}",
        section.name,
        section.offset
    );
    match style {
        MoldenStyle::Geometries => {
            if section.header_args().contains("zmat") {
                return Err(TrajError::Unsupported(
                    "Z-matrix geometries are not supported".into(),
                ));
            }
            reader.seek_to(section.offset)?;
            let topology = xyz::read_topology(reader, table)?;
            let energy_cursor = match index.get("geoconv") {
                Some(geoconv) => find_energy_list(reader, geoconv)?,
                None => None,
            };
            Ok(MoldenTopology {
                topology,
                data_start: section.offset,
                energy_cursor,
                unit: unit_hint.unwrap_or(LengthUnit::Angstrom),
            })
        }
        MoldenStyle::Atoms | MoldenStyle::FrCoord => {
            let unit = match style {
                MoldenStyle::Atoms => atoms_unit(section, unit_hint)?,
                _ => unit_hint.unwrap_or(LengthUnit::Bohr),
            };
            let topology = read_atom_block(reader, section, style, table)?;
            Ok(MoldenTopology {
                topology,
                data_start: section.offset,
                energy_cursor: None,
                unit,
            })
        }
        MoldenStyle::Unknown => Err(TrajError::Parse("unidentified Molden style".into())),
    }
}

/// `[Atoms] Angs` / `[Atoms] AU`; a bare header keeps the caller's unit.
fn atoms_unit(section: &Section, unit_hint: Option<LengthUnit>) -> TrajResult<LengthUnit> {
    match section.header_args() {
        "angs" => Ok(LengthUnit::Angstrom),
        "au" => Ok(LengthUnit::Bohr),
        "" => Ok(unit_hint.unwrap_or(LengthUnit::Angstrom)),
        other => Err(TrajError::Parse(format!(
            "unrecognized units '{other}' in [atoms] header"
        ))),
    }
}

pub(crate) fn is_block_end(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('[')
}

fn read_atom_block<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    section: &Section,
    style: MoldenStyle,
    table: &dyn ElementLookup,
) -> TrajResult<Topology> {
    reader.seek_to(section.offset)?;
    let mut n_atoms = 0usize;
    while let Some(line) = reader.read_line()? {
        if is_block_end(&line) {
            break;
        }
        n_atoms += 1;
    }

    reader.seek_to(section.offset)?;
    let mut symbols = Vec::with_capacity(n_atoms);
    let mut numbers = Vec::with_capacity(n_atoms);
    for i in 0..n_atoms {
        let line = reader.expect_line("atom line")?;
        let mut tokens = line.split_whitespace();
        let symbol = tokens
            .next()
            .ok_or_else(|| TrajError::Parse(format!("missing symbol for atom {}", i + 1)))?;
        symbols.push(symbol.to_string());
        if style == MoldenStyle::Atoms {
            let number = tokens
                .nth(1)
                .and_then(|t| t.parse::<i32>().ok())
                .ok_or_else(|| {
                    TrajError::Parse(format!("missing atomic number for atom {}", i + 1))
                })?;
            numbers.push(number);
        }
    }

    if style == MoldenStyle::Atoms {
        Topology::from_numbered_symbols(symbols, numbers, table)
    } else {
        Ok(Topology::from_symbols(symbols, table))
    }
}

/// Locates the value list following the `energy` keyword inside `[GEOCONV]`.
fn find_energy_list<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    geoconv: &Section,
) -> TrajResult<Option<u64>> {
    reader.seek_to(geoconv.offset)?;
    while let Some(line) = reader.read_line()? {
        let line = line.trim();
        if line.starts_with('[') {
            break;
        }
        if line.eq_ignore_ascii_case("energy") {
            return Ok(Some(reader.position()?));
        }
    }
    Ok(None)
}

pub fn layout_for(style: MoldenStyle) -> TrajResult<AtomLineLayout> {
    match style {
        MoldenStyle::Geometries => Ok(AtomLineLayout::XYZ),
        MoldenStyle::Atoms => Ok(AtomLineLayout::MOLDEN_ATOMS),
        MoldenStyle::FrCoord => Ok(AtomLineLayout::MOLDEN_FR_COORD),
        MoldenStyle::Unknown => Err(TrajError::Parse("unidentified Molden style".into())),
    }
}

pub fn read_frame<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    style: MoldenStyle,
    n_atoms: usize,
    factor: f64,
) -> TrajResult<Frame> {
    xyz::read_frame(reader, n_atoms, layout_for(style)?, factor)
}

/// Energy at `cursor`, and where the next one starts. A non-numeric line ends the list.
pub fn read_energy<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    cursor: u64,
) -> TrajResult<(Option<f64>, u64)> {
    reader.seek_to(cursor)?;
    let Some(line) = reader.read_line()? else {
        return Ok((None, cursor));
    };
    match line.trim().parse::<f64>() {
        Ok(energy) => Ok((Some(energy), reader.position()?)),
        Err(_) => Ok((None, cursor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use traj_core::elements::PeriodicTable;
    use traj_core::units::BOHR_TO_ANGSTROM;

    fn setup(text: &str) -> (LineReader<Cursor<Vec<u8>>>, SectionIndex) {
        let mut reader = LineReader::new(Cursor::new(text.as_bytes().to_vec()));
        let index = SectionIndex::scan(&mut reader).unwrap();
        (reader, index)
    }

    const OPT: &str = "[Molden Format]\n\
[GEOCONV]\n\
energy\n\
-76.01\n\
-76.02\n\
max-force\n\
0.1\n\
0.01\n\
[GEOMETRIES] XYZ\n\
2\n\
step 1\n\
O 0.0 0.0 0.0\n\
H 0.0 0.0 1.0\n\
2\n\
step 2\n\
O 0.0 0.0 0.0\n\
H 0.0 0.0 0.97\n";

    #[test]
    fn geometries_topology_and_energies() {
        let (mut reader, index) = setup(OPT);
        let topo = read_topology(&mut reader, &index, None, &PeriodicTable).unwrap();
        assert_eq!(topo.topology.symbols(), &["O", "H"]);
        assert_eq!(topo.unit, LengthUnit::Angstrom);
        assert_eq!(topo.data_start, index.get("geometries").unwrap().offset);

        let cursor = topo.energy_cursor.unwrap();
        let (e1, cursor) = read_energy(&mut reader, cursor).unwrap();
        let (e2, cursor) = read_energy(&mut reader, cursor).unwrap();
        let (e3, end) = read_energy(&mut reader, cursor).unwrap();
        assert_eq!(e1, Some(-76.01));
        assert_eq!(e2, Some(-76.02));
        assert_eq!(e3, None);
        assert_eq!(end, cursor);
    }

    #[test]
    fn zmat_geometries_are_unsupported() {
        let (mut reader, index) = setup("[Molden Format]\n[GEOMETRIES] ZMAT\n1\n\nC\n");
        assert!(matches!(
            read_topology(&mut reader, &index, None, &PeriodicTable).err(),
            Some(TrajError::Unsupported(_))
        ));
    }

    #[test]
    fn atoms_section_reads_numbers_and_unit() {
        let text = "[Molden Format]\n[Atoms] AU\nC 1 6 0.0 0.0 0.0\nX 2 0 1.0 0.0 0.0\n\n[GTO]\n";
        let (mut reader, index) = setup(text);
        let topo = read_topology(&mut reader, &index, None, &PeriodicTable).unwrap();
        assert_eq!(topo.unit, LengthUnit::Bohr);
        assert_eq!(topo.topology.n_atoms(), 2);
        assert_eq!(topo.topology.atomic_numbers(), &[6, 0]);

        reader.seek_to(topo.data_start).unwrap();
        let frame = read_frame(
            &mut reader,
            MoldenStyle::Atoms,
            2,
            topo.unit.to_angstrom(),
        )
        .unwrap();
        assert!((frame.coords[1][0] - BOHR_TO_ANGSTROM).abs() < 1e-12);
    }

    #[test]
    fn unknown_atoms_unit_is_rejected() {
        let (mut reader, index) = setup("[Molden Format]\n[Atoms] pm\nC 1 6 0 0 0\n");
        assert!(matches!(
            read_topology(&mut reader, &index, None, &PeriodicTable).err(),
            Some(TrajError::Parse(_))
        ));
    }

    #[test]
    fn fr_coord_defaults_to_bohr_unless_overridden() {
        let text = "[Molden Format]\n[FR-COORD]\no 0.0 0.0 0.0\nh 0.0 0.0 1.8\n[FR-NORM-COORD]\n";
        let (mut reader, index) = setup(text);
        let topo = read_topology(&mut reader, &index, None, &PeriodicTable).unwrap();
        assert_eq!(topo.unit, LengthUnit::Bohr);
        assert_eq!(topo.topology.atomic_numbers(), &[8, 1]);

        let topo =
            read_topology(&mut reader, &index, Some(LengthUnit::Angstrom), &PeriodicTable).unwrap();
        assert_eq!(topo.unit, LengthUnit::Angstrom);
    }
}
