//! Byte-offset index of `[name]` sections in a Molden file.

use std::io::{BufRead, Seek};

use traj_core::error::{TrajError, TrajResult};

use crate::text::LineReader;

pub const MAX_SECTIONS: usize = 50;

/// Which section supplies coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoldenStyle {
    /// `[GEOMETRIES]`: a sequence of XYZ blocks.
    Geometries,
    /// `[Atoms]`: one frame, `symbol index number x y z` lines.
    Atoms,
    /// `[FR-COORD]`: one frame, `symbol x y z` lines in Bohr.
    FrCoord,
    Unknown,
}

impl MoldenStyle {
    pub fn section_name(self) -> Option<&'static str> {
        match self {
            Self::Geometries => Some("geometries"),
            Self::Atoms => Some("atoms"),
            Self::FrCoord => Some("fr-coord"),
            Self::Unknown => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    /// Lowercased name between the brackets.
    pub name: String,
    /// Lowercased, stripped header line, kept for trailing tokens (`angs`, `zmat`).
    pub header: String,
    pub header_offset: u64,
    /// First byte after the header line.
    pub offset: u64,
}

impl Section {
    /// Tokens after the closing bracket.
    pub fn header_args(&self) -> &str {
        self.header
            .split_once(']')
            .map(|(_, rest)| rest.trim())
            .unwrap_or("")
    }
}

#[derive(Clone, Debug)]
pub struct SectionIndex {
    sections: Vec<Section>,
    style: MoldenStyle,
}

impl SectionIndex {
    /// Scans the whole file once; the reader is rewound to the start afterwards.
    pub fn scan<R: BufRead + Seek>(reader: &mut LineReader<R>) -> TrajResult<Self> {
        reader.rewind()?;
        let mut sections = Vec::new();
        let mut style = MoldenStyle::Unknown;
        loop {
            let header_offset = reader.position()?;
            let Some(line) = reader.read_line()? else {
                break;
            };
            let header = line.trim().to_ascii_lowercase();
            if !header.starts_with('[') {
                continue;
            }
            let name = match header.find(']') {
                Some(end) => header[1..end].trim().to_string(),
                None => header[1..].trim().to_string(),
            };
            if sections.len() == MAX_SECTIONS {
                return Err(TrajError::Parse(format!(
                    "more than {MAX_SECTIONS} sections in Molden file"
                )));
            }
            style = match (name.as_str(), style) {
                ("geometries", _) => MoldenStyle::Geometries,
                ("atoms", MoldenStyle::FrCoord | MoldenStyle::Unknown) => MoldenStyle::Atoms,
                ("fr-coord", MoldenStyle::Unknown) => MoldenStyle::FrCoord,
                (_, current) => current,
            };
            let offset = reader.position()?;
            sections.push(Section {
                name,
                header,
                header_offset,
                offset,
            });
        }
        reader.rewind()?;
        log::debug!(
            "indexed {} Molden sections, coordinate style {:?}",
            sections.len(),
            style
        );
        Ok(Self { sections, style })
    }

    /// First section called `name` (lowercase).
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn style(&self) -> MoldenStyle {
        self.style
    }

    pub fn coordinate_section(&self) -> TrajResult<&Section> {
        let name = self.style.section_name().ok_or_else(|| {
            TrajError::Parse("unidentified Molden style: no geometry or atom section".into())
        })?;
        self.get(name)
            .ok_or_else(|| TrajError::Parse(format!("could not find section [{name}]")))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn index(text: &str) -> (SectionIndex, LineReader<Cursor<Vec<u8>>>) {
        let mut reader = LineReader::new(Cursor::new(text.as_bytes().to_vec()));
        let idx = SectionIndex::scan(&mut reader).unwrap();
        (idx, reader)
    }

    #[test]
    fn records_offsets_and_rewinds() {
        let text = "[Molden Format]\n[Atoms] Angs\nC 1 6 0 0 0\n";
        let (idx, mut reader) = index(text);
        assert_eq!(reader.position().unwrap(), 0);
        assert_eq!(idx.sections().len(), 2);
        let atoms = idx.get("atoms").unwrap();
        assert_eq!(atoms.header_offset, 16);
        assert_eq!(atoms.offset, 29);
        assert_eq!(atoms.header_args(), "angs");
        reader.seek_to(atoms.offset).unwrap();
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("C 1 6 0 0 0"));
    }

    #[test]
    fn geometries_take_precedence_in_any_order() {
        let text = "[Molden Format]\n[FR-COORD]\n[Atoms] AU\n[GEOMETRIES] XYZ\n[ATOMS] angs\n";
        let (idx, _) = index(text);
        assert_eq!(idx.style(), MoldenStyle::Geometries);
        assert_eq!(idx.coordinate_section().unwrap().name, "geometries");
    }

    #[test]
    fn atoms_beat_fr_coord() {
        let (idx, _) = index("[Molden Format]\n[Atoms] AU\n[FR-COORD]\n");
        assert_eq!(idx.style(), MoldenStyle::Atoms);
        let (idx, _) = index("[Molden Format]\n[FR-COORD]\n");
        assert_eq!(idx.style(), MoldenStyle::FrCoord);
    }

    #[test]
    fn unknown_style_has_no_coordinate_section() {
        let (idx, _) = index("[Molden Format]\n[GTO]\n");
        assert_eq!(idx.style(), MoldenStyle::Unknown);
        assert!(matches!(
            idx.coordinate_section().unwrap_err(),
            TrajError::Parse(_)
        ));
    }

    #[test]
    fn too_many_sections_is_an_error() {
        let text: String = (0..=MAX_SECTIONS).map(|i| format!("[s{i}]\n")).collect();
        let mut reader = LineReader::new(Cursor::new(text.into_bytes()));
        assert!(matches!(
            SectionIndex::scan(&mut reader).unwrap_err(),
            TrajError::Parse(_)
        ));
    }
}
