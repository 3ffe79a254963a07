use std::io::{BufRead, Seek, Write};

use traj_core::elements::ElementLookup;
use traj_core::error::{TrajError, TrajResult};
use traj_core::frame::Frame;
use traj_core::topology::Topology;

use crate::text::{parse_count, parse_f64, LineReader};

/// How a block of atom lines is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtomLineLayout {
    /// Block starts with an atom-count line and a comment line.
    pub header: bool,
    /// Tokens between the symbol and the coordinates.
    pub skip: usize,
}

impl AtomLineLayout {
    pub const XYZ: Self = Self {
        header: true,
        skip: 0,
    };
    /// `symbol index atomic_number x y z`
    pub const MOLDEN_ATOMS: Self = Self {
        header: false,
        skip: 2,
    };
    pub const MOLDEN_FR_COORD: Self = Self {
        header: false,
        skip: 0,
    };
}

/// Reads the symbols of one XYZ block starting at the current position.
pub fn read_topology<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    table: &dyn ElementLookup,
) -> TrajResult<Topology> {
    let count_line = reader.expect_line("atom count")?;
    let n_atoms = parse_count(&count_line, "atom number")?;
    reader.expect_line("comment line")?;
    // grown per line: the count is unchecked until every atom line is read
    let mut symbols = Vec::new();
    for i in 0..n_atoms {
        let line = reader.expect_line("atom line")?;
        let symbol = line
            .split_whitespace()
            .next()
            .ok_or_else(|| TrajError::Parse(format!("missing symbol for atom {}", i + 1)))?;
        symbols.push(symbol.to_string());
    }
    Ok(Topology::from_symbols(symbols, table))
}

/// Reads one frame of `n_atoms` atoms, scaling coordinates by `factor`.
///
/// A fourth value after the coordinates is the per-atom extra scalar. Atom 0
/// decides whether the frame has one; every later atom must agree.
pub fn read_frame<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    n_atoms: usize,
    layout: AtomLineLayout,
    factor: f64,
) -> TrajResult<Frame> {
    let mut comment = None;
    if layout.header {
        let count_line = reader.expect_line("atom count")?;
        let nat = parse_count(&count_line, "atom number")?;
        if nat != n_atoms {
            return Err(TrajError::Parse(format!(
                "number of atoms different than expected: {nat} vs {n_atoms}"
            )));
        }
        comment = Some(reader.expect_line("comment line")?);
    }

    let mut coords = Vec::with_capacity(n_atoms);
    let mut extra: Option<Vec<f64>> = None;
    for pos in 0..n_atoms {
        let line = reader.expect_line("atom line")?;
        let mut tokens = line.split_whitespace().skip(1 + layout.skip);
        let mut xyz = [0.0f64; 3];
        for (axis, value) in xyz.iter_mut().enumerate() {
            let token = tokens.next().ok_or_else(|| {
                TrajError::Parse(format!("missing coordinate {axis} for atom {}", pos + 1))
            })?;
            *value = parse_f64(token, "coordinate")? * factor;
        }
        coords.push(xyz);

        let value = tokens
            .next()
            .map(|token| parse_f64(token, "extra value"))
            .transpose()?;
        if pos == 0 {
            if let Some(v) = value {
                let mut values = Vec::with_capacity(n_atoms);
                values.push(v);
                extra = Some(values);
            }
            continue;
        }
        match (value, extra.as_mut()) {
            (Some(v), Some(values)) => values.push(v),
            (Some(_), None) => {
                return Err(TrajError::Parse(format!(
                    "unexpected extra data at atom {}",
                    pos + 1
                )));
            }
            (None, Some(_)) => {
                return Err(TrajError::Parse(format!(
                    "inconsistent extra data: atom {} has none",
                    pos + 1
                )));
            }
            (None, None) => {}
        }
    }

    Ok(Frame {
        coords,
        extra,
        comment,
        ..Frame::default()
    })
}

/// Writes one XYZ block; coordinates are divided by `factor`.
pub fn write_frame<W: Write>(
    out: &mut W,
    symbols: &[String],
    coords: &[[f64; 3]],
    comment: Option<&str>,
    factor: f64,
) -> TrajResult<()> {
    writeln!(out, "{}", coords.len())?;
    writeln!(out, "{}", comment.unwrap_or(""))?;
    for (symbol, xyz) in symbols.iter().zip(coords) {
        writeln!(
            out,
            "{} {} {} {}",
            symbol,
            space_signed(xyz[0] / factor, 12, 8),
            space_signed(xyz[1] / factor, 12, 8),
            space_signed(xyz[2] / factor, 12, 8)
        )?;
    }
    Ok(())
}

/// Fixed-point with a blank in place of the `+` sign, right-aligned to `width`.
fn space_signed(value: f64, width: usize, precision: usize) -> String {
    let digits = format!("{value:.precision$}");
    let signed = if digits.starts_with('-') {
        digits
    } else {
        format!(" {digits}")
    };
    format!("{signed:>width$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use traj_core::elements::PeriodicTable;

    fn reader(text: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(text.as_bytes().to_vec()))
    }

    const WATER: &str = "3\nframe0\nO 0.0 0.0 0.0\nH 0.96 0.0 0.0\nH -0.24 0.93 0.0\n";

    #[test]
    fn topology_from_symbols() {
        let mut r = reader(WATER);
        let topo = read_topology(&mut r, &PeriodicTable).unwrap();
        assert_eq!(topo.n_atoms(), 3);
        assert_eq!(topo.symbols(), &["O", "H", "H"]);
        assert_eq!(topo.atomic_numbers(), &[8, 1, 1]);
    }

    #[test]
    fn bad_count_line_is_parse_error() {
        let mut r = reader("three\n\n");
        assert!(matches!(
            read_topology(&mut r, &PeriodicTable).unwrap_err(),
            TrajError::Parse(_)
        ));
    }

    #[test]
    fn oversized_count_fails_on_missing_lines() {
        let mut r = reader("100000000000000\ncomment\nC 0 0 0\n");
        assert!(matches!(
            read_topology(&mut r, &PeriodicTable).unwrap_err(),
            TrajError::Parse(_)
        ));
    }

    #[test]
    fn frame_scales_and_keeps_comment() {
        let mut r = reader(WATER);
        let frame = read_frame(&mut r, 3, AtomLineLayout::XYZ, 10.0).unwrap();
        assert_eq!(frame.comment.as_deref(), Some("frame0"));
        assert!((frame.coords[1][0] - 9.6).abs() < 1e-12);
        assert!(frame.extra.is_none());
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let mut r = reader(WATER);
        assert!(read_frame(&mut r, 2, AtomLineLayout::XYZ, 1.0).is_err());
    }

    #[test]
    fn extra_column_follows_first_atom() {
        let mut r = reader("2\n\nNa 0 0 0 1.0\nCl 1 0 0 -1.0\n");
        let frame = read_frame(&mut r, 2, AtomLineLayout::XYZ, 1.0).unwrap();
        assert_eq!(frame.extra, Some(vec![1.0, -1.0]));

        let mut r = reader("2\n\nNa 0 0 0 1.0\nCl 1 0 0\n");
        assert!(read_frame(&mut r, 2, AtomLineLayout::XYZ, 1.0).is_err());

        // only the last atom carries a value
        let mut r = reader("2\n\nNa 0 0 0\nCl 1 0 0 -1.0\n");
        assert!(read_frame(&mut r, 2, AtomLineLayout::XYZ, 1.0).is_err());
    }

    #[test]
    fn missing_coordinate_is_parse_error() {
        let mut r = reader("1\n\nC 0.0 1.0\n");
        assert!(matches!(
            read_frame(&mut r, 1, AtomLineLayout::XYZ, 1.0).unwrap_err(),
            TrajError::Parse(_)
        ));
    }

    #[test]
    fn molden_atoms_skip_index_and_number() {
        let mut r = reader("C 1 6 0.5 1.5 2.5\nO 2 8 0.0 0.0 1.2\n");
        let frame = read_frame(&mut r, 2, AtomLineLayout::MOLDEN_ATOMS, 2.0).unwrap();
        assert_eq!(frame.coords[0], [1.0, 3.0, 5.0]);
        assert!(frame.comment.is_none());
    }

    #[test]
    fn write_uses_space_sign_columns() {
        let mut out = Vec::new();
        let symbols = vec!["C".to_string(), "O".to_string()];
        write_frame(
            &mut out,
            &symbols,
            &[[1.0, -2.5, 0.0], [123.456789, 0.0, 0.0]],
            Some("test"),
            1.0,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2");
        assert_eq!(lines[1], "test");
        assert_eq!(lines[2], "C   1.00000000  -2.50000000   0.00000000");
        assert_eq!(lines[3], "O  123.45678900   0.00000000   0.00000000");
    }
}
