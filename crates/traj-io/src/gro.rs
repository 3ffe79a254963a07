use std::io::{BufRead, Seek, Write};

use traj_core::elements::{infer_element_from_atom_name, ElementLookup};
use traj_core::error::{TrajError, TrajResult};
use traj_core::frame::{Box3, Frame};
use traj_core::topology::Topology;

use crate::text::{parse_column_f64, parse_count, parse_f64, slice_trim_opt, LineReader};

/// Atom lines longer than this carry velocity columns.
const VELOCITY_LINE_LEN: usize = 50;
const OFF_DIAGONAL_EPS: f64 = 1e-6;
/// Off-diagonal order on the box line: v1(y) v1(z) v2(x) v2(z) v3(x) v3(y).
const OFF_DIAGONAL: [(usize, usize); 6] = [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)];

/// Reads residue ids, residue names and atom names from the first frame.
///
/// The atom names are kept as symbols; atomic numbers and masses come from
/// the element each name implies (`OW` -> O).
pub fn read_topology<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    table: &dyn ElementLookup,
) -> TrajResult<Topology> {
    reader.expect_line("title line")?;
    let count_line = reader.expect_line("atom count")?;
    let n_atoms = parse_count(&count_line, "atom number")?;

    let mut resids = Vec::new();
    let mut resnames = Vec::new();
    let mut names = Vec::new();
    let mut elements = Vec::new();
    for i in 0..n_atoms {
        let line = reader.expect_line("atom line")?;
        let resid = slice_trim_opt(&line, 0, 5)
            .and_then(|s| s.parse::<i32>().ok())
            .ok_or_else(|| TrajError::Parse(format!("invalid residue id on atom {}", i + 1)))?;
        let resname = slice_trim_opt(&line, 5, 10).unwrap_or("");
        let name = slice_trim_opt(&line, 10, 15)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TrajError::Parse(format!("missing atom name on atom {}", i + 1)))?;
        resids.push(resid);
        resnames.push(resname.to_string());
        elements.push(infer_element_from_atom_name(name).unwrap_or_default());
        names.push(name.to_string());
    }

    let by_element = Topology::from_symbols(elements, table);
    Topology::from_numbered_symbols(names, by_element.atomic_numbers().to_vec(), table)?
        .with_residues(Some(resids), Some(resnames))
}

/// Reads one GRO frame; coordinates and box are scaled by `factor`, velocities are not.
pub fn read_frame<R: BufRead + Seek>(
    reader: &mut LineReader<R>,
    n_atoms: usize,
    factor: f64,
) -> TrajResult<Frame> {
    let title = reader.expect_line("title line")?;
    let count_line = reader.expect_line("atom count")?;
    let nat = parse_count(&count_line, "atom number")?;
    if nat != n_atoms {
        return Err(TrajError::Parse(format!(
            "incorrect atom number: {nat} vs {n_atoms}"
        )));
    }

    let mut coords = Vec::with_capacity(n_atoms);
    let mut velocities: Option<Vec<[f64; 3]>> = None;
    for pos in 0..n_atoms {
        let line = reader.expect_line("atom line")?;
        if pos == 0 && line.len() > VELOCITY_LINE_LEN {
            velocities = Some(Vec::with_capacity(n_atoms));
        }
        coords.push([
            parse_column_f64(&line, 20, 28, "x")? * factor,
            parse_column_f64(&line, 28, 36, "y")? * factor,
            parse_column_f64(&line, 36, 44, "z")? * factor,
        ]);
        if let Some(v) = velocities.as_mut() {
            v.push([
                parse_column_f64(&line, 44, 52, "vx")?,
                parse_column_f64(&line, 52, 60, "vy")?,
                parse_column_f64(&line, 60, 68, "vz")?,
            ]);
        }
    }

    let box_line = reader.expect_line("box line")?;
    let mut cell = parse_box_line(&box_line)?;
    for row in cell.iter_mut() {
        for v in row.iter_mut() {
            *v *= factor;
        }
    }

    Ok(Frame {
        coords,
        velocities,
        box_: Box3::from_matrix(cell),
        comment: Some(title.trim().to_string()),
        ..Frame::default()
    })
}

/// Box line in file units: three diagonal values, then optionally six off-diagonals.
///
/// Fixed 10-character columns are tried first; lines that do not fit them
/// are read as whitespace-separated values.
pub fn parse_box_line(line: &str) -> TrajResult<[[f64; 3]; 3]> {
    parse_box_columns(line).or_else(|_| parse_box_tokens(line))
}

fn parse_box_columns(line: &str) -> TrajResult<[[f64; 3]; 3]> {
    let mut cell = [[0.0f64; 3]; 3];
    for d in 0..3 {
        cell[d][d] = parse_column_f64(line, d * 10, d * 10 + 10, "box length")?;
    }
    for (k, &(i, j)) in OFF_DIAGONAL.iter().enumerate() {
        let start = 30 + k * 10;
        if let Some(raw) = slice_trim_opt(line, start, start + 10).filter(|s| !s.is_empty()) {
            cell[i][j] = parse_f64(raw, "box vector")?;
        }
    }
    Ok(cell)
}

fn parse_box_tokens(line: &str) -> TrajResult<[[f64; 3]; 3]> {
    let values = line
        .split_whitespace()
        .map(|t| parse_f64(t, "box value"))
        .collect::<TrajResult<Vec<_>>>()?;
    if values.len() != 3 && values.len() != 9 {
        return Err(TrajError::Parse(format!(
            "box line must have 3 or 9 values, got {}",
            values.len()
        )));
    }
    let mut cell = [[0.0f64; 3]; 3];
    for d in 0..3 {
        cell[d][d] = values[d];
    }
    for (k, &(i, j)) in OFF_DIAGONAL.iter().enumerate() {
        if let Some(&v) = values.get(3 + k) {
            cell[i][j] = v;
        }
    }
    Ok(cell)
}

pub struct GroAtoms<'a> {
    pub names: &'a [String],
    pub resids: Option<&'a [i32]>,
    pub resnames: Option<&'a [String]>,
}

/// Writes one GRO frame. Coordinates and box are divided by `factor`.
pub fn write_frame<W: Write>(
    out: &mut W,
    atoms: &GroAtoms<'_>,
    coords: &[[f64; 3]],
    velocities: Option<&[[f64; 3]]>,
    cell: Option<&[[f64; 3]; 3]>,
    comment: Option<&str>,
    factor: f64,
) -> TrajResult<()> {
    writeln!(out, "{}", comment.unwrap_or(""))?;
    writeln!(out, "{:>5}", coords.len())?;
    for (i, xyz) in coords.iter().enumerate() {
        let resid = atoms
            .resids
            .and_then(|ids| ids.get(i).copied())
            .unwrap_or(1)
            .rem_euclid(100000);
        let resname = atoms
            .resnames
            .and_then(|names| names.get(i))
            .map(String::as_str)
            .unwrap_or("");
        let name = atoms.names.get(i).map(String::as_str).unwrap_or("");
        let idx = (i + 1) % 100000;
        write!(
            out,
            "{resid:>5}{resname:<5}{name:>5}{idx:>5}{x:>8.3}{y:>8.3}{z:>8.3}",
            resname = truncate(resname, 5),
            name = truncate(name, 5),
            x = xyz[0] / factor,
            y = xyz[1] / factor,
            z = xyz[2] / factor,
        )?;
        if let Some(v) = velocities.and_then(|v| v.get(i)) {
            write!(out, "{:>8.4}{:>8.4}{:>8.4}", v[0], v[1], v[2])?;
        }
        writeln!(out)?;
    }

    match cell {
        Some(cell) => {
            for d in 0..3 {
                write!(out, "{:>10.5}", cell[d][d] / factor)?;
            }
            let off: Vec<f64> = OFF_DIAGONAL.iter().map(|&(i, j)| cell[i][j] / factor).collect();
            if off.iter().any(|v| v.abs() > OFF_DIAGONAL_EPS) {
                for v in off {
                    write!(out, "{v:>10.5}")?;
                }
            }
            writeln!(out)?;
        }
        None => writeln!(out, "{:>10.5}{:>10.5}{:>10.5}", 0.0, 0.0, 0.0)?,
    }
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
