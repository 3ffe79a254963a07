//! Line-oriented access with explicit byte offsets, shared by the text formats.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use traj_core::error::{TrajError, TrajResult};

pub struct LineReader<R> {
    inner: R,
    buf: String,
}

impl LineReader<BufReader<File>> {
    pub fn open(path: &Path) -> TrajResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead + Seek> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: String::new(),
        }
    }

    pub fn position(&mut self) -> TrajResult<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek_to(&mut self, offset: u64) -> TrajResult<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn rewind(&mut self) -> TrajResult<()> {
        self.seek_to(0)
    }

    /// Next line without its terminator, or `None` at end of file.
    pub fn read_line(&mut self) -> TrajResult<Option<String>> {
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Like [`read_line`](Self::read_line), but end of file is a parse error.
    pub fn expect_line(&mut self, what: &str) -> TrajResult<String> {
        self.read_line()?
            .ok_or_else(|| TrajError::Parse(format!("unexpected end of file while reading {what}")))
    }

    /// Reads the next line and restores the cursor to where it was.
    pub fn peek_line(&mut self) -> TrajResult<Option<String>> {
        let offset = self.position()?;
        let line = self.read_line()?;
        self.seek_to(offset)?;
        Ok(line)
    }
}

/// Trimmed `[start, end)` byte columns; `None` if the line ends before `start`.
pub fn slice_trim_opt(line: &str, start: usize, end: usize) -> Option<&str> {
    if line.len() <= start {
        return None;
    }
    let end = end.min(line.len());
    line.get(start..end).map(str::trim)
}

pub fn parse_column_f64(line: &str, start: usize, end: usize, label: &str) -> TrajResult<f64> {
    let Some(raw) = slice_trim_opt(line, start, end) else {
        return Err(TrajError::Parse(format!(
            "missing {label} field (columns {start}-{end})"
        )));
    };
    parse_f64(raw, label)
}

pub fn parse_f64(token: &str, label: &str) -> TrajResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| TrajError::Parse(format!("invalid {label} '{token}'")))
}

/// Leading integer of a line, the way atom-count lines are written.
pub fn parse_count(line: &str, label: &str) -> TrajResult<usize> {
    let token = line.split_whitespace().next().unwrap_or("");
    token
        .parse::<usize>()
        .map_err(|_| TrajError::Parse(format!("incorrect {label} '{}'", line.trim())))
}
