// Tabular reading: turns a spreadsheet export into rows of named cells.
//
// Spreadsheets are exported to CSV; the header row names the cells of every
// following row. Header names are lowercased, blank rows are skipped.

use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Cells and rows
// ---------------------------------------------------------------------------

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Classify a raw CSV field. Empty fields are null, finite numbers are
    /// numeric, everything else is kept verbatim as text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell. Text is parsed as a number, accepting a
    /// decimal comma ("6,5").
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Null => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    /// String view of the cell. Whole numbers render without a fraction.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
        }
    }
}

/// One spreadsheet row: cells in column order, keyed by lowercased header.
///
/// Headers may repeat; lookups return the rightmost match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell. The header is trimmed and lowercased.
    pub fn push(&mut self, header: &str, value: CellValue) {
        self.cells.push((header.trim().to_lowercase(), value));
    }

    /// Builder-style `push`, handy in tests.
    pub fn with(mut self, header: &str, value: CellValue) -> Self {
        self.push(header, value);
        self
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .rev()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// A row whose cells are all null is a blank line.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_null())
    }
}

// ---------------------------------------------------------------------------
// Reader seam
// ---------------------------------------------------------------------------

/// Anything that can turn a file into rows of named cells.
pub trait TabularReader {
    fn read_rows(&self, path: &Path) -> Result<Vec<RawRow>, ReadError>;
}

/// CSV-backed reader for spreadsheet exports.
#[derive(Debug, Clone, Copy)]
pub struct CsvReader {
    delimiter: u8,
}

impl CsvReader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl TabularReader for CsvReader {
    fn read_rows(&self, path: &Path) -> Result<Vec<RawRow>, ReadError> {
        let file = std::fs::File::open(path).map_err(|e| ReadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows_from_reader(file, self.delimiter).map_err(|e| ReadError::Csv {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Read every data row from CSV text. Ragged rows are padded with nulls;
/// extra trailing fields without a header are dropped.
pub(crate) fn rows_from_reader<R: Read>(rdr: R, delimiter: u8) -> Result<Vec<RawRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(rdr);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping malformed row {}: {}", index + 1, e);
                continue;
            }
        };

        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).map(CellValue::parse).unwrap_or(CellValue::Null);
            row.push(header, value);
        }
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
