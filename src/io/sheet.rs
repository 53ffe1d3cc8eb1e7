//! Untyped cell grids read from workbooks or delimited text.
//!
//! The GDP source ships either as a workbook or as CSV, often with a few
//! preamble rows above the real header. Both are read into the same
//! [`Grid`] so header detection and typing happen in one place.

use std::fs::File;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::PipelineError;

/// A single untyped cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Cell content as trimmed text; numbers render without a trailing `.0`.
    pub fn text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
        }
    }

    /// Returns `true` for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Interprets the cell as a calendar year header.
    pub fn as_year(&self) -> Option<i32> {
        match self {
            Self::Number(n) if n.fract() == 0.0 => i32::try_from(*n as i64).ok(),
            Self::Text(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        }
    }

    /// Interprets the cell as an optional number; blank cells are `None`.
    ///
    /// Returns `Err` with the offending text when the cell is not numeric.
    pub fn as_number(&self) -> Result<Option<f64>, String> {
        match self {
            Self::Number(n) => Ok(Some(*n)),
            Self::Empty => Ok(None),
            Self::Text(s) => parse_optional_number(s),
        }
    }
}

/// Parses a text field as an optional number, blank meaning `None`.
pub fn parse_optional_number(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| trimmed.to_string())
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::String(s) => Self::Text(s.clone()),
            Data::Float(n) => Self::Number(*n),
            Data::Int(n) => Self::Number(*n as f64),
            Data::Bool(b) => Self::Text(b.to_string()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Rows of cells, ragged rows allowed.
pub type Grid = Vec<Vec<Cell>>;

/// Reads a grid from `path`: delimited text for `.csv`, a workbook otherwise.
///
/// # Errors
///
/// Returns a `PipelineError` if the file cannot be read or the sheet is missing.
pub fn read_grid(path: &Path, sheet: Option<&str>) -> Result<Grid, PipelineError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        read_csv_grid(path)
    } else {
        read_workbook_grid(path, sheet)
    }
}

fn read_csv_grid(path: &Path) -> Result<Grid, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut grid = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| PipelineError::csv(path, e))?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}

fn read_workbook_grid(path: &Path, sheet: Option<&str>) -> Result<Grid, PipelineError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| PipelineError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| PipelineError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: name.to_string(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: "<first>".to_string(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PipelineError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // Range may not begin at A1; pad so column indices stay absolute.
    let (_, start_col) = range.start().unwrap_or((0, 0));
    let pad = start_col as usize;
    Ok(range
        .rows()
        .map(|row| {
            std::iter::repeat_n(Cell::Empty, pad)
                .chain(row.iter().map(Cell::from))
                .collect()
        })
        .collect())
}

/// Returns the index of the first row holding a cell whose text is `column`.
pub fn find_header_row(grid: &Grid, column: &str) -> Option<usize> {
    grid.iter()
        .position(|row| row.iter().any(|cell| cell.text() == column))
}
