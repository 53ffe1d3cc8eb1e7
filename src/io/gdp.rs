//! Loader for the wide GDP table (one column per calendar year).

use std::path::Path;

use tracing::{debug, info};

use crate::config::GdpConfig;
use crate::error::PipelineError;
use crate::io::sheet::{Cell, Grid, find_header_row, read_grid};

/// Source name used in errors and logs for the GDP table.
pub const GDP_SOURCE: &str = "gdp";

/// One country row of the wide GDP table.
#[derive(Debug, Clone, PartialEq)]
pub struct GdpWideRow {
    pub country_name: String,
    pub country_code: String,
    /// One value per entry of [`GdpWideTable::years`], in the same order.
    pub values: Vec<Option<f64>>,
}

/// GDP table in its published wide shape.
///
/// Only identifier columns and columns whose header parses as a year are
/// kept; trailing metadata columns are discarded at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GdpWideTable {
    pub years: Vec<i32>,
    pub rows: Vec<GdpWideRow>,
}

/// Identifier column positions in the header row.
struct IdColumns {
    name: usize,
    code: usize,
    indicator_name: usize,
    indicator_code: usize,
}

/// Builds the wide table from a raw grid.
///
/// The header row is the first row containing the country-name column, so
/// preamble rows above it are skipped. Rows with a blank country name are
/// ignored. Only year columns inside the retention window of `cfg` are kept.
///
/// # Errors
///
/// Returns a `PipelineError` if the header row or an identifier column is
/// missing, or a retained year cell is not numeric.
pub fn parse_gdp_grid(grid: &Grid, cfg: &GdpConfig) -> Result<GdpWideTable, PipelineError> {
    let header_idx = find_header_row(grid, &cfg.country_name_column).ok_or_else(|| {
        PipelineError::HeaderNotFound {
            source_name: GDP_SOURCE.to_string(),
            column: cfg.country_name_column.clone(),
        }
    })?;
    let header = &grid[header_idx];

    let find = |column: &str| {
        header
            .iter()
            .position(|cell| cell.text() == column)
            .ok_or_else(|| PipelineError::MissingColumn {
                source_name: GDP_SOURCE.to_string(),
                column: column.to_string(),
            })
    };
    let ids = IdColumns {
        name: find(cfg.country_name_column.as_str())?,
        code: find(cfg.country_code_column.as_str())?,
        indicator_name: find(cfg.indicator_name_column.as_str())?,
        indicator_code: find(cfg.indicator_code_column.as_str())?,
    };

    let all_years: Vec<(usize, i32)> = header
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            ![ids.name, ids.code, ids.indicator_name, ids.indicator_code].contains(idx)
        })
        .filter_map(|(idx, cell)| cell.as_year().map(|year| (idx, year)))
        .collect();

    let dropped = header
        .iter()
        .filter(|cell| !cell.is_blank())
        .count()
        .saturating_sub(all_years.len() + 4);
    if dropped > 0 {
        debug!(columns = dropped, "ignored non-year GDP columns");
    }

    // Out-of-window cells are never parsed.
    let year_columns: Vec<(usize, i32)> = all_years
        .iter()
        .copied()
        .filter(|&(_, year)| cfg.retains(year))
        .collect();
    debug!(
        kept = year_columns.len(),
        outside_window = all_years.len() - year_columns.len(),
        "selected GDP year columns"
    );

    let empty = Cell::Empty;
    let mut rows = Vec::new();
    for (offset, row) in grid[header_idx + 1..].iter().enumerate() {
        let cell = |idx: usize| row.get(idx).unwrap_or(&empty);
        let country_name = cell(ids.name).text();
        if country_name.is_empty() {
            continue;
        }
        let line = header_idx + offset + 2;

        let mut values = Vec::with_capacity(year_columns.len());
        for &(idx, year) in &year_columns {
            let value = cell(idx)
                .as_number()
                .map_err(|value| PipelineError::InvalidNumber {
                    source_name: GDP_SOURCE.to_string(),
                    row: line,
                    column: year.to_string(),
                    value,
                })?;
            values.push(value);
        }

        rows.push(GdpWideRow {
            country_name,
            country_code: cell(ids.code).text(),
            values,
        });
    }

    Ok(GdpWideTable {
        years: year_columns.into_iter().map(|(_, year)| year).collect(),
        rows,
    })
}

/// Loads the wide GDP table from a workbook or CSV file.
///
/// # Errors
///
/// Returns a `PipelineError` if the file cannot be read or lacks the
/// expected columns.
pub fn load_gdp(
    path: &Path,
    sheet: Option<&str>,
    cfg: &GdpConfig,
) -> Result<GdpWideTable, PipelineError> {
    let grid = read_grid(path, sheet)?;
    let table = parse_gdp_grid(&grid, cfg)?;
    info!(
        source = GDP_SOURCE,
        rows = table.rows.len(),
        years = table.years.len(),
        "loaded GDP table"
    );
    Ok(table)
}
