//! Loaders for the delimited energy production and consumption tables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::config::{ConsumptionColumns, EnergyColumns, ProductionColumns};
use crate::error::PipelineError;
use crate::io::sheet::parse_optional_number;
use crate::records::{ConsumptionMix, ConsumptionRecord, ProductionMix, ProductionRecord};

/// Source name used in errors and logs for the production table.
pub const PRODUCTION_SOURCE: &str = "production";
/// Source name used in errors and logs for the consumption table.
pub const CONSUMPTION_SOURCE: &str = "consumption";

/// Identifier fields plus four technology values of one energy row.
struct EnergyRow {
    country_name: String,
    country_code: String,
    year: i32,
    values: [Option<f64>; 4],
}

/// Resolved column positions for one energy table.
struct ColumnIndex {
    entity: usize,
    code: usize,
    year: usize,
    technologies: [(usize, String); 4],
}

impl ColumnIndex {
    fn resolve(
        source_name: &str,
        headers: &csv::StringRecord,
        ids: &EnergyColumns,
        technologies: [&str; 4],
    ) -> Result<Self, PipelineError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| PipelineError::MissingColumn {
                    source_name: source_name.to_string(),
                    column: column.to_string(),
                })
        };
        Ok(Self {
            entity: find(ids.entity_column.as_str())?,
            code: find(ids.code_column.as_str())?,
            year: find(ids.year_column.as_str())?,
            technologies: [
                (find(technologies[0])?, technologies[0].to_string()),
                (find(technologies[1])?, technologies[1].to_string()),
                (find(technologies[2])?, technologies[2].to_string()),
                (find(technologies[3])?, technologies[3].to_string()),
            ],
        })
    }
}

/// Reads an energy table and returns its rows with four technology values
/// in the order given by `technologies`.
fn read_energy_rows(
    source_name: &str,
    reader: impl Read,
    ids: &EnergyColumns,
    technologies: [&str; 4],
    path: &Path,
) -> Result<Vec<EnergyRow>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers().map_err(|e| PipelineError::csv(path, e))?.clone();
    let index = ColumnIndex::resolve(source_name, &headers, ids, technologies)?;

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| PipelineError::csv(path, e))?;
        // 1-based line number including the header line.
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let year_raw = field(index.year).trim();
        let year = year_raw
            .parse::<i32>()
            .map_err(|_| PipelineError::InvalidYear {
                source_name: source_name.to_string(),
                row,
                value: year_raw.to_string(),
            })?;

        let mut values = [None; 4];
        for (slot, (idx, column)) in values.iter_mut().zip(&index.technologies) {
            *slot = parse_optional_number(field(*idx)).map_err(|value| {
                PipelineError::InvalidNumber {
                    source_name: source_name.to_string(),
                    row,
                    column: column.clone(),
                    value,
                }
            })?;
        }

        rows.push(EnergyRow {
            country_name: field(index.entity).trim().to_string(),
            country_code: field(index.code).trim().to_string(),
            year,
            values,
        });
    }

    info!(source = source_name, rows = rows.len(), "loaded energy table");
    Ok(rows)
}

/// Parses the production table from any reader.
///
/// # Errors
///
/// Returns a `PipelineError` on a missing column or a malformed value.
pub fn read_production(
    reader: impl Read,
    ids: &EnergyColumns,
    columns: &ProductionColumns,
    path: &Path,
) -> Result<Vec<ProductionRecord>, PipelineError> {
    let technologies = [
        columns.wind.as_str(),
        columns.hydro.as_str(),
        columns.solar.as_str(),
        columns.other.as_str(),
    ];
    let rows = read_energy_rows(PRODUCTION_SOURCE, reader, ids, technologies, path)?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let [wind, hydro, solar, other] = r.values;
            ProductionRecord {
                country_name: r.country_name,
                country_code: r.country_code,
                year: r.year,
                production: ProductionMix {
                    wind,
                    hydro,
                    solar,
                    other,
                },
            }
        })
        .collect())
}

/// Parses the consumption table from any reader.
///
/// # Errors
///
/// Returns a `PipelineError` on a missing column or a malformed value.
pub fn read_consumption(
    reader: impl Read,
    ids: &EnergyColumns,
    columns: &ConsumptionColumns,
    path: &Path,
) -> Result<Vec<ConsumptionRecord>, PipelineError> {
    let technologies = [
        columns.wind.as_str(),
        columns.solar.as_str(),
        columns.geo_biomass_other.as_str(),
        columns.hydro.as_str(),
    ];
    let rows = read_energy_rows(CONSUMPTION_SOURCE, reader, ids, technologies, path)?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let [wind, solar, geo_biomass_other, hydro] = r.values;
            ConsumptionRecord {
                country_name: r.country_name,
                country_code: r.country_code,
                year: r.year,
                consumption: ConsumptionMix {
                    wind,
                    solar,
                    geo_biomass_other,
                    hydro,
                },
            }
        })
        .collect())
}

/// Loads the production table from a CSV file.
///
/// # Errors
///
/// Returns a `PipelineError` if the file cannot be opened or parsed.
pub fn load_production(
    path: &Path,
    ids: &EnergyColumns,
    columns: &ProductionColumns,
) -> Result<Vec<ProductionRecord>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    read_production(file, ids, columns, path)
}

/// Loads the consumption table from a CSV file.
///
/// # Errors
///
/// Returns a `PipelineError` if the file cannot be opened or parsed.
pub fn load_consumption(
    path: &Path,
    ids: &EnergyColumns,
    columns: &ConsumptionColumns,
) -> Result<Vec<ConsumptionRecord>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    read_consumption(file, ids, columns, path)
}
