//! CSV and JSON export of the reconciled table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::records::ReconciledRecord;

/// Column header for CSV export.
const HEADER: &str = "country_name,country_code,year,\
                      wind_consumption_twh,solar_consumption_twh,\
                      geo_biomass_other_consumption_twh,hydro_consumption_twh,\
                      wind_production_twh,hydro_production_twh,\
                      solar_production_twh,other_production_twh,\
                      gdp_musd,total_consumption_twh,total_production_twh";

/// Exports reconciled rows to a CSV file at the given path.
///
/// Missing values are written as empty fields. Produces deterministic output
/// for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[ReconciledRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes reconciled rows as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[ReconciledRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        let c = &r.consumption;
        let p = &r.production;
        wtr.write_record(&[
            r.country_name.clone(),
            r.country_code.clone(),
            r.year.to_string(),
            field(c.wind),
            field(c.solar),
            field(c.geo_biomass_other),
            field(c.hydro),
            field(p.wind),
            field(p.hydro),
            field(p.solar),
            field(p.other),
            field(r.gdp_musd),
            field(r.total_consumption),
            field(r.total_production),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Exports reconciled rows as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialization or writing fails.
pub fn export_json(records: &[ReconciledRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut buf = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut buf, records)?;
    buf.flush()
}
