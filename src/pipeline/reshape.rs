//! Year-window trimming and wide-to-long reshaping of the GDP table.

use tracing::debug;

use crate::config::GdpConfig;
use crate::io::gdp::{GdpWideRow, GdpWideTable};
use crate::records::GdpRecord;

impl GdpWideTable {
    /// Returns a copy keeping only the year columns inside the retention
    /// window of `cfg`.
    ///
    /// Selection is by parsed year, so reordered or extra columns in the
    /// source cannot shift the window.
    pub fn retain_years(&self, cfg: &GdpConfig) -> GdpWideTable {
        let keep: Vec<usize> = self
            .years
            .iter()
            .enumerate()
            .filter(|(_, year)| cfg.retains(**year))
            .map(|(idx, _)| idx)
            .collect();

        debug!(
            kept = keep.len(),
            dropped = self.years.len() - keep.len(),
            first_year = cfg.first_year,
            last_year = ?cfg.last_year,
            "trimmed GDP year columns"
        );

        GdpWideTable {
            years: keep.iter().map(|&idx| self.years[idx]).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| GdpWideRow {
                    values: keep
                        .iter()
                        .map(|&idx| row.values.get(idx).copied().flatten())
                        .collect(),
                    ..row.clone()
                })
                .collect(),
        }
    }

    /// Melts the year columns into one [`GdpRecord`] per `(country, year)`.
    ///
    /// Rows come out country-major in source order, years ascending in
    /// column order. Blank values are kept as `None`.
    pub fn melt(&self) -> Vec<GdpRecord> {
        let mut out = Vec::with_capacity(self.rows.len() * self.years.len());
        for row in &self.rows {
            for (idx, &year) in self.years.iter().enumerate() {
                out.push(GdpRecord {
                    country_name: row.country_name.clone(),
                    country_code: row.country_code.clone(),
                    year,
                    gdp_usd: row.values.get(idx).copied().flatten(),
                });
            }
        }
        out
    }
}
