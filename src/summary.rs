//! Headline figures for a selection of reconciled rows.

use std::fmt;

use crate::records::{ReconciledRecord, USD_PER_MUSD};

/// Per-technology production sums over a selection (TWh).
///
/// Missing values contribute nothing to a sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProductionBreakdown {
    pub wind_twh: f64,
    pub hydro_twh: f64,
    pub solar_twh: f64,
    pub other_twh: f64,
    pub total_twh: f64,
}

impl ProductionBreakdown {
    /// Sums each technology and the total across `rows`.
    pub fn from_rows(rows: &[&ReconciledRecord]) -> Self {
        let sum = |f: fn(&ReconciledRecord) -> Option<f64>| -> f64 {
            rows.iter().filter_map(|&r| f(r)).sum()
        };
        Self {
            wind_twh: sum(|r| r.production.wind),
            hydro_twh: sum(|r| r.production.hydro),
            solar_twh: sum(|r| r.production.solar),
            other_twh: sum(|r| r.production.other),
            total_twh: sum(|r| r.total_production),
        }
    }
}

/// Aggregate figures for a country selection, relative to a reference set
/// (typically the top-N ranking it was drawn from).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSummary {
    /// Number of rows in the selection.
    pub rows: usize,
    /// Total production of the selection (TWh).
    pub total_production_twh: f64,
    /// Selection production as a percentage of the reference total.
    pub share_of_reference_pct: f64,
    /// Combined GDP of the selection (trillion USD).
    pub gdp_trillion_usd: f64,
    /// Production split by technology.
    pub breakdown: ProductionBreakdown,
}

impl SelectionSummary {
    /// Computes the summary of `selection` against `reference`.
    ///
    /// The share is `0.0` when the reference produces nothing.
    pub fn compute(selection: &[&ReconciledRecord], reference: &[&ReconciledRecord]) -> Self {
        let breakdown = ProductionBreakdown::from_rows(selection);
        let reference_total = ProductionBreakdown::from_rows(reference).total_twh;

        let share_of_reference_pct = if reference_total > 0.0 {
            100.0 * breakdown.total_twh / reference_total
        } else {
            0.0
        };

        let gdp_musd: f64 = selection.iter().filter_map(|r| r.gdp_musd).sum();

        Self {
            rows: selection.len(),
            total_production_twh: breakdown.total_twh,
            share_of_reference_pct,
            gdp_trillion_usd: gdp_musd / USD_PER_MUSD,
            breakdown,
        }
    }
}

impl fmt::Display for SelectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.breakdown;
        writeln!(f, "--- Selection Summary ---")?;
        writeln!(f, "Selected rows:                {:>10}", self.rows)?;
        writeln!(
            f,
            "Total production:             {:>10.0} TWh",
            self.total_production_twh
        )?;
        writeln!(
            f,
            "Share of ranked production:   {:>10.0}%",
            self.share_of_reference_pct
        )?;
        writeln!(
            f,
            "Combined GDP:                 {:>10.2} trillion USD",
            self.gdp_trillion_usd
        )?;
        writeln!(f, "Production by technology:")?;
        writeln!(f, "  Wind:                       {:>10.1} TWh", b.wind_twh)?;
        writeln!(f, "  Hydro:                      {:>10.1} TWh", b.hydro_twh)?;
        writeln!(f, "  Solar:                      {:>10.1} TWh", b.solar_twh)?;
        writeln!(f, "  Other:                      {:>10.1} TWh", b.other_twh)?;
        write!(f, "  Total:                      {:>10.1} TWh", b.total_twh)
    }
}
