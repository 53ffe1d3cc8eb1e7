//! Reconciliation pipeline: energy production and consumption joined with GDP.
//!
//! Each step takes its input by reference and returns a new value; nothing is
//! renamed or dropped in place.
//!
//! 1. trim the GDP table to the configured year window
//! 2. join consumption with production on `(name, code, year)`
//! 3. melt GDP to long form and normalize its country names
//! 4. join energy with GDP on `(name, year)` and derive aggregates

pub mod join;
pub mod names;
pub mod reshape;

use std::collections::BTreeSet;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::io::energy::{load_consumption, load_production};
use crate::io::gdp::{GdpWideTable, load_gdp};
use crate::records::{ConsumptionRecord, ProductionRecord, ReconciledRecord};

use self::join::{CoverageGap, enforce_policy, join_energy, join_gdp};
use self::names::normalize_gdp_names;

/// The three raw inputs, loaded once.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub consumption: Vec<ConsumptionRecord>,
    pub production: Vec<ProductionRecord>,
    pub gdp: GdpWideTable,
}

impl SourceTables {
    /// Loads all three sources named in `cfg.sources`.
    ///
    /// # Errors
    ///
    /// Returns a `PipelineError` on the first source that cannot be read or
    /// lacks an expected column.
    pub fn load(cfg: &PipelineConfig) -> Result<Self, PipelineError> {
        let consumption = load_consumption(
            &cfg.sources.consumption,
            &cfg.energy,
            &cfg.consumption_columns,
        )?;
        let production =
            load_production(&cfg.sources.production, &cfg.energy, &cfg.production_columns)?;
        let gdp = load_gdp(&cfg.sources.gdp, cfg.sources.gdp_sheet.as_deref(), &cfg.gdp)?;
        Ok(Self {
            consumption,
            production,
            gdp,
        })
    }
}

/// Output of a reconciliation run.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Reconciled rows in energy-table order.
    pub records: Vec<ReconciledRecord>,
    /// What each join excluded, energy join first.
    pub coverage: Vec<CoverageGap>,
}

impl Reconciliation {
    /// Distinct country names in the output, sorted.
    pub fn countries(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.country_name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Reconciles the three sources into one per-country, per-year table.
///
/// # Errors
///
/// Returns a `PipelineError` if either join matches nothing, or if the
/// strict join policy rejects a coverage gap.
pub fn reconcile(
    sources: &SourceTables,
    cfg: &PipelineConfig,
) -> Result<Reconciliation, PipelineError> {
    let gdp_window = sources.gdp.retain_years(&cfg.gdp);

    let energy = join_energy(&sources.consumption, &sources.production)?;
    enforce_policy(&energy.gap, &cfg.join)?;

    let gdp_long = normalize_gdp_names(gdp_window.melt(), &cfg.country_aliases);

    let merged = join_gdp(&energy.rows, &gdp_long)?;
    enforce_policy(&merged.gap, &cfg.join)?;

    let reconciliation = Reconciliation {
        records: merged.rows,
        coverage: vec![energy.gap, merged.gap],
    };
    info!(
        rows = reconciliation.records.len(),
        countries = reconciliation.countries().len(),
        "reconciliation complete"
    );
    Ok(reconciliation)
}
