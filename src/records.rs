//! Typed relations: the three inputs and the reconciled output row.

use std::fmt;

use serde::Serialize;

/// Divisor turning raw USD into millions of USD.
pub const USD_PER_MUSD: f64 = 1_000_000.0;

/// Sums four optional terms, yielding `None` if any term is missing.
fn sum_all(terms: [Option<f64>; 4]) -> Option<f64> {
    terms.into_iter().sum()
}

/// Renewable electricity production by technology (TWh).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProductionMix {
    pub wind: Option<f64>,
    pub hydro: Option<f64>,
    pub solar: Option<f64>,
    /// Other renewables including bioenergy.
    pub other: Option<f64>,
}

impl ProductionMix {
    /// Sum of the four technologies, `None` if any is missing.
    pub fn total(&self) -> Option<f64> {
        sum_all([self.wind, self.hydro, self.solar, self.other])
    }
}

/// Renewable energy consumption by technology (TWh).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConsumptionMix {
    pub wind: Option<f64>,
    pub solar: Option<f64>,
    /// Geothermal, biomass and other.
    pub geo_biomass_other: Option<f64>,
    pub hydro: Option<f64>,
}

impl ConsumptionMix {
    /// Sum of the four technologies, `None` if any is missing.
    pub fn total(&self) -> Option<f64> {
        sum_all([self.wind, self.solar, self.geo_biomass_other, self.hydro])
    }
}

/// One row of the energy production table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecord {
    pub country_name: String,
    /// Empty for regional aggregates that carry no code.
    pub country_code: String,
    pub year: i32,
    pub production: ProductionMix,
}

/// One row of the energy consumption table.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionRecord {
    pub country_name: String,
    pub country_code: String,
    pub year: i32,
    pub consumption: ConsumptionMix,
}

/// Production and consumption joined on `(country_name, country_code, year)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRecord {
    pub country_name: String,
    pub country_code: String,
    pub year: i32,
    pub consumption: ConsumptionMix,
    pub production: ProductionMix,
}

/// One `(country, year)` GDP observation in long form.
#[derive(Debug, Clone, PartialEq)]
pub struct GdpRecord {
    pub country_name: String,
    /// World Bank code; differs from the energy code for aggregates.
    pub country_code: String,
    pub year: i32,
    /// GDP in current USD; `None` when the source cell is blank.
    pub gdp_usd: Option<f64>,
}

/// Merged per-country, per-year row handed to downstream consumers.
///
/// `total_consumption`, `total_production` and `gdp_musd` are derived once
/// at construction by [`ReconciledRecord::derive`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    pub country_name: String,
    /// Code from the energy sources.
    pub country_code: String,
    pub year: i32,
    pub consumption: ConsumptionMix,
    pub production: ProductionMix,
    /// GDP in millions of current USD.
    pub gdp_musd: Option<f64>,
    pub total_consumption: Option<f64>,
    pub total_production: Option<f64>,
}

impl ReconciledRecord {
    /// Builds the output row from a joined energy row and its GDP value (USD).
    pub fn derive(energy: &EnergyRecord, gdp_usd: Option<f64>) -> Self {
        Self {
            country_name: energy.country_name.clone(),
            country_code: energy.country_code.clone(),
            year: energy.year,
            consumption: energy.consumption,
            production: energy.production,
            gdp_musd: gdp_usd.map(|usd| usd / USD_PER_MUSD),
            total_consumption: energy.consumption.total(),
            total_production: energy.production.total(),
        }
    }
}

impl fmt::Display for ReconciledRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:>4} | prod={:>9} TWh  cons={:>9} TWh | GDP={:>12} MUSD",
            self.country_name,
            self.year,
            fmt_opt(self.total_production, 2),
            fmt_opt(self.total_consumption, 2),
            fmt_opt(self.gdp_musd, 0),
        )
    }
}

/// Formats an optional value with fixed precision, `-` when missing.
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy(production: ProductionMix, consumption: ConsumptionMix) -> EnergyRecord {
        EnergyRecord {
            country_name: "Alpha".to_string(),
            country_code: "ALP".to_string(),
            year: 2020,
            consumption,
            production,
        }
    }

    #[test]
    fn totals_sum_all_four_technologies() {
        let production = ProductionMix {
            wind: Some(10.0),
            hydro: Some(5.0),
            solar: Some(0.0),
            other: Some(0.0),
        };
        let consumption = ConsumptionMix {
            wind: Some(8.0),
            solar: Some(0.0),
            geo_biomass_other: Some(0.0),
            hydro: Some(3.0),
        };
        let row = ReconciledRecord::derive(&energy(production, consumption), Some(2_000_000.0));
        assert_eq!(row.total_production, Some(15.0));
        assert_eq!(row.total_consumption, Some(11.0));
        assert_eq!(row.gdp_musd, Some(2.0));
    }

    #[test]
    fn missing_component_yields_missing_total() {
        let production = ProductionMix {
            wind: Some(1.0),
            hydro: None,
            solar: Some(2.0),
            other: Some(3.0),
        };
        assert_eq!(production.total(), None);
        assert_eq!(ConsumptionMix::default().total(), None);
    }

    #[test]
    fn missing_gdp_propagates_as_none() {
        let row = ReconciledRecord::derive(
            &energy(ProductionMix::default(), ConsumptionMix::default()),
            None,
        );
        assert_eq!(row.gdp_musd, None);
    }

    #[test]
    fn display_marks_missing_values() {
        let row = ReconciledRecord::derive(
            &energy(ProductionMix::default(), ConsumptionMix::default()),
            None,
        );
        let s = format!("{row}");
        assert!(s.contains("Alpha"));
        assert!(s.contains('-'));
    }
}
