//! TOML-based pipeline configuration.
//!
//! Every field has a default matching the observed data vintage (Our World in
//! Data energy tables plus a World Bank GDP extract), so an empty file is a
//! valid configuration.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level pipeline configuration parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input file locations.
    pub sources: SourcesConfig,
    /// Identifier columns shared by both energy tables.
    pub energy: EnergyColumns,
    /// Technology columns of the production table.
    pub production_columns: ProductionColumns,
    /// Technology columns of the consumption table.
    pub consumption_columns: ConsumptionColumns,
    /// GDP identifier columns and year retention window.
    pub gdp: GdpConfig,
    /// GDP-source spelling mapped to energy-source spelling.
    pub country_aliases: CountryAliasTable,
    /// Join coverage policy.
    pub join: JoinConfig,
    /// Ranking defaults for downstream queries.
    pub ranking: RankingConfig,
}

/// Input file locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Energy consumption table (CSV).
    pub consumption: PathBuf,
    /// Energy production table (CSV).
    pub production: PathBuf,
    /// GDP wide table (workbook, or CSV when the extension is `.csv`).
    pub gdp: PathBuf,
    /// Workbook sheet holding the GDP table; the first sheet when unset.
    pub gdp_sheet: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            consumption: PathBuf::from("modern-renewable-energy-consumption.csv"),
            production: PathBuf::from("modern-renewable-prod.csv"),
            gdp: PathBuf::from("GDP year country.xlsx"),
            gdp_sheet: Some("Data".to_string()),
        }
    }
}

/// Identifier columns shared by both energy tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnergyColumns {
    pub entity_column: String,
    pub code_column: String,
    pub year_column: String,
}

impl Default for EnergyColumns {
    fn default() -> Self {
        Self {
            entity_column: "Entity".to_string(),
            code_column: "Code".to_string(),
            year_column: "Year".to_string(),
        }
    }
}

/// Header names of the production technology columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductionColumns {
    pub wind: String,
    pub hydro: String,
    pub solar: String,
    pub other: String,
}

impl Default for ProductionColumns {
    fn default() -> Self {
        Self {
            wind: "Electricity from wind (TWh)".to_string(),
            hydro: "Electricity from hydro (TWh)".to_string(),
            solar: "Electricity from solar (TWh)".to_string(),
            other: "Electricity from other renewables including bioenergy (TWh)".to_string(),
        }
    }
}

impl ProductionColumns {
    fn as_array(&self) -> [&str; 4] {
        [
            self.wind.as_str(),
            self.hydro.as_str(),
            self.solar.as_str(),
            self.other.as_str(),
        ]
    }
}

/// Header names of the consumption technology columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumptionColumns {
    pub wind: String,
    pub solar: String,
    pub geo_biomass_other: String,
    pub hydro: String,
}

impl Default for ConsumptionColumns {
    fn default() -> Self {
        Self {
            wind: "Wind Generation - TWh".to_string(),
            solar: "Solar Generation - TWh".to_string(),
            geo_biomass_other: "Geo Biomass Other - TWh".to_string(),
            hydro: "Hydro Generation - TWh".to_string(),
        }
    }
}

impl ConsumptionColumns {
    fn as_array(&self) -> [&str; 4] {
        [
            self.wind.as_str(),
            self.solar.as_str(),
            self.geo_biomass_other.as_str(),
            self.hydro.as_str(),
        ]
    }
}

/// GDP identifier columns and year retention window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GdpConfig {
    pub country_name_column: String,
    pub country_code_column: String,
    pub indicator_name_column: String,
    pub indicator_code_column: String,
    /// First retained year (inclusive).
    pub first_year: i32,
    /// Last retained year (inclusive); open-ended when unset.
    pub last_year: Option<i32>,
}

impl Default for GdpConfig {
    fn default() -> Self {
        Self {
            country_name_column: "Country Name".to_string(),
            country_code_column: "Country Code".to_string(),
            indicator_name_column: "Indicator Name".to_string(),
            indicator_code_column: "Indicator Code".to_string(),
            first_year: 2000,
            last_year: None,
        }
    }
}

impl GdpConfig {
    /// Returns `true` when `year` falls inside the retention window.
    pub fn retains(&self, year: i32) -> bool {
        year >= self.first_year && self.last_year.is_none_or(|last| year <= last)
    }
}

/// Country-name synonyms applied to the GDP table before the second join.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CountryAliasTable(pub BTreeMap<String, String>);

impl Default for CountryAliasTable {
    fn default() -> Self {
        let pairs = [
            ("Egypt, Arab Rep.", "Egypt"),
            ("Hong Kong SAR, China", "Hong Kong"),
            ("Iran, Islamic Rep.", "Iran"),
            ("South Korea, Rep.", "Korea"),
            ("Venezuela, RB", "Venezuela"),
        ];
        Self(
            pairs
                .into_iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }
}

/// How the pipeline reacts when a join drops countries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Log a warning per gap and continue.
    #[default]
    Lenient,
    /// Fail on any gap not listed in `allowed_exclusions`.
    Strict,
}

impl fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => write!(f, "lenient"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// Join coverage policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JoinConfig {
    pub policy: JoinPolicy,
    /// Countries that may be dropped even under the strict policy.
    pub allowed_exclusions: Vec<String>,
}

/// Ranking defaults for downstream queries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankingConfig {
    /// Aggregate entities that are never ranked as countries.
    pub excluded: Vec<String>,
    pub default_year: i32,
    pub default_top: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            excluded: [
                "World",
                "European Union",
                "High income",
                "Upper middle income",
                "Lower middle income",
                "Low income",
                "OECD members",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            default_year: 2020,
            default_top: 10,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"gdp.last_year"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl PipelineConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// Relative source paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            cfg.sources.resolve_against(dir);
        }
        Ok(cfg)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let e = &self.energy;
        for (field, value) in [
            ("energy.entity_column", &e.entity_column),
            ("energy.code_column", &e.code_column),
            ("energy.year_column", &e.year_column),
        ] {
            require_non_empty(&mut errors, field, value);
        }

        check_technology_columns(
            &mut errors,
            "production_columns",
            &self.production_columns.as_array(),
        );
        check_technology_columns(
            &mut errors,
            "consumption_columns",
            &self.consumption_columns.as_array(),
        );

        let g = &self.gdp;
        for (field, value) in [
            ("gdp.country_name_column", &g.country_name_column),
            ("gdp.country_code_column", &g.country_code_column),
            ("gdp.indicator_name_column", &g.indicator_name_column),
            ("gdp.indicator_code_column", &g.indicator_code_column),
        ] {
            require_non_empty(&mut errors, field, value);
        }
        if let Some(last) = g.last_year {
            if last < g.first_year {
                errors.push(ConfigError {
                    field: "gdp.last_year".into(),
                    message: format!("must be >= gdp.first_year ({})", g.first_year),
                });
            }
        }

        for (from, to) in &self.country_aliases.0 {
            if self.country_aliases.0.contains_key(to) {
                errors.push(ConfigError {
                    field: format!("country_aliases.\"{from}\""),
                    message: format!("target \"{to}\" is itself an alias; chains are not allowed"),
                });
            }
        }

        if self.ranking.default_top == 0 {
            errors.push(ConfigError {
                field: "ranking.default_top".into(),
                message: "must be > 0".into(),
            });
        }

        errors
    }
}

impl SourcesConfig {
    fn resolve_against(&mut self, dir: &Path) {
        for path in [&mut self.consumption, &mut self.production, &mut self.gdp] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}

fn require_non_empty(errors: &mut Vec<ConfigError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ConfigError {
            field: field.to_string(),
            message: "must not be empty".into(),
        });
    }
}

fn check_technology_columns(errors: &mut Vec<ConfigError>, section: &str, columns: &[&str; 4]) {
    let mut seen = HashSet::new();
    for column in columns {
        if column.trim().is_empty() {
            errors.push(ConfigError {
                field: section.to_string(),
                message: "column names must not be empty".into(),
            });
        } else if !seen.insert(*column) {
            errors.push(ConfigError {
                field: section.to_string(),
                message: format!("column \"{column}\" is mapped twice"),
            });
        }
    }
}
