//! Thin read-only queries over the reconciled table.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::records::ReconciledRecord;

/// Rows for one calendar year, in table order.
pub fn for_year(records: &[ReconciledRecord], year: i32) -> Vec<&ReconciledRecord> {
    records.iter().filter(|r| r.year == year).collect()
}

/// Rows whose country is in `countries`, in table order.
pub fn for_countries<'a>(
    records: &'a [ReconciledRecord],
    countries: &[String],
) -> Vec<&'a ReconciledRecord> {
    records
        .iter()
        .filter(|r| countries.iter().any(|c| *c == r.country_name))
        .collect()
}

/// Top `n` rows of `year` by total production.
///
/// Ordered by total production descending, ties broken by country name
/// ascending. Rows without a total and entities listed in `excluded` are
/// never ranked.
pub fn top_by_production<'a>(
    records: &'a [ReconciledRecord],
    year: i32,
    n: usize,
    excluded: &[String],
) -> Vec<&'a ReconciledRecord> {
    let mut ranked: Vec<(&ReconciledRecord, f64)> = records
        .iter()
        .filter(|r| r.year == year)
        .filter(|r| !excluded.iter().any(|e| *e == r.country_name))
        .filter_map(|r| r.total_production.map(|total| (r, total)))
        .collect();

    ranked.sort_by(|(a, ta), (b, tb)| match tb.total_cmp(ta) {
        Ordering::Equal => a.country_name.cmp(&b.country_name),
        other => other,
    });
    ranked.into_iter().take(n).map(|(r, _)| r).collect()
}

/// Production figure plotted by the technology trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductionMetric {
    #[default]
    Total,
    Wind,
    Hydro,
    Solar,
    Other,
}

impl ProductionMetric {
    pub const ALL: [ProductionMetric; 5] = [
        Self::Total,
        Self::Wind,
        Self::Hydro,
        Self::Solar,
        Self::Other,
    ];

    /// Reads the metric from a reconciled row.
    pub fn value(&self, record: &ReconciledRecord) -> Option<f64> {
        let p = &record.production;
        match self {
            Self::Total => record.total_production,
            Self::Wind => p.wind,
            Self::Hydro => p.hydro,
            Self::Solar => p.solar,
            Self::Other => p.other,
        }
    }
}

impl fmt::Display for ProductionMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Total => write!(f, "total"),
            Self::Wind => write!(f, "wind"),
            Self::Hydro => write!(f, "hydro"),
            Self::Solar => write!(f, "solar"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ProductionMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown technology \"{s}\", expected one of: total, wind, hydro, solar, other"
                )
            })
    }
}

/// Yearly values of one metric for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub country_name: String,
    /// `(year, value)` pairs, years ascending.
    pub points: Vec<(i32, Option<f64>)>,
}

/// Per-country time series of `metric`, restricted to `countries`.
///
/// Series are ordered by country name.
pub fn technology_trend(
    records: &[ReconciledRecord],
    countries: &[String],
    metric: ProductionMetric,
) -> Vec<TrendSeries> {
    let mut by_country: BTreeMap<&str, Vec<(i32, Option<f64>)>> = BTreeMap::new();
    for r in for_countries(records, countries) {
        by_country
            .entry(r.country_name.as_str())
            .or_default()
            .push((r.year, metric.value(r)));
    }
    by_country
        .into_iter()
        .map(|(country_name, mut points)| {
            points.sort_by_key(|(year, _)| *year);
            TrendSeries {
                country_name: country_name.to_string(),
                points,
            }
        })
        .collect()
}
