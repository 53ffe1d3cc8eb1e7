//! Inner joins between the source relations, with coverage reporting.
//!
//! Both joins keep only keys present on both sides. Rows lost this way are
//! not silently discarded: each join returns a [`CoverageGap`] listing the
//! country names and keys it excluded, and [`enforce_policy`] decides
//! whether a gap is a warning or a fatal error.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use tracing::{info, warn};

use crate::config::{JoinConfig, JoinPolicy};
use crate::error::PipelineError;
use crate::records::{
    ConsumptionRecord, EnergyRecord, GdpRecord, ProductionRecord, ReconciledRecord,
};

/// Which of the two joins a result or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStage {
    /// Consumption joined with production on `(name, code, year)`.
    Energy,
    /// Energy joined with GDP on `(name, year)`.
    Gdp,
}

impl JoinStage {
    /// Labels of the left and right inputs.
    pub fn sides(&self) -> (&'static str, &'static str) {
        match self {
            Self::Energy => ("consumption", "production"),
            Self::Gdp => ("energy", "gdp"),
        }
    }
}

impl fmt::Display for JoinStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Energy => write!(f, "consumption/production"),
            Self::Gdp => write!(f, "energy/GDP"),
        }
    }
}

/// Key of a row that found no partner.
///
/// `country_code` is the row's own code, except for energy rows of the GDP
/// join, which matches on name and year only and reports `None` there.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinKey {
    pub country_name: String,
    pub country_code: Option<String>,
    pub year: i32,
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country_code {
            Some(code) => write!(f, "{} [{}] {}", self.country_name, code, self.year),
            None => write!(f, "{} {}", self.country_name, self.year),
        }
    }
}

/// Rows and countries excluded by one join.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageGap {
    pub stage: JoinStage,
    /// Left country names none of whose rows found a partner, sorted.
    ///
    /// Covers names missing from the right input as well as names present
    /// on both sides whose codes or years never line up.
    pub left_dropped_countries: Vec<String>,
    /// Right country names none of whose rows found a partner, sorted.
    pub right_dropped_countries: Vec<String>,
    /// Left rows without a partner, in input order.
    pub unmatched_left: Vec<JoinKey>,
    /// Right rows without a partner, in input order.
    pub unmatched_right: Vec<JoinKey>,
}

impl CoverageGap {
    /// Returns `true` when the join lost nothing on either side.
    pub fn is_empty(&self) -> bool {
        self.unmatched_left.is_empty() && self.unmatched_right.is_empty()
    }

    /// Countries whose loss reduces the reconciled output.
    ///
    /// For the energy join both sides count; for the GDP join only energy
    /// countries do, since GDP-only entities were never candidates.
    pub fn excluded_countries(&self) -> Vec<&str> {
        let mut names: BTreeSet<&str> = self
            .left_dropped_countries
            .iter()
            .map(String::as_str)
            .collect();
        if self.stage == JoinStage::Energy {
            names.extend(self.right_dropped_countries.iter().map(String::as_str));
        }
        names.into_iter().collect()
    }
}

impl fmt::Display for CoverageGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = self.stage.sides();
        writeln!(
            f,
            "{} join: {} unmatched {left} rows, {} unmatched {right} rows",
            self.stage,
            self.unmatched_left.len(),
            self.unmatched_right.len()
        )?;
        writeln!(
            f,
            "  dropped from {left}: {}",
            self.left_dropped_countries.join(", ")
        )?;
        write!(
            f,
            "  dropped from {right}: {}",
            self.right_dropped_countries.join(", ")
        )
    }
}

/// Rows produced by a join together with what it excluded.
#[derive(Debug, Clone)]
pub struct JoinOutcome<T> {
    pub rows: Vec<T>,
    pub gap: CoverageGap,
}

/// Generic hash inner join.
///
/// Emits every matching pair, in left-row order and then right-row order for
/// duplicate keys. Returns the joined rows and the indices of unmatched left
/// and right rows.
fn inner_join<'a, L, R, K, O>(
    left: &'a [L],
    right: &'a [R],
    left_key: impl Fn(&'a L) -> K,
    right_key: impl Fn(&'a R) -> K,
    combine: impl Fn(&'a L, &'a R) -> O,
) -> (Vec<O>, Vec<usize>, Vec<usize>)
where
    K: Eq + Hash,
{
    let mut index: HashMap<K, Vec<usize>> = HashMap::with_capacity(right.len());
    for (idx, r) in right.iter().enumerate() {
        index.entry(right_key(r)).or_default().push(idx);
    }

    let mut right_matched = vec![false; right.len()];
    let mut unmatched_left = Vec::new();
    let mut rows = Vec::new();
    for (idx, l) in left.iter().enumerate() {
        match index.get(&left_key(l)) {
            Some(partners) => {
                for &r_idx in partners {
                    right_matched[r_idx] = true;
                    rows.push(combine(l, &right[r_idx]));
                }
            }
            None => unmatched_left.push(idx),
        }
    }

    let unmatched_right = right_matched
        .iter()
        .enumerate()
        .filter(|(_, matched)| !**matched)
        .map(|(idx, _)| idx)
        .collect();
    (rows, unmatched_left, unmatched_right)
}

/// Sorted names of the input (one per row) that have no matched row.
fn dropped_countries<'a>(
    names: impl Iterator<Item = &'a str>,
    unmatched: &[usize],
) -> Vec<String> {
    let unmatched: HashSet<usize> = unmatched.iter().copied().collect();
    let mut all = BTreeSet::new();
    let mut matched = BTreeSet::new();
    for (idx, name) in names.enumerate() {
        all.insert(name);
        if !unmatched.contains(&idx) {
            matched.insert(name);
        }
    }
    all.difference(&matched).map(|s| s.to_string()).collect()
}

/// Joins consumption and production on `(country_name, country_code, year)`.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyJoin`] if no row matches.
pub fn join_energy(
    consumption: &[ConsumptionRecord],
    production: &[ProductionRecord],
) -> Result<JoinOutcome<EnergyRecord>, PipelineError> {
    let (rows, unmatched_c, unmatched_p) = inner_join(
        consumption,
        production,
        |c| (c.country_name.as_str(), c.country_code.as_str(), c.year),
        |p| (p.country_name.as_str(), p.country_code.as_str(), p.year),
        |c, p| EnergyRecord {
            country_name: c.country_name.clone(),
            country_code: c.country_code.clone(),
            year: c.year,
            consumption: c.consumption,
            production: p.production,
        },
    );

    let gap = CoverageGap {
        stage: JoinStage::Energy,
        left_dropped_countries: dropped_countries(
            consumption.iter().map(|c| c.country_name.as_str()),
            &unmatched_c,
        ),
        right_dropped_countries: dropped_countries(
            production.iter().map(|p| p.country_name.as_str()),
            &unmatched_p,
        ),
        unmatched_left: unmatched_c
            .into_iter()
            .map(|i| {
                let c = &consumption[i];
                coded_key(&c.country_name, &c.country_code, c.year)
            })
            .collect(),
        unmatched_right: unmatched_p
            .into_iter()
            .map(|i| {
                let p = &production[i];
                coded_key(&p.country_name, &p.country_code, p.year)
            })
            .collect(),
    };

    finish(JoinStage::Energy, rows, gap)
}

/// Joins energy rows with long-form GDP on `(country_name, year)` and derives
/// the reconciled output row.
///
/// GDP country codes and indicator columns do not reach the output.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyJoin`] if no row matches.
pub fn join_gdp(
    energy: &[EnergyRecord],
    gdp: &[GdpRecord],
) -> Result<JoinOutcome<ReconciledRecord>, PipelineError> {
    let (rows, unmatched_e, unmatched_g) = inner_join(
        energy,
        gdp,
        |e| (e.country_name.as_str(), e.year),
        |g| (g.country_name.as_str(), g.year),
        |e, g| ReconciledRecord::derive(e, g.gdp_usd),
    );

    let gap = CoverageGap {
        stage: JoinStage::Gdp,
        left_dropped_countries: dropped_countries(
            energy.iter().map(|e| e.country_name.as_str()),
            &unmatched_e,
        ),
        right_dropped_countries: dropped_countries(
            gdp.iter().map(|g| g.country_name.as_str()),
            &unmatched_g,
        ),
        unmatched_left: unmatched_e
            .into_iter()
            .map(|i| name_key(&energy[i].country_name, energy[i].year))
            .collect(),
        unmatched_right: unmatched_g
            .into_iter()
            .map(|i| {
                let g = &gdp[i];
                coded_key(&g.country_name, &g.country_code, g.year)
            })
            .collect(),
    };

    finish(JoinStage::Gdp, rows, gap)
}

fn coded_key(name: &str, code: &str, year: i32) -> JoinKey {
    JoinKey {
        country_name: name.to_string(),
        country_code: Some(code.to_string()),
        year,
    }
}

fn name_key(name: &str, year: i32) -> JoinKey {
    JoinKey {
        country_name: name.to_string(),
        country_code: None,
        year,
    }
}

fn finish<T>(
    stage: JoinStage,
    rows: Vec<T>,
    gap: CoverageGap,
) -> Result<JoinOutcome<T>, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyJoin { stage });
    }
    info!(
        stage = %stage,
        matched = rows.len(),
        unmatched_left = gap.unmatched_left.len(),
        unmatched_right = gap.unmatched_right.len(),
        "join complete"
    );
    Ok(JoinOutcome { rows, gap })
}

/// Applies the configured join policy to a coverage gap.
///
/// Every gap is logged as a warning. Under [`JoinPolicy::Strict`] a gap
/// excluding any country not in `allowed_exclusions` is an error.
///
/// # Errors
///
/// Returns [`PipelineError::CoverageViolation`] under the strict policy.
pub fn enforce_policy(gap: &CoverageGap, cfg: &JoinConfig) -> Result<(), PipelineError> {
    let (left, right) = gap.stage.sides();
    if !gap.left_dropped_countries.is_empty() {
        warn!(
            stage = %gap.stage,
            side = left,
            count = gap.left_dropped_countries.len(),
            countries = ?gap.left_dropped_countries,
            "countries dropped by join"
        );
    }
    if !gap.right_dropped_countries.is_empty() {
        warn!(
            stage = %gap.stage,
            side = right,
            count = gap.right_dropped_countries.len(),
            countries = ?gap.right_dropped_countries,
            "countries dropped by join"
        );
    }

    if cfg.policy == JoinPolicy::Lenient {
        return Ok(());
    }
    let violations: Vec<String> = gap
        .excluded_countries()
        .into_iter()
        .filter(|name| {
            !cfg.allowed_exclusions
                .iter()
                .any(|allowed| allowed.as_str() == *name)
        })
        .map(str::to_string)
        .collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::CoverageViolation {
            stage: gap.stage,
            countries: violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ConsumptionMix, ProductionMix};

    fn consumption(name: &str, code: &str, year: i32) -> ConsumptionRecord {
        ConsumptionRecord {
            country_name: name.to_string(),
            country_code: code.to_string(),
            year,
            consumption: ConsumptionMix {
                wind: Some(1.0),
                solar: Some(1.0),
                geo_biomass_other: Some(1.0),
                hydro: Some(1.0),
            },
        }
    }

    fn production(name: &str, code: &str, year: i32) -> ProductionRecord {
        ProductionRecord {
            country_name: name.to_string(),
            country_code: code.to_string(),
            year,
            production: ProductionMix {
                wind: Some(2.0),
                hydro: Some(2.0),
                solar: Some(2.0),
                other: Some(2.0),
            },
        }
    }

    fn gdp(name: &str, year: i32, usd: Option<f64>) -> GdpRecord {
        GdpRecord {
            country_name: name.to_string(),
            country_code: "ZZZ".to_string(),
            year,
            gdp_usd: usd,
        }
    }

    #[test]
    fn energy_join_requires_matching_code() {
        let cons = vec![consumption("Alpha", "ALP", 2020), consumption("Beta", "BET", 2020)];
        let prod = vec![production("Alpha", "ALP", 2020), production("Beta", "XXX", 2020)];
        let out = join_energy(&cons, &prod).expect("Alpha matches");
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].country_name, "Alpha");
        assert_eq!(out.gap.unmatched_left.len(), 1);
        assert_eq!(out.gap.unmatched_left[0].country_code.as_deref(), Some("BET"));
        assert_eq!(out.gap.unmatched_right[0].country_code.as_deref(), Some("XXX"));
        assert_eq!(out.gap.left_dropped_countries, vec!["Beta".to_string()]);
        assert_eq!(out.gap.right_dropped_countries, vec!["Beta".to_string()]);
        assert_eq!(out.gap.excluded_countries(), vec!["Beta"]);
    }

    #[test]
    fn strict_policy_rejects_country_lost_to_code_mismatch() {
        let cons = vec![consumption("Alpha", "ALP", 2020), consumption("Beta", "BET", 2020)];
        let prod = vec![production("Alpha", "ALP", 2020), production("Beta", "XXX", 2020)];
        let out = join_energy(&cons, &prod).expect("Alpha matches");
        let cfg = JoinConfig {
            policy: JoinPolicy::Strict,
            allowed_exclusions: vec![],
        };
        match enforce_policy(&out.gap, &cfg) {
            Err(PipelineError::CoverageViolation { stage, countries }) => {
                assert_eq!(stage, JoinStage::Energy);
                assert_eq!(countries, vec!["Beta".to_string()]);
            }
            other => panic!("expected coverage violation, got {other:?}"),
        }
    }

    #[test]
    fn partially_matched_country_is_not_dropped() {
        let cons = vec![consumption("Alpha", "ALP", 2019), consumption("Alpha", "ALP", 2020)];
        let prod = vec![production("Alpha", "ALP", 2020)];
        let out = join_energy(&cons, &prod).expect("2020 matches");
        assert_eq!(out.gap.unmatched_left.len(), 1);
        assert!(out.gap.left_dropped_countries.is_empty());
        assert!(out.gap.excluded_countries().is_empty());
    }

    #[test]
    fn energy_join_reports_one_sided_countries() {
        let cons = vec![consumption("Alpha", "ALP", 2020), consumption("Gamma", "GAM", 2020)];
        let prod = vec![production("Alpha", "ALP", 2020), production("Delta", "DEL", 2020)];
        let out = join_energy(&cons, &prod).expect("Alpha matches");
        assert_eq!(out.gap.left_dropped_countries, vec!["Gamma".to_string()]);
        assert_eq!(out.gap.right_dropped_countries, vec!["Delta".to_string()]);
        assert_eq!(out.gap.excluded_countries(), vec!["Delta", "Gamma"]);
    }

    #[test]
    fn empty_join_is_fatal() {
        let cons = vec![consumption("Alpha", "ALP", 2019)];
        let prod = vec![production("Alpha", "ALP", 2020)];
        let err = join_energy(&cons, &prod).expect_err("no overlap");
        assert!(matches!(err, PipelineError::EmptyJoin { stage: JoinStage::Energy }));
    }

    #[test]
    fn gdp_join_ignores_country_code() {
        let energy = join_energy(
            &[consumption("Alpha", "ALP", 2020)],
            &[production("Alpha", "ALP", 2020)],
        )
        .expect("energy join")
        .rows;
        let out = join_gdp(&energy, &[gdp("Alpha", 2020, Some(3_000_000.0))]).expect("gdp join");
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].country_code, "ALP");
        assert_eq!(out.rows[0].gdp_musd, Some(3.0));
        assert!(out.gap.is_empty());
    }

    #[test]
    fn gdp_join_keeps_rows_with_blank_gdp() {
        let energy = join_energy(
            &[consumption("Alpha", "ALP", 2020)],
            &[production("Alpha", "ALP", 2020)],
        )
        .expect("energy join")
        .rows;
        let out = join_gdp(&energy, &[gdp("Alpha", 2020, None)]).expect("gdp join");
        assert_eq!(out.rows[0].gdp_musd, None);
        assert_eq!(out.rows[0].total_production, Some(8.0));
    }

    #[test]
    fn gdp_join_reports_gdp_only_rows_with_their_code() {
        let energy = join_energy(
            &[consumption("Alpha", "ALP", 2020)],
            &[production("Alpha", "ALP", 2020)],
        )
        .expect("energy join")
        .rows;
        let out = join_gdp(
            &energy,
            &[gdp("Alpha", 2020, Some(1.0)), gdp("Euro area", 2020, Some(2.0))],
        )
        .expect("gdp join");
        assert_eq!(out.gap.right_dropped_countries, vec!["Euro area".to_string()]);
        assert_eq!(out.gap.unmatched_right.len(), 1);
        assert_eq!(out.gap.unmatched_right[0].country_code.as_deref(), Some("ZZZ"));
        // GDP-only entities are never candidates for the output.
        assert!(out.gap.excluded_countries().is_empty());
    }

    #[test]
    fn duplicate_keys_emit_every_pair() {
        let cons = vec![consumption("Alpha", "ALP", 2020)];
        let prod = vec![production("Alpha", "ALP", 2020), production("Alpha", "ALP", 2020)];
        let out = join_energy(&cons, &prod).expect("join");
        assert_eq!(out.rows.len(), 2);
        assert!(out.gap.is_empty());
    }

    #[test]
    fn lenient_policy_accepts_gaps() {
        let gap = CoverageGap {
            stage: JoinStage::Gdp,
            left_dropped_countries: vec!["Kosovo".to_string()],
            right_dropped_countries: vec![],
            unmatched_left: vec![name_key("Kosovo", 2020)],
            unmatched_right: vec![],
        };
        assert!(enforce_policy(&gap, &JoinConfig::default()).is_ok());
    }

    #[test]
    fn strict_policy_rejects_unlisted_exclusions() {
        let gap = CoverageGap {
            stage: JoinStage::Gdp,
            left_dropped_countries: vec!["Kosovo".to_string(), "Taiwan".to_string()],
            right_dropped_countries: vec!["Euro area".to_string()],
            unmatched_left: vec![],
            unmatched_right: vec![],
        };
        let cfg = JoinConfig {
            policy: JoinPolicy::Strict,
            allowed_exclusions: vec!["Kosovo".to_string()],
        };
        match enforce_policy(&gap, &cfg) {
            Err(PipelineError::CoverageViolation { countries, .. }) => {
                // GDP-only aggregates never count as exclusions.
                assert_eq!(countries, vec!["Taiwan".to_string()]);
            }
            other => panic!("expected coverage violation, got {other:?}"),
        }
    }

    #[test]
    fn strict_policy_passes_when_all_allowed() {
        let gap = CoverageGap {
            stage: JoinStage::Energy,
            left_dropped_countries: vec!["Kosovo".to_string()],
            right_dropped_countries: vec![],
            unmatched_left: vec![],
            unmatched_right: vec![],
        };
        let cfg = JoinConfig {
            policy: JoinPolicy::Strict,
            allowed_exclusions: vec!["Kosovo".to_string()],
        };
        assert!(enforce_policy(&gap, &cfg).is_ok());
    }

    #[test]
    fn gap_display_lists_both_sides() {
        let gap = CoverageGap {
            stage: JoinStage::Gdp,
            left_dropped_countries: vec!["Taiwan".to_string()],
            right_dropped_countries: vec!["Euro area".to_string()],
            unmatched_left: vec![],
            unmatched_right: vec![],
        };
        let s = gap.to_string();
        assert!(s.contains("dropped from energy: Taiwan"));
        assert!(s.contains("dropped from gdp: Euro area"));
    }
}
