//! Country-name normalization applied to the GDP table.

use crate::config::CountryAliasTable;
use crate::records::GdpRecord;

impl CountryAliasTable {
    /// Returns the canonical spelling of `name`, or `name` itself if no alias
    /// applies.
    ///
    /// Idempotent as long as no alias target is itself an alias source, which
    /// [`PipelineConfig::validate`](crate::config::PipelineConfig::validate)
    /// enforces.
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.0.get(name).map_or(name, String::as_str)
    }
}

/// Rewrites GDP country names to the spellings used by the energy sources.
pub fn normalize_gdp_names(records: Vec<GdpRecord>, aliases: &CountryAliasTable) -> Vec<GdpRecord> {
    records
        .into_iter()
        .map(|mut r| {
            if let Some(canonical) = aliases.0.get(&r.country_name) {
                r.country_name = canonical.clone();
            }
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gdp(name: &str) -> GdpRecord {
        GdpRecord {
            country_name: name.to_string(),
            country_code: "XXX".to_string(),
            year: 2020,
            gdp_usd: Some(1.0),
        }
    }

    #[test]
    fn default_aliases_rewrite_known_spellings() {
        let aliases = CountryAliasTable::default();
        assert_eq!(aliases.canonical("Egypt, Arab Rep."), "Egypt");
        assert_eq!(aliases.canonical("Venezuela, RB"), "Venezuela");
        assert_eq!(aliases.canonical("France"), "France");
    }

    #[test]
    fn normalization_keeps_unlisted_names() {
        let out = normalize_gdp_names(
            vec![gdp("Iran, Islamic Rep."), gdp("Norway")],
            &CountryAliasTable::default(),
        );
        let names: Vec<&str> = out.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(names, vec!["Iran", "Norway"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let aliases = CountryAliasTable::default();
        let input = vec![gdp("Hong Kong SAR, China"), gdp("Korea"), gdp("Chile")];
        let once = normalize_gdp_names(input, &aliases);
        let twice = normalize_gdp_names(once.clone(), &aliases);
        assert_eq!(once, twice);
    }
}
