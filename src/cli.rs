use std::env;
use std::path::PathBuf;

use energy_transition::query::ProductionMetric;

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub consumption: Option<PathBuf>,
    pub production: Option<PathBuf>,
    pub gdp: Option<PathBuf>,
    pub strict: bool,
    pub year: Option<i32>,
    pub top: Option<usize>,
    pub countries: Option<Vec<String>>,
    pub technology: ProductionMetric,
    pub out_csv: Option<PathBuf>,
    pub out_json: Option<PathBuf>,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions {
        config: None,
        consumption: None,
        production: None,
        gdp: None,
        strict: false,
        year: None,
        top: None,
        countries: None,
        technology: ProductionMetric::default(),
        out_csv: None,
        out_json: None,
    };

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" | "--consumption" | "--production" | "--gdp" | "--out-csv"
            | "--out-json" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    &format!("missing value for {flag} (expected a file path)"),
                )?;
                let slot = match flag {
                    "--config" => &mut opts.config,
                    "--consumption" => &mut opts.consumption,
                    "--production" => &mut opts.production,
                    "--gdp" => &mut opts.gdp,
                    "--out-csv" => &mut opts.out_csv,
                    _ => &mut opts.out_json,
                };
                if slot.replace(PathBuf::from(path)).is_some() {
                    return Err(format!("{flag} provided more than once"));
                }
            }
            "--year" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --year (expected a year)")?;
                let year = raw
                    .parse::<i32>()
                    .map_err(|_| format!("--year value \"{raw}\" is not a valid year"))?;
                opts.year = Some(year);
            }
            "--top" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --top (expected a count)")?;
                let top = raw
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("--top value \"{raw}\" must be a positive integer"))?;
                opts.top = Some(top);
            }
            "--countries" => {
                i += 1;
                let raw = args.next_or_err(
                    i,
                    "missing value for --countries (expected a comma-separated list)",
                )?;
                let countries: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if countries.is_empty() {
                    return Err("--countries needs at least one name".to_string());
                }
                opts.countries = Some(countries);
            }
            "--technology" => {
                i += 1;
                let raw = args.next_or_err(
                    i,
                    "missing value for --technology (expected total, wind, hydro, solar or other)",
                )?;
                opts.technology = raw.parse()?;
            }
            "--strict" => {
                opts.strict = true;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("energy-transition: reconcile renewable energy statistics with GDP");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  energy-transition [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load pipeline configuration from TOML");
    eprintln!("  --consumption <path>     Override the consumption CSV");
    eprintln!("  --production <path>      Override the production CSV");
    eprintln!("  --gdp <path>             Override the GDP workbook or CSV");
    eprintln!("  --strict                 Fail when a join drops countries");
    eprintln!("  --year <i32>             Year to rank (default from config)");
    eprintln!("  --top <n>                Number of ranked countries (default from config)");
    eprintln!("  --countries <a,b,..>     Selection to summarize (default: the ranking)");
    eprintln!("  --technology <name>      Trend metric: total, wind, hydro, solar, other");
    eprintln!("  --out-csv <path>         Export the reconciled table to CSV");
    eprintln!("  --out-json <path>        Export the reconciled table to JSON");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) to control diagnostics on stderr.");
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;
    use energy_transition::query::ProductionMetric;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_when_no_arguments() {
        let opts = parse_args_from(Vec::new()).expect("parse should succeed");
        assert!(opts.config.is_none());
        assert!(!opts.strict);
        assert_eq!(opts.technology, ProductionMetric::Total);
    }

    #[test]
    fn supports_source_overrides() {
        let opts = parse_args_from(args(&["--gdp", "gdp.csv", "--production", "prod.csv"]))
            .expect("parse should succeed");
        assert_eq!(
            opts.gdp.as_deref().and_then(|p| p.to_str()),
            Some("gdp.csv")
        );
        assert_eq!(
            opts.production.as_deref().and_then(|p| p.to_str()),
            Some("prod.csv")
        );
        assert!(opts.consumption.is_none());
    }

    #[test]
    fn parses_selection_and_ranking() {
        let opts = parse_args_from(args(&[
            "--year",
            "2019",
            "--top",
            "5",
            "--countries",
            "Norway, Brazil,",
            "--technology",
            "hydro",
            "--strict",
        ]))
        .expect("parse should succeed");
        assert_eq!(opts.year, Some(2019));
        assert_eq!(opts.top, Some(5));
        assert_eq!(
            opts.countries,
            Some(vec!["Norway".to_string(), "Brazil".to_string()])
        );
        assert_eq!(opts.technology, ProductionMetric::Hydro);
        assert!(opts.strict);
    }

    #[test]
    fn rejects_duplicate_path_flag() {
        let err = parse_args_from(args(&["--config", "a.toml", "--config", "b.toml"]))
            .err()
            .unwrap_or_default();
        assert!(err.contains("more than once"));
    }

    #[test]
    fn rejects_zero_top_and_missing_values() {
        assert!(parse_args_from(args(&["--top", "0"])).is_err());
        assert!(parse_args_from(args(&["--year"])).is_err());
        assert!(parse_args_from(args(&["--technology", "nuclear"])).is_err());
        assert!(parse_args_from(args(&["--bogus"])).is_err());
    }
}
