//! Energy transition entry point: CLI wiring, config loading and report output.

mod cli;

use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use energy_transition::config::{JoinPolicy, PipelineConfig};
use energy_transition::io::export::{export_csv, export_json};
use energy_transition::pipeline::{Reconciliation, SourceTables, reconcile};
use energy_transition::query::{
    ProductionMetric, for_countries, technology_trend, top_by_production,
};
use energy_transition::records::{ReconciledRecord, fmt_opt};
use energy_transition::summary::SelectionSummary;

use cli::CliOptions;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Builds the effective configuration: file (or defaults) plus CLI overrides.
fn load_config(cli: &CliOptions) -> Result<PipelineConfig, String> {
    let mut cfg = match cli.config {
        Some(ref path) => PipelineConfig::from_toml_file(path).map_err(|e| e.to_string())?,
        None => PipelineConfig::default(),
    };

    if let Some(ref path) = cli.consumption {
        cfg.sources.consumption = path.clone();
    }
    if let Some(ref path) = cli.production {
        cfg.sources.production = path.clone();
    }
    if let Some(ref path) = cli.gdp {
        cfg.sources.gdp = path.clone();
    }
    if cli.strict {
        cfg.join.policy = JoinPolicy::Strict;
    }
    if let Some(year) = cli.year {
        cfg.ranking.default_year = year;
    }
    if let Some(top) = cli.top {
        cfg.ranking.default_top = top;
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(lines.join("\n"));
    }
    Ok(cfg)
}

fn print_coverage(out: &Reconciliation) {
    println!("--- Join Coverage ---");
    for gap in &out.coverage {
        println!("{gap}");
    }
    println!("Countries reconciled: {}", out.countries().len());
}

fn print_ranking(ranked: &[&ReconciledRecord], year: i32) {
    println!("\n--- Top {} Producers ({year}) ---", ranked.len());
    println!(
        "{:<4} {:<32} {:>10} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "#", "Country", "Wind", "Hydro", "Solar", "Other", "Total", "GDP (M$)"
    );
    for (rank, r) in ranked.iter().enumerate() {
        let p = &r.production;
        println!(
            "{:<4} {:<32} {:>10} {:>10} {:>10} {:>10} {:>10} {:>12}",
            rank + 1,
            r.country_name,
            fmt_opt(p.wind, 1),
            fmt_opt(p.hydro, 1),
            fmt_opt(p.solar, 1),
            fmt_opt(p.other, 1),
            fmt_opt(r.total_production, 1),
            fmt_opt(r.gdp_musd, 0),
        );
    }
}

fn print_trend(records: &[ReconciledRecord], countries: &[String], metric: ProductionMetric) {
    println!("\n--- {metric} production trend (TWh) ---");
    for series in technology_trend(records, countries, metric) {
        let points: Vec<String> = series
            .points
            .iter()
            .map(|(year, value)| format!("{year}={}", fmt_opt(*value, 1)))
            .collect();
        println!("{}: {}", series.country_name, points.join(" "));
    }
}

fn run(cli: &CliOptions) -> Result<(), String> {
    let cfg = load_config(cli)?;

    let sources = SourceTables::load(&cfg).map_err(|e| e.to_string())?;
    let out = reconcile(&sources, &cfg).map_err(|e| e.to_string())?;

    print_coverage(&out);

    let year = cfg.ranking.default_year;
    let ranked = top_by_production(
        &out.records,
        year,
        cfg.ranking.default_top,
        &cfg.ranking.excluded,
    );
    print_ranking(&ranked, year);

    let selected_countries: Vec<String> = match cli.countries {
        Some(ref names) => names.clone(),
        None => ranked.iter().map(|r| r.country_name.clone()).collect(),
    };
    let selection: Vec<&ReconciledRecord> = for_countries(&out.records, &selected_countries)
        .into_iter()
        .filter(|r| r.year == year)
        .collect();
    println!("\n{}", SelectionSummary::compute(&selection, &ranked));

    print_trend(&out.records, &selected_countries, cli.technology);

    if let Some(ref path) = cli.out_csv {
        export_csv(&out.records, path)
            .map_err(|e| format!("failed to write CSV \"{}\": {e}", path.display()))?;
        info!(path = %path.display(), "reconciled table written");
    }
    if let Some(ref path) = cli.out_json {
        export_json(&out.records, path)
            .map_err(|e| format!("failed to write JSON \"{}\": {e}", path.display()))?;
        info!(path = %path.display(), "reconciled table written");
    }
    Ok(())
}

fn main() {
    let cli = match cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    init_logging();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
