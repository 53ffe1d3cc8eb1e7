//! Shared fixtures for integration tests: small source files in a temp dir.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use energy_transition::config::PipelineConfig;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

pub const PRODUCTION_HEADER: &str = "Entity,Code,Year,Electricity from wind (TWh),\
Electricity from hydro (TWh),Electricity from solar (TWh),\
Electricity from other renewables including bioenergy (TWh)";

pub const CONSUMPTION_HEADER: &str = "Entity,Code,Year,Geo Biomass Other - TWh,\
Solar Generation - TWh,Wind Generation - TWh,Hydro Generation - TWh";

/// Alpha and Beta in 2019-2020, plus World as an aggregate row.
pub const PRODUCTION_ROWS: &[&str] = &[
    "Alpha,ALP,2019,9,5,0,0",
    "Alpha,ALP,2020,10,5,0,0",
    "Beta,BET,2020,2,1,1,",
    "World,OWID_WRL,2020,100,50,20,5",
];

pub const CONSUMPTION_ROWS: &[&str] = &[
    "Alpha,ALP,2019,0,0,7,3",
    "Alpha,ALP,2020,0,0,8,3",
    "Beta,BET,2020,1,1,2,1",
    "World,OWID_WRL,2020,5,20,100,50",
];

/// GDP years present in every fixture (1999 falls outside the default window).
pub const GDP_YEARS: [i32; 3] = [1999, 2019, 2020];

/// `(name, code, values per GDP_YEARS)`; Beta is absent so it drops at the GDP join.
pub const GDP_ROWS: &[(&str, &str, [f64; 3])] = &[
    ("Alpha, Rep.", "ALP", [1.0, 1_800_000.0, 2_000_000.0]),
    ("World", "WLD", [1.0, 80_000_000.0, 85_000_000.0]),
];

/// Temp directory holding one set of source files.
pub struct Fixture {
    pub dir: TempDir,
    pub consumption: PathBuf,
    pub production: PathBuf,
    pub gdp: PathBuf,
}

impl Fixture {
    /// Config pointing at the fixture files with the alias Alpha needs.
    pub fn config(&self) -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        cfg.sources.consumption = self.consumption.clone();
        cfg.sources.production = self.production.clone();
        cfg.sources.gdp = self.gdp.clone();
        cfg.country_aliases
            .0
            .insert("Alpha, Rep.".to_string(), "Alpha".to_string());
        cfg
    }
}

fn write_lines(path: &Path, header: &str, rows: &[&str]) {
    let mut body = String::from(header);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    fs::write(path, body).expect("write fixture");
}

fn write_energy(dir: &Path) -> (PathBuf, PathBuf) {
    let consumption = dir.join("consumption.csv");
    let production = dir.join("production.csv");
    write_lines(&consumption, CONSUMPTION_HEADER, CONSUMPTION_ROWS);
    write_lines(&production, PRODUCTION_HEADER, PRODUCTION_ROWS);
    (consumption, production)
}

/// Fixture with the GDP table as CSV, preceded by World Bank style preamble rows.
pub fn csv_fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let (consumption, production) = write_energy(dir.path());

    let gdp = dir.path().join("gdp.csv");
    let mut lines = vec![
        "Data Source,World Development Indicators".to_string(),
        String::new(),
        format!(
            "Country Name,Country Code,Indicator Name,Indicator Code,{}",
            GDP_YEARS.map(|y| y.to_string()).join(",")
        ),
    ];
    for (name, code, values) in GDP_ROWS {
        lines.push(format!(
            "\"{name}\",{code},GDP (current US$),NY.GDP.MKTP.CD,{}",
            values.map(|v| v.to_string()).join(",")
        ));
    }
    fs::write(&gdp, lines.join("\n")).expect("write gdp");

    Fixture {
        dir,
        consumption,
        production,
        gdp,
    }
}

/// Fixture with the GDP table as an `.xlsx` workbook on a sheet named `Data`.
pub fn xlsx_fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let (consumption, production) = write_energy(dir.path());

    let gdp = dir.path().join("gdp.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Data").expect("sheet name");

    let ids = ["Country Name", "Country Code", "Indicator Name", "Indicator Code"];
    for (col, id) in ids.iter().enumerate() {
        sheet.write_string(0, col as u16, *id).expect("write header");
    }
    for (i, year) in GDP_YEARS.iter().enumerate() {
        sheet
            .write_number(0, (ids.len() + i) as u16, f64::from(*year))
            .expect("write year");
    }
    for (r, (name, code, values)) in GDP_ROWS.iter().enumerate() {
        let row = (r + 1) as u32;
        sheet.write_string(row, 0, *name).expect("write name");
        sheet.write_string(row, 1, *code).expect("write code");
        sheet.write_string(row, 2, "GDP (current US$)").expect("write indicator");
        sheet.write_string(row, 3, "NY.GDP.MKTP.CD").expect("write indicator code");
        for (i, value) in values.iter().enumerate() {
            sheet
                .write_number(row, (ids.len() + i) as u16, *value)
                .expect("write value");
        }
    }
    workbook.save(&gdp).expect("save workbook");

    Fixture {
        dir,
        consumption,
        production,
        gdp,
    }
}
