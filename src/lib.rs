//! Reconciles renewable energy production and consumption statistics with
//! national GDP into one per-country, per-year table.

pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod query;
pub mod records;
pub mod summary;
