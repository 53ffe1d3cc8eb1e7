//! Source loaders and reconciled-table export.

pub mod energy;
pub mod export;
pub mod gdp;
pub mod sheet;
