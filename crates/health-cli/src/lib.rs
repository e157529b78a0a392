//! # Health CLI
//!
//! Input handling for the `vax-aqi` command-line tool.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod input;

pub use input::{load_air_quality, load_densities, load_records, load_vaccinations, load_values};
