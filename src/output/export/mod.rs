//! Export of solved trajectories to on-disk formats.
//!
//! Each format lives in its own sub-module behind a small free-function
//! API; adding a format means adding a file, not touching existing ones.
//!
//! # Available formats
//!
//! | Format | Module  | Writes                                   |
//! |--------|---------|------------------------------------------|
//! | CSV    | [`csv`] | scalar trajectories and spatial profiles |
//!
//! # Usage example
//!
//! ```rust,ignore
//! use bamm_rs::output::export::{export_csv, CsvConfig};
//!
//! // Time column plus one column per named output.
//! export_csv(&solution, &["Surface concentration"], "surface.csv", None)?;
//!
//! // Same, with solver metadata as # comments.
//! let config = CsvConfig::default().include_metadata(true);
//! export_csv(&solution, &["Surface concentration"], "surface.csv", Some(&config))?;
//! ```

pub mod csv;

pub use csv::{export_csv, export_profile_csv, CsvConfig};
