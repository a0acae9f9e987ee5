//! Output of simulation results
//!
//! Everything under this module consumes a finished
//! [`Solution`](crate::solver::Solution) and turns it into something a
//! human or another tool can use. Nothing here feeds back into the
//! pipeline.
//!
//! # Architecture
//!
//! ```text
//! output/
//! ├── mod.rs       ← This file
//! └── export/      ← Data export
//!     ├── mod.rs
//!     └── csv.rs
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bamm_rs::output::export::export_csv;
//!
//! export_csv(&solution, &["Surface concentration"], "surface.csv", None)?;
//! ```

pub mod export;

pub use export::{export_csv, export_profile_csv, CsvConfig};
