//! CSV export for solved trajectories
//!
//! Writes named outputs of a [`Solution`] to CSV, which loads directly
//! into spreadsheets, pandas, and MATLAB.
//!
//! # Quick Examples
//!
//! ## Scalar trajectories
//!
//! ```rust,ignore
//! use bamm_rs::output::export::export_csv;
//!
//! export_csv(&solution, &["Surface concentration"], "surface.csv", None)?;
//! ```
//!
//! **Output** (`surface.csv`):
//! ```csv
//! time,Surface concentration
//! 0.000000,0.900000
//! 0.010000,0.89712...
//! ```
//!
//! ## Full profile of one output
//!
//! ```rust,ignore
//! use bamm_rs::output::export::export_profile_csv;
//!
//! export_profile_csv(&solution, "Concentration", "profile.csv", None)?;
//! ```
//!
//! One row per sampled time, one column per cell.
//!
//! ## Solver metadata as comments
//!
//! ```rust,ignore
//! use bamm_rs::output::export::{export_csv, CsvConfig};
//!
//! let config = CsvConfig::default().include_metadata(true);
//! export_csv(&solution, &["Surface concentration"], "surface.csv", Some(&config))?;
//! ```
//!
//! prefixes the file with `# solver: ...` style comment lines taken from
//! the solution metadata.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::error::ExportError;
use crate::solver::Solution;

// =================================================================================================
// Configuration
// =================================================================================================

/// Formatting options for CSV export.
///
/// # Example
///
/// ```
/// use bamm_rs::output::export::CsvConfig;
///
/// let config = CsvConfig::default().delimiter(';').precision(10);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    delimiter: char,
    precision: usize,
    include_metadata: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            precision: 6,
            include_metadata: false,
        }
    }
}

impl CsvConfig {
    /// Config with 12 decimal places, for downstream numerical work.
    pub fn high_precision() -> Self {
        Self {
            precision: 12,
            ..Default::default()
        }
    }

    /// Sets the column separator.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the number of decimal places.
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Writes the solution metadata as `#` comment lines before the
    /// header.
    pub fn include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    fn format(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = self.precision)
    }
}

// =================================================================================================
// Helpers
// =================================================================================================

/// Metadata lines are sorted by key so the file is reproducible.
fn write_metadata(writer: &mut impl Write, solution: &Solution) -> Result<(), ExportError> {
    let mut keys: Vec<&String> = solution.metadata().keys().collect();
    keys.sort();
    for key in keys {
        writeln!(writer, "# {key}: {}", solution.metadata()[key])?;
    }
    writeln!(writer, "#")?;
    Ok(())
}

// =================================================================================================
// Export Functions
// =================================================================================================

/// Exports scalar output trajectories, one column per name.
///
/// The first column holds the sampled times; each requested output adds
/// a column under its own name.
///
/// # Errors
///
/// - [`ExportError::UnknownVariable`] when a name matches no output
/// - [`ExportError::NonScalar`] when the output is a spatial profile
///   (use [`export_profile_csv`] for those)
/// - [`ExportError::Io`] when the file cannot be written
pub fn export_csv(
    solution: &Solution,
    outputs: &[&str],
    path: &str,
    config: Option<&CsvConfig>,
) -> Result<(), ExportError> {
    let default_config = CsvConfig::default();
    let config = config.unwrap_or(&default_config);

    // ====== Extract columns before touching the filesystem ======

    let mut columns = Vec::with_capacity(outputs.len());
    for name in outputs {
        let processed = solution
            .variable(name)
            .map_err(|_| ExportError::UnknownVariable {
                name: name.to_string(),
            })?;
        let values = processed
            .as_scalars()
            .ok_or_else(|| ExportError::NonScalar {
                name: name.to_string(),
            })?
            .to_vec();
        columns.push(values);
    }

    // ====== Write ======

    let mut writer = BufWriter::new(File::create(path)?);

    if config.include_metadata {
        write_metadata(&mut writer, solution)?;
    }

    write!(writer, "time")?;
    for name in outputs {
        write!(writer, "{}{name}", config.delimiter)?;
    }
    writeln!(writer)?;

    for (i, time) in solution.times().iter().enumerate() {
        write!(writer, "{}", config.format(*time))?;
        for column in &columns {
            write!(writer, "{}{}", config.delimiter, config.format(column[i]))?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Exports the full spatial profile of one output.
///
/// One row per sampled time: the time first, then the value in every
/// cell from the domain minimum outward.
///
/// # Errors
///
/// - [`ExportError::UnknownVariable`] when the name matches no output
/// - [`ExportError::NonScalar`] when the output is a scalar trajectory
///   rather than a profile
/// - [`ExportError::Io`] when the file cannot be written
pub fn export_profile_csv(
    solution: &Solution,
    output: &str,
    path: &str,
    config: Option<&CsvConfig>,
) -> Result<(), ExportError> {
    let default_config = CsvConfig::default();
    let config = config.unwrap_or(&default_config);

    let processed = solution
        .variable(output)
        .map_err(|_| ExportError::UnknownVariable {
            name: output.to_string(),
        })?;
    let profiles = processed
        .as_profiles()
        .ok_or_else(|| ExportError::NonScalar {
            name: output.to_string(),
        })?;

    let mut writer = BufWriter::new(File::create(path)?);

    if config.include_metadata {
        write_metadata(&mut writer, solution)?;
    }

    let cells = profiles.first().map_or(0, |profile| profile.len());
    write!(writer, "time")?;
    for i in 0..cells {
        write!(writer, "{}cell {i}", config.delimiter)?;
    }
    writeln!(writer)?;

    for (time, profile) in solution.times().iter().zip(profiles) {
        write!(writer, "{}", config.format(*time))?;
        for value in profile.iter() {
            write!(writer, "{}{}", config.delimiter, config.format(*value))?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
