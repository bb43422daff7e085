//! Reporting decode outcomes
//!
//! A reporter receives one call per input file: the path and either the
//! winning strategy's result or `None` when nothing was found (or the file
//! could not be processed).

/// Plain text reporters
pub mod basic;
/// One CSV row per file
pub mod csv_report;
/// Rename files after their decoded values
pub mod rename;

use std::path::Path;

use crate::error::Result;
use crate::strategy::StrategyResult;

pub use basic::{BasicReporter, TerseReporter};
pub use csv_report::CsvReporter;
pub use rename::RenameReporter;

/// Receives the outcome for each processed file.
pub trait Reporter {
    /// Report one file; `None` when nothing was decoded.
    fn result(&mut self, source: &Path, outcome: Option<&StrategyResult>) -> Result<()>;

    /// Flush any buffered output.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn result(&mut self, source: &Path, outcome: Option<&StrategyResult>) -> Result<()> {
        (**self).result(source, outcome)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
