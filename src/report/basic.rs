use std::io::Write;
use std::path::Path;

use super::Reporter;
use crate::error::Result;
use crate::strategy::StrategyResult;

/// Path, count, then `[index] [type] [value]` per barcode.
pub struct BasicReporter<W: Write> {
    out: W,
}

impl<W: Write> BasicReporter<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for BasicReporter<W> {
    fn result(&mut self, source: &Path, outcome: Option<&StrategyResult>) -> Result<()> {
        let barcodes = outcome.map(|r| r.barcodes.as_slice()).unwrap_or_default();
        writeln!(self.out, "{}", source.display())?;
        writeln!(self.out, "Found [{}] barcodes:", barcodes.len())?;
        for (index, barcode) in barcodes.iter().enumerate() {
            writeln!(
                self.out,
                "[{index}] [{}] [{}]",
                barcode.symbology,
                barcode.value()
            )?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }
}

/// `path [value] [value] ...` on one line.
pub struct TerseReporter<W: Write> {
    out: W,
}

impl<W: Write> TerseReporter<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for TerseReporter<W> {
    fn result(&mut self, source: &Path, outcome: Option<&StrategyResult>) -> Result<()> {
        write!(self.out, "{}", source.display())?;
        for barcode in outcome.iter().flat_map(|r| &r.barcodes) {
            write!(self.out, " [{}]", barcode.value())?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }
}
