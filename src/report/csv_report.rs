use std::io::Write;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use super::Reporter;
use crate::error::Result;
use crate::strategy::StrategyResult;

const HEADER: [&str; 10] = [
    "OS",
    "Engine",
    "Directory",
    "File",
    "Image.conversion",
    "Elapsed",
    "N.found",
    "Types",
    "Values",
    "Strategy",
];

#[derive(Serialize)]
struct Row<'a> {
    os: &'a str,
    engine: &'a str,
    directory: String,
    file: String,
    conversion: &'a str,
    elapsed: f64,
    found: usize,
    types: String,
    values: String,
    strategy: &'a str,
}

/// One CSV row per file. Types and values are joined with `|`. `Elapsed`
/// is seconds since the reporter was created.
pub struct CsvReporter<W: Write> {
    writer: csv::Writer<W>,
    engine: String,
    conversion: &'static str,
    start: Instant,
}

impl<W: Write> CsvReporter<W> {
    /// Writes the header immediately.
    pub fn new(out: W, engine: &str, greyscale: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
        writer.write_record(HEADER)?;
        Ok(Self {
            writer,
            engine: engine.to_string(),
            conversion: if greyscale { "Greyscale" } else { "Unchanged" },
            start: Instant::now(),
        })
    }

    /// Flush and give back the writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| std::io::Error::other(err.to_string()).into())
    }
}

impl<W: Write> Reporter for CsvReporter<W> {
    fn result(&mut self, source: &Path, outcome: Option<&StrategyResult>) -> Result<()> {
        let barcodes = outcome.map(|r| r.barcodes.as_slice()).unwrap_or_default();
        let row = Row {
            os: std::env::consts::OS,
            engine: &self.engine,
            directory: source
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file: source
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            conversion: self.conversion,
            elapsed: self.start.elapsed().as_secs_f64(),
            found: barcodes.len(),
            types: barcodes
                .iter()
                .map(|b| b.symbology.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            values: barcodes.iter().map(|b| b.value()).collect::<Vec<_>>().join("|"),
            strategy: outcome.map(|r| r.strategy.as_str()).unwrap_or_default(),
        };
        self.writer.serialize(row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}
