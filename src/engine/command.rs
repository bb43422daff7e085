use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::Engine;
use crate::error::EngineError;
use crate::models::Barcode;

/// How to read a decoder's standard output. One barcode per non-empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// `TYPE:data`, as printed by `zbarimg`
    TypedLines,
    /// The bare value; every barcode gets `symbology`
    ValueLines {
        /// Symbology reported for every line
        symbology: String,
    },
}

/// A decoder run as a child process on a temporary PNG.
///
/// The image path is appended after `args`. Anything written to stderr is
/// treated as an engine failure, as is a non-zero exit status other than
/// the configured "no symbols found" status.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    name: String,
    program: OsString,
    args: Vec<OsString>,
    format: OutputFormat,
    no_result_status: Option<i32>,
}

impl CommandEngine {
    /// Engine `name` running `program` with `args`.
    pub fn new<I, S>(name: &str, program: impl Into<OsString>, args: I, format: OutputFormat) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            name: name.to_string(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            format,
            no_result_status: None,
        }
    }

    /// Exit status the program uses to say it found nothing.
    pub fn with_no_result_status(self, status: i32) -> Self {
        Self {
            no_result_status: Some(status),
            ..self
        }
    }

    /// `zbarimg --quiet`, which exits with 4 when nothing was found.
    pub fn zbar() -> Self {
        Self::new("zbar", "zbarimg", ["--quiet"], OutputFormat::TypedLines).with_no_result_status(4)
    }

    /// `dmtxread` from libdmtx.
    pub fn dmtx() -> Self {
        Self::new(
            "libdmtx",
            "dmtxread",
            Vec::<OsString>::new(),
            OutputFormat::ValueLines {
                symbology: "Data Matrix".to_string(),
            },
        )
    }

    /// True if the program can be found.
    pub fn available(&self) -> bool {
        find_program(&self.program).is_some()
    }

    /// `self` if the program can be found, `Unavailable` otherwise.
    pub fn ensure_available(self) -> Result<Self, EngineError> {
        if self.available() {
            Ok(self)
        } else {
            Err(EngineError::Unavailable(self.name))
        }
    }

    /// Run the decoder on an image file.
    pub fn decode_file(&self, path: &Path) -> Result<Vec<Barcode>, EngineError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            return Err(self.failed(stderr.trim().to_string()));
        }
        let status = output.status.code();
        if !output.status.success() && status != self.no_result_status {
            return Err(self.failed(format!("exit status {:?}", status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| self.parse_line(line))
            .collect()
    }

    fn parse_line(&self, line: &str) -> Result<Barcode, EngineError> {
        let (symbology, value) = match &self.format {
            OutputFormat::TypedLines => line
                .split_once(':')
                .ok_or_else(|| self.failed(format!("unexpected output line [{line}]")))?,
            OutputFormat::ValueLines { symbology } => (symbology.as_str(), line),
        };
        Barcode::new(symbology, value.as_bytes()).map_err(|err| self.failed(err.to_string()))
    }

    fn failed(&self, message: String) -> EngineError {
        EngineError::Failed {
            engine: self.name.clone(),
            message,
        }
    }
}

impl Engine for CommandEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, EngineError> {
        let temp = tempfile::Builder::new()
            .prefix("gouda-")
            .suffix(".png")
            .tempfile()?;
        debug!(path = %temp.path().display(), engine = %self.name, "writing temp file");
        image.save_with_format(temp.path(), ImageFormat::Png)?;
        self.decode_file(temp.path())
    }
}

/// Resolve `program` against `PATH` unless it already names a file.
fn find_program(program: &OsString) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|p| p.is_file())
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn script(body: &str, format: OutputFormat) -> CommandEngine {
        CommandEngine::new("script", "sh", ["-c", body, "script"], format)
    }

    fn blank() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255])))
    }

    #[test]
    fn test_typed_lines() {
        let engine = script(
            "test -f \"$1\" && printf 'CODE-128:Stegosaurus\\n\\nEAN-13:123\\n'",
            OutputFormat::TypedLines,
        );
        let barcodes = engine.decode(&blank()).unwrap();
        assert_eq!(barcodes.len(), 2);
        assert_eq!(barcodes[0].symbology, "CODE-128");
        assert_eq!(barcodes[0].data, b"Stegosaurus");
        assert_eq!(barcodes[1].symbology, "EAN-13");
    }

    #[test]
    fn test_value_lines() {
        let engine = script(
            "echo 1265025",
            OutputFormat::ValueLines {
                symbology: "Data Matrix".into(),
            },
        );
        let barcodes = engine.decode(&blank()).unwrap();
        assert_eq!(barcodes.len(), 1);
        assert_eq!(barcodes[0].symbology, "Data Matrix");
        assert_eq!(barcodes[0].value(), "1265025");
    }

    #[test]
    fn test_stderr_is_failure() {
        let engine = script("echo boom >&2", OutputFormat::TypedLines);
        assert!(matches!(
            engine.decode(&blank()),
            Err(EngineError::Failed { .. })
        ));
    }

    #[test]
    fn test_no_result_status() {
        let engine = script("exit 4", OutputFormat::TypedLines);
        assert!(engine.decode(&blank()).is_err());
        let engine = engine.with_no_result_status(4);
        assert!(engine.decode(&blank()).unwrap().is_empty());
    }

    #[test]
    fn test_availability() {
        assert!(script("true", OutputFormat::TypedLines).available());
        let missing = CommandEngine::new(
            "missing",
            "gouda-no-such-decoder",
            Vec::<OsString>::new(),
            OutputFormat::TypedLines,
        );
        assert!(!missing.available());
        assert!(matches!(
            missing.ensure_available(),
            Err(EngineError::Unavailable(_))
        ));
    }
}
