use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::Reporter;
use crate::error::Result;
use crate::strategy::StrategyResult;

/// Renames each file after its decoded value, keeping the extension.
///
/// The first value renames the file; every further value gets a copy. If the
/// destination exists the value is skipped, unless `avoid_collisions` is set,
/// in which case `-1`, `-2`, ... is appended to the stem until a free name is
/// found. Characters that cannot appear in file names become `-`.
#[derive(Debug, Clone, Default)]
pub struct RenameReporter {
    avoid_collisions: bool,
}

impl RenameReporter {
    /// With `avoid_collisions`, taken names get a numeric suffix.
    pub fn new(avoid_collisions: bool) -> Self {
        Self { avoid_collisions }
    }

    fn destination(&self, source: &Path, stem: &str) -> Option<PathBuf> {
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let candidate = dir.join(format!("{stem}{ext}"));
        if candidate == source || !candidate.exists() {
            return Some(candidate);
        }
        if !self.avoid_collisions {
            return None;
        }
        (1..)
            .map(|n| dir.join(format!("{stem}-{n}{ext}")))
            .find(|p| !p.exists())
    }
}

fn file_stem_for(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

impl Reporter for RenameReporter {
    fn result(&mut self, source: &Path, outcome: Option<&StrategyResult>) -> Result<()> {
        let Some(outcome) = outcome else {
            info!(path = %source.display(), "no barcodes, not renaming");
            return Ok(());
        };

        let mut seen = HashSet::new();
        let mut renamed: Option<PathBuf> = None;
        for barcode in &outcome.barcodes {
            let stem = file_stem_for(&barcode.value());
            if stem.is_empty() || !seen.insert(stem.clone()) {
                continue;
            }
            let Some(dest) = self.destination(source, &stem) else {
                warn!(path = %source.display(), value = %stem, "destination exists, skipping");
                continue;
            };
            match &renamed {
                None => {
                    info!(from = %source.display(), to = %dest.display(), "rename");
                    if dest != source {
                        fs::rename(source, &dest)?;
                    }
                    renamed = Some(dest);
                }
                Some(first) => {
                    if dest == source {
                        continue;
                    }
                    info!(from = %first.display(), to = %dest.display(), "copy");
                    fs::copy(first, &dest)?;
                }
            }
        }
        Ok(())
    }
}
