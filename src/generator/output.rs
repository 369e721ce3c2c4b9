use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::config::OutputTarget;

/// Result of comparing generated code with the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    UpToDate,
    Stale,
    Missing,
}

/// Write generated code to its target. Nothing is written on earlier failures.
pub fn write_output(target: &OutputTarget, code: &str) -> anyhow::Result<()> {
    match target {
        OutputTarget::Stdout => {
            let mut out = io::stdout().lock();
            out.write_all(code.as_bytes())
                .and_then(|()| out.flush())
                .context("can't write generated code to stdout")?;
        }
        OutputTarget::File(path) => {
            fs::write(path, code).with_context(|| format!("can't write {}", path.display()))?;
            info!(path = %path.display(), bytes = code.len(), "generated code written");
        }
    }
    Ok(())
}

/// Compare `code` with the content of `path` without writing anything.
pub fn check_output(path: &Path, code: &str) -> anyhow::Result<CheckOutcome> {
    match fs::read_to_string(path) {
        Ok(current) if current == code => Ok(CheckOutcome::UpToDate),
        Ok(_) => Ok(CheckOutcome::Stale),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CheckOutcome::Missing),
        Err(e) => Err(e).with_context(|| format!("can't read {}", path.display())),
    }
}
