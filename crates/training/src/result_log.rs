use crate::checkpoint::ensure_dir;
use crate::{TrainError, TrainResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only text log of test results, one `<result>\t<timestamp>` line per run.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `result` stamped with the local time; returns the line written.
    pub fn append(&self, result: &str) -> TrainResult<String> {
        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.append_at(result, &stamp)
    }

    pub fn append_at(&self, result: &str, timestamp: &str) -> TrainResult<String> {
        if let Some(dir) = self.path.parent() {
            ensure_dir(dir)?;
        }
        let line = format!("{result}\t{timestamp}\n");
        let io_err = |source: std::io::Error| TrainError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)?;
        tracing::info!("{}", line.trim_end());
        tracing::info!("Generating log!");
        Ok(line)
    }
}
