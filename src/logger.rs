//! Optional JSONL log of transfer outcomes (`--log-file`)

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Completed,
    Refused,
    Failed,
}

#[derive(Serialize, Debug)]
pub struct TransferRecord {
    pub timestamp: String,
    pub role: &'static str,
    pub peer: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub declared: u64,
    pub status: TransferStatus,
}

impl TransferRecord {
    pub fn new(
        role: &'static str,
        peer: String,
        path: &Path,
        bytes: u64,
        declared: u64,
        status: TransferStatus,
    ) -> Self {
        TransferRecord {
            timestamp: Utc::now().to_rfc3339(),
            role,
            peer,
            path: path.to_path_buf(),
            bytes,
            declared,
            status,
        }
    }
}

pub trait Logger: Send + Sync {
    fn record(&self, _entry: &TransferRecord) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

pub struct JsonlLogger {
    file: Mutex<File>,
}

impl JsonlLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context("open transfer log file")?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }
}

impl Logger for JsonlLogger {
    fn record(&self, entry: &TransferRecord) {
        if let Ok(mut f) = self.file.lock() {
            if let Ok(line) = serde_json::to_string(entry) {
                let _ = writeln!(f, "{}", line);
            }
        }
    }
}
