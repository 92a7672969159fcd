// src/ledger/snapshot.rs

//! JSON snapshots of the in-memory ledger, keyed by block height.

use super::memory::InMemoryLedger;
use super::LedgerView;
use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub block_number: u64,
    pub ledger: InMemoryLedger,
}

impl LedgerSnapshot {
    pub fn capture(ledger: &InMemoryLedger) -> Self {
        Self {
            block_number: ledger.block_number(),
            ledger: ledger.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SimError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        log::info!("Saved ledger snapshot at block {} to {}", self.block_number, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: LedgerSnapshot = serde_json::from_reader(reader)?;
        log::debug!("Loaded ledger snapshot at block {}", snapshot.block_number);
        Ok(snapshot)
    }
}

/// `<dir>/ledger_<block>.json`
pub fn snapshot_path(dir: &Path, block_number: u64) -> PathBuf {
    dir.join(format!("ledger_{block_number}.json"))
}
