//! Append-only registry of published snapshots, grouped by version label.

use crate::error::StoreError;
use crate::model::{ExportRecord, LedgerDoc, Locator, VersionEntry};
use crate::remote::RemoteStore;

pub const LEDGER_MIME: &str = "application/json";

/// In-memory copy of the canonical ledger document, loaded once per process.
///
/// Exports are held in append order and presented newest-first. `persist`
/// overwrites the remote copy unconditionally; the last writer wins.
pub struct VersionLedger {
    locator: Locator,
    doc: LedgerDoc,
}

impl VersionLedger {
    /// Downloads and parses the canonical ledger document. Queries are only
    /// possible on a loaded ledger.
    pub fn load(store: &RemoteStore, locator: &str) -> Result<Self, StoreError> {
        let id = Locator::normalize(locator);
        let bytes = store.download(locator).join().map_err(ledger_access)?;
        let doc: LedgerDoc = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::LedgerAccess(format!("parse ledger document: {}", e)))?;
        Ok(Self { locator: id, doc })
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Known version labels, in the order they first appeared.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.doc.versions.iter().map(|v| v.label.as_str())
    }

    /// Exports recorded under `label`, newest first. Unknown labels yield an
    /// empty sequence.
    pub fn exports_for(&self, label: &str) -> impl Iterator<Item = &ExportRecord> {
        self.doc
            .versions
            .iter()
            .find(|v| v.label == label)
            .map(|v| v.exports.iter().rev())
            .into_iter()
            .flatten()
    }

    /// Adds `record` as the new most-recent entry for `label`, creating the
    /// label on first use.
    pub fn append(&mut self, label: &str, record: ExportRecord) {
        match self.doc.versions.iter_mut().find(|v| v.label == label) {
            Some(entry) => entry.exports.push(record),
            None => self.doc.versions.push(VersionEntry {
                label: label.to_string(),
                exports: vec![record],
            }),
        }
    }

    /// Re-uploads the full document over the canonical remote copy.
    pub fn persist(&self, store: &RemoteStore) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.doc)
            .map_err(|e| StoreError::local("serialize ledger document", e))?;
        store
            .update(self.locator.as_str(), bytes, LEDGER_MIME)
            .join()
            .map_err(ledger_access)?;
        Ok(())
    }
}

/// Any failure touching the canonical ledger document surfaces as
/// `LedgerAccess`, not as a generic transport/permission error.
fn ledger_access(err: StoreError) -> StoreError {
    match err {
        StoreError::LedgerAccess(_) => err,
        other => StoreError::LedgerAccess(other.to_string()),
    }
}

#[cfg(test)]
#[path = "tests/ledger/ledger_tests.rs"]
mod tests;
