//! Per-export manifest: which file types went into one snapshot, and where
//! each one lives remotely.

use std::collections::BTreeMap;

use crate::dataset::DatasetFile;
use crate::error::StoreError;
use crate::exec::Operation;
use crate::ledger::VersionLedger;
use crate::model::{ExportRecord, FileType, Locator, ManifestDoc};
use crate::remote::RemoteStore;

pub const MANIFEST_MIME: &str = "application/json";
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

pub struct SnapshotManifest {
    title: String,
    folder: Option<Locator>,
    locators: BTreeMap<FileType, Locator>,
}

impl SnapshotManifest {
    /// New, empty, not yet assigned to any remote folder.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            folder: None,
            locators: BTreeMap::new(),
        }
    }

    /// Downloads and parses a previously published manifest document.
    pub fn fetch(store: &RemoteStore, locator: &str) -> Result<Self, StoreError> {
        let bytes = store.download(locator).join()?;
        let doc: ManifestDoc = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::local("parse manifest document", e))?;
        Ok(Self {
            title: doc.title,
            folder: None,
            locators: doc.files,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn folder(&self) -> Option<&Locator> {
        self.folder.as_ref()
    }

    /// Absence means that file type was not included in the export.
    pub fn locator_for(&self, ty: FileType) -> Option<&Locator> {
        self.locators.get(&ty)
    }

    pub fn set_locator_for(&mut self, ty: FileType, locator: Locator) {
        self.locators.insert(ty, locator);
    }

    /// Publishes one snapshot: creates a subfolder named after the title,
    /// uploads every dataset file concurrently, and only after all of them
    /// have locators uploads the manifest document itself and records it in
    /// the ledger. A failed upload fails the publish and leaves the folder
    /// and any finished files behind as orphans; the ledger is never pointed
    /// at an incomplete manifest.
    pub fn publish(
        &mut self,
        store: &RemoteStore,
        parent: &str,
        ledger: &mut VersionLedger,
        label: &str,
        files: &BTreeMap<FileType, Box<dyn DatasetFile>>,
    ) -> Result<Locator, StoreError> {
        let folder = store.create_folder(parent, &self.title).join()?;
        self.folder = Some(folder.clone());

        let mut pending: Vec<(FileType, Operation<Locator>)> = Vec::new();
        for (ty, file) in files {
            let bytes = file.export_bytes()?;
            pending.push((*ty, store.upload(&ty.file_name(), bytes, ty.mime(), &folder)));
        }

        // Barrier: every file upload must resolve before the manifest itself
        // goes up.
        for (ty, op) in pending {
            let locator = op.join()?;
            self.locators.insert(ty, locator);
        }

        let doc = ManifestDoc {
            version: 1,
            title: self.title.clone(),
            files: self.locators.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| StoreError::local("serialize manifest document", e))?;
        let manifest_locator = store
            .upload(MANIFEST_FILE_NAME, bytes, MANIFEST_MIME, &folder)
            .join()?;

        ledger.append(
            label,
            ExportRecord {
                display_name: self.title.clone(),
                locator: manifest_locator.clone(),
            },
        );
        ledger.persist(store)?;

        Ok(manifest_locator)
    }

    /// Imports the selected file types into their consumers. The destination
    /// graph is not safe under concurrent mutation, so each download is
    /// joined before the next one starts.
    pub fn import_into(
        &self,
        store: &RemoteStore,
        files: &mut BTreeMap<FileType, Box<dyn DatasetFile>>,
        selected: &[FileType],
    ) -> Result<(), StoreError> {
        for ty in selected {
            let Some(locator) = self.locators.get(ty) else {
                continue;
            };
            let Some(file) = files.get_mut(ty) else {
                continue;
            };
            let bytes = store.download(locator.as_str()).join()?;
            file.import_bytes(&bytes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/manifest/manifest_tests.rs"]
mod tests;
