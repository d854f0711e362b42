//! The seam between remote persistence and the editor's file types.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::model::FileType;

/// One dataset file of the node graph: produces bytes to upload and consumes
/// downloaded bytes. Individual file types plug in here.
pub trait DatasetFile: Send {
    fn file_type(&self) -> FileType;
    fn export_bytes(&self) -> Result<Vec<u8>, StoreError>;
    fn import_bytes(&mut self, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Dataset file stored at `<dir>/<base-name>.<extension>`.
pub struct DirFile {
    ty: FileType,
    path: PathBuf,
}

impl DirFile {
    pub fn new(dir: &Path, ty: FileType) -> Self {
        Self {
            ty,
            path: dir.join(ty.file_name()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetFile for DirFile {
    fn file_type(&self) -> FileType {
        self.ty
    }

    fn export_bytes(&self) -> Result<Vec<u8>, StoreError> {
        fs::read(&self.path)
            .map_err(|e| StoreError::local(&format!("read {}", self.path.display()), e))
    }

    fn import_bytes(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::local(&format!("create {}", parent.display()), e))?;
        }
        fs::write(&self.path, bytes)
            .map_err(|e| StoreError::local(&format!("write {}", self.path.display()), e))
    }
}

/// Maps a file type to its handler. The match is exhaustive: a new `FileType`
/// variant must pick a handler here before the crate compiles.
pub fn handler_for(dir: &Path, ty: FileType) -> Box<dyn DatasetFile> {
    match ty {
        FileType::NodeCoords
        | FileType::NodeConnections
        | FileType::NodeLabels
        | FileType::MapImage => Box::new(DirFile::new(dir, ty)),
    }
}

/// Handlers for the dataset files actually present in `dir`.
pub fn scan_dir(dir: &Path) -> BTreeMap<FileType, Box<dyn DatasetFile>> {
    FileType::ALL
        .into_iter()
        .filter(|ty| dir.join(ty.file_name()).is_file())
        .map(|ty| (ty, handler_for(dir, ty)))
        .collect()
}

/// Handlers for every file type, as import destinations under `dir`.
pub fn open_all(dir: &Path) -> BTreeMap<FileType, Box<dyn DatasetFile>> {
    FileType::ALL
        .into_iter()
        .map(|ty| (ty, handler_for(dir, ty)))
        .collect()
}
