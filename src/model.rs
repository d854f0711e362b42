use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque reference to an object held by the remote file store.
///
/// Accepted either as a bare identifier or embedded in a share/download URL
/// containing `id=<value>`; [`Locator::normalize`] extracts the value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(pub String);

impl Locator {
    /// Takes everything after the last `id=`, so normalizing an already
    /// normalized locator is a no-op.
    pub fn normalize(raw: &str) -> Locator {
        match raw.rfind("id=") {
            Some(idx) => Locator(raw[idx + 3..].to_string()),
            None => Locator(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abstract dataset file types of one node-graph export. Each supplies
/// exactly one content type and one filename extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    NodeCoords,
    NodeConnections,
    NodeLabels,
    MapImage,
}

impl FileType {
    pub const ALL: [FileType; 4] = [
        FileType::NodeCoords,
        FileType::NodeConnections,
        FileType::NodeLabels,
        FileType::MapImage,
    ];

    pub fn mime(self) -> &'static str {
        match self {
            FileType::NodeCoords | FileType::NodeConnections | FileType::NodeLabels => "text/csv",
            FileType::MapImage => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileType::NodeCoords | FileType::NodeConnections | FileType::NodeLabels => "csv",
            FileType::MapImage => "png",
        }
    }

    pub fn base_name(self) -> &'static str {
        match self {
            FileType::NodeCoords => "node-coords",
            FileType::NodeConnections => "node-connections",
            FileType::NodeLabels => "node-labels",
            FileType::MapImage => "map-image",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.{}", self.base_name(), self.extension())
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node-coords" => Ok(FileType::NodeCoords),
            "node-connections" => Ok(FileType::NodeConnections),
            "node-labels" => Ok(FileType::NodeLabels),
            "map-image" => Ok(FileType::MapImage),
            other => Err(format!("unknown file type {:?}", other)),
        }
    }
}

/// One published snapshot, scoped to a version label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub display_name: String,
    pub locator: Locator,
}

/// On-wire form of the version ledger. Exports are stored in append order,
/// oldest first; the newest-first rule is applied on read.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerDoc {
    pub version: u32,
    pub versions: Vec<VersionEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VersionEntry {
    pub label: String,
    pub exports: Vec<ExportRecord>,
}

/// On-wire form of one snapshot manifest. A missing key means that file type
/// was not included in the export.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestDoc {
    pub version: u32,
    pub title: String,
    pub files: BTreeMap<FileType, Locator>,
}

#[cfg(test)]
#[path = "tests/model/locator_tests.rs"]
mod tests;
