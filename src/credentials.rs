use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

const CREDENTIALS_FILE: &str = "credentials.json";

/// The one shared credential for the process lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub base_url: String,
    pub token: String,
}

/// Per-user on-disk credential store. Clearing it is the sole mechanism to
/// force re-authentication.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$WAYMARK_HOME` if set, otherwise `~/.waymark`.
    pub fn default_dir() -> Result<Self, StoreError> {
        if let Some(dir) = std::env::var_os("WAYMARK_HOME") {
            return Ok(Self::at(PathBuf::from(dir)));
        }
        let home = std::env::var_os("HOME").ok_or_else(|| {
            StoreError::LocalIo("neither WAYMARK_HOME nor HOME is set".to_string())
        })?;
        Ok(Self::at(PathBuf::from(home).join(".waymark")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    pub fn load(&self) -> Result<Credentials, StoreError> {
        let path = self.credentials_path();
        if !path.is_file() {
            return Err(StoreError::LocalIo(
                "not signed in (run `waymark login --url ... --token ...`)".to_string(),
            ));
        }
        let bytes = fs::read(&path)
            .map_err(|e| StoreError::local(&format!("read {}", path.display()), e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::local(&format!("parse {}", path.display()), e))
    }

    pub fn save(&self, creds: &Credentials) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::local(&format!("create {}", self.dir.display()), e))?;
        let bytes = serde_json::to_vec_pretty(creds)
            .map_err(|e| StoreError::local("serialize credentials", e))?;
        let path = self.credentials_path();
        fs::write(&path, bytes)
            .map_err(|e| StoreError::local(&format!("write {}", path.display()), e))
    }

    /// Deletes the store. Missing directory is not an error; the next
    /// `authenticate` simply fails until the user signs in again.
    pub fn purge(&self) -> Result<(), StoreError> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::local(
                &format!("clear credential store {}", self.dir.display()),
                e,
            )),
        }
    }
}
