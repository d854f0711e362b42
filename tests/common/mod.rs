use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use waymark::credentials::{CredentialStore, Credentials};
use waymark::remote::RemoteStore;

pub struct ServerGuard {
    pub base_url: String,
    pub token: String,
    _data_dir: tempfile::TempDir,
    child: Child,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_server() -> Result<ServerGuard> {
    let data_dir = tempfile::tempdir().context("create server tempdir")?;

    let token = "dev".to_string();

    let addr_file = data_dir.path().join("addr.txt");

    let child = Command::new(env!("CARGO_BIN_EXE_waymark-remote"))
        .args([
            "--addr",
            "127.0.0.1:0",
            "--addr-file",
            addr_file.to_str().unwrap(),
            "--dev-token",
            &token,
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn waymark-remote")?;

    let base_url = read_addr_file(&addr_file)?;
    wait_for_healthz(&base_url)?;

    Ok(ServerGuard {
        base_url,
        token,
        _data_dir: data_dir,
        child,
    })
}

/// Writes a credential file under `dir` and opens a store against the guarded
/// server with it.
pub fn signed_in_store(server: &ServerGuard, dir: &Path) -> Result<RemoteStore> {
    store_with_token(server, dir, &server.token)
}

pub fn store_with_token(server: &ServerGuard, dir: &Path, token: &str) -> Result<RemoteStore> {
    let creds = CredentialStore::at(dir);
    creds.save(&Credentials {
        base_url: server.base_url.clone(),
        token: token.to_string(),
    })?;
    let store = RemoteStore::connect(&server.base_url, creds, 4)?;
    Ok(store)
}

fn read_addr_file(addr_file: &Path) -> Result<String> {
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("addr file not written at {}", addr_file.display());
        }
        if let Ok(addr) = std::fs::read_to_string(addr_file) {
            let addr = addr.trim();
            if !addr.is_empty() {
                return Ok(format!("http://{}", addr));
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn wait_for_healthz(base_url: &str) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("server at {} never became healthy", base_url);
        }
        if let Ok(resp) = client.get(format!("{}/healthz", base_url)).send() {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
}
