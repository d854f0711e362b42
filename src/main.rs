use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use waymark::credentials::{CredentialStore, Credentials};
use waymark::dataset;
use waymark::ledger::VersionLedger;
use waymark::manifest::SnapshotManifest;
use waymark::model::FileType;
use waymark::remote::{DEFAULT_LEDGER_LOCATOR, DEFAULT_ROOT_FOLDER, RemoteStore};

const DEFAULT_WORKERS: usize = 4;

#[derive(Parser)]
#[command(name = "waymark")]
#[command(about = "Publish and import node-graph dataset snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the shared remote credential
    Login {
        #[arg(long)]
        url: String,
        #[arg(long)]
        token: String,
    },

    /// Clear the credential store, forcing re-authentication
    Logout,

    /// List known version labels
    Versions {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List exports under a version label, newest first
    Exports {
        label: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Publish the dataset files in a directory as one snapshot
    Publish {
        /// Version label to record the export under
        #[arg(long)]
        label: String,
        /// Snapshot title (defaults to a timestamped name)
        #[arg(long)]
        title: Option<String>,
        /// Directory holding the dataset files
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Parent folder locator (raw id or share URL)
        #[arg(long, default_value = DEFAULT_ROOT_FOLDER)]
        parent: String,
    },

    /// Import a published snapshot into a directory
    Import {
        /// Version label to import from
        #[arg(long)]
        label: String,
        /// Snapshot title (defaults to the newest export under the label)
        #[arg(long)]
        title: Option<String>,
        /// Destination directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// File types to import (defaults to all present in the manifest)
        #[arg(long, value_delimiter = ',')]
        types: Vec<FileType>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { url, token } => {
            let creds = CredentialStore::default_dir()?;
            creds.save(&Credentials {
                base_url: url,
                token,
            })?;
            println!("signed in; credential stored at {}", creds.dir().display());
        }
        Commands::Logout => {
            let creds = CredentialStore::default_dir()?;
            creds.purge()?;
            println!("credential store cleared");
        }
        Commands::Versions { json } => {
            let store = open_store()?;
            let ledger = VersionLedger::load(&store, DEFAULT_LEDGER_LOCATOR)?;
            if json {
                let labels: Vec<&str> = ledger.labels().collect();
                println!("{}", serde_json::to_string_pretty(&labels)?);
            } else {
                for label in ledger.labels() {
                    println!("{}", label);
                }
            }
        }
        Commands::Exports { label, json } => {
            let store = open_store()?;
            let ledger = VersionLedger::load(&store, DEFAULT_LEDGER_LOCATOR)?;
            let exports: Vec<_> = ledger.exports_for(&label).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&exports)?);
            } else {
                for record in exports {
                    println!("{}\t{}", record.display_name, record.locator);
                }
            }
        }
        Commands::Publish {
            label,
            title,
            dir,
            parent,
        } => {
            let title = match title {
                Some(title) => title,
                None => default_title()?,
            };
            let files = dataset::scan_dir(&dir);
            if files.is_empty() {
                return Err(anyhow!("no dataset files found in {}", dir.display()));
            }

            let store = open_store()?;
            let mut ledger = VersionLedger::load(&store, DEFAULT_LEDGER_LOCATOR)?;
            let mut manifest = SnapshotManifest::new(&title);
            let locator = manifest.publish(&store, &parent, &mut ledger, &label, &files)?;
            println!("published {} under {} ({})", title, label, locator);
        }
        Commands::Import {
            label,
            title,
            dir,
            types,
        } => {
            let store = open_store()?;
            let ledger = VersionLedger::load(&store, DEFAULT_LEDGER_LOCATOR)?;
            let record = match &title {
                Some(title) => ledger
                    .exports_for(&label)
                    .find(|r| r.display_name == *title)
                    .ok_or_else(|| anyhow!("no export named {} under {}", title, label))?,
                None => ledger
                    .exports_for(&label)
                    .next()
                    .ok_or_else(|| anyhow!("no exports under {}", label))?,
            };

            let manifest = SnapshotManifest::fetch(&store, record.locator.as_str())?;
            let selected: Vec<FileType> = if types.is_empty() {
                FileType::ALL.to_vec()
            } else {
                types
            };
            let mut files = dataset::open_all(&dir);
            manifest.import_into(&store, &mut files, &selected)?;
            println!("imported {} into {}", record.display_name, dir.display());
        }
    }

    Ok(())
}

fn open_store() -> Result<RemoteStore> {
    let creds_store = CredentialStore::default_dir()?;
    let creds = creds_store.load()?;
    let store = RemoteStore::connect(&creds.base_url, creds_store, DEFAULT_WORKERS)?;
    store.authenticate().context("authenticate")?;
    Ok(store)
}

fn default_title() -> Result<String> {
    let format = time::format_description::parse("[year]-[month]-[day]-[hour][minute][second]")
        .context("build title format")?;
    let stamp = time::OffsetDateTime::now_utc()
        .format(&format)
        .context("format title timestamp")?;
    Ok(format!("export-{}", stamp))
}
