//! In-memory dev stand-in for the remote file store. Integration tests spawn
//! this binary and point a `RemoteStore` at it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use tokio::sync::RwLock;

use waymark::model::LedgerDoc;
use waymark::remote::{DEFAULT_LEDGER_LOCATOR, DEFAULT_ROOT_FOLDER, FOLDER_MIME, RemoteFile};

#[derive(Parser)]
#[command(name = "waymark-remote")]
struct Args {
    /// Listen address; port 0 picks a free port
    #[arg(long, default_value = "127.0.0.1:0")]
    addr: SocketAddr,

    /// Write the bound address to this file once listening
    #[arg(long)]
    addr_file: Option<PathBuf>,

    /// Development bearer token
    #[arg(long, default_value = "dev")]
    dev_token: String,
}

#[derive(Clone)]
struct StoredObject {
    meta: RemoteFile,
    parent: Option<String>,
    bytes: Vec<u8>,
    permissions: Vec<serde_json::Value>,
}

#[derive(Clone)]
struct AppState {
    token: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let mut objects = HashMap::new();
    seed_well_known(&mut objects).context("seed well-known objects")?;

    let state = AppState {
        token: args.dev_token,
        objects: Arc::new(RwLock::new(objects)),
    };

    let authed = Router::new()
        .route("/files", post(create_file))
        .route("/files/:id", get(get_file))
        .route(
            "/files/:id/content",
            get(get_content).patch(update_content),
        )
        .route("/files/:id/permissions", post(add_permission))
        .route("/folders", post(create_folder))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .merge(authed)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;
    let local_addr = listener.local_addr().context("read listener local addr")?;
    eprintln!("waymark-remote listening on {}", local_addr);

    if let Some(addr_file) = &args.addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// The root folder and an empty version ledger exist from the start, under
/// their well-known locators.
fn seed_well_known(objects: &mut HashMap<String, StoredObject>) -> Result<()> {
    objects.insert(
        DEFAULT_ROOT_FOLDER.to_string(),
        StoredObject {
            meta: RemoteFile {
                id: DEFAULT_ROOT_FOLDER.to_string(),
                name: "root".to_string(),
                mime_type: FOLDER_MIME.to_string(),
            },
            parent: None,
            bytes: Vec::new(),
            permissions: Vec::new(),
        },
    );

    let ledger = serde_json::to_vec_pretty(&LedgerDoc {
        version: 1,
        versions: Vec::new(),
    })
    .context("serialize empty ledger")?;
    objects.insert(
        DEFAULT_LEDGER_LOCATOR.to_string(),
        StoredObject {
            meta: RemoteFile {
                id: DEFAULT_LEDGER_LOCATOR.to_string(),
                name: "version-ledger.json".to_string(),
                mime_type: "application/json".to_string(),
            },
            parent: Some(DEFAULT_ROOT_FOLDER.to_string()),
            bytes: ledger,
            permissions: Vec::new(),
        },
    );

    Ok(())
}

async fn require_bearer(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Ok(value) = value.to_str() else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if token != state.token {
        return StatusCode::FORBIDDEN.into_response();
    }
    next.run(req).await
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_file(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let objects = state.objects.read().await;
    match objects.get(&id) {
        Some(obj) => Json(obj.meta.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_content(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let objects = state.objects.read().await;
    match objects.get(&id) {
        Some(obj) => (
            [(header::CONTENT_TYPE, obj.meta.mime_type.clone())],
            obj.bytes.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(serde::Deserialize)]
struct CreateFileQuery {
    parent: String,
    name: String,
}

async fn create_file(
    State(state): State<AppState>,
    Query(query): Query<CreateFileQuery>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut objects = state.objects.write().await;
    let Some(parent) = objects.get(&query.parent) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if parent.meta.mime_type != FOLDER_MIME {
        return (StatusCode::BAD_REQUEST, "parent is not a folder").into_response();
    }

    let Some(id) = generate_id() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let meta = RemoteFile {
        id,
        name: query.name,
        mime_type: mime,
    };
    objects.insert(
        meta.id.clone(),
        StoredObject {
            meta: meta.clone(),
            parent: Some(query.parent),
            bytes: body.to_vec(),
            permissions: Vec::new(),
        },
    );
    (StatusCode::CREATED, Json(meta)).into_response()
}

async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let mut objects = state.objects.write().await;
    let Some(obj) = objects.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(mime) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        obj.meta.mime_type = mime.to_string();
    }
    obj.bytes = body.to_vec();
    Json(obj.meta.clone()).into_response()
}

async fn add_permission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(grant): Json<serde_json::Value>,
) -> Response {
    let mut objects = state.objects.write().await;
    let Some(obj) = objects.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    obj.permissions.push(grant);
    StatusCode::NO_CONTENT.into_response()
}

#[derive(serde::Deserialize)]
struct CreateFolderRequest {
    name: String,
    parent: String,
}

async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> Response {
    let mut objects = state.objects.write().await;
    let Some(parent) = objects.get(&req.parent) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if parent.meta.mime_type != FOLDER_MIME {
        return (StatusCode::BAD_REQUEST, "parent is not a folder").into_response();
    }

    let Some(id) = generate_id() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let meta = RemoteFile {
        id,
        name: req.name,
        mime_type: FOLDER_MIME.to_string(),
    };
    objects.insert(
        meta.id.clone(),
        StoredObject {
            meta: meta.clone(),
            parent: Some(req.parent),
            bytes: Vec::new(),
            permissions: Vec::new(),
        },
    );
    (StatusCode::CREATED, Json(meta)).into_response()
}

/// 16 bytes of entropy, hex-encoded.
fn generate_id() -> Option<String> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).ok()?;
    let mut out = String::with_capacity(32);
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    Some(out)
}
