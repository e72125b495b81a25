//! CLI command implementations

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use super::args::{Cli, Command, RevisionAction};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_response;
use crate::forms::{FormKind, FormKindInfo, FormService};
use crate::http_server::{FormsState, HttpServer};
use crate::observability;
use crate::revision::{next_label_for_create, next_label_for_update};
use crate::storage::{DocumentStore, FileStore, MemoryStore};
use crate::uploads::{LocalBackend, UploadService};

/// Directory under `data_dir` holding the record file
const STORE_SUBDIR: &str = "data";

/// Parse arguments and run the command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve {
            config,
            port,
            in_memory,
        } => serve(&config, port, in_memory),
        Command::Forms => write_response(forms_registry()),
        Command::Revision { action } => write_response(revision(action)),
    }
}

/// Create the data and upload directories.
///
/// Refuses to run twice against the same data directory.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    let dirs = [data_dir.join(STORE_SUBDIR), config.upload_path()];
    for dir in &dirs {
        fs::create_dir_all(dir).map_err(|e| {
            CliError::io_error(format!(
                "Failed to create directory {}: {}",
                dir.display(),
                e
            ))
        })?;
    }

    write_response(json!({
        "data_dir": data_dir.display().to_string(),
        "upload_dir": config.upload_path().display().to_string(),
    }))
}

/// Open the store, build the service and run the HTTP API until shutdown.
pub fn serve(config_path: &Path, port: Option<u16>, in_memory: bool) -> CliResult<()> {
    let config = Config::load(config_path)?;
    observability::init_logging(&config.log_level);

    if !in_memory && !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let state = Arc::new(build_state(&config, in_memory)?);

    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }
    let server = HttpServer::new(http_config, state);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir,
        in_memory,
        "starting shipforms"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Open the record store and upload backend described by `config`.
pub fn build_state(config: &Config, in_memory: bool) -> CliResult<FormsState> {
    let store: Arc<dyn DocumentStore> = if in_memory {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::open(config.data_path())?)
    };

    let upload_dir = config.upload_path();
    fs::create_dir_all(&upload_dir).map_err(|e| {
        CliError::io_error(format!(
            "Failed to create upload directory {}: {}",
            upload_dir.display(),
            e
        ))
    })?;

    let uploads = UploadService::new(LocalBackend::new(upload_dir), config.max_upload_bytes)?;
    Ok(FormsState::new(FormService::new(store, uploads)))
}

fn forms_registry() -> Value {
    let forms: Vec<FormKindInfo> = FormKind::all().iter().map(FormKind::info).collect();
    json!({ "forms": forms, "total": forms.len() })
}

fn revision(action: RevisionAction) -> Value {
    let label = match action {
        RevisionAction::NextCreate { count } => next_label_for_create(count),
        RevisionAction::NextUpdate { current } => next_label_for_update(current.as_deref()),
    };
    json!({ "revisionNo": label.to_string() })
}

fn is_initialized(config: &Config) -> bool {
    config.data_path().join(STORE_SUBDIR).exists() && config.upload_path().exists()
}
