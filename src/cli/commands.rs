//! CLI command implementations
//!
//! `serve` runs the HTTP API. The remaining commands open the configured
//! backend directly, perform one operation, and exit.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use uuid::Uuid;

use crate::blob_store::{open_backend, BackendConfig, BlobReader, SharedBackend};
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::{log_event_with_fields, Event, Logger, MetricsRegistry, Severity};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend URL (required): `file://<root>` or `memory://`
    pub backend: String,

    /// `host`, `port` and `cors_origins`, read from the top level
    #[serde(flatten)]
    pub http: HttpServerConfig,

    /// Force writes to stable storage before acknowledging (default true)
    #[serde(default = "default_fsync")]
    pub fsync: bool,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_fsync() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Default configuration storing blobs in `root`
    pub fn with_root(root: &Path) -> Self {
        Self {
            backend: format!("file://{}", root.display()),
            http: HttpServerConfig::default(),
            fsync: default_fsync(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {:?}: {}", path, e))
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        self.backend_config()?;
        self.severity()?;
        Ok(())
    }

    /// Parsed backend selection
    pub fn backend_config(&self) -> CliResult<BackendConfig> {
        self.backend
            .parse()
            .map_err(|e| CliError::config_error(format!("{}", e)))
    }

    /// Parsed minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    /// Construct the configured backend
    pub fn open_backend(&self) -> CliResult<SharedBackend> {
        let backend = open_backend(&self.backend_config()?, self.fsync)?;
        Ok(backend)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(&cli.config, cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(config: &Path, cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init => init(config),
        Command::Serve { port } => serve(config, port),
        Command::Put { key, file } => put(config, &key, file.as_deref()),
        Command::Get { key, out } => get(config, &key, out.as_deref()),
        Command::Stat { key } => stat(config, &key),
        Command::Rm { key } => rm(config, &key),
        Command::Ls { after, limit } => ls(config, after.as_deref(), limit),
    }
}

/// Write a default config if none exists, then create the backend root
pub fn init(config_path: &Path) -> CliResult<()> {
    let written = !config_path.exists();

    if written {
        let config = Config::with_root(&default_root(config_path));
        let body = serde_json::to_string_pretty(&config)?;
        fs::write(config_path, body + "\n").map_err(|e| {
            CliError::config_error(format!("Failed to write config {:?}: {}", config_path, e))
        })?;
    }

    let config = Config::load(config_path)?;
    config.open_backend()?;

    write_response(json!({
        "initialized": true,
        "config_written": written,
        "backend": config.backend,
    }))
}

fn default_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join("data"),
        _ => PathBuf::from("data"),
    }
}

/// Serve the HTTP API until interrupted
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", config_path.display().to_string().as_str())],
    );

    let backend = config.open_backend()?;
    log_event_with_fields(
        Event::BackendOpened,
        &[("backend", config.backend.as_str()), ("driver", backend.name())],
    );

    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }

    let metrics = Arc::new(MetricsRegistry::new());
    let server = HttpServer::with_metrics(http_config, backend, metrics);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(server.start()).map_err(|e| {
        let reason = e.to_string();
        log_event_with_fields(Event::ServeFailed, &[("reason", reason.as_str())]);
        CliError::serve_failed(format!("HTTP server failed: {}", reason))
    })
}

/// Store a blob from `file`, or stdin
pub fn put(config_path: &Path, key: &str, file: Option<&Path>) -> CliResult<()> {
    let backend = Config::load(config_path)?.open_backend()?;

    let size = match file {
        Some(path) => {
            let mut source = File::open(path).map_err(|e| {
                CliError::io_error(format!("Failed to open {:?}: {}", path, e))
            })?;
            backend.write(key, &mut source)?
        }
        None => {
            let stdin = io::stdin();
            let mut source = stdin.lock();
            backend.write(key, &mut source)?
        }
    };

    write_response(json!({ "key": key, "size": size }))
}

/// Fetch a blob into `out`, or stream it raw to stdout
pub fn get(config_path: &Path, key: &str, out: Option<&Path>) -> CliResult<()> {
    let backend = Config::load(config_path)?.open_backend()?;
    let reader = backend.read(key)?;

    match out {
        Some(path) => {
            let size = write_output(reader, path)?;
            write_response(json!({ "key": key, "size": size }))
        }
        None => {
            let stdout = io::stdout();
            let mut sink = stdout.lock();
            reader.copy_to(&mut sink)?;
            Ok(())
        }
    }
}

/// Copy `reader` into a hidden sibling of `path`, then rename it into place.
///
/// On failure the partial copy is removed and `path` is left as it was.
fn write_output(reader: BlobReader, path: &Path) -> CliResult<u64> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::io_error(format!("Not a file path: {:?}", path)))?;
    let part = path.with_file_name(format!(
        ".{}.{}.part",
        file_name.to_string_lossy(),
        Uuid::new_v4()
    ));

    let result = File::create(&part)
        .map_err(|e| CliError::io_error(format!("Failed to create {:?}: {}", part, e)))
        .and_then(|mut sink| {
            let size = reader.copy_to(&mut sink)?;
            sink.sync_all()?;
            Ok(size)
        })
        .and_then(|size| {
            fs::rename(&part, path).map_err(|e| {
                CliError::io_error(format!("Failed to move output to {:?}: {}", path, e))
            })?;
            Ok(size)
        });

    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

/// Print a blob's metadata
pub fn stat(config_path: &Path, key: &str) -> CliResult<()> {
    let backend = Config::load(config_path)?.open_backend()?;
    let info = backend.stat(key)?;
    write_response(serde_json::to_value(info)?)
}

/// Remove a blob
pub fn rm(config_path: &Path, key: &str) -> CliResult<()> {
    let backend = Config::load(config_path)?.open_backend()?;
    backend.remove(key)?;
    write_response(json!({ "removed": key }))
}

/// List blobs, paging when `after` or `limit` is given
pub fn ls(config_path: &Path, after: Option<&str>, limit: Option<usize>) -> CliResult<()> {
    let backend = Config::load(config_path)?.open_backend()?;

    if after.is_none() && limit.is_none() {
        let listed = backend.list()?;
        return write_response(serde_json::to_value(listed)?);
    }

    let page = backend.list_page(after, limit.unwrap_or(usize::MAX))?;
    write_response(serde_json::to_value(page)?)
}
