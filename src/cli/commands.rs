//! CLI command implementations
//!
//! Every command loads and validates the config first. Commands that touch
//! school data open the data file, build an orchestrator over it and write
//! exactly one JSON response to stdout.
//!
//! The data file stays locked while a command holds it open. A command that
//! finds it locked fails with `CONCURRENT_CYCLE_REJECTED`.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::http_server::{HttpServer, PromotionState};
use crate::lifecycle::{CycleError, PlanFile, PromotionCycleOrchestrator, PromotionCycleRequest};
use crate::observability::{
    log_event, log_event_with_fields, AuditLog, Event, FileAuditLog, Logger, MemoryAuditLog,
};
use crate::school::{ClassRecord, JsonFileStore, StoreError};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, classes } => init(&config, classes),
        Command::Preview {
            config,
            max_ordinal,
        } => preview(&config, max_ordinal),
        Command::Promote {
            config,
            max_ordinal,
            confirm_graduation,
            operator,
        } => promote(&config, max_ordinal, confirm_graduation, operator),
        Command::Rerun {
            config,
            confirm_graduation,
            operator,
        } => rerun(&config, confirm_graduation, operator),
        Command::Serve { config, port } => serve(&config, port),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", config_path.display().to_string().as_str())],
    );
    Ok(config)
}

/// Create the school data file.
///
/// With `classes > 0`, also creates "Class 1" through "Class N" so the
/// school can be enrolled straight away.
pub fn init(config_path: &Path, classes: u32) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_path = config.data_path();

    if data_path.exists() {
        return Err(CliError::already_initialized(data_path.display()));
    }

    let store = JsonFileStore::create(data_path).map_err(|e| CliError::store_error(&e))?;
    for k in 1..=classes {
        store
            .insert_class(ClassRecord::new(format!("Class {}", k)))
            .map_err(|e| CliError::store_error(&e))?;
    }
    log_event_with_fields(
        Event::StoreInitialized,
        &[("path", data_path.display().to_string().as_str())],
    );

    write_response(json!({
        "initialized": true,
        "data_file": config.data_file,
        "classes_created": classes,
    }))
}

/// Snapshot and plan, print what a cycle would do.
pub fn preview(config_path: &Path, max_ordinal: Option<u32>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let orchestrator = open_orchestrator(&config)?;

    match orchestrator.preview(max_ordinal.unwrap_or(config.max_ordinal)) {
        Ok(preview) => write_response(serde_json::to_value(preview)?),
        Err(e) => {
            write_error(e.code(), &e.to_string())?;
            Err(CliError::cycle_failed(&e))
        }
    }
}

/// Run one promotion cycle and print its report.
pub fn promote(
    config_path: &Path,
    max_ordinal: Option<u32>,
    confirm_graduation: bool,
    operator: Option<String>,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let orchestrator = open_orchestrator(&config)?;

    let mut request = PromotionCycleRequest::new(max_ordinal.unwrap_or(config.max_ordinal))
        .with_confirmation(confirm_graduation);
    if let Some(operator) = operator {
        request = request.with_operator(operator);
    }

    match orchestrator.run(&request) {
        Ok(report) => write_response(serde_json::to_value(report)?),
        Err(e) => {
            write_error(e.code(), &e.to_string())?;
            Err(CliError::cycle_failed(&e))
        }
    }
}

/// Re-run the last cycle from the plan saved next to the data file.
///
/// Confirms a pending graduation or retries failed moves and deletions
/// without promoting anyone a second time.
pub fn rerun(config_path: &Path, confirm_graduation: bool, operator: Option<String>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let orchestrator = open_orchestrator(&config)?;

    match orchestrator.rerun_last(confirm_graduation, operator) {
        Ok(report) => write_response(serde_json::to_value(report)?),
        Err(e) => {
            write_error(e.code(), &e.to_string())?;
            Err(CliError::cycle_failed(&e))
        }
    }
}

/// Serve the promotion HTTP API until the process is stopped.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let orchestrator = Arc::new(open_orchestrator(&config)?);

    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }

    let state = Arc::new(PromotionState::new(orchestrator, config.max_ordinal));
    let server = HttpServer::with_config(http_config, state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })?;

    log_event(Event::ServerStopped);
    Ok(())
}

/// Open the data file and audit log and wire them into an orchestrator.
fn open_orchestrator(config: &Config) -> CliResult<PromotionCycleOrchestrator> {
    let data_path = config.data_path();
    if !data_path.exists() {
        return Err(CliError::not_initialized(data_path.display()));
    }

    let store = match JsonFileStore::open(data_path) {
        Ok(store) => store,
        // another gradeflow process holds the data file, so a cycle may be running
        Err(StoreError::Locked(detail)) => {
            log_event_with_fields(Event::StoreOpenFailed, &[("error", detail.as_str())]);
            let err = CycleError::ConcurrentCycleRejected;
            write_error(err.code(), &format!("{} ({})", err, detail))?;
            return Err(CliError::cycle_failed(&err));
        }
        Err(e) => {
            log_event_with_fields(Event::StoreOpenFailed, &[("error", e.to_string().as_str())]);
            return Err(CliError::store_error(&e));
        }
    };
    log_event_with_fields(
        Event::StoreOpened,
        &[("path", data_path.display().to_string().as_str())],
    );

    let audit: Arc<dyn AuditLog> = match config.audit_path() {
        Some(path) => {
            let log = FileAuditLog::open(path).map_err(|e| {
                CliError::config_error(format!("Failed to open audit log: {}", e))
            })?;
            log_event_with_fields(
                Event::AuditLogOpened,
                &[("path", path.display().to_string().as_str())],
            );
            Arc::new(log)
        }
        None => Arc::new(MemoryAuditLog::new()),
    };

    Ok(PromotionCycleOrchestrator::new(Arc::new(store))
        .with_ordinal(config.ordinal())
        .with_audit_log(audit)
        .with_plan_file(PlanFile::new(config.plan_path())))
}
