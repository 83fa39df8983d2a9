// System connection wizard engine
//
// Library entry: logging setup plus the non-interactive runners the binary dispatches to.

pub mod config;
pub mod error;
pub mod executor;
pub mod forms;
pub mod models;
pub mod smoke;
pub mod tui;
pub mod utils;
pub mod wizard;

use crate::config::{ConsoleConfig, LoggingSettings};
use crate::executor::{ConnectorExecutor, HttpExecutor, LoopbackExecutor};
use crate::models::kind::ConnectorKind;
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn init_logging(
    with_stdout: bool,
    settings: &LoggingSettings,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_dir = utils::path_resolver::resolve_log_folder(settings.directory.as_deref())?;
    let level = settings.level_filter()?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("wizard-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("wizard-{}.txt", timestamp));

    // stdout stays off for the TUI so log lines never land in the rendered frame
    let mut dispatch = fern::Dispatch::new().level(level);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    let session = uuid::Uuid::new_v4().to_string();
    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                        Some(&session),
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(log_dir)
}

fn load_config_or_exit(config_path: Option<&Path>) -> ConsoleConfig {
    match ConsoleConfig::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_kind_or_exit(kind: Option<&str>) -> ConnectorKind {
    match kind.unwrap_or("universal").parse::<ConnectorKind>() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("Wizard error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the effective layered configuration (token masked) and exit.
pub fn run_print_config(config_path: Option<PathBuf>) {
    let cfg = load_config_or_exit(config_path.as_deref());
    match cfg.to_toml() {
        Ok(rendered) => print!("{}", rendered),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Deterministic scripted wizard run (for automated verification / log capture).
/// Writes `wizard_smoke_<kind>_transcript.log` under the log folder and exits 0/1.
pub fn run_wizard_smoke(kind: Option<String>, use_http: bool, config_path: Option<PathBuf>) {
    let cfg = load_config_or_exit(config_path.as_deref());
    let log_dir = match init_logging(cfg.logging.stdout, &cfg.logging) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            match utils::path_resolver::resolve_log_folder(None) {
                Ok(dir) => dir,
                Err(e) => {
                    eprintln!("Wizard error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };
    let kind = parse_kind_or_exit(kind.as_deref());

    info!(
        "[PHASE: initialization] Wizard smoke starting at {} kind={} executor={}",
        chrono::Utc::now(),
        kind,
        if use_http { "http" } else { "loopback" }
    );

    let executor: Arc<dyn ConnectorExecutor> = if use_http {
        match HttpExecutor::new(&cfg.executor) {
            Ok(exec) => Arc::new(exec),
            Err(e) => {
                error!("[PHASE: initialization] [STEP: executor] {:?}", e);
                eprintln!("Wizard error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Arc::new(LoopbackExecutor::new())
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();
    let result = match rt {
        Ok(rt) => rt.block_on(smoke::wizard_smoke(kind, executor, &log_dir)),
        Err(e) => Err(anyhow::anyhow!(
            "Failed to create async runtime for wizard smoke: {}",
            e
        )),
    };

    match result {
        Ok(report) => {
            info!(
                "[PHASE: smoke] [STEP: done] {} steps visited, transcript {:?}",
                report.visited.len(),
                report.transcript_path
            );
        }
        Err(e) => {
            error!(
                "[PHASE: smoke] [STEP: wizard_smoke] Smoke exited with error: {:?}",
                e
            );
            eprintln!("Wizard error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Non-interactive TUI smoke: renders the opening frame for one connector kind and exits 0.
pub fn run_tui_smoke(kind: Option<String>, config_path: Option<PathBuf>) {
    let cfg = load_config_or_exit(config_path.as_deref());
    // No stdout logging; the frame is printed instead.
    if let Err(e) = init_logging(false, &cfg.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    let kind = parse_kind_or_exit(kind.as_deref());

    info!(
        "[PHASE: initialization] Headless TUI smoke starting at {}",
        chrono::Utc::now()
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();
    let result = match rt {
        Ok(rt) => rt.block_on(tui::smoke(kind)),
        Err(e) => Err(anyhow::anyhow!(
            "Failed to create async runtime for TUI smoke: {}",
            e
        )),
    };

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(e) => {
            error!(
                "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
                e
            );
            eprintln!("Wizard error: {}", e);
            std::process::exit(1);
        }
    }
}
