//! Requester runner: copy the selected files

use std::env;
use std::process::ExitCode;

use crate::application::ports::ConfigStore;
use crate::application::{copy_locally, CopyInput, CopyRequestUseCase, RequestConfig, RequestError};
use crate::domain::config::AppConfig;
use crate::domain::message::SenderId;
use crate::domain::paths::{is_container, translate_path, validate_path};
use crate::domain::timeout::Timeout;
use crate::infrastructure::{create_clipboard, Mailbox, XdgConfigStore};

use super::args::Cli;
use super::collect::collect_files;
use super::config_cmd::parse_bool;
use super::logging;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment overrides
pub const ENV_CONTAINER_WORKSPACE: &str = "FILECLIP_CONTAINER_WORKSPACE";
pub const ENV_HOST_WORKSPACE: &str = "FILECLIP_HOST_WORKSPACE";
pub const ENV_USE_WATCHER: &str = "FILECLIP_USE_WATCHER";
pub const ENV_FORCE_POLLING: &str = "FILECLIP_FORCE_POLLING";

/// Requester log level unless `--log-level` says otherwise
const DEFAULT_REQUESTER_LOG_LEVEL: &str = "warn";

/// Run the requester
pub async fn run_copy(cli: Cli) -> ExitCode {
    let mut presenter = Presenter::new();
    logging::init_stderr(
        cli.log_level
            .map(|l| l.as_str())
            .unwrap_or(DEFAULT_REQUESTER_LOG_LEVEL),
    );

    let files = match collect_files(&cli.files, &cli.dirs) {
        Ok(files) => files,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if files.is_empty() {
        presenter.error("No files to copy. Pass files or --dir DIR (see --help)");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let cli_config = AppConfig {
        container_workspace: cli.container_workspace.clone(),
        host_workspace: cli.host_workspace.clone(),
        use_watcher: cli.use_watcher_flag(),
        force_polling: cli.force_polling.then_some(true),
        ping_timeout: cli.ping_timeout.clone(),
        watcher_timeout: cli.watcher_timeout.clone(),
        log_level: None,
    };
    let config = load_merged_config(cli_config).await;

    let (ping_timeout, result_timeout) = match parse_timeouts(&config) {
        Ok(timeouts) => timeouts,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let clipboard = create_clipboard();

    if !config.use_watcher_or_default() || !is_container() {
        let report = copy_locally(&clipboard, &files).await;
        return finish(&mut presenter, &report);
    }

    let Some(host_root) = config.host_workspace.clone() else {
        presenter.warn(&format!(
            "Host workspace not configured (set {} or `fileclip config set host_workspace`); copying locally",
            ENV_HOST_WORKSPACE
        ));
        let report = copy_locally(&clipboard, &files).await;
        return finish(&mut presenter, &report);
    };

    let container_root = config.container_workspace_or_default();
    let mut input = CopyInput::default();
    for file in files {
        if !validate_path(&file, &container_root) {
            presenter.warn(&format!("Path outside allowed root: {}", file.display()));
            continue;
        }
        match translate_path(&file, &container_root, &host_root) {
            Ok(host) => {
                input.host_paths.push(host);
                input.local_paths.push(file);
            }
            Err(e) => presenter.warn(&e.to_string()),
        }
    }
    if input.host_paths.is_empty() {
        presenter.error("No valid files to copy");
        return ExitCode::from(EXIT_ERROR);
    }

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup(false).await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }
    let mut cancel = shutdown.receiver();

    let request_config = RequestConfig {
        force_polling: config.force_polling_or_default(),
        ping_timeout,
        result_timeout,
        poll_interval: Timeout::default_poll_interval().as_std(),
    };
    let mut use_case = CopyRequestUseCase::new(
        Mailbox::new(config.container_mailbox()),
        clipboard,
        SenderId::current(),
        request_config,
    );

    presenter.start_spinner("Contacting host watcher...");
    match use_case.connect(&mut cancel).await {
        Ok(_) => {}
        Err(RequestError::Cancelled) => {
            presenter.stop_spinner();
            presenter.warn("Cancelled");
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            presenter.stop_spinner();
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    }
    presenter.update_spinner(&format!(
        "Waiting for host watcher ({} file(s))...",
        input.host_paths.len()
    ));

    match use_case.execute(input, &mut cancel).await {
        Ok(report) => finish(&mut presenter, &report),
        Err(RequestError::Cancelled) => {
            presenter.stop_spinner();
            presenter.warn("Cancelled");
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            presenter.stop_spinner();
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn finish(presenter: &mut Presenter, report: &crate::application::CopyReport) -> ExitCode {
    presenter.report(report);
    if report.success {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

fn parse_timeouts(config: &AppConfig) -> Result<(Timeout, Timeout), String> {
    let parse = |value: &Option<String>, fallback: Timeout, name: &str| match value {
        Some(s) => s
            .parse::<Timeout>()
            .map_err(|e| format!("Invalid {}: {}", name, e)),
        None => Ok(fallback),
    };
    Ok((
        parse(&config.ping_timeout, Timeout::default_ping(), "ping-timeout")?,
        parse(
            &config.watcher_timeout,
            Timeout::default_result(),
            "watcher-timeout",
        )?,
    ))
}

/// Settings from `FILECLIP_*` environment variables
pub fn env_config() -> AppConfig {
    let text = |key: &str| env::var(key).ok().filter(|s| !s.is_empty());
    let flag = |key: &str| text(key).and_then(|v| parse_bool(&v).ok());

    AppConfig {
        container_workspace: text(ENV_CONTAINER_WORKSPACE),
        host_workspace: text(ENV_HOST_WORKSPACE),
        use_watcher: flag(ENV_USE_WATCHER),
        force_polling: flag(ENV_FORCE_POLLING),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}
