//! Watcher runner

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::info;

use crate::application::{WatcherConfig, WatcherUseCase};
use crate::domain::config::AppConfig;
use crate::domain::message::SenderId;
use crate::domain::observation::ObservationDecision;
use crate::domain::timeout::Timeout;
use crate::infrastructure::{create_clipboard, Mailbox};

use super::app::{load_merged_config, EXIT_ERROR, EXIT_SUCCESS};
use super::args::WatchArgs;
use super::logging::{self, WATCHER_LOG_FILE};
#[cfg(unix)]
use super::pid_file::PidFile;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Run the watcher until SIGINT/SIGTERM
pub async fn run_watch(args: WatchArgs) -> ExitCode {
    let presenter = Presenter::new();

    let cli_config = AppConfig {
        host_workspace: args.host_workspace.clone(),
        force_polling: args.force_polling.then_some(true),
        log_level: args.log_level.map(|l| l.as_str().to_string()),
        ..Default::default()
    };
    let config = load_merged_config(cli_config).await;

    let mailbox = Mailbox::new(config.host_mailbox());
    if let Err(e) = mailbox.ensure().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    #[cfg(unix)]
    let pid_file = {
        let pid_file = PidFile::in_mailbox(mailbox.dir());
        if let Err(e) = pid_file.acquire() {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        pid_file
    };

    let log_path = mailbox.dir().join(WATCHER_LOG_FILE);
    if let Err(e) = logging::init_file(&log_path, config.log_level_or_default()) {
        presenter.error(&format!(
            "Failed to open log file {}: {}",
            log_path.display(),
            e
        ));
        return ExitCode::from(EXIT_ERROR);
    }

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup(true).await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let decision = ObservationDecision::for_watcher(config.force_polling_or_default());
    let watcher_config = WatcherConfig {
        allowed_root: Some(PathBuf::from(config.host_workspace_or_default())),
        poll_interval: Timeout::default_poll_interval().as_std(),
    };
    let use_case = WatcherUseCase::new(
        mailbox.clone(),
        create_clipboard(),
        SenderId::current(),
        watcher_config,
    );

    info!(pid = std::process::id(), dir = %mailbox.dir().display(), "watcher starting");
    match use_case.sweep_stale().await {
        Ok(report) if report.stale_requests > 0 => presenter.warn(&format!(
            "Ignoring {} stale copy request(s) left in {}",
            report.stale_requests,
            mailbox.dir().display()
        )),
        Ok(_) => {}
        Err(e) => presenter.warn(&format!("Start-up sweep failed: {}", e)),
    }

    presenter.info(&format!(
        "Watching {} ({}, log: {})",
        mailbox.dir().display(),
        decision.strategy,
        log_path.display()
    ));
    presenter.info("Press Ctrl+C to stop");

    let outcome = use_case.run(decision, shutdown.receiver()).await;

    #[cfg(unix)]
    drop(pid_file);

    match outcome {
        Ok(()) => {
            presenter.success("Watcher stopped");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
