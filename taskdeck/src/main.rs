//! `TaskDeck`: terminal task client with optimistic sync.
//!
//! Talks to a remote task API; tasks appear, toggle, and disappear
//! locally before the server confirms, and roll back if it doesn't.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! taskdeck login --email alice@example.com --password secret
//! taskdeck add "Buy milk"
//! taskdeck list --filter active --search milk
//! taskdeck done 1f5a9d6e-9a0f-4a7e-8f25-3f2f4d9b1c11
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdeck::config::{CliArgs, ClientConfig, Command};
use taskdeck::gateway::{GatewayError, HttpGateway, TaskGateway};
use taskdeck::store::{StatePatch, Store, TokenFile};
use taskdeck::sync::controller::DEFAULT_NOTICE_BUFFER;
use taskdeck::sync::{FlowOutcome, Notice, NoticeKind, SyncController};
use taskdeck_api::{Registration, TaskId};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!(base_url = %config.base_url, "taskdeck starting");

    let store = Arc::new(Store::new(config.token_file.clone().map(TokenFile::new)));
    let gateway = match HttpGateway::new(&config, Arc::clone(&store)) {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (notice_tx, notice_rx) = mpsc::channel(DEFAULT_NOTICE_BUFFER);
    let controller = SyncController::new(Arc::clone(&store), gateway, notice_tx);
    let printer = tokio::spawn(print_notices(notice_rx));

    // Log every state transition at debug level.
    let _state_log = store.subscribe(|state| {
        tracing::debug!(
            tasks = state.tasks.len(),
            loading = state.loading,
            error = state.error.is_some(),
            "state changed"
        );
    });

    let exit = run_command(cli.command, &controller).await;

    // Dropping the controller closes the notice channel; drain the rest.
    drop(controller);
    let _ = printer.await;

    tracing::info!("taskdeck exiting");
    exit
}

/// Initialize logging: stderr by default, or a log file when requested.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so
/// buffered entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if let Some(path) = file_path {
        let log_dir = path.parent()?;
        let file_name = path.file_name()?.to_str()?;
        let file_appender = tracing_appender::rolling::never(log_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_env_filter(env_filter)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        None
    }
}

/// Prints notices as they arrive until the channel closes.
async fn print_notices(mut rx: mpsc::Receiver<Notice>) {
    while let Some(notice) = rx.recv().await {
        match notice.kind {
            NoticeKind::Error => eprintln!("! {}", notice.text),
            NoticeKind::Success | NoticeKind::Info => eprintln!("  {}", notice.text),
        }
    }
}

/// Dispatches the subcommand through the sync controller.
async fn run_command<G: TaskGateway>(
    command: Command,
    controller: &SyncController<G>,
) -> ExitCode {
    match command {
        Command::Login { email, password } => match controller.login(&email, &password).await {
            Ok(()) => {
                println!("Logged in as {email}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Login failed: {}", gateway_error_text(&e));
                ExitCode::FAILURE
            }
        },
        Command::Register {
            email,
            password,
            username,
        } => {
            let registration = Registration {
                email,
                password,
                username,
            };
            match controller.register(&registration).await {
                Ok(user) => {
                    println!("Registered {} (id {})", user.email, user.id);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Registration failed: {}", gateway_error_text(&e));
                    ExitCode::FAILURE
                }
            }
        }
        Command::Logout => {
            controller.logout();
            println!("Logged out");
            ExitCode::SUCCESS
        }
        Command::List { filter, search } => {
            controller
                .store()
                .apply(StatePatch::new().filter(filter).search(search));
            controller.load_tasks().await;
            let state = controller.store().snapshot();
            if let Some(error) = &state.error {
                eprintln!("Failed to load tasks: {error}");
                return ExitCode::FAILURE;
            }
            let visible = state.visible_tasks();
            if visible.is_empty() {
                println!("No tasks found.");
            }
            for task in visible {
                let marker = match task.status {
                    taskdeck_api::TaskStatus::Completed => "[x]",
                    taskdeck_api::TaskStatus::Pending => "[ ]",
                };
                match &task.priority {
                    Some(priority) => println!("{marker} {}  {} ({priority})", task.id, task.title),
                    None => println!("{marker} {}  {}", task.id, task.title),
                }
            }
            ExitCode::SUCCESS
        }
        Command::Add { title } => flow_exit(controller.add_task(&title).await),
        Command::Done { id } => {
            // Toggling needs the current task in the store.
            controller.load_tasks().await;
            flow_exit(controller.toggle_task(&TaskId::new(id)).await)
        }
        Command::Rm { id } => {
            controller.load_tasks().await;
            flow_exit(controller.delete_task(&TaskId::new(id)).await)
        }
    }
}

/// Maps a flow outcome to a process exit code.
fn flow_exit(outcome: FlowOutcome) -> ExitCode {
    match outcome {
        FlowOutcome::Committed => ExitCode::SUCCESS,
        FlowOutcome::RolledBack => ExitCode::FAILURE,
        FlowOutcome::Skipped => {
            eprintln!("Nothing to do: task not found or not confirmed yet");
            ExitCode::FAILURE
        }
    }
}

/// User-facing text for a gateway failure outside the sync flows.
fn gateway_error_text(e: &GatewayError) -> String {
    e.server_message()
        .map_or_else(|| e.to_string(), str::to_string)
}
