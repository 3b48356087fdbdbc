//! Terminal front end for the Sola protocol client.
//!
//! A rustyline REPL that feeds lines into a `ChatSession` and renders the
//! session's output events, including incremental streamed chunks.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::io::Write as IoWrite;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Editor;
use rustyline::{Context, Helper};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use sola_application::{run_session, ChatSession, ScheduledTaskService, SessionDeps, SessionOutput};
use sola_client::{HttpBackendClient, HttpMemoryStore, SocketTransport};
use sola_core::backend::FallbackBackend;
use sola_core::config::BackendConfig;
use sola_core::conversation::ConversationRepository;
use sola_core::memory::MemoryStore;
use sola_core::notify::TracingNotifier;
use sola_core::protocol::FrameSink;
use sola_core::speech::NoOpSpeechOutput;
use sola_infrastructure::{
    AppStateStore, TomlConversationRepository, TomlScheduledTaskRepository,
};

/// Phrases offered for completion and hints.
const LOCAL_PHRASES: &[&str] = &[
    "help",
    "voice on",
    "voice off",
    "show scheduler",
    "hide scheduler",
    "show counselor",
    "hide counselor",
    "show branding",
    "hide branding",
    "grant consent",
    "revoke consent",
    "skills",
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: LOCAL_PHRASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let candidates: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| !line.is_empty() && cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') || line.starts_with("system ") {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() {
            return None;
        }
        self.commands
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for CliHelper {}

/// Renders session output events to the terminal.
async fn render_outputs(
    mut outputs: mpsc::UnboundedReceiver<SessionOutput>,
    app_state_store: AppStateStore,
    task_service: Arc<ScheduledTaskService>,
) {
    while let Some(output) = outputs.recv().await {
        match output {
            SessionOutput::Connectivity { connected } => {
                if connected {
                    println!("{}", "● connected".green());
                } else {
                    println!("{}", "○ disconnected".red());
                }
            }
            SessionOutput::ConversationOpened { title, .. } => {
                println!("{}", format!("=== {} ===", title).bright_magenta());
            }
            SessionOutput::UserMessage(_) => {
                // The REPL already echoed the line.
            }
            SessionOutput::AssistantStarted { .. } => {}
            SessionOutput::AssistantChunk { text, .. } => {
                print!("{}", text.bright_blue());
                let _ = std::io::stdout().flush();
            }
            SessionOutput::AssistantFinalized { .. } => {
                println!();
            }
            SessionOutput::AssistantFailed { display, .. } => {
                println!("{}", display.red());
            }
            SessionOutput::AssistantDiscarded { .. } => {
                // Timeout cleanup stays silent.
            }
            SessionOutput::AssistantMessage(message) => {
                for step in &message.workflow_steps {
                    println!(
                        "{}",
                        format!("  {} {} [{:?}]", step.icon, step.label, step.status).bright_black()
                    );
                }
                for line in message.content.lines() {
                    println!("{}", line.bright_blue());
                }
            }
            SessionOutput::StateChanged(state) => {
                if let Err(err) = app_state_store.save(&state) {
                    tracing::warn!("[Repl] Failed to save app state: {}", err);
                }
                if state.panels.scheduler {
                    match task_service.list().await {
                        Ok(tasks) if tasks.is_empty() => {
                            println!("{}", "No scheduled tasks".bright_black());
                        }
                        Ok(tasks) => {
                            println!("{}", "Scheduled tasks:".bright_yellow());
                            for task in tasks {
                                println!(
                                    "{}",
                                    format!(
                                        "  [{:?}] {} — {} ({:?})",
                                        task.status, task.title, task.schedule, task.recurrence
                                    )
                                    .yellow()
                                );
                            }
                        }
                        Err(err) => {
                            eprintln!("{}", format!("Failed to list tasks: {}", err).red());
                        }
                    }
                }
            }
            SessionOutput::Notice(notice) => {
                for line in notice.lines() {
                    println!("{}", line.bright_black());
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    // ===== Backend wiring =====
    let config = BackendConfig::from_env();
    tracing::info!("[Repl] Using backend {}", config.base_url());

    let conversations: Arc<dyn ConversationRepository> =
        Arc::new(TomlConversationRepository::default_location().await?);
    let task_repository = Arc::new(TomlScheduledTaskRepository::default_location().await?);
    let task_service = Arc::new(ScheduledTaskService::new(task_repository));
    let app_state_store = AppStateStore::default_location()?;
    let app_state = app_state_store.load();

    let (transport, transport_rx) = SocketTransport::new(config.socket_url());
    let transport = Arc::new(transport);
    transport.connect();

    let backend: Arc<dyn FallbackBackend> = Arc::new(HttpBackendClient::new(config.clone())?);
    let memory: Arc<dyn MemoryStore> = Arc::new(HttpMemoryStore::from_env(&config));

    let (outputs_tx, outputs_rx) = mpsc::unbounded_channel();
    let transport_sink: Arc<dyn FrameSink> = transport.clone();
    let deps = SessionDeps {
        transport: transport_sink,
        backend,
        conversations,
        memory,
        notifier: Arc::new(TracingNotifier),
        speech: Arc::new(NoOpSpeechOutput),
    };
    let (session, timer_rx) = ChatSession::new(deps, app_state, outputs_tx);
    let mut session = session.with_project(std::env::var("SOLA_PROJECT").ok());
    session.restore().await?;

    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();
    let session_task = tokio::spawn(run_session(session, transport_rx, input_rx, timer_rx));
    let render_task = tokio::spawn(render_outputs(outputs_rx, app_state_store, task_service));

    // ===== REPL =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Sola ===".bright_magenta().bold());
    println!(
        "{}",
        "Type 'help' for local commands, or 'quit' to exit.".bright_black()
    );

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if input_tx.send(trimmed.to_string()).is_err() {
                    eprintln!("{}", "Session ended unexpectedly".red());
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    // Closing the input channel winds the session loop down.
    transport.disconnect();
    drop(input_tx);
    let _ = session_task.await;
    let _ = render_task.await;

    Ok(())
}
