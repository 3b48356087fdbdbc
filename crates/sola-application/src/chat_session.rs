//! The chat session coordinator.
//!
//! One `ChatSession` wires the transport, consent gate, streaming
//! assembler, command router, proactive inbox, repositories and the
//! fallback backend into a single event-driven loop. Everything runs on
//! one task; network callbacks, user input and fallback timers arrive as
//! messages on the same select loop, so there is no concurrent mutation of
//! session state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use sola_client::TransportEvent;
use sola_core::app_state::AppState;
use sola_core::backend::FallbackBackend;
use sola_core::consent::{ConsentGate, GateDisposition};
use sola_core::conversation::{Conversation, ConversationRepository, Message, WorkflowStep, WorkflowStepStatus};
use sola_core::inbox::ProactiveInbox;
use sola_core::memory::{MemoryExchange, MemoryStore};
use sola_core::notify::Notifier;
use sola_core::protocol::{ClientFrame, FrameSink, ServerFrame, SystemAction};
use sola_core::router::{CommandRouter, LocalAction, RouteDecision, HELP_TEXT};
use sola_core::speech::SpeechOutput;
use sola_core::streaming::{StreamEffect, StreamingAssembler, FALLBACK_TIMEOUT_SECS};

/// Events the session emits for a front end to render.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    /// Socket connectivity changed.
    Connectivity { connected: bool },
    /// A conversation became active (restored or newly created).
    ConversationOpened { id: String, title: String },
    /// A user message was appended.
    UserMessage(Message),
    /// A streamed turn opened; an empty placeholder is now visible.
    AssistantStarted { message_id: String },
    /// Streamed text to append to the placeholder.
    AssistantChunk { message_id: String, text: String },
    /// The streamed turn finished successfully.
    AssistantFinalized { message_id: String },
    /// The streamed turn failed; the message now shows `display`.
    AssistantFailed { message_id: String, display: String },
    /// The placeholder was removed without ever producing content.
    AssistantDiscarded { message_id: String },
    /// A whole (non-streamed) assistant message was appended.
    AssistantMessage(Message),
    /// Application state changed and should be committed by the front end.
    StateChanged(AppState),
    /// Informational text that is not part of the conversation.
    Notice(String),
}

/// External collaborators of a session.
pub struct SessionDeps {
    pub transport: Arc<dyn FrameSink>,
    pub backend: Arc<dyn FallbackBackend>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub memory: Arc<dyn MemoryStore>,
    pub notifier: Arc<dyn Notifier>,
    pub speech: Arc<dyn SpeechOutput>,
}

/// Coordinates one user-visible chat session.
pub struct ChatSession {
    conversation: Option<Conversation>,
    assembler: StreamingAssembler,
    gate: ConsentGate,
    inbox: ProactiveInbox,
    app_state: AppState,
    /// Optional project label attached to outbound frames.
    project: Option<String>,
    /// User text of the turn currently streaming, kept for the memory
    /// commit on finalization.
    pending_user_text: Option<String>,
    deps: SessionDeps,
    outputs: mpsc::UnboundedSender<SessionOutput>,
    timer_tx: mpsc::UnboundedSender<u64>,
}

impl ChatSession {
    /// Creates a session. The returned receiver carries fallback-timer
    /// generations back into [`run_session`].
    pub fn new(
        deps: SessionDeps,
        app_state: AppState,
        outputs: mpsc::UnboundedSender<SessionOutput>,
    ) -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let session = Self {
            conversation: None,
            assembler: StreamingAssembler::new(),
            gate: ConsentGate::new(),
            inbox: ProactiveInbox::new(),
            app_state,
            project: None,
            pending_user_text: None,
            deps,
            outputs,
            timer_tx,
        };
        (session, timer_rx)
    }

    /// Sets the project label attached to outbound frames.
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project;
        self
    }

    /// Reopens the conversation that was active last run, if any.
    pub async fn restore(&mut self) -> Result<()> {
        if let Some(id) = self.deps.conversations.active_conversation_id().await? {
            if let Some(conversation) = self.deps.conversations.find_by_id(&id).await? {
                tracing::info!("[Session] Restored conversation {}", conversation.id);
                self.emit(SessionOutput::ConversationOpened {
                    id: conversation.id.clone(),
                    title: conversation.title.clone(),
                });
                self.conversation = Some(conversation);
            }
        }
        Ok(())
    }

    /// Read access for front ends that render the whole history.
    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Current application state.
    pub fn app_state(&self) -> &AppState {
        &self.app_state
    }

    /// Generation of the stream currently in flight; fallback timers carry
    /// this value back in so stale ones can be told apart.
    pub fn stream_generation(&self) -> u64 {
        self.assembler.generation()
    }

    // ------------------------------------------------------------------
    // Input handling
    // ------------------------------------------------------------------

    /// Routes and dispatches one raw line of user input.
    ///
    /// Never blocks and never fails the input path: backend errors become
    /// visible assistant messages, persistence errors are logged.
    pub async fn handle_user_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        match CommandRouter::route(input) {
            RouteDecision::Local { action, follow_up } => {
                self.handle_local(action, follow_up);
            }
            RouteDecision::ConsentGrant => {
                self.send_or_notice(ClientFrame::System {
                    action: SystemAction::Grant,
                });
            }
            RouteDecision::ConsentRevoke => {
                self.gate.revoke();
                self.send_or_notice(ClientFrame::System {
                    action: SystemAction::Revoke,
                });
                self.emit(SessionOutput::Notice("Consent revoked".to_string()));
            }
            RouteDecision::ListSkills => self.list_skills().await,
            RouteDecision::RunSkill { skill_id, input } => {
                self.run_skill(&skill_id, &input).await;
            }
            RouteDecision::HttpCommand { text } => {
                self.open_turn(&text).await;
                self.command_over_http(text).await;
            }
            RouteDecision::PrivilegedCommand { text } => {
                self.open_turn(&text).await;
                self.dispatch_privileged(text).await;
            }
            RouteDecision::Command { text } => {
                self.open_turn(&text).await;
                self.dispatch_command(text).await;
            }
            RouteDecision::Speak { text } => {
                self.open_turn(&text).await;
                self.dispatch_speak(text).await;
            }
        }
    }

    fn handle_local(&mut self, action: LocalAction, follow_up: Option<String>) {
        self.app_state.apply(&action);
        if matches!(action, LocalAction::ShowHelp) {
            self.emit(SessionOutput::Notice(HELP_TEXT.to_string()));
        } else {
            self.emit(SessionOutput::StateChanged(self.app_state.clone()));
        }

        // The panel change already happened above; the follow-up backend
        // command is a second, independent step and is best-effort.
        if let Some(command) = follow_up {
            if let Err(err) = self.deps.transport.send_frame(ClientFrame::Command {
                text: command,
                project: self.project.clone(),
            }) {
                tracing::debug!("[Session] Panel follow-up command not sent: {}", err);
            }
        }
    }

    async fn dispatch_speak(&mut self, text: String) {
        if self.deps.transport.is_connected() {
            let frame = ClientFrame::Speak {
                text: text.clone(),
                project: self.project.clone(),
            };
            match self.deps.transport.send_frame(frame) {
                Ok(()) => {
                    let placeholder = Message::streaming_placeholder();
                    let message_id = placeholder.id.clone();
                    if let Some(conversation) = self.conversation.as_mut() {
                        conversation.push_message(placeholder);
                    }
                    let generation = self.assembler.begin_turn(&message_id);
                    self.pending_user_text = Some(text);
                    self.emit(SessionOutput::AssistantStarted { message_id });
                    self.arm_fallback_timer(generation);
                    self.persist().await;
                    return;
                }
                Err(err) => {
                    tracing::debug!("[Session] Socket speak failed, using HTTP: {}", err);
                }
            }
        }

        // HTTP path: one whole response, no placeholder involved.
        let message = match self.deps.backend.speak(&text, self.project.as_deref()).await {
            Ok(reply) => Message::assistant(reply),
            Err(err) => Message::assistant(format!("Backend Error: {}", err)),
        };
        self.append_assistant(message).await;
    }

    async fn dispatch_command(&mut self, text: String) {
        if self.deps.transport.is_connected() {
            let frame = ClientFrame::Command {
                text: text.clone(),
                project: self.project.clone(),
            };
            match self.deps.transport.send_frame(frame) {
                // The result arrives later as a command_response frame.
                Ok(()) => return,
                Err(err) => {
                    tracing::debug!("[Session] Socket command failed, using HTTP: {}", err);
                }
            }
        }
        self.command_over_http(text).await;
    }

    async fn dispatch_privileged(&mut self, text: String) {
        if !self.deps.transport.is_connected() {
            self.command_over_http(text).await;
            return;
        }

        match self.gate.request_privileged(&text) {
            GateDisposition::Send => {
                let frame = ClientFrame::Command {
                    text: text.clone(),
                    project: self.project.clone(),
                };
                if self.deps.transport.send_frame(frame).is_err() {
                    self.command_over_http(text).await;
                }
            }
            GateDisposition::Deferred => {
                let frame = ClientFrame::System {
                    action: SystemAction::Grant,
                };
                if self.deps.transport.send_frame(frame).is_err() {
                    // Could not even ask for consent; the parked command
                    // must not linger against a dead connection.
                    self.gate.reset();
                    self.command_over_http(text).await;
                    return;
                }
                self.emit(SessionOutput::Notice(
                    "Privileged command held until consent is granted".to_string(),
                ));
            }
        }
    }

    async fn command_over_http(&mut self, text: String) {
        let message = match self
            .deps
            .backend
            .execute_command(&text, self.project.as_deref())
            .await
        {
            Ok(result) => Message::command_result(result, command_steps(true)),
            Err(err) => {
                Message::command_result(format!("Backend Error: {}", err), command_steps(false))
            }
        };
        self.append_assistant(message).await;
    }

    async fn list_skills(&mut self) {
        match self.deps.backend.list_skills().await {
            Ok(skills) if skills.is_empty() => {
                self.emit(SessionOutput::Notice("No skills available".to_string()));
            }
            Ok(skills) => {
                let listing = skills
                    .iter()
                    .map(|s| format!("{} — {}", s.id, s.description))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.emit(SessionOutput::Notice(listing));
            }
            Err(err) => {
                self.emit(SessionOutput::Notice(format!("Backend Error: {}", err)));
            }
        }
    }

    async fn run_skill(&mut self, skill_id: &str, input: &str) {
        let turn_text = if input.is_empty() {
            format!("skill {}", skill_id)
        } else {
            format!("skill {} {}", skill_id, input)
        };
        self.open_turn(&turn_text).await;
        let message = match self.deps.backend.execute_skill(skill_id, input).await {
            Ok(result) => Message::command_result(result, command_steps(true)),
            Err(err) => {
                Message::command_result(format!("Backend Error: {}", err), command_steps(false))
            }
        };
        self.append_assistant(message).await;
    }

    // ------------------------------------------------------------------
    // Frame handling
    // ------------------------------------------------------------------

    /// Applies one inbound server frame.
    pub async fn handle_frame(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::SystemResponse { consent_granted } => {
                let released = self.gate.on_system_response(consent_granted);
                tracing::debug!(
                    "[Session] Consent {} by backend",
                    if consent_granted { "granted" } else { "withheld" }
                );
                if let Some(command) = released {
                    let frame = ClientFrame::Command {
                        text: command,
                        project: self.project.clone(),
                    };
                    if let Err(err) = self.deps.transport.send_frame(frame) {
                        tracing::debug!("[Session] Released command not sent: {}", err);
                    }
                }
            }
            ServerFrame::SpeakResponseChunk {
                chunk,
                done,
                error,
                memory_commit,
            } => {
                let effect = self.assembler.on_chunk(
                    &chunk,
                    done,
                    error.as_deref(),
                    memory_commit.as_deref(),
                );
                self.apply_stream_effect(effect).await;
            }
            ServerFrame::SpeakResponse {
                content,
                memory_commit,
            } => {
                let effect = self
                    .assembler
                    .on_legacy_response(&content, memory_commit.as_deref());
                self.apply_stream_effect(effect).await;
            }
            ServerFrame::CommandResponse { result } => {
                let message = Message::command_result(result, command_steps(true));
                self.append_assistant(message).await;
            }
            ServerFrame::ProactiveMessage {
                content,
                reason,
                timestamp,
            } => {
                self.handle_proactive(content, reason, timestamp).await;
            }
            ServerFrame::Error { message } => {
                let effect = self.assembler.on_error(&message);
                if effect == StreamEffect::None {
                    // No active placeholder to seed; show a standalone
                    // assistant-role error message.
                    self.append_assistant(Message::assistant(format!("Error: {}", message)))
                        .await;
                } else {
                    self.apply_stream_effect(effect).await;
                }
            }
        }
    }

    /// Reacts to a connectivity change.
    ///
    /// Disconnection is a hard cutover: consent resets, a pending
    /// privileged command is dropped, and an in-flight placeholder is left
    /// as-is. The user must re-initiate.
    pub async fn handle_connectivity(&mut self, connected: bool) {
        tracing::info!("[Session] Connectivity changed: connected={}", connected);
        if !connected {
            self.gate.reset();
            self.assembler.detach();
            self.pending_user_text = None;
        }
        self.emit(SessionOutput::Connectivity { connected });
    }

    /// Handles the fallback timer for the turn with `generation`.
    pub async fn handle_fallback_timeout(&mut self, generation: u64) {
        let effect = self.assembler.on_fallback_timeout(generation);
        self.apply_stream_effect(effect).await;
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn handle_proactive(
        &mut self,
        content: String,
        reason: Option<String>,
        timestamp: Option<String>,
    ) {
        // The only path that creates a conversation from network data.
        self.ensure_conversation().await;

        let disposition = self.inbox.classify(&content, reason.as_deref());

        let mut message = Message::assistant(content.clone());
        message.agent = Some("sola".to_string());
        if let Some(timestamp) = timestamp {
            message.timestamp = timestamp;
        }
        if let Some(conversation) = self.conversation.as_mut() {
            conversation.push_message(message.clone());
        }
        self.emit(SessionOutput::AssistantMessage(message));

        if disposition.notify {
            self.deps.notifier.notify("Sola", &disposition.preview);
        }

        if self.app_state.voice_enabled {
            let speech = Arc::clone(&self.deps.speech);
            tokio::spawn(async move {
                if let Err(err) = speech.speak(&content).await {
                    tracing::warn!("[Session] Speech output failed: {}", err);
                }
            });
        }

        self.persist().await;
    }

    async fn apply_stream_effect(&mut self, effect: StreamEffect) {
        match effect {
            StreamEffect::None => {}
            StreamEffect::Append { message_id, text } => {
                if let Some(conversation) = self.conversation.as_mut() {
                    if let Some(message) = conversation.message_mut(&message_id) {
                        message.content.push_str(&text);
                    }
                }
                self.emit(SessionOutput::AssistantChunk { message_id, text });
            }
            StreamEffect::Finalize {
                message_id,
                trailing_text,
                memory_commit,
            } => {
                let mut final_content = None;
                if let Some(conversation) = self.conversation.as_mut() {
                    if let Some(message) = conversation.message_mut(&message_id) {
                        if let Some(text) = &trailing_text {
                            message.content.push_str(text);
                        }
                        message.memory_commit = memory_commit;
                        message.finalize();
                        final_content = Some(message.content.clone());
                    }
                }
                if let Some(text) = trailing_text {
                    self.emit(SessionOutput::AssistantChunk {
                        message_id: message_id.clone(),
                        text,
                    });
                }
                self.emit(SessionOutput::AssistantFinalized { message_id });
                if let Some(content) = final_content {
                    self.commit_exchange(content);
                }
                self.persist().await;
            }
            StreamEffect::Hydrate {
                message_id,
                content,
                memory_commit,
            } => {
                if let Some(conversation) = self.conversation.as_mut() {
                    if let Some(message) = conversation.message_mut(&message_id) {
                        message.content = content.clone();
                        message.memory_commit = memory_commit;
                        message.finalize();
                    }
                }
                self.emit(SessionOutput::AssistantChunk {
                    message_id: message_id.clone(),
                    text: content.clone(),
                });
                self.emit(SessionOutput::AssistantFinalized { message_id });
                self.commit_exchange(content);
                self.persist().await;
            }
            StreamEffect::Fail {
                message_id,
                display,
            } => {
                if let Some(conversation) = self.conversation.as_mut() {
                    if let Some(message) = conversation.message_mut(&message_id) {
                        message.content = display.clone();
                        message.finalize();
                    }
                }
                self.pending_user_text = None;
                self.emit(SessionOutput::AssistantFailed {
                    message_id,
                    display,
                });
                self.persist().await;
            }
            StreamEffect::Discard { message_id } => {
                if let Some(conversation) = self.conversation.as_mut() {
                    conversation.remove_message(&message_id);
                }
                self.pending_user_text = None;
                self.emit(SessionOutput::AssistantDiscarded { message_id });
                self.persist().await;
            }
        }
    }

    /// Appends the user message for a backend-bound turn and, on the very
    /// first turn, derives the conversation title from it.
    async fn open_turn(&mut self, text: &str) {
        self.ensure_conversation().await;
        if let Some(conversation) = self.conversation.as_mut() {
            conversation.retitle_from(text);
            let message = Message::user(text);
            conversation.push_message(message.clone());
            self.emit(SessionOutput::UserMessage(message));
        }
        self.persist().await;
    }

    async fn ensure_conversation(&mut self) {
        if self.conversation.is_some() {
            return;
        }
        let conversation = Conversation::new();
        if let Err(err) = self
            .deps
            .conversations
            .set_active_conversation(Some(&conversation.id))
            .await
        {
            tracing::warn!("[Session] Failed to record active conversation: {}", err);
        }
        self.emit(SessionOutput::ConversationOpened {
            id: conversation.id.clone(),
            title: conversation.title.clone(),
        });
        self.conversation = Some(conversation);
    }

    async fn append_assistant(&mut self, message: Message) {
        self.ensure_conversation().await;
        if let Some(conversation) = self.conversation.as_mut() {
            conversation.push_message(message.clone());
        }
        self.emit(SessionOutput::AssistantMessage(message));
        self.persist().await;
    }

    /// Commits the finished exchange to long-term memory in the background;
    /// failures are logged and never reach the UI.
    fn commit_exchange(&mut self, assistant_text: String) {
        let Some(conversation) = self.conversation.as_ref() else {
            return;
        };
        let Some(user_text) = self.pending_user_text.take() else {
            return;
        };
        let exchange = MemoryExchange::new(&conversation.id, user_text, assistant_text);
        let memory = Arc::clone(&self.deps.memory);
        tokio::spawn(async move {
            if let Err(err) = memory.commit(&exchange).await {
                tracing::warn!("[Session] Memory commit failed: {}", err);
            }
        });
    }

    fn arm_fallback_timer(&self, generation: u64) {
        let timer_tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(FALLBACK_TIMEOUT_SECS)).await;
            let _ = timer_tx.send(generation);
        });
    }

    fn send_or_notice(&mut self, frame: ClientFrame) {
        if let Err(err) = self.deps.transport.send_frame(frame) {
            tracing::debug!("[Session] Frame not sent: {}", err);
            self.emit(SessionOutput::Notice(
                "Not connected; consent commands need a live connection".to_string(),
            ));
        }
    }

    async fn persist(&self) {
        let Some(conversation) = self.conversation.as_ref() else {
            return;
        };
        if let Err(err) = self.deps.conversations.save(conversation).await {
            tracing::warn!("[Session] Failed to persist conversation: {}", err);
        }
    }

    fn emit(&self, output: SessionOutput) {
        let _ = self.outputs.send(output);
    }
}

fn command_steps(success: bool) -> Vec<WorkflowStep> {
    vec![
        WorkflowStep::new("Dispatch", "→", WorkflowStepStatus::Done),
        WorkflowStep::new(
            "Execute",
            if success { "✓" } else { "✗" },
            if success {
                WorkflowStepStatus::Done
            } else {
                WorkflowStepStatus::Failed
            },
        ),
    ]
}

/// Drives a session until every input source closes.
pub async fn run_session(
    mut session: ChatSession,
    mut transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    mut input_rx: mpsc::UnboundedReceiver<String>,
    mut timer_rx: mpsc::UnboundedReceiver<u64>,
) {
    loop {
        tokio::select! {
            maybe_input = input_rx.recv() => {
                let Some(input) = maybe_input else { break };
                session.handle_user_input(&input).await;
            }
            maybe_event = transport_rx.recv() => {
                let Some(event) = maybe_event else { break };
                match event {
                    TransportEvent::Connectivity { connected } => {
                        session.handle_connectivity(connected).await;
                    }
                    TransportEvent::Frame(frame) => {
                        session.handle_frame(frame).await;
                    }
                }
            }
            maybe_generation = timer_rx.recv() => {
                let Some(generation) = maybe_generation else { break };
                session.handle_fallback_timeout(generation).await;
            }
        }
    }
    tracing::debug!("[Session] Event loop finished");
}
