use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use agent_core::{
    AgentError, EventEnvelope, Message, Role, Session, StreamEvent, ToolCallRequest, ToolError,
    ToolRegistry,
};
use agent_llm::ChatProvider;

use crate::adapters::{
    Continuation, ExecutedCall, FallbackProtocolAdapter, NativeProtocolAdapter, ProtocolAdapter,
    RoundOutput,
};
use crate::config::{OrchestratorConfig, ToolProtocol};
use crate::stream::EventEmitter;

pub type Result<T> = std::result::Result<T, AgentError>;

enum TurnState {
    Generating,
    Executing(RoundOutput),
    Continuing(RoundOutput, Vec<ExecutedCall>),
    Done,
}

/// A running turn started by [`Orchestrator::spawn_turn`].
pub struct TurnHandle {
    pub events: mpsc::Receiver<EventEnvelope>,
    pub cancel_token: CancellationToken,
    /// Resolves to the conversation as it stood when the turn ended.
    pub join: JoinHandle<Session>,
}

impl TurnHandle {
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

/// Drives one conversational turn through generation and tool rounds.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<ToolRegistry>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ChatProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self::with_config(provider, registry, OrchestratorConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn ChatProvider>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    /// Runs the turn on its own task and returns the receiving end of its
    /// event stream. Dropping the receiver cancels the turn.
    pub fn spawn_turn(&self, session: Session, cancel_token: CancellationToken) -> TurnHandle {
        let (event_tx, events) = mpsc::channel(self.config.event_buffer.max(1));

        let turn_finished = CancellationToken::new();
        let watcher_finished = turn_finished.clone();
        let watcher_tx = event_tx.clone();
        let watcher_cancel = cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = watcher_tx.closed() => watcher_cancel.cancel(),
                _ = watcher_finished.cancelled() => {}
            }
        });

        let orchestrator = self.clone();
        let turn_cancel = cancel_token.clone();
        let join = tokio::spawn(async move {
            let _finished = turn_finished.drop_guard();
            let mut session = session;
            let _ = orchestrator
                .run_turn(&mut session, event_tx, turn_cancel)
                .await;
            session
        });

        TurnHandle {
            events,
            cancel_token,
            join,
        }
    }

    /// Runs one turn to completion, sending events to `event_tx`.
    ///
    /// Ends with exactly one terminal event unless the turn is cancelled, in
    /// which case nothing further is sent and `AgentError::Cancelled` is
    /// returned.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        event_tx: mpsc::Sender<EventEnvelope>,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        let emitter = EventEmitter::new(event_tx, cancel_token);
        let session_id = session.id.clone();

        match self.drive(session, &emitter).await {
            Ok(()) => {
                emitter.emit(StreamEvent::Done).await?;
                log::info!("[{}] Turn completed", session_id);
                Ok(())
            }
            Err(AgentError::Cancelled) => {
                log::info!("[{}] Turn cancelled", session_id);
                Err(AgentError::Cancelled)
            }
            Err(error) => {
                log::error!("[{}] Turn failed: {}", session_id, error);
                emitter
                    .emit(StreamEvent::Error {
                        error: error.to_string(),
                    })
                    .await?;
                Err(error)
            }
        }
    }

    async fn drive(&self, session: &mut Session, emitter: &EventEmitter) -> Result<()> {
        let session_id = session.id.clone();
        normalize_messages(session, self.config.system_prompt.as_deref());

        let (mut adapter, max_tool_rounds) = self.select_adapter();
        log::info!(
            "[{}] Starting turn with {} messages ({} protocol, up to {} tool rounds)",
            session_id,
            session.messages.len(),
            adapter.name(),
            max_tool_rounds
        );

        let mut tool_rounds = 0usize;
        let mut state = TurnState::Generating;

        loop {
            state = match state {
                TurnState::Generating => {
                    if emitter.is_cancelled() {
                        return Err(AgentError::Cancelled);
                    }

                    let timer = Timer::new(format!("{} generation", adapter.name()));
                    let mut round = adapter
                        .generate(session, self.provider.as_ref(), emitter)
                        .await?;
                    timer.debug(&session_id);

                    if !round.has_requests() {
                        adapter.finish(session, round);
                        TurnState::Done
                    } else if tool_rounds >= max_tool_rounds {
                        log::info!(
                            "[{}] Tool round limit ({}) reached; ignoring {} further tool request(s)",
                            session_id,
                            max_tool_rounds,
                            round.requests.len()
                        );
                        if let Some(pending) = round.pending.take() {
                            emitter.content(pending).await?;
                        }
                        adapter.finish(session, round);
                        TurnState::Done
                    } else {
                        TurnState::Executing(round)
                    }
                }

                TurnState::Executing(round) => {
                    tool_rounds += 1;
                    log::debug!(
                        "[{}] Tool round {}: {} request(s)",
                        session_id,
                        tool_rounds,
                        round.requests.len()
                    );

                    let mut executed = Vec::with_capacity(round.requests.len());
                    for request in &round.requests {
                        executed.push(self.execute_request(request, emitter, &session_id).await?);
                    }
                    TurnState::Continuing(round, executed)
                }

                TurnState::Continuing(round, executed) => {
                    match adapter.continue_with(session, round, executed) {
                        Continuation::Continue => TurnState::Generating,
                        Continuation::Finish(answer) => {
                            if let Some(answer) = answer {
                                emitter.content(answer).await?;
                            }
                            TurnState::Done
                        }
                    }
                }

                TurnState::Done => return Ok(()),
            };
        }
    }

    fn select_adapter(&self) -> (Box<dyn ProtocolAdapter>, usize) {
        let definitions = self.registry.definitions();

        let native = definitions.is_empty()
            || match self.config.protocol {
                ToolProtocol::Auto => self.provider.supports_native_tools(),
                ToolProtocol::Native => true,
                ToolProtocol::Fallback => false,
            };

        if native {
            let schemas = definitions.iter().map(|d| d.to_schema()).collect();
            (
                Box::new(NativeProtocolAdapter::new(schemas)),
                self.config.round_limits.native,
            )
        } else {
            (
                Box::new(FallbackProtocolAdapter::new(definitions)),
                self.config.round_limits.fallback,
            )
        }
    }

    /// Emits `tool_call`, runs the tool on its own task, then emits the
    /// outcome. A started execution is always awaited, even when the turn is
    /// cancelled meanwhile.
    async fn execute_request(
        &self,
        request: &ToolCallRequest,
        emitter: &EventEmitter,
        session_id: &str,
    ) -> Result<ExecutedCall> {
        emitter
            .emit(StreamEvent::ToolCall {
                tool: request.tool.clone(),
                parameters: request.arguments_value(),
            })
            .await?;

        let timer = Timer::new(format!("tool_{}", request.tool));
        let registry = Arc::clone(&self.registry);
        let name = request.tool.clone();
        let arguments = request.arguments.clone();
        let task = tokio::spawn(async move { registry.execute(&name, arguments).await });

        let outcome: std::result::Result<Value, ToolError> = match task.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                log::error!(
                    "[{}] Tool '{}' task failed: {}",
                    session_id,
                    request.tool,
                    join_error
                );
                Err(ToolError::Execution {
                    tool: request.tool.clone(),
                    message: if join_error.is_panic() {
                        "tool panicked".to_string()
                    } else {
                        "tool task was cancelled".to_string()
                    },
                })
            }
        };
        timer.debug(session_id);

        if emitter.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        match &outcome {
            Ok(result) => {
                emitter
                    .emit(StreamEvent::ToolResult {
                        tool: request.tool.clone(),
                        result: result.clone(),
                    })
                    .await?
            }
            Err(error) => {
                log::warn!(
                    "[{}] Tool '{}' failed: {}",
                    session_id,
                    request.tool,
                    error
                );
                emitter
                    .emit(StreamEvent::ToolError {
                        tool: request.tool.clone(),
                        error: error.to_string(),
                    })
                    .await?
            }
        }

        Ok(ExecutedCall {
            request: request.clone(),
            outcome,
        })
    }
}

/// Drops empty messages that carry nothing for the model, and makes sure a
/// system message leads the conversation when one exists or is configured.
fn normalize_messages(session: &mut Session, system_prompt: Option<&str>) {
    session.messages.retain(|message| {
        message.role == Role::Tool
            || message.has_tool_calls()
            || !message.content.trim().is_empty()
    });

    match session
        .messages
        .iter()
        .position(|message| message.role == Role::System)
    {
        Some(0) => {}
        Some(index) => {
            let system = session.messages.remove(index);
            session.messages.insert(0, system);
        }
        None => {
            if let Some(prompt) = system_prompt.filter(|prompt| !prompt.trim().is_empty()) {
                session.messages.insert(0, Message::system(prompt));
            }
        }
    }
}

struct Timer {
    name: String,
    start: std::time::Instant,
}

impl Timer {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: std::time::Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    fn debug(&self, session_id: &str) {
        log::debug!(
            "[{}] {} completed in {}ms",
            session_id,
            self.name,
            self.elapsed_ms()
        );
    }
}
