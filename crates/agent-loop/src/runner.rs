use std::sync::Arc;

use agent_core::tools::{ToolCall, ToolDispatcher};
use agent_core::{
    AgentError, EventBus, Message, SessionError, SessionEvent, SessionId, SessionStatus,
    SessionStore, StreamEvent, Subscription, TurnLease,
};
use agent_llm::{LLMProvider, OpenAIProvider};

use crate::config::AgentLoopConfig;
use crate::stream::handler::consume_llm_stream;

pub type Result<T> = std::result::Result<T, AgentError>;

/// Explicit reference to one session, passed to every orchestrator call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    id: SessionId,
}

impl SessionHandle {
    pub fn id(&self) -> &SessionId {
        &self.id
    }
}

impl From<SessionId> for SessionHandle {
    fn from(id: SessionId) -> Self {
        Self { id }
    }
}

/// How a single round ended.
enum RoundOutcome {
    /// Tool results were appended; ask the model again.
    Continue,
    /// The model answered without tool calls.
    Finished,
}

/// Drives sessions through model requests and tool dispatch.
pub struct TurnOrchestrator {
    store: Arc<SessionStore>,
    bus: Arc<EventBus>,
    llm: Arc<dyn LLMProvider>,
    tools: Arc<dyn ToolDispatcher>,
    config: AgentLoopConfig,
}

impl TurnOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        bus: Arc<EventBus>,
        llm: Arc<dyn LLMProvider>,
        tools: Arc<dyn ToolDispatcher>,
        config: AgentLoopConfig,
    ) -> Self {
        Self {
            store,
            bus,
            llm,
            tools,
            config,
        }
    }

    /// Talks to the OpenAI-compatible endpoint described by `config.llm`.
    pub fn with_openai(
        store: Arc<SessionStore>,
        bus: Arc<EventBus>,
        tools: Arc<dyn ToolDispatcher>,
        config: AgentLoopConfig,
    ) -> Self {
        log::info!(
            "Using model {} at {}",
            config.llm.model,
            config.llm.base_url
        );
        let llm = Arc::new(OpenAIProvider::from_config(&config.llm));
        Self::new(store, bus, llm, tools, config)
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &AgentLoopConfig {
        &self.config
    }

    pub fn open_session(&self) -> SessionHandle {
        SessionHandle::from(self.store.create())
    }

    /// Reconstructs a handle for a session known to the store or its repository.
    pub async fn resume_session(&self, id: SessionId) -> Result<SessionHandle> {
        let count = self.store.restore(&id).await?;
        log::info!("[{}] Session resumed with {} messages", id, count);
        Ok(SessionHandle::from(id))
    }

    pub fn subscribe(&self, session: &SessionHandle) -> Subscription {
        self.bus.subscribe(session.id())
    }

    pub async fn history(&self, session: &SessionHandle) -> Result<Vec<Message>> {
        self.store.read_all(session.id()).await
    }

    pub async fn status(&self, session: &SessionHandle) -> Result<SessionStatus> {
        self.store.get_status(session.id()).await
    }

    /// Requests cooperative cancellation; returns whether a turn was active.
    pub async fn cancel(&self, session: &SessionHandle) -> Result<bool> {
        self.store.cancel(session.id()).await
    }

    /// Runs one user turn to completion, cancellation or failure.
    ///
    /// Returns `Ok` only when the model answered without tool calls and the
    /// session is `Waiting`.
    pub async fn start_turn(&self, session: &SessionHandle, user_text: impl Into<String>) -> Result<()> {
        let session_id = session.id();
        let lease = self.store.begin_turn(session_id).await?;
        let user_text = user_text.into();

        log::debug!("[{}] Starting turn with message: {}", session_id, user_text);

        let result = self.run_turn(&lease, user_text).await;
        match &result {
            Ok(()) => log::info!("[{}] Turn completed", session_id),
            Err(AgentError::Cancelled) => log::info!("[{}] Turn cancelled", session_id),
            Err(error) => {
                log::error!("[{}] Turn failed: {}", session_id, error);
                self.fail_turn(session_id, error).await;
            }
        }
        result
    }

    async fn run_turn(&self, lease: &TurnLease, user_text: String) -> Result<()> {
        let session_id = lease.session_id();

        self.reset_after_failure(session_id).await?;

        if self.store.message_count(session_id).await? == 0 {
            self.store
                .append_message(session_id, Message::system(self.config.system_prompt.clone()))
                .await?;
        }
        self.store
            .append_message(session_id, Message::user(user_text))
            .await?;

        self.set_status(session_id, SessionStatus::Running).await?;

        let mut rounds = 0usize;
        loop {
            if lease.is_cancelled() {
                return Err(self.finish_cancelled(session_id, "before model request").await);
            }

            if rounds >= self.config.max_turns {
                let limit = self.config.max_turns;
                log::warn!("[{}] Turn limit of {} model requests reached", session_id, limit);
                self.store
                    .append_message(
                        session_id,
                        Message::system(format!(
                            "Stopped after {} model requests without a final answer.",
                            limit
                        )),
                    )
                    .await?;
                return Err(SessionError::TurnLimitExceeded {
                    session_id: session_id.clone(),
                    limit,
                }
                .into());
            }
            rounds += 1;

            match self.run_round(lease, rounds).await? {
                RoundOutcome::Continue => continue,
                RoundOutcome::Finished => {
                    self.set_status(session_id, SessionStatus::Waiting).await?;
                    return Ok(());
                }
            }
        }
    }

    /// One model request followed by sequential dispatch of its tool calls.
    async fn run_round(&self, lease: &TurnLease, round: usize) -> Result<RoundOutcome> {
        let session_id = lease.session_id();
        let total = self.store.record_model_turn(session_id)?;
        let history = self.store.read_all(session_id).await?;

        log::debug!(
            "[{}] Round {} (model request {} for this session) with {} messages",
            session_id,
            round,
            total,
            history.len()
        );

        let pending = match self.llm.chat_stream(&history).await {
            Ok(stream) => consume_llm_stream(stream, &self.bus, session_id).await,
            Err(error) => Err(error),
        };
        let pending = match pending {
            Ok(pending) => pending,
            Err(error) => {
                let message = format!("Model request failed: {}", error);
                self.store
                    .append_message(session_id, Message::system(message))
                    .await?;
                return Err(AgentError::Transport(error.to_string()));
            }
        };

        let assistant = pending.commit();
        let tool_calls = assistant.tool_calls.clone();
        self.store.append_message(session_id, assistant).await?;

        if tool_calls.is_empty() {
            return Ok(RoundOutcome::Finished);
        }

        log::debug!(
            "[{}] Executing {} tool call(s)",
            session_id,
            tool_calls.len()
        );
        for (index, call) in tool_calls.iter().enumerate() {
            if lease.is_cancelled() {
                log::info!(
                    "[{}] Skipping {} remaining tool call(s)",
                    session_id,
                    tool_calls.len() - index
                );
                return Err(self.finish_cancelled(session_id, "before tool dispatch").await);
            }
            self.dispatch_tool(session_id, call).await?;
        }

        Ok(RoundOutcome::Continue)
    }

    async fn dispatch_tool(&self, session_id: &SessionId, call: &ToolCall) -> Result<()> {
        log::debug!(
            "[{}] Tool '{}' with {} argument(s)",
            session_id,
            call.name,
            call.arguments.len()
        );

        let (content, success) = match self.tools.execute(&call.name, &call.arguments).await {
            Ok(text) => (format!("Tool Output [{}]:\n{}", call.name, text), true),
            Err(error) => {
                log::warn!("[{}] Tool '{}' failed: {}", session_id, call.name, error);
                (format!("Tool Error [{}]:\n{}", call.name, error), false)
            }
        };

        self.store
            .append_message(session_id, Message::tool_output(content.clone()))
            .await?;
        self.bus.publish(
            session_id,
            SessionEvent::ToolOutput {
                tool_name: call.name.clone(),
                content,
                success,
            },
        );
        Ok(())
    }

    async fn finish_cancelled(&self, session_id: &SessionId, checkpoint: &str) -> AgentError {
        log::info!("[{}] Cancellation observed {}", session_id, checkpoint);
        match self.set_status(session_id, SessionStatus::Cancelled).await {
            Ok(()) => AgentError::Cancelled,
            Err(error) => error,
        }
    }

    /// A new turn may follow an errored or cancelled one.
    async fn reset_after_failure(&self, session_id: &SessionId) -> Result<()> {
        let status = self.store.get_status(session_id).await?;
        if matches!(status, SessionStatus::Error | SessionStatus::Cancelled) {
            self.store.set_status(session_id, SessionStatus::Idle).await?;
        }
        Ok(())
    }

    async fn set_status(&self, session_id: &SessionId, status: SessionStatus) -> Result<()> {
        if self.store.get_status(session_id).await? == status {
            return Ok(());
        }
        self.store.set_status(session_id, status).await?;
        self.bus.publish(session_id, status);
        Ok(())
    }

    /// Moves a still-running session into `Error` and tells observers why.
    async fn fail_turn(&self, session_id: &SessionId, error: &AgentError) {
        self.bus
            .publish(session_id, StreamEvent::error(error.to_string()));

        match self.store.get_status(session_id).await {
            Ok(SessionStatus::Running) => {
                if let Err(status_error) = self.set_status(session_id, SessionStatus::Error).await {
                    log::warn!(
                        "[{}] Failed to mark session as errored: {}",
                        session_id,
                        status_error
                    );
                }
            }
            Ok(_) => {}
            Err(status_error) => {
                log::warn!("[{}] Failed to read session status: {}", session_id, status_error);
            }
        }
    }
}
