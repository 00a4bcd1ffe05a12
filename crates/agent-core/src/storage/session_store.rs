use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::agent::{AgentError, Message, SessionError, SessionId, SessionStatus};
use crate::storage::{HistoryRepository, HistoryRow, MemoryHistory};

pub type Result<T> = std::result::Result<T, AgentError>;

struct SessionRecord {
    messages: RwLock<Vec<Message>>,
    status: RwLock<SessionStatus>,
    turn_count: AtomicUsize,
    turn_active: AtomicBool,
    cancel_token: Mutex<CancellationToken>,
}

impl SessionRecord {
    fn new(messages: Vec<Message>) -> Self {
        Self {
            messages: RwLock::new(messages),
            status: RwLock::new(SessionStatus::Idle),
            turn_count: AtomicUsize::new(0),
            turn_active: AtomicBool::new(false),
            cancel_token: Mutex::new(CancellationToken::new()),
        }
    }
}

/// Session identity, append-only message logs and status.
///
/// Every append is persisted through the [`HistoryRepository`] before it
/// becomes visible to readers, and readers always get a complete prefix.
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<SessionRecord>>,
    repository: Arc<dyn HistoryRepository>,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn HistoryRepository>) -> Self {
        Self {
            sessions: DashMap::new(),
            repository,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryHistory::new()))
    }

    pub fn create(&self) -> SessionId {
        let session_id = SessionId::new();
        self.sessions
            .insert(session_id.clone(), Arc::new(SessionRecord::new(Vec::new())));
        log::info!("[{}] Session created", session_id);
        session_id
    }

    /// Rebuilds a session from persisted rows; the restored session is `Idle`.
    ///
    /// Returns the number of messages in the log.
    pub async fn restore(&self, session_id: &SessionId) -> Result<usize> {
        if let Some(record) = self.sessions.get(session_id).map(|r| Arc::clone(r.value())) {
            return Ok(record.messages.read().await.len());
        }

        let rows = self.repository.load_rows(session_id).await?;
        if rows.is_empty() {
            return Err(SessionError::NotFound(session_id.clone()).into());
        }
        let messages: Vec<Message> = rows.into_iter().map(HistoryRow::into_message).collect();
        let count = messages.len();

        self.sessions
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(SessionRecord::new(messages)));
        log::info!("[{}] Session restored with {} messages", session_id, count);
        Ok(count)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Persists then appends; returns the message's position in the log.
    pub async fn append_message(&self, session_id: &SessionId, message: Message) -> Result<usize> {
        let record = self.record(session_id)?;
        let mut messages = record.messages.write().await;
        let sequence = messages.len();

        let row = HistoryRow::from_message(session_id, sequence as u64, &message);
        if let Err(error) = self.repository.append_row(&row).await {
            log::error!("[{}] Failed to persist message {}: {}", session_id, sequence, error);
            return Err(error.into());
        }

        messages.push(message);
        Ok(sequence)
    }

    pub async fn read_all(&self, session_id: &SessionId) -> Result<Vec<Message>> {
        let record = self.record(session_id)?;
        let messages = record.messages.read().await;
        Ok(messages.clone())
    }

    pub async fn message_count(&self, session_id: &SessionId) -> Result<usize> {
        let record = self.record(session_id)?;
        let messages = record.messages.read().await;
        Ok(messages.len())
    }

    pub async fn set_status(&self, session_id: &SessionId, status: SessionStatus) -> Result<()> {
        let record = self.record(session_id)?;
        let mut current = record.status.write().await;
        if !current.can_transition_to(status) {
            return Err(SessionError::InvalidTransition {
                session_id: session_id.clone(),
                from: *current,
                to: status,
            }
            .into());
        }
        log::debug!("[{}] Status {} -> {}", session_id, *current, status);
        *current = status;
        Ok(())
    }

    pub async fn get_status(&self, session_id: &SessionId) -> Result<SessionStatus> {
        let record = self.record(session_id)?;
        let status = *record.status.read().await;
        Ok(status)
    }

    pub fn turn_count(&self, session_id: &SessionId) -> Result<usize> {
        Ok(self.record(session_id)?.turn_count.load(Ordering::SeqCst))
    }

    /// Counts one model request against the session.
    pub fn record_model_turn(&self, session_id: &SessionId) -> Result<usize> {
        Ok(self.record(session_id)?.turn_count.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Claims the session's single turn slot and installs a fresh cancellation token.
    pub async fn begin_turn(&self, session_id: &SessionId) -> Result<TurnLease> {
        let record = self.record(session_id)?;
        let mut cancel_token = record.cancel_token.lock().await;

        if record
            .turn_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::TurnInProgress(session_id.clone()).into());
        }

        *cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        drop(cancel_token);

        Ok(TurnLease {
            session_id: session_id.clone(),
            record,
            token,
        })
    }

    pub fn is_turn_active(&self, session_id: &SessionId) -> Result<bool> {
        Ok(self.record(session_id)?.turn_active.load(Ordering::SeqCst))
    }

    /// Requests cooperative cancellation; returns whether a turn was active.
    pub async fn cancel(&self, session_id: &SessionId) -> Result<bool> {
        let record = self.record(session_id)?;
        let cancel_token = record.cancel_token.lock().await;

        if !record.turn_active.load(Ordering::SeqCst) {
            return Ok(false);
        }
        cancel_token.cancel();
        log::info!("[{}] Cancellation requested", session_id);
        Ok(true)
    }

    fn record(&self, session_id: &SessionId) -> Result<Arc<SessionRecord>> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound(session_id.clone()).into())
    }
}

/// Exclusive right to run one turn on a session; released on drop.
pub struct TurnLease {
    session_id: SessionId,
    record: Arc<SessionRecord>,
    token: CancellationToken,
}

impl TurnLease {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TurnLease {
    fn drop(&mut self) {
        self.record.turn_active.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Role, StoreError};
    use async_trait::async_trait;

    #[tokio::test]
    async fn append_and_read_preserve_order() {
        let store = SessionStore::in_memory();
        let session_id = store.create();

        store
            .append_message(&session_id, Message::system("sys"))
            .await
            .unwrap();
        let sequence = store
            .append_message(&session_id, Message::user("hello"))
            .await
            .unwrap();

        let messages = store.read_all(&session_id).await.unwrap();
        assert_eq!(sequence, 1);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "hello");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = SessionStore::in_memory();
        let missing = SessionId::from("missing");

        let result = store.read_all(&missing).await;

        assert!(matches!(
            result,
            Err(AgentError::Session(SessionError::NotFound(id))) if id == missing
        ));
    }

    #[tokio::test]
    async fn status_rejects_illegal_transitions() {
        let store = SessionStore::in_memory();
        let session_id = store.create();

        assert_eq!(store.get_status(&session_id).await.unwrap(), SessionStatus::Idle);
        let invalid = store.set_status(&session_id, SessionStatus::Waiting).await;
        assert!(matches!(
            invalid,
            Err(AgentError::Session(SessionError::InvalidTransition { .. }))
        ));

        store
            .set_status(&session_id, SessionStatus::Running)
            .await
            .unwrap();
        store
            .set_status(&session_id, SessionStatus::Waiting)
            .await
            .unwrap();
        assert_eq!(
            store.get_status(&session_id).await.unwrap(),
            SessionStatus::Waiting
        );
    }

    #[tokio::test]
    async fn only_one_turn_lease_at_a_time() {
        let store = SessionStore::in_memory();
        let session_id = store.create();

        let lease = store.begin_turn(&session_id).await.unwrap();
        let second = store.begin_turn(&session_id).await;
        assert!(matches!(
            second,
            Err(AgentError::Session(SessionError::TurnInProgress(_)))
        ));

        drop(lease);
        assert!(!store.is_turn_active(&session_id).unwrap());
        assert!(store.begin_turn(&session_id).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_targets_the_active_lease_only() {
        let store = SessionStore::in_memory();
        let session_id = store.create();

        assert!(!store.cancel(&session_id).await.unwrap());

        let lease = store.begin_turn(&session_id).await.unwrap();
        assert!(store.cancel(&session_id).await.unwrap());
        assert!(lease.is_cancelled());
        drop(lease);

        let fresh = store.begin_turn(&session_id).await.unwrap();
        assert!(!fresh.is_cancelled());
    }

    #[tokio::test]
    async fn restore_rebuilds_log_from_repository() {
        let repository = Arc::new(MemoryHistory::new());
        let session_id = {
            let store = SessionStore::new(repository.clone());
            let session_id = store.create();
            store
                .append_message(&session_id, Message::user("first"))
                .await
                .unwrap();
            store
                .append_message(&session_id, Message::assistant("reply", Vec::new()))
                .await
                .unwrap();
            session_id
        };

        let store = SessionStore::new(repository);
        assert_eq!(store.restore(&session_id).await.unwrap(), 2);
        let messages = store.read_all(&session_id).await.unwrap();
        assert_eq!(messages[1].content, "reply");
        assert_eq!(store.get_status(&session_id).await.unwrap(), SessionStatus::Idle);

        let unknown = store.restore(&SessionId::new()).await;
        assert!(matches!(
            unknown,
            Err(AgentError::Session(SessionError::NotFound(_)))
        ));
    }

    struct FailingHistory;

    #[async_trait]
    impl HistoryRepository for FailingHistory {
        async fn append_row(&self, _row: &HistoryRow) -> std::result::Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        async fn load_rows(
            &self,
            _session_id: &SessionId,
        ) -> std::result::Result<Vec<HistoryRow>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failed_persist_leaves_log_untouched() {
        let store = SessionStore::new(Arc::new(FailingHistory));
        let session_id = store.create();

        let result = store.append_message(&session_id, Message::user("x")).await;

        assert!(matches!(result, Err(AgentError::Store(_))));
        assert_eq!(store.message_count(&session_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn restore_refuses_ids_that_escape_the_history_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = crate::storage::JsonlHistory::new(temp_dir.path().join("history"));
        history.init().await.unwrap();
        let store = SessionStore::new(Arc::new(history));

        let result = store.restore(&SessionId::from("../outside")).await;

        assert!(matches!(
            result,
            Err(AgentError::Store(StoreError::InvalidSessionId(_)))
        ));
        assert!(!store.contains(&SessionId::from("../outside")));
    }

    #[tokio::test]
    async fn model_turns_are_counted() {
        let store = SessionStore::in_memory();
        let session_id = store.create();

        assert_eq!(store.record_model_turn(&session_id).unwrap(), 1);
        assert_eq!(store.record_model_turn(&session_id).unwrap(), 2);
        assert_eq!(store.turn_count(&session_id).unwrap(), 2);
    }
}
