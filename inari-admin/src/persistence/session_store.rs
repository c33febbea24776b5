use std::fmt::Debug;

use async_trait::async_trait;
use inari_common::{SessionId, SessionIdError, UserSession};
use opendal::Operator;

/// Errors reading or writing sessions.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No session is stored under this id.
    #[error("session {0} not found")]
    NotFound(SessionId),
    /// The id can't be a session id.
    #[error(transparent)]
    InvalidId(#[from] SessionIdError),
    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(#[from] opendal::Error),
    /// The stored document is not a session.
    #[error("stored session is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable keyed storage for sessions.
///
/// Last write wins. Callers that read, modify and write back a session hold
/// the session's lock from [`super::SessionLocks`].
#[async_trait]
pub trait SessionStore: Debug + Send + Sync {
    /// Insert or replace the session under its `uid`.
    async fn create(&self, session: &UserSession) -> Result<(), StoreError>;

    /// Load a session. A miss is [`StoreError::NotFound`].
    async fn fetch_by_id(&self, id: &SessionId) -> Result<UserSession, StoreError>;
}

/// [`SessionStore`] keeping one JSON document per session at `sessions/{uid}.json`.
#[derive(Debug, Clone)]
pub struct OpendalSessionStore {
    operator: Operator,
}

impl OpendalSessionStore {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Store backed by process memory.
    #[cfg(any(test, feature = "testing"))]
    pub fn in_memory() -> Self {
        let builder = opendal::services::Memory::default();
        let operator = Operator::new(builder)
            .expect("memory operator is infallible")
            .finish();
        Self::new(operator)
    }

    fn path(id: &SessionId) -> String {
        format!("sessions/{id}.json")
    }
}

#[async_trait]
impl SessionStore for OpendalSessionStore {
    async fn create(&self, session: &UserSession) -> Result<(), StoreError> {
        let id = session.id()?;
        let document = serde_json::to_vec(session)?;

        self.operator.write(&Self::path(&id), document).await?;
        tracing::debug!(session_id = %id, "Session saved");
        Ok(())
    }

    async fn fetch_by_id(&self, id: &SessionId) -> Result<UserSession, StoreError> {
        let buffer = match self.operator.read(&Self::path(id)).await {
            Ok(buffer) => buffer,
            Err(error) if error.kind() == opendal::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()))
            }
            Err(error) => return Err(error.into()),
        };

        Ok(serde_json::from_slice(&buffer.to_vec())?)
    }
}
