use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::store::{KeyValueStore, AUTH_USER_KEY, SESSION_ID_KEY};

/// Resolves the per-install session id and the signed-in user, if any.
pub struct SessionIdentity {
    store: Arc<dyn KeyValueStore>,
    session_id: OnceCell<String>,
}

#[derive(Deserialize)]
struct AuthUserRecord {
    id: serde_json::Value,
}

impl SessionIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            session_id: OnceCell::new(),
        }
    }

    /// Read-or-create. The first call per process hits the store; later
    /// calls return the memoized value.
    pub async fn session_id(&self) -> String {
        self.session_id
            .get_or_init(|| self.load_or_create_session_id())
            .await
            .clone()
    }

    async fn load_or_create_session_id(&self) -> String {
        match self.store.get(SESSION_ID_KEY).await {
            Ok(Some(existing)) if !existing.trim().is_empty() => return existing,
            Ok(_) => {}
            Err(e) => tracing::warn!("failed to read session id, generating a new one: {e}"),
        }

        let session_id = generate_session_id();
        if let Err(e) = self.store.set(SESSION_ID_KEY, &session_id).await {
            tracing::warn!("failed to persist session id: {e}");
        }
        tracing::debug!(session_id = %session_id, "created telemetry session id");
        session_id
    }

    /// Best-effort read of the authenticated user's id.
    pub async fn user_id(&self) -> Option<String> {
        let raw = match self.store.get(AUTH_USER_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::debug!("auth record unavailable: {e}");
                return None;
            }
        };

        let record: AuthUserRecord = serde_json::from_str(&raw).ok()?;
        match record.id {
            serde_json::Value::String(id) if !id.is_empty() => Some(id),
            serde_json::Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

fn generate_session_id() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}
