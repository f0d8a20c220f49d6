use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Maps browser sessions to their remote thread id. Passed into the request
/// handlers as explicit shared state; lives for the process lifetime.
#[derive(Default)]
pub struct SessionStore {
    threads: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn set_thread(&self, session_id: &str, thread_id: String) {
        self.threads
            .write()
            .await
            .insert(session_id.to_string(), thread_id);
    }

    pub async fn thread_for(&self, session_id: &str) -> Option<String> {
        self.threads.read().await.get(session_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn thread_roundtrip_per_session() {
        let store = SessionStore::new();
        store.set_thread("sid_1", "thread_1".to_string()).await;
        store.set_thread("sid_2", "thread_2".to_string()).await;

        assert_eq!(store.thread_for("sid_1").await.as_deref(), Some("thread_1"));
        assert_eq!(store.thread_for("sid_2").await.as_deref(), Some("thread_2"));
        assert_eq!(store.thread_for("sid_3").await, None);
    }

    #[tokio::test]
    async fn new_thread_replaces_the_previous_one() {
        let store = SessionStore::new();
        store.set_thread("sid_1", "thread_1".to_string()).await;
        store.set_thread("sid_1", "thread_9".to_string()).await;

        assert_eq!(store.thread_for("sid_1").await.as_deref(), Some("thread_9"));
    }
}
