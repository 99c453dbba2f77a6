use super::SessionStore;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Cookie-session key under which a browser's store key is kept.
pub const STORE_KEY: &str = "session_store_key";

/// In-memory map from browser session to its [`SessionStore`].
///
/// Nothing here survives a restart: a restarted process has no signed-in users.
#[derive(Default)]
pub struct SessionRegistry {
    stores: RwLock<HashMap<String, SessionStore>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_key() -> String {
        Uuid::new_v4().to_string()
    }

    async fn get(&self, key: &str) -> Option<SessionStore> {
        self.stores.read().await.get(key).cloned()
    }

    /// Return the store for `key`, creating a fresh one if needed. The flag is
    /// true when the store was created by this call.
    pub async fn get_or_create(&self, key: &str) -> (SessionStore, bool) {
        if let Some(store) = self.get(key).await {
            store.touch();
            return (store, false);
        }

        let mut stores = self.stores.write().await;
        // Another request may have created it while we waited for the lock.
        if let Some(store) = stores.get(key) {
            store.touch();
            return (store.clone(), false);
        }

        let store = SessionStore::new();
        stores.insert(key.to_string(), store.clone());
        debug!("Created session store ({} active)", stores.len());
        (store, true)
    }

    pub async fn len(&self) -> usize {
        self.stores.read().await.len()
    }

    /// Evict stores nobody has touched for longer than `max_idle`.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|_, store| store.idle_for() <= max_idle);
        before - stores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_reuses_store() {
        let registry = SessionRegistry::new();
        let key = SessionRegistry::new_key();

        let (first, created) = registry.get_or_create(&key).await;
        assert!(created);
        first.finish_initial_load(None);

        let (second, created) = registry.get_or_create(&key).await;
        assert!(!created);
        assert!(!second.is_loading(), "same store should be returned");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_prune_keeps_recent_stores() {
        let registry = SessionRegistry::new();
        registry.get_or_create("a").await;
        registry.get_or_create("b").await;

        assert_eq!(registry.prune_idle(Duration::from_secs(60)).await, 0);
        assert_eq!(registry.len().await, 2);

        assert!(registry.get("a").await.is_some());
        assert!(registry.get("c").await.is_none());
    }
}
