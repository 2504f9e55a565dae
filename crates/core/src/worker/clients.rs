//! Pages the interceptor can control and message.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::Error;

/// Identifies a registered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Messages the interceptor posts to pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// A version finished activating and now controls the page.
    SwActivated {
        #[serde(rename = "cacheName")]
        cache_name: String,
    },
}

#[derive(Debug)]
struct ClientSlot {
    url: String,
    controller: Option<String>,
    inbox: VecDeque<ClientMessage>,
}

/// Serializable view of a registered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClientInfo {
    pub id: ClientId,
    pub url: String,
    /// Cache name of the controlling version.
    pub controller: Option<String>,
    pub pending_messages: usize,
}

/// Registered pages, their controller, and their undelivered messages.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    next_id: AtomicU64,
    slots: Mutex<BTreeMap<ClientId, ClientSlot>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open page. New pages start uncontrolled.
    pub async fn register(&self, url: impl Into<String>) -> ClientId {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let slot = ClientSlot { url: url.into(), controller: None, inbox: VecDeque::new() };
        self.slots.lock().await.insert(id, slot);
        id
    }

    /// Make the version named `cache_name` the controller of every page.
    ///
    /// Returns how many pages were claimed.
    pub async fn claim(&self, cache_name: &str) -> usize {
        let mut slots = self.slots.lock().await;
        for slot in slots.values_mut() {
            slot.controller = Some(cache_name.to_string());
        }
        slots.len()
    }

    /// Queue `message` for every page controlled by `cache_name`.
    ///
    /// Returns how many pages received it.
    pub async fn broadcast(&self, cache_name: &str, message: &ClientMessage) -> usize {
        let mut slots = self.slots.lock().await;
        let mut delivered = 0;
        for slot in slots.values_mut() {
            if slot.controller.as_deref() == Some(cache_name) {
                slot.inbox.push_back(message.clone());
                delivered += 1;
            }
        }
        delivered
    }

    /// Take every message queued for `id`.
    pub async fn drain(&self, id: ClientId) -> Result<Vec<ClientMessage>, Error> {
        let mut slots = self.slots.lock().await;
        let slot = slots.get_mut(&id).ok_or_else(|| Error::UnknownClient(id.to_string()))?;
        Ok(slot.inbox.drain(..).collect())
    }

    pub async fn list(&self) -> Vec<ClientInfo> {
        self.slots
            .lock()
            .await
            .iter()
            .map(|(id, slot)| ClientInfo {
                id: *id,
                url: slot.url.clone(),
                controller: slot.controller.clone(),
                pending_messages: slot.inbox.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activated_message_shape() {
        let msg = ClientMessage::SwActivated { cache_name: "app-v4-2024-03-09".into() };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"type": "SW_ACTIVATED", "cacheName": "app-v4-2024-03-09"}));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_controlled_pages() {
        let clients = ClientRegistry::new();
        let a = clients.register("https://app.example.com/").await;
        let msg = ClientMessage::SwActivated { cache_name: "app-v1".into() };

        assert_eq!(clients.broadcast("app-v1", &msg).await, 0);

        assert_eq!(clients.claim("app-v1").await, 1);
        let b = clients.register("https://app.example.com/settings").await;
        assert_eq!(clients.broadcast("app-v1", &msg).await, 1);

        assert_eq!(clients.drain(a).await.unwrap(), vec![msg]);
        assert!(clients.drain(a).await.unwrap().is_empty());
        assert!(clients.drain(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drain_unknown_client() {
        let clients = ClientRegistry::new();
        assert!(matches!(clients.drain(ClientId(42)).await, Err(Error::UnknownClient(_))));
    }

    #[tokio::test]
    async fn test_list_reports_controller() {
        let clients = ClientRegistry::new();
        let id = clients.register("https://app.example.com/").await;
        clients.claim("app-v2").await;

        let listed = clients.list().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].controller.as_deref(), Some("app-v2"));
    }
}
