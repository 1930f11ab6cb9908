//! Published documentation views, one per collection.
//!
//! Loads may overlap (a request and the scheduled reload, or two requests).
//! Each load takes a ticket from a global generation counter and only the
//! most recently started load for a collection may publish its result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::docs::DocumentView;

#[derive(Clone, Debug)]
pub struct LoadTicket {
    pub collection: String,
    pub generation: u64,
}

#[derive(Clone, Debug)]
pub struct Published {
    pub generation: u64,
    pub view: Arc<DocumentView>,
    pub raw: Arc<str>,
}

#[derive(Default)]
struct Slot {
    latest_started: u64,
    published: Option<Published>,
}

#[derive(Default)]
pub struct ViewStore {
    generation: AtomicU64,
    slots: RwLock<HashMap<String, Slot>>,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin(&self, collection: &str) -> LoadTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut slots = self.slots.write().await;
        let slot = slots.entry(collection.to_string()).or_default();
        slot.latest_started = slot.latest_started.max(generation);

        LoadTicket {
            collection: collection.to_string(),
            generation,
        }
    }

    /// Replaces the collection's view when `ticket` is still the latest load.
    /// Returns whether the view was published.
    pub async fn publish(
        &self,
        ticket: &LoadTicket,
        view: impl Into<Arc<DocumentView>>,
        raw: impl Into<Arc<str>>,
    ) -> bool {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(ticket.collection.clone()).or_default();

        if slot.latest_started != ticket.generation {
            tracing::info!(
                collection = %ticket.collection,
                generation = ticket.generation,
                latest = slot.latest_started,
                "discarding result of superseded load"
            );
            return false;
        }

        slot.published = Some(Published {
            generation: ticket.generation,
            view: view.into(),
            raw: raw.into(),
        });
        true
    }

    /// Drops the published view after the latest load failed.
    pub async fn discard(&self, ticket: &LoadTicket) {
        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get_mut(&ticket.collection) {
            if slot.latest_started == ticket.generation {
                slot.published = None;
            }
        }
    }

    pub async fn get(&self, collection: &str) -> Option<Published> {
        self.slots
            .read()
            .await
            .get(collection)
            .and_then(|slot| slot.published.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::{DEFAULT_BASE_URL, STATUS_ACTIVE};

    fn view(version: &str) -> DocumentView {
        DocumentView {
            id: "billing".to_string(),
            name: "Billing".to_string(),
            version: version.to_string(),
            status: STATUS_ACTIVE,
            description: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: vec![],
        }
    }

    #[tokio::test]
    async fn latest_load_publishes() {
        let store = ViewStore::new();
        let ticket = store.begin("billing").await;

        assert!(store.publish(&ticket, view("1"), "paths: {}".to_string()).await);

        let published = store.get("billing").await.unwrap();
        assert_eq!(published.generation, ticket.generation);
        assert_eq!(published.view.version, "1");
        assert_eq!(&*published.raw, "paths: {}");
    }

    #[tokio::test]
    async fn superseded_load_is_discarded_even_if_it_finishes_last() {
        let store = ViewStore::new();
        let first = store.begin("billing").await;
        let second = store.begin("billing").await;

        assert!(store.publish(&second, view("2"), String::new()).await);
        assert!(!store.publish(&first, view("1"), String::new()).await);

        assert_eq!(store.get("billing").await.unwrap().view.version, "2");
    }

    #[tokio::test]
    async fn generations_are_independent_per_collection() {
        let store = ViewStore::new();
        let billing = store.begin("billing").await;
        let users = store.begin("users").await;

        assert!(store.publish(&billing, view("1"), String::new()).await);
        assert!(store.publish(&users, view("1"), String::new()).await);
    }

    #[tokio::test]
    async fn failed_latest_load_clears_view() {
        let store = ViewStore::new();
        let ok = store.begin("billing").await;
        store.publish(&ok, view("1"), String::new()).await;

        let failed = store.begin("billing").await;
        store.discard(&failed).await;

        assert!(store.get("billing").await.is_none());
    }

    #[tokio::test]
    async fn failed_stale_load_keeps_view() {
        let store = ViewStore::new();
        let stale = store.begin("billing").await;
        let fresh = store.begin("billing").await;
        store.publish(&fresh, view("2"), String::new()).await;

        store.discard(&stale).await;

        assert_eq!(store.get("billing").await.unwrap().view.version, "2");
    }
}
