//! Shared fixtures for client integration tests

#![allow(dead_code)]

use shelf_http::{
    KeyValueStore, MemoryStorage, Notification, NotificationLevel, SessionEvents, ShelfClient,
    StorageError, TokenPair, TokenStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records everything the client asks the UI to do
#[derive(Default)]
pub struct RecordingEvents {
    notifications: Mutex<Vec<Notification>>,
    redirects: AtomicUsize,
}

impl RecordingEvents {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .map(|n| n.message)
            .collect()
    }

    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl SessionEvents for RecordingEvents {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory storage that counts bulk removals (session clears)
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    clears: AtomicUsize,
}

impl CountingStorage {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for CountingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_many(keys)
    }
}

pub struct Harness {
    pub client: ShelfClient,
    pub events: Arc<RecordingEvents>,
    pub storage: Arc<CountingStorage>,
}

impl Harness {
    pub fn tokens(&self) -> &TokenStore {
        self.client.tokens()
    }
}

/// Client against `base_url` with optional stored tokens
pub fn harness(base_url: &str, tokens: Option<(&str, &str)>) -> Harness {
    let storage = Arc::new(CountingStorage::default());
    let events = Arc::new(RecordingEvents::default());
    let store = TokenStore::new(storage.clone());
    if let Some((access, refresh)) = tokens {
        store.store_tokens(&TokenPair::new(access, refresh)).unwrap();
    }

    let client = ShelfClient::builder()
        .base_url(base_url)
        .tokens(store)
        .events(events.clone())
        .build()
        .unwrap();

    Harness {
        client,
        events,
        storage,
    }
}
