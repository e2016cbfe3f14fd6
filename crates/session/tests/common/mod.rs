//! Shared fixtures for session tests

#![allow(dead_code)]

use serde_json::{Value, json};
use shelf_http::{
    Notification, NotificationLevel, SessionEvents, ShelfClient, TokenPair, TokenStore,
};
use shelf_session::SessionContext;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
pub struct RecordingEvents {
    notifications: Mutex<Vec<Notification>>,
    redirects: AtomicUsize,
}

impl RecordingEvents {
    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.message.clone())
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

pub fn user_json(id: &str, name: &str, favorites: &[&str]) -> Value {
    json!({
        "_id": id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "role": "user",
        "favorites": favorites,
    })
}

/// Session over `store` whose events go to `events`
pub fn session_with(
    server: &MockServer,
    store: TokenStore,
    events: Arc<dyn SessionEvents>,
) -> SessionContext {
    SessionContext::new(
        ShelfClient::builder().base_url(server.uri()).tokens(store),
        events,
    )
    .unwrap()
}

pub fn session(server: &MockServer) -> (SessionContext, Arc<RecordingEvents>) {
    let events = Arc::new(RecordingEvents::default());
    let session = session_with(server, TokenStore::in_memory(), events.clone());
    (session, events)
}

pub async fn mount_login(server: &MockServer, email: &str, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(wiremock::matchers::body_partial_json(json!({ "email": email })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": access, "refreshToken": refresh })),
        )
        .mount(server)
        .await;
}

pub async fn mount_me(server: &MockServer, access: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Token store that already holds a session for `user`
pub fn stored_session(access: &str, refresh: &str, user: &Value) -> TokenStore {
    let store = TokenStore::in_memory();
    store.store_tokens(&TokenPair::new(access, refresh)).unwrap();
    store
        .store_user(&serde_json::from_value(user.clone()).unwrap())
        .unwrap();
    store
}
