//! Integration tests for the Shelf HTTP client

mod common;

use common::harness;
use serde_json::json;
use shelf_core::{MediaFilter, MediaType, SortOrder, UserPatch};
use shelf_http::{ClientError, ShelfClient};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json() -> serde_json::Value {
    json!({
        "_id": "u1",
        "name": "Ada",
        "email": "ada@example.com",
        "role": "user",
        "favorites": ["m1"]
    })
}

#[tokio::test]
async fn test_client_builder() {
    let client = ShelfClient::builder()
        .base_url("http://localhost:5000/api")
        .build();

    assert!(client.is_ok());
    assert_eq!(client.unwrap().base_url(), "http://localhost:5000/api");
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = ShelfClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), Some(("abc", "r1")));

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let user = h.client.me().await.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.favorites, vec!["m1".to_string()]);
    server.verify().await;
}

#[tokio::test]
async fn test_profile_accepts_wrapped_user() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), Some(("abc", "r1")));

    Mock::given(method("PUT"))
        .and(path("/users/me"))
        .and(body_json(json!({ "name": "Ada L." })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user_json() })))
        .mount(&server)
        .await;

    let patch = UserPatch {
        name: Some("Ada L.".into()),
        ..Default::default()
    };
    let user = h.client.update_profile(&patch).await.unwrap();
    assert_eq!(user.email, "ada@example.com");
}

#[tokio::test]
async fn test_list_media_sends_filter_as_query() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), None);

    Mock::given(method("GET"))
        .and(path("/media"))
        .and(query_param("type", "film"))
        .and(query_param("search", "dune"))
        .and(query_param("sort", "year"))
        .and(query_param("order", "desc"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "_id": "m9",
                "title": "Dune",
                "type": "film",
                "creator": "Denis Villeneuve",
                "availableCopies": 0,
                "totalCopies": 1
            }],
            "pagination": { "page": 2, "limit": 12, "total": 13, "pages": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filter = MediaFilter::default()
        .media_type(MediaType::Film)
        .search("  dune ")
        .sort("year", SortOrder::Desc)
        .page(2);
    let page = h.client.list_media(&filter).await.unwrap();

    assert_eq!(page.data.len(), 1);
    assert!(!page.data[0].is_available());
    assert!(page.pagination.has_prev());
    assert!(!page.pagination.has_next());
    server.verify().await;
}

#[tokio::test]
async fn test_toggle_favorite_returns_server_list() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), Some(("abc", "r1")));

    Mock::given(method("POST"))
        .and(path("/users/favorites/toggle"))
        .and(body_json(json!({ "mediaId": "m2" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "favorites": ["m1", "m2"] })),
        )
        .mount(&server)
        .await;

    let favorites = h.client.toggle_favorite("m2").await.unwrap();
    assert_eq!(favorites, vec!["m1".to_string(), "m2".to_string()]);
}

#[tokio::test]
async fn test_borrow_sends_media_id() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), Some(("abc", "r1")));

    Mock::given(method("POST"))
        .and(path("/borrow"))
        .and(body_json(json!({ "mediaId": "m1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "b1",
            "mediaId": "m1",
            "userId": "u1",
            "borrowedAt": "2024-03-01T10:00:00Z",
            "dueDate": "2024-03-15T10:00:00Z",
            "status": "active"
        })))
        .mount(&server)
        .await;

    let record = h.client.borrow_media("m1").await.unwrap();
    assert_eq!(record.id, "b1");
    assert!(record.returned_at.is_none());
}

#[tokio::test]
async fn test_not_found_and_server_errors_are_notified() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), Some(("abc", "r1")));

    Mock::given(method("GET"))
        .and(path("/media/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "No such item" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/genres"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = h.client.get_media("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));

    let err = h.client.genres().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.server_message(), Some("maintenance"));

    assert_eq!(
        h.events.errors(),
        vec![
            "The requested resource was not found.".to_string(),
            "Server error. Please try again later.".to_string(),
        ]
    );
    assert_eq!(h.events.redirects(), 0);
}

#[tokio::test]
async fn test_validation_errors_are_left_to_the_caller() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), None);

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Email already in use" })),
        )
        .mount(&server)
        .await;

    let request = shelf_http::types::RegisterRequest {
        name: "Ada".into(),
        email: "ada@example.com".into(),
        password: "secret123".into(),
    };
    let err = h.client.register(&request).await.unwrap_err();

    assert!(matches!(err, ClientError::BadRequest(_)));
    assert_eq!(err.server_message(), Some("Email already in use"));
    assert!(h.events.notifications().is_empty());
}

#[tokio::test]
async fn test_logout_tolerates_empty_body() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), Some(("abc", "r1")));

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = h.client.logout("r1").await.unwrap();
    assert!(response.message.is_none());
    server.verify().await;
}
