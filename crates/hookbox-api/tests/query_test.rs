//! Integration tests for the query endpoints.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use bytes::Bytes;
use hookbox_core::{
    storage::BoxFuture, CoreError, ListFilter, MemoryStore, NewRecord, Page, RecordId, RecordStore,
    WebhookRecord,
};
use tower::ServiceExt;

fn test_app(store: Arc<dyn RecordStore>) -> Router {
    let state = hookbox_api::AppState {
        store,
        max_body_bytes: 1024 * 1024,
        capture_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(30),
    };
    hookbox_api::create_router(state)
}

fn delivery(method: &str, pathname: &str, status: u16) -> NewRecord {
    NewRecord {
        method: method.to_string(),
        pathname: pathname.to_string(),
        source_ip: "203.0.113.7".to_string(),
        status_code: status,
        content_type: Some("application/json".to_string()),
        query_params: Some(HashMap::from([("test".to_string(), "true".to_string())])),
        headers: HashMap::from([("user-agent".to_string(), "Stripe/1.0".to_string())]),
        body: Bytes::from_static(b"{\"ok\":true}"),
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response =
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn listing_pages_through_every_record() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..25 {
        store.insert(delivery("POST", &format!("/webhooks/{i}"), 200)).await.unwrap();
    }

    let mut collected = Vec::new();
    let mut uri = "/api/webhooks?limit=10".to_string();
    let mut pages = 0;
    loop {
        let (status, body) = get_json(test_app(store.clone()), &uri).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert!(items.len() <= 10);
        for item in items {
            let id = item["id"].as_str().unwrap().to_string();
            assert!(!collected.contains(&id), "record {id} served twice");
            collected.push(id);
        }
        pages += 1;
        match body["next_cursor"].as_str() {
            Some(cursor) => uri = format!("/api/webhooks?limit=10&cursor={cursor}"),
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(collected.len(), 25);
}

#[tokio::test]
async fn listing_defaults_to_twenty_newest_first() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..25 {
        store.insert(delivery("POST", &format!("/webhooks/{i}"), 200)).await.unwrap();
    }

    let (status, body) = get_json(test_app(store), "/api/webhooks").await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 20);
    assert_eq!(items[0]["pathname"], "/webhooks/24");
    assert!(body["next_cursor"].is_string());
}

#[tokio::test]
async fn summaries_expose_scalars_but_not_the_payload() {
    let store = Arc::new(MemoryStore::new());
    store.insert(delivery("POST", "/webhooks/stripe", 200)).await.unwrap();

    let (_, body) = get_json(test_app(store), "/api/webhooks").await;
    let item = &body["items"][0];
    assert_eq!(item["method"], "POST");
    assert_eq!(item["pathname"], "/webhooks/stripe");
    assert_eq!(item["source_ip"], "203.0.113.7");
    assert_eq!(item["status_code"], 200);
    assert_eq!(item["content_type"], "application/json");
    assert_eq!(item["content_length"], 11);
    assert!(item["created_at"].is_string());
    assert!(item.get("body").is_none());
    assert!(item.get("headers").is_none());
}

#[tokio::test]
async fn bad_list_parameters_are_rejected_with_the_envelope() {
    let store = Arc::new(MemoryStore::new());
    store.insert(delivery("POST", "/webhooks/stripe", 200)).await.unwrap();

    for uri in [
        "/api/webhooks?limit=0",
        "/api/webhooks?limit=-1",
        "/api/webhooks?limit=101",
        "/api/webhooks?limit=abc",
        "/api/webhooks?cursor=%21%21%21",
        "/api/webhooks?status_min=abc",
        "/api/webhooks?created_after=yesterday",
        "/api/webhooks?limit=1&limit=2",
    ] {
        let (status, body) = get_json(test_app(store.clone()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "invalid_request", "{uri}");
        assert!(body["error"]["message"].is_string());
    }
}

#[tokio::test]
async fn filters_narrow_the_listing() {
    let store = Arc::new(MemoryStore::new());
    store.insert(delivery("GET", "/webhooks/stripe", 200)).await.unwrap();
    store.insert(delivery("POST", "/webhooks/github", 404)).await.unwrap();
    store.insert(delivery("POST", "/callbacks/sms", 200)).await.unwrap();

    let (_, by_method) = get_json(test_app(store.clone()), "/api/webhooks?method=GET").await;
    assert_eq!(by_method["items"].as_array().unwrap().len(), 1);
    assert_eq!(by_method["items"][0]["method"], "GET");

    let (_, by_prefix) =
        get_json(test_app(store.clone()), "/api/webhooks?pathname_prefix=%2Fwebhooks%2F").await;
    assert_eq!(by_prefix["items"].as_array().unwrap().len(), 2);

    let (_, by_status) =
        get_json(test_app(store.clone()), "/api/webhooks?status_min=400&status_max=499").await;
    assert_eq!(by_status["items"].as_array().unwrap().len(), 1);
    assert_eq!(by_status["items"][0]["pathname"], "/webhooks/github");

    let (_, in_future) =
        get_json(test_app(store), "/api/webhooks?created_after=2099-01-01T00:00:00Z").await;
    assert!(in_future["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn get_by_id_returns_the_full_record() {
    let store = Arc::new(MemoryStore::new());
    let stored = store.insert(delivery("POST", "/webhooks/stripe", 200)).await.unwrap();

    let (status, body) =
        get_json(test_app(store), &format!("/api/webhooks/{}", stored.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], stored.id.to_string());
    assert_eq!(body["body"], "{\"ok\":true}");
    assert_eq!(body["headers"]["user-agent"], "Stripe/1.0");
    assert_eq!(body["query_params"]["test"], "true");
    assert_eq!(body["content_length"], 11);
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_distinguished() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) =
        get_json(test_app(store.clone()), &format!("/api/webhooks/{}", RecordId::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = get_json(test_app(store), "/api/webhooks/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

/// Store stub whose every operation fails, for the 503 path.
struct FailingStore;

fn down() -> CoreError {
    CoreError::Unavailable("backend down".to_string())
}

impl RecordStore for FailingStore {
    fn insert(&self, _record: NewRecord) -> BoxFuture<'_, Result<WebhookRecord, CoreError>> {
        Box::pin(async { Err(down()) })
    }

    fn list(&self, _filter: ListFilter) -> BoxFuture<'_, Result<Page, CoreError>> {
        Box::pin(async { Err(down()) })
    }

    fn find_by_id(
        &self,
        _id: RecordId,
    ) -> BoxFuture<'_, Result<Option<WebhookRecord>, CoreError>> {
        Box::pin(async { Err(down()) })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, CoreError>> {
        Box::pin(async { Err(down()) })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), CoreError>> {
        Box::pin(async { Err(down()) })
    }
}

#[tokio::test]
async fn storage_failure_maps_to_service_unavailable() {
    let store = Arc::new(FailingStore);

    let (status, body) = get_json(test_app(store.clone()), "/api/webhooks").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "storage_unavailable");
    assert_eq!(body["error"]["message"], "storage unavailable");

    let (status, _) = get_json(test_app(store), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_and_liveness_answer_when_the_store_is_up() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) = get_json(test_app(store.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "up");

    let (status, body) = get_json(test_app(store), "/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
}
