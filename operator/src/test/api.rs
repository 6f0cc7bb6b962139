use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::api::{router, AppState};
use crate::queue::InMemoryQueue;
use crate::store::InMemoryStore;

use super::util::test_crd;

fn test_state() -> AppState {
    let store = Arc::new(InMemoryStore::new());
    let (queue, receiver) = InMemoryQueue::new();
    // Keep the receiver half alive for the state's lifetime so `send`
    // on the API's create/delete paths never hits a closed channel.
    std::mem::forget(receiver);
    AppState {
        store,
        queue: Arc::new(queue),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn create_then_get_returns_the_created_instance() {
    let state = test_state();
    state.store.put_crd(test_crd("ferrite.io", "v1", "Widget", "widgets")).await.unwrap();
    let app = router(state);

    let create = app
        .clone()
        .oneshot(json_request("POST", "/apis/ferrite.io/v1/widgets", json!({"metadata": {"name": "a"}, "spec": {"color": "red"}})))
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);

    let get = app.oneshot(get_request("/apis/ferrite.io/v1/widgets/a")).await.unwrap();
    assert_eq!(get.status(), StatusCode::OK);
    let body = body_json(get).await;
    assert_eq!(body["spec"]["color"], "red");
    assert_eq!(body["status"]["state"], "Pending");
}

#[tokio::test]
async fn get_missing_resource_returns_404() {
    let state = test_state();
    state.store.put_crd(test_crd("ferrite.io", "v1", "Widget", "widgets")).await.unwrap();
    let app = router(state);

    let response = app.oneshot(get_request("/apis/ferrite.io/v1/widgets/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_shallow_merges_into_the_stored_spec() {
    let state = test_state();
    state.store.put_crd(test_crd("ferrite.io", "v1", "Widget", "widgets")).await.unwrap();
    let app = router(state);

    app.clone()
        .oneshot(json_request(
            "POST",
            "/apis/ferrite.io/v1/widgets",
            json!({"metadata": {"name": "a"}, "spec": {"color": "red", "size": 3}}),
        ))
        .await
        .unwrap();

    let patch = app
        .clone()
        .oneshot(json_request("PATCH", "/apis/ferrite.io/v1/widgets/a", json!({"spec": {"color": "blue"}})))
        .await
        .unwrap();
    assert_eq!(patch.status(), StatusCode::OK);

    let get = app.oneshot(get_request("/apis/ferrite.io/v1/widgets/a")).await.unwrap();
    let body = body_json(get).await;
    assert_eq!(body["spec"], json!({"color": "blue", "size": 3}));
}

#[tokio::test]
async fn delete_missing_resource_returns_404() {
    let state = test_state();
    state.store.put_crd(test_crd("ferrite.io", "v1", "Widget", "widgets")).await.unwrap();
    let app = router(state);

    let response = app
        .oneshot(Request::builder().method("DELETE").uri("/apis/ferrite.io/v1/widgets/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_renders_as_a_table_when_requested() {
    let state = test_state();
    state.store.put_crd(test_crd("ferrite.io", "v1", "Widget", "widgets")).await.unwrap();
    let app = router(state);

    app.clone()
        .oneshot(json_request("POST", "/apis/ferrite.io/v1/widgets", json!({"metadata": {"name": "a"}, "spec": {}})))
        .await
        .unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/apis/ferrite.io/v1/widgets")
        .header("accept", "application/json;as=Table")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "Table");
    assert_eq!(body["rows"][0]["cells"][0], "a");
}

#[tokio::test]
async fn registering_a_crd_makes_its_group_discoverable() {
    let state = test_state();
    let app = router(state);

    let create = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/apis/apiextensions.ferrite.io/v1/customresourcedefinitions",
            json!({"group": "ferrite.io", "version": "v1", "kind": "Widget", "plural": "widgets"}),
        ))
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);

    let groups = app.oneshot(get_request("/apis")).await.unwrap();
    let body = body_json(groups).await;
    assert!(body["groups"].as_array().unwrap().iter().any(|g| g == "ferrite.io"));
}
