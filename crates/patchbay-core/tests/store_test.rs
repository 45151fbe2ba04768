#![allow(clippy::unwrap_used)]
// Integration tests for `OutputStore` against a wiremock backend.

use std::sync::Arc;

use patchbay_api::AudioClient;
use patchbay_core::{
    BackendEvent, CoreError, FailureKind, OutputId, OutputRequest, OutputStore,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, OutputStore) {
    let server = MockServer::start().await;
    let client = AudioClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, OutputStore::new(client))
}

async fn mount_list(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/audio/output"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn ids(store: &OutputStore) -> Vec<String> {
    store
        .snapshot()
        .iter()
        .map(|o| o.id().map(ToString::to_string).unwrap_or_default())
        .collect()
}

// ── load ────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_keeps_server_order_and_count() {
    let (server, store) = setup().await;
    mount_list(
        &server,
        json!([
            { "type": "device", "id": "o-3", "display_name": "C", "name": "hw:2" },
            { "type": "device", "id": "o-1", "display_name": "A", "name": "hw:0" },
            { "type": "icecast", "id": "o-2", "endpoint": "http://radio/live" }
        ]),
    )
    .await;

    assert_eq!(store.load().await.unwrap(), 3);
    assert_eq!(ids(&store), ["o-3", "o-1", "o-2"]);
    assert!(store.last_load().is_some());
}

#[tokio::test]
async fn load_replaces_previous_list() {
    let (server, store) = setup().await;
    store.merge(vec![
        serde_json::from_value(json!({ "type": "device", "id": "stale" })).unwrap(),
    ]);
    mount_list(&server, json!([{ "type": "device", "id": "fresh" }])).await;

    store.load().await.unwrap();
    assert_eq!(ids(&store), ["fresh"]);
}

#[tokio::test]
async fn failed_load_leaves_list_untouched() {
    let (server, store) = setup().await;
    store.merge(vec![
        serde_json::from_value(json!({ "type": "device", "id": "o-1" })).unwrap(),
    ]);

    Mock::given(method("GET"))
        .and(path("/audio/output"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    let err = store.load().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Rejected);
    assert_eq!(ids(&store), ["o-1"]);
    assert!(store.last_load().is_none());
}

#[tokio::test]
async fn malformed_list_is_a_malformed_error() {
    let (server, store) = setup().await;
    mount_list(&server, json!({ "outputs": [] })).await;

    let err = store.load().await.unwrap_err();
    assert!(matches!(err, CoreError::Malformed { .. }), "got {err:?}");
}

// ── create ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_device_appends_normalized_output() {
    let (server, store) = setup().await;
    mount_list(&server, json!([{ "type": "device", "id": "o-1", "name": "hw:0" }])).await;
    store.load().await.unwrap();

    Mock::given(method("POST"))
        .and(path("/audio/output"))
        .and(body_json(json!({
            "type": "device", "display_name": "Speakers", "name": "Speakers"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "type": "device", "id": "o-7", "display_name": "Speakers", "name": "Speakers" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let created = store
        .create(&OutputRequest::Device {
            name: "Speakers".into(),
        })
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id(), Some(&OutputId::new("o-7")));
    assert_eq!(created[0].parameters().len(), 1);
    assert_eq!(created[0].parameters()["name"], json!("Speakers"));
    assert_eq!(ids(&store), ["o-1", "o-7"]);
}

#[tokio::test]
async fn create_appends_every_returned_output_in_order() {
    let (server, store) = setup().await;
    mount_list(&server, json!([{ "type": "device", "id": "o-1" }])).await;
    store.load().await.unwrap();
    let before = store.snapshot()[0].clone();

    Mock::given(method("POST"))
        .and(path("/audio/output"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "type": "multiplex", "id": "m-b", "parent_id": "o-1", "channels": "1" },
            { "type": "multiplex", "id": "m-a", "parent_id": "o-1", "channels": "0" }
        ])))
        .mount(&server)
        .await;

    let created = store
        .create(&OutputRequest::Multiplex {
            parent_id: "o-1".into(),
            channels: "0,1".into(),
            display_name: None,
        })
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(ids(&store), ["o-1", "m-b", "m-a"]);
    assert!(Arc::ptr_eq(&store.snapshot()[0], &before));
}

#[tokio::test]
async fn create_with_empty_response_changes_nothing() {
    let (server, store) = setup().await;
    Mock::given(method("POST"))
        .and(path("/audio/output"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let created = store
        .create(&OutputRequest::Device { name: "x".into() })
        .await
        .unwrap();
    assert!(created.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn rejected_create_reports_backend_message() {
    let (server, store) = setup().await;
    Mock::given(method("POST"))
        .and(path("/audio/output"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "No such device" })),
        )
        .mount(&server)
        .await;

    let err = store
        .create(&OutputRequest::Device { name: "ghost".into() })
        .await
        .unwrap_err();
    assert!(
        matches!(&err, CoreError::Rejected { status: 400, message } if message == "No such device"),
        "got {err:?}"
    );
    assert!(store.is_empty());
}

// ── remove ──────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_deletes_by_id_then_drops_the_entry() {
    let (server, store) = setup().await;
    mount_list(
        &server,
        json!([{ "type": "device", "id": "o-1" }, { "type": "device", "id": "o-2" }]),
    )
    .await;
    store.load().await.unwrap();

    Mock::given(method("DELETE"))
        .and(path("/audio/output/o-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(2)
        .mount(&server)
        .await;

    let target = store.get(&OutputId::new("o-1")).unwrap();
    assert!(store.remove(&target).await.unwrap());
    assert_eq!(ids(&store), ["o-2"]);
    assert!(!store.snapshot().iter().any(|o| Arc::ptr_eq(o, &target)));

    // Second removal: backend still confirms, local list is unchanged.
    assert!(!store.remove(&target).await.unwrap());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn create_echoed_by_event_can_still_be_removed() {
    let (server, store) = setup().await;
    let created_body = json!({
        "type": "device", "id": "o-7", "display_name": "Speakers", "name": "Speakers"
    });
    Mock::given(method("POST"))
        .and(path("/audio/output"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([created_body.clone()])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/audio/output/o-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let created = store
        .create(&OutputRequest::Device {
            name: "Speakers".into(),
        })
        .await
        .unwrap();
    store.apply_event(&BackendEvent {
        name: "output_create".into(),
        payload: created_body,
    });
    assert_eq!(ids(&store), ["o-7"]);
    assert!(Arc::ptr_eq(&store.snapshot()[0], &created[0]));

    assert!(store.remove(&created[0]).await.unwrap());
    assert!(store.is_empty());
}

#[tokio::test]
async fn remove_drops_an_entry_replaced_since_it_was_fetched() {
    let (server, store) = setup().await;
    mount_list(
        &server,
        json!([{ "type": "device", "id": "o-1", "display_name": "Old" }]),
    )
    .await;
    store.load().await.unwrap();
    Mock::given(method("DELETE"))
        .and(path("/audio/output/o-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let held = store.snapshot()[0].clone();
    store.apply_event(&BackendEvent {
        name: "output_create".into(),
        payload: json!({ "type": "device", "id": "o-1", "display_name": "New" }),
    });
    assert_eq!(store.len(), 1);

    assert!(store.remove(&held).await.unwrap());
    assert!(store.is_empty());
}

#[tokio::test]
async fn failed_remove_keeps_the_entry() {
    let (server, store) = setup().await;
    mount_list(&server, json!([{ "type": "device", "id": "o-1" }])).await;
    store.load().await.unwrap();

    Mock::given(method("DELETE"))
        .and(path("/audio/output/o-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let target = store.snapshot()[0].clone();
    let err = store.remove(&target).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Rejected);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn remove_without_id_is_rejected_locally() {
    let (server, store) = setup().await;
    mount_list(&server, json!([{ "type": "device", "name": "hw:0" }])).await;
    store.load().await.unwrap();

    let anon = store.snapshot()[0].clone();
    let err = store.remove(&anon).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "got {err:?}");
    assert_eq!(err.kind(), FailureKind::Client);
    assert_eq!(store.len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// ── subscriptions ───────────────────────────────────────────────────

#[tokio::test]
async fn subscribers_see_each_mutation() {
    let (server, store) = setup().await;
    mount_list(&server, json!([{ "type": "device", "id": "o-1" }])).await;

    let mut stream = store.subscribe();
    assert!(stream.current().is_empty());

    store.load().await.unwrap();
    let snap = stream.changed().await.unwrap();
    assert_eq!(snap.len(), 1);

    store.remove_by_id(&OutputId::new("o-1"));
    let snap = stream.changed().await.unwrap();
    assert!(snap.is_empty());
}

// ── failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn slow_backend_is_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio/output"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(100))
        .build()
        .unwrap();
    let store = OutputStore::new(AudioClient::from_reqwest(&server.uri(), http).unwrap());

    let err = store.load().await.unwrap_err();
    assert!(matches!(err, CoreError::Timeout { .. }), "got {err:?}");
    assert_eq!(err.kind(), FailureKind::Transport);
}
