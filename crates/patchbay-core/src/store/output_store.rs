// ── Backend-synchronized output store ──
//
// Canonical list of outputs for one session. The backend is the source of
// truth: the list only changes after the backend answers (load, create,
// delete) or announces a change on the event socket.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use patchbay_api::AudioClient;
use patchbay_api::socket::BackendEvent;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::collection::OutputList;
use crate::error::CoreError;
use crate::model::{Output, OutputId};
use crate::stream::{OutputSnapshot, OutputStream};
use crate::workflow::OutputRequest;

/// Event announcing new outputs (single object or array).
pub const EVENT_OUTPUT_CREATE: &str = "output_create";
/// Event announcing a deleted output (`{"id": ...}` or a bare id).
pub const EVENT_OUTPUT_REMOVE: &str = "output_remove";

pub struct OutputStore {
    client: AudioClient,
    list: OutputList,
    last_load: watch::Sender<Option<DateTime<Utc>>>,
    last_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl OutputStore {
    pub fn new(client: AudioClient) -> Self {
        let (last_load, _) = watch::channel(None);
        let (last_event, _) = watch::channel(None);
        Self {
            client,
            list: OutputList::new(),
            last_load,
            last_event,
        }
    }

    pub fn client(&self) -> &AudioClient {
        &self.client
    }

    // ── Backend operations ───────────────────────────────────────────

    /// Fetch the full collection and replace the list in server order.
    ///
    /// On failure the list is left untouched.
    pub async fn load(&self) -> Result<usize, CoreError> {
        let raw = self.client.list_outputs().await?;
        let outputs: Vec<Output> = raw.into_iter().map(Output::from_raw).collect();
        let count = outputs.len();

        self.list.replace_all(outputs);
        self.last_load.send_replace(Some(Utc::now()));
        debug!(outputs = count, "output list loaded");
        Ok(count)
    }

    /// Submit one creation payload and append whatever the backend returns.
    pub async fn create(&self, request: &OutputRequest) -> Result<Vec<Arc<Output>>, CoreError> {
        let raw = self.client.create_output(&request.to_payload()).await?;
        let created: Vec<Output> = raw.into_iter().map(Output::from_raw).collect();
        debug!(created = created.len(), kind = request.kind(), "outputs created");
        Ok(self.list.merge(created))
    }

    /// Delete `output` on the backend, then drop that exact entry locally,
    /// or whichever entry has since taken over its id.
    ///
    /// Returns `Ok(false)` if nothing with that id was left in the list by
    /// the time the backend confirmed.
    pub async fn remove(&self, output: &Arc<Output>) -> Result<bool, CoreError> {
        let id = output.id().ok_or_else(|| CoreError::Validation {
            message: format!("output '{}' has no id and cannot be deleted", output.label()),
        })?;

        self.client.delete_output(id.as_str()).await?;
        // A later merge may have swapped in a newer entry for the same id;
        // the backend has dropped that id either way.
        let removed = self.list.remove_ptr(output) || self.list.remove_by_id(id).is_some();
        debug!(%id, removed, "output deleted");
        Ok(removed)
    }

    // ── Local mutations ──────────────────────────────────────────────

    /// Insert already-normalized outputs (e.g. a workflow result).
    ///
    /// An id already in the list is replaced in place, never duplicated.
    pub fn merge(&self, outputs: Vec<Output>) -> Vec<Arc<Output>> {
        self.list.merge(outputs)
    }

    /// Drop an entry the backend reported as gone. No backend call.
    pub fn remove_by_id(&self, id: &OutputId) -> Option<Arc<Output>> {
        self.list.remove_by_id(id)
    }

    /// Apply a backend event. Returns `true` if the list changed.
    ///
    /// Events the store does not track are ignored.
    pub fn apply_event(&self, event: &BackendEvent) -> bool {
        let changed = match event.name.as_str() {
            EVENT_OUTPUT_CREATE => {
                let outputs = outputs_from_payload(&event.payload);
                if outputs.is_empty() {
                    warn!(payload = %event.payload, "ignoring malformed output_create event");
                    false
                } else {
                    !self.list.merge(outputs).is_empty()
                }
            }
            EVENT_OUTPUT_REMOVE => match id_from_payload(&event.payload) {
                Some(id) => self.list.remove_by_id(&id).is_some(),
                None => {
                    warn!(payload = %event.payload, "ignoring malformed output_remove event");
                    false
                }
            },
            _ => return false,
        };

        self.last_event.send_replace(Some(Utc::now()));
        changed
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> OutputSnapshot {
        self.list.snapshot()
    }

    pub fn subscribe(&self) -> OutputStream {
        OutputStream::new(self.list.subscribe())
    }

    pub fn get(&self, id: &OutputId) -> Option<Arc<Output>> {
        self.list.get(id)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When the list was last replaced by [`load`](Self::load).
    pub fn last_load(&self) -> Option<DateTime<Utc>> {
        *self.last_load.borrow()
    }

    /// When the last tracked backend event arrived.
    pub fn last_event(&self) -> Option<DateTime<Utc>> {
        *self.last_event.borrow()
    }
}

fn outputs_from_payload(payload: &Value) -> Vec<Output> {
    let items: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .map(Output::from_raw)
        .collect()
}

fn id_from_payload(payload: &Value) -> Option<OutputId> {
    let id = match payload {
        Value::Object(map) => map.get("id")?,
        other => other,
    };
    match id {
        Value::String(s) => Some(OutputId::new(s.as_str())),
        Value::Number(n) => Some(OutputId::new(n.to_string())),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> OutputStore {
        let client =
            AudioClient::from_reqwest("http://127.0.0.1:9", reqwest::Client::new()).unwrap();
        OutputStore::new(client)
    }

    fn event(name: &str, payload: Value) -> BackendEvent {
        BackendEvent {
            name: name.into(),
            payload,
        }
    }

    #[test]
    fn create_event_merges_single_and_array_payloads() {
        let store = store();
        assert!(store.apply_event(&event(
            EVENT_OUTPUT_CREATE,
            json!({ "type": "device", "id": "o-1", "name": "hw:0" }),
        )));
        assert!(store.apply_event(&event(
            EVENT_OUTPUT_CREATE,
            json!([
                { "type": "multiplex", "id": "o-2", "parent_id": "o-1", "channels": "0" },
                { "type": "multiplex", "id": "o-3", "parent_id": "o-1", "channels": "1" }
            ]),
        )));
        assert_eq!(store.len(), 3);
        assert!(store.last_event().is_some());
        assert!(store.last_load().is_none());
    }

    #[test]
    fn replayed_create_event_keeps_ids_unique() {
        let store = store();
        let created = event(EVENT_OUTPUT_CREATE, json!({ "type": "device", "id": "o-1" }));
        store.apply_event(&created);
        store.apply_event(&created);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_event_accepts_object_or_bare_id() {
        let store = store();
        store.merge(vec![
            Output::from_raw(json!({ "id": "o-1" }).as_object().cloned().unwrap()),
            Output::from_raw(json!({ "id": 2 }).as_object().cloned().unwrap()),
        ]);

        assert!(store.apply_event(&event(EVENT_OUTPUT_REMOVE, json!({ "id": "o-1" }))));
        assert!(store.apply_event(&event(EVENT_OUTPUT_REMOVE, json!(2))));
        assert!(!store.apply_event(&event(EVENT_OUTPUT_REMOVE, json!({ "id": "o-1" }))));
        assert!(store.is_empty());
    }

    #[test]
    fn unrelated_and_malformed_events_are_ignored() {
        let store = store();
        assert!(!store.apply_event(&event("mixer_create", json!({ "id": "m-1" }))));
        assert!(store.last_event().is_none());

        assert!(!store.apply_event(&event(EVENT_OUTPUT_CREATE, json!("nonsense"))));
        assert!(!store.apply_event(&event(EVENT_OUTPUT_REMOVE, json!([]))));
        assert!(store.is_empty());
    }
}
