// ── Output creation workflow ──
//
// A short-lived, variant-dispatched process: open it to fetch candidate
// devices and freeze the current output list, submit exactly one
// selection, and hand the created outputs back to the caller. The
// workflow never touches the store's list; merging is the caller's call.

mod request;

use std::sync::Arc;

use patchbay_api::AudioClient;
use secrecy::SecretString;
use tracing::{debug, info};

pub use request::{MULTIPLEX_FALLBACK_NAME, OutputRequest};

use crate::error::CoreError;
use crate::model::{Output, OutputId};
use crate::store::OutputStore;
use crate::stream::OutputSnapshot;

/// What the user picked in the creation dialog.
#[derive(Debug, Clone)]
pub enum OutputSelection {
    Device {
        name: String,
    },
    Multiplex {
        parent_id: OutputId,
        channels: String,
    },
    Icecast {
        endpoint: String,
        password: SecretString,
    },
}

/// Result of a closed workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// Outputs the backend created, in response order. May be empty.
    Created(Vec<Output>),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowState {
    Open,
    Submitting,
    Closed,
}

pub struct NewOutputWorkflow {
    client: AudioClient,
    devices: Vec<String>,
    snapshot: OutputSnapshot,
    state: WorkflowState,
}

impl NewOutputWorkflow {
    /// Fetch candidate devices and snapshot the store's current list.
    pub async fn open(client: AudioClient, store: &OutputStore) -> Result<Self, CoreError> {
        let devices = client.list_output_devices().await?;
        let snapshot = store.snapshot();
        debug!(
            devices = devices.len(),
            outputs = snapshot.len(),
            "output workflow opened"
        );

        Ok(Self {
            client,
            devices,
            snapshot,
            state: WorkflowState::Open,
        })
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Device names the backend can open.
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    /// Outputs eligible as a multiplex parent (devices in the snapshot).
    pub fn parents(&self) -> Vec<Arc<Output>> {
        self.snapshot
            .iter()
            .filter(|o| o.is_device())
            .cloned()
            .collect()
    }

    /// The list as it was when the workflow opened.
    pub fn snapshot(&self) -> &OutputSnapshot {
        &self.snapshot
    }

    /// Translate a selection into the payload that [`submit`](Self::submit)
    /// would send.
    pub fn request_for(&self, selection: OutputSelection) -> OutputRequest {
        match selection {
            OutputSelection::Device { name } => OutputRequest::Device { name },
            OutputSelection::Multiplex {
                parent_id,
                channels,
            } => {
                let display_name = self
                    .snapshot
                    .iter()
                    .find(|o| o.id() == Some(&parent_id))
                    .and_then(|o| o.display_name())
                    .map(str::to_owned);
                OutputRequest::Multiplex {
                    parent_id: parent_id.to_string(),
                    channels,
                    display_name,
                }
            }
            OutputSelection::Icecast { endpoint, password } => {
                OutputRequest::Icecast { endpoint, password }
            }
        }
    }

    /// Send exactly one creation request.
    ///
    /// On success the workflow closes and returns the created outputs. On
    /// failure it stays open so the caller can retry or cancel.
    pub async fn submit(&mut self, selection: OutputSelection) -> Result<WorkflowOutcome, CoreError> {
        self.ensure_open()?;
        let request = self.request_for(selection);

        self.state = WorkflowState::Submitting;
        let result = self.client.create_output(&request.to_payload()).await;

        match result {
            Ok(raw) => {
                self.state = WorkflowState::Closed;
                let created: Vec<Output> = raw.into_iter().map(Output::from_raw).collect();
                info!(kind = request.kind(), created = created.len(), "outputs created");
                Ok(WorkflowOutcome::Created(created))
            }
            Err(e) => {
                self.state = WorkflowState::Open;
                Err(e.into())
            }
        }
    }

    /// Close without contacting the backend.
    pub fn cancel(&mut self) -> Result<WorkflowOutcome, CoreError> {
        self.ensure_open()?;
        self.state = WorkflowState::Closed;
        debug!("output workflow cancelled");
        Ok(WorkflowOutcome::Cancelled)
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        match self.state {
            WorkflowState::Closed => Err(CoreError::WorkflowClosed),
            // A dropped submit future leaves `Submitting` behind; nothing was
            // applied, so the workflow is still usable.
            WorkflowState::Open | WorkflowState::Submitting => Ok(()),
        }
    }
}
