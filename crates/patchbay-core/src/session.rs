// ── Session ──
//
// Lifecycle for one backend: builds the HTTP client, loads the output
// store, and optionally keeps it current from the Socket.IO event channel.

use std::sync::Arc;

use patchbay_api::socket::{BackendEvent, EventSocket, socket_url};
use patchbay_api::{AudioClient, CreateMixerRequest, MixerChannelUpdate};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::model::{Mixer, Output, OutputId};
use crate::store::OutputStore;
use crate::stream::{OutputSnapshot, OutputStream};
use crate::workflow::{NewOutputWorkflow, OutputRequest};

const EVENT_CHANNEL_SIZE: usize = 256;

/// The main entry point for consumers.
///
/// Cheaply cloneable. Owns the REST client, the output store and the
/// background event listener.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    client: AudioClient,
    store: Arc<OutputStore>,
    event_tx: broadcast::Sender<Arc<BackendEvent>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Build the client. Does not contact the backend.
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let client = AudioClient::new(config.base_url.clone(), &config.transport())?;
        Ok(Self::with_client(config, client))
    }

    /// Build a session around an existing client.
    pub fn with_client(config: SessionConfig, client: AudioClient) -> Self {
        let store = Arc::new(OutputStore::new(client.clone()));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(SessionInner {
                config,
                client,
                store,
                event_tx,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &AudioClient {
        &self.inner.client
    }

    pub fn store(&self) -> &Arc<OutputStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load the output list and, if enabled, start the event listener.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let count = self.inner.store.load().await?;
        if self.inner.config.events_enabled {
            self.start_events().await?;
        }
        info!(outputs = count, url = %self.inner.config.base_url, "session connected");
        Ok(())
    }

    /// Spawn the Socket.IO listener. Calling it twice is a no-op.
    pub async fn start_events(&self) -> Result<(), CoreError> {
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            return Ok(());
        }

        let url = socket_url(self.inner.client.base_url())?;
        let socket = EventSocket::connect(
            url,
            self.inner.config.reconnect.clone(),
            self.inner.cancel.child_token(),
        );

        handles.push(tokio::spawn(event_task(
            Arc::clone(&self.inner.store),
            socket,
            self.inner.event_tx.clone(),
            self.inner.cancel.clone(),
        )));
        debug!("event listener started");
        Ok(())
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("session disconnected");
    }

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Forces the event listener off since a single request/response
    /// cycle never needs it.
    pub async fn oneshot<F, Fut, T>(config: SessionConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.events_enabled = false;

        let session = Session::new(cfg)?;
        session.connect().await?;
        let result = f(session.clone()).await;
        session.disconnect().await;
        result
    }

    /// Backend events re-broadcast by the listener, after the store has
    /// applied them.
    pub fn events(&self) -> broadcast::Receiver<Arc<BackendEvent>> {
        self.inner.event_tx.subscribe()
    }

    // ── Outputs ──────────────────────────────────────────────────────

    pub fn outputs_snapshot(&self) -> OutputSnapshot {
        self.inner.store.snapshot()
    }

    pub fn outputs(&self) -> OutputStream {
        self.inner.store.subscribe()
    }

    /// Open a creation workflow against the current list.
    pub async fn new_output_workflow(&self) -> Result<NewOutputWorkflow, CoreError> {
        NewOutputWorkflow::open(self.inner.client.clone(), &self.inner.store).await
    }

    pub async fn create_output(
        &self,
        request: &OutputRequest,
    ) -> Result<Vec<Arc<Output>>, CoreError> {
        self.inner.store.create(request).await
    }

    /// Delete an output that is currently in the store.
    pub async fn delete_output(&self, id: &OutputId) -> Result<(), CoreError> {
        let output = self
            .inner
            .store
            .get(id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "output".into(),
                identifier: id.to_string(),
            })?;
        self.inner.store.remove(&output).await?;
        Ok(())
    }

    // ── Mixers ───────────────────────────────────────────────────────

    pub async fn list_mixers(&self) -> Result<Vec<Mixer>, CoreError> {
        let mixers = self.inner.client.list_mixers().await?;
        Ok(mixers.into_iter().map(Mixer::from).collect())
    }

    pub async fn get_mixer(&self, id: &str) -> Result<Mixer, CoreError> {
        self.inner
            .client
            .get_mixer(id)
            .await
            .map(Mixer::from)
            .map_err(|e| not_found_or(e, "mixer", id))
    }

    /// Create a mixer. `channels` defaults to 2 on the backend.
    pub async fn create_mixer(
        &self,
        display_name: &str,
        channels: Option<u32>,
    ) -> Result<Vec<Mixer>, CoreError> {
        if display_name.trim().is_empty() {
            return Err(CoreError::Validation {
                message: "mixer name must not be empty".into(),
            });
        }
        if channels == Some(0) {
            return Err(CoreError::Validation {
                message: "a mixer needs at least one output channel".into(),
            });
        }

        let created = self
            .inner
            .client
            .create_mixer(&CreateMixerRequest {
                display_name: display_name.to_owned(),
                channels,
            })
            .await?;
        Ok(created.into_iter().map(Mixer::from).collect())
    }

    pub async fn rename_mixer(&self, id: &str, display_name: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .rename_mixer(id, display_name)
            .await
            .map_err(|e| not_found_or(e, "mixer", id))
    }

    pub async fn delete_mixer(&self, id: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .delete_mixer(id)
            .await
            .map_err(|e| not_found_or(e, "mixer", id))
    }

    /// Append an input channel, returning its id.
    pub async fn add_mixer_channel(&self, id: &str) -> Result<String, CoreError> {
        self.inner
            .client
            .add_mixer_channel(id)
            .await
            .map_err(|e| not_found_or(e, "mixer", id))
    }

    /// Route an input into a channel and/or change its volume.
    pub async fn update_mixer_channel(
        &self,
        id: &str,
        channel: &str,
        input: Option<String>,
        volume: Option<f64>,
    ) -> Result<(), CoreError> {
        if input.is_none() && volume.is_none() {
            return Err(CoreError::Validation {
                message: "nothing to update: pass an input and/or a volume".into(),
            });
        }
        if let Some(v) = volume.filter(|v| !v.is_finite()) {
            return Err(CoreError::Validation {
                message: format!("volume must be a finite number, got {v}"),
            });
        }

        self.inner
            .client
            .update_mixer_channel(id, channel, &MixerChannelUpdate { input, volume })
            .await
            .map_err(|e| not_found_or(e, "mixer channel", &format!("{id}/{channel}")))
    }

    pub async fn remove_mixer_channel(&self, id: &str, channel: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .remove_mixer_channel(id, channel)
            .await
            .map_err(|e| not_found_or(e, "mixer channel", &format!("{id}/{channel}")))
    }
}

/// Map a backend 404 to [`CoreError::NotFound`], everything else as usual.
fn not_found_or(err: patchbay_api::Error, entity: &str, identifier: &str) -> CoreError {
    if err.is_not_found() {
        CoreError::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    } else {
        err.into()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Apply backend events to the store and fan them out to subscribers.
async fn event_task(
    store: Arc<OutputStore>,
    socket: EventSocket,
    event_tx: broadcast::Sender<Arc<BackendEvent>>,
    cancel: CancellationToken,
) {
    let mut rx = socket.subscribe();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Ok(event) => {
                    store.apply_event(&event);
                    let _ = event_tx.send(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event listener lagged, reloading outputs");
                    if let Err(e) = store.load().await {
                        warn!(error = %e, "resync after lag failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    socket.shutdown();
}
