// Mixer endpoints
//
// CRUD for mixers and their input channels.

use serde_json::json;
use tracing::debug;

use crate::client::AudioClient;
use crate::error::Error;
use crate::models::{CreateMixerRequest, MixerChannelUpdate, MixerDetail, MixerSummary};

impl AudioClient {
    /// List all mixers.
    ///
    /// `GET /audio/mixer`
    pub async fn list_mixers(&self) -> Result<Vec<MixerSummary>, Error> {
        let url = self.url("audio/mixer")?;
        debug!("listing mixers");
        self.get(url).await
    }

    /// Create a mixer. The backend answers with a one-element array.
    ///
    /// `POST /audio/mixer`
    pub async fn create_mixer(
        &self,
        request: &CreateMixerRequest,
    ) -> Result<Vec<MixerSummary>, Error> {
        let url = self.url("audio/mixer")?;
        debug!(display_name = %request.display_name, "creating mixer");
        self.post(url, request).await
    }

    /// Fetch one mixer with its channel states.
    ///
    /// `GET /audio/mixer/{id}`
    pub async fn get_mixer(&self, id: &str) -> Result<MixerDetail, Error> {
        let url = self.segments_url(&["audio", "mixer", id])?;
        self.get(url).await
    }

    /// Rename a mixer.
    ///
    /// `PUT /audio/mixer/{id}`
    pub async fn rename_mixer(&self, id: &str, display_name: &str) -> Result<(), Error> {
        let url = self.segments_url(&["audio", "mixer", id])?;
        debug!(id, display_name, "renaming mixer");
        self.put(url, &json!({ "display_name": display_name })).await
    }

    /// Delete a mixer. Fails with HTTP 400 while the mixer is in use.
    ///
    /// `DELETE /audio/mixer/{id}`
    pub async fn delete_mixer(&self, id: &str) -> Result<(), Error> {
        let url = self.segments_url(&["audio", "mixer", id])?;
        debug!(id, "deleting mixer");
        self.delete(url).await
    }

    /// Add an input channel, returning the new channel id.
    ///
    /// `POST /audio/mixer/{id}/channel`
    pub async fn add_mixer_channel(&self, id: &str) -> Result<String, Error> {
        let url = self.segments_url(&["audio", "mixer", id, "channel"])?;
        debug!(id, "adding mixer channel");
        let value: serde_json::Value = self.post_empty(url).await?;
        Ok(match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    }

    /// Change a channel's input and/or volume.
    ///
    /// `PUT /audio/mixer/{id}/channel/{channel}`
    pub async fn update_mixer_channel(
        &self,
        id: &str,
        channel: &str,
        update: &MixerChannelUpdate,
    ) -> Result<(), Error> {
        let url = self.segments_url(&["audio", "mixer", id, "channel", channel])?;
        debug!(id, channel, ?update, "updating mixer channel");
        self.put(url, update).await
    }

    /// Remove a channel from a mixer.
    ///
    /// `DELETE /audio/mixer/{id}/channel/{channel}`
    pub async fn remove_mixer_channel(&self, id: &str, channel: &str) -> Result<(), Error> {
        let url = self.segments_url(&["audio", "mixer", id, "channel", channel])?;
        debug!(id, channel, "removing mixer channel");
        self.delete(url).await
    }
}
