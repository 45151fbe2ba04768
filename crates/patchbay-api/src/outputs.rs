// Output endpoints
//
// Listing, creation, and deletion of routing outputs plus the candidate
// physical device list. Bodies stay raw; see `models::RawOutput`.

use tracing::debug;

use crate::client::AudioClient;
use crate::error::Error;
use crate::models::RawOutput;

impl AudioClient {
    /// List every configured output, in backend order.
    ///
    /// `GET /audio/output`
    pub async fn list_outputs(&self) -> Result<Vec<RawOutput>, Error> {
        let url = self.url("audio/output")?;
        debug!("listing outputs");
        self.get(url).await
    }

    /// List physical device names that can back a `device` output.
    ///
    /// `GET /audio/output/devices`
    pub async fn list_output_devices(&self) -> Result<Vec<String>, Error> {
        let url = self.url("audio/output/devices")?;
        debug!("listing candidate output devices");
        self.get(url).await
    }

    /// Create an output from a variant-specific flat payload.
    ///
    /// `POST /audio/output`. The backend may fan a single request out into
    /// several outputs, so the response is always an array (possibly empty).
    pub async fn create_output(&self, payload: &RawOutput) -> Result<Vec<RawOutput>, Error> {
        let url = self.url("audio/output")?;
        debug!(
            kind = payload.get("type").and_then(|v| v.as_str()).unwrap_or("?"),
            "creating output"
        );
        self.post(url, payload).await
    }

    /// Delete an output by id.
    ///
    /// `DELETE /audio/output/{id}`
    pub async fn delete_output(&self, id: &str) -> Result<(), Error> {
        let url = self.segments_url(&["audio", "output", id])?;
        debug!(id, "deleting output");
        self.delete(url).await
    }
}
