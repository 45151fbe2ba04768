// Backend wire types
//
// Outputs travel as flat, schema-less JSON objects and are kept raw here;
// `patchbay-core` owns their interpretation. Mixers have a fixed shape.

use serde::{Deserialize, Serialize};

/// A flat output mapping exactly as the backend sends or accepts it.
pub type RawOutput = serde_json::Map<String, serde_json::Value>;

// ── Mixers ───────────────────────────────────────────────────────────

/// Mixer entry from `GET /audio/mixer` and the create response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerSummary {
    pub id: String,
    pub display_name: String,
    pub output_channels: u32,
}

/// Full mixer from `GET /audio/mixer/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerDetail {
    pub id: String,
    pub display_name: String,
    pub output_channels: u32,
    #[serde(default)]
    pub channels: Vec<MixerChannelState>,
}

/// One input channel of a mixer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerChannelState {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub volume: f64,
    /// Input routed into this channel, `None` when unassigned.
    #[serde(default)]
    pub input: Option<String>,
}

/// Body for `POST /audio/mixer`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMixerRequest {
    pub display_name: String,
    /// Output channel count; the backend defaults to 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
}

/// Body for `PUT /audio/mixer/{id}/channel/{channel}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MixerChannelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Channel ids come back as strings from listings but as bare integers
/// from the channel-create endpoint. Normalize both to strings.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}
