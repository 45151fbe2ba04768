// ── Mixer domain types ──

use serde::{Deserialize, Serialize};

/// A software mixer summing several inputs into one output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mixer {
    pub id: String,
    pub display_name: String,
    pub output_channels: u32,
    /// Input channels. Empty when loaded from the listing endpoint.
    #[serde(default)]
    pub channels: Vec<MixerChannel>,
}

/// One input slot of a mixer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerChannel {
    pub id: String,
    /// Linear gain; 1.0 is unity.
    pub volume: f64,
    pub input: Option<String>,
}

impl Mixer {
    pub fn channel(&self, id: &str) -> Option<&MixerChannel> {
        self.channels.iter().find(|c| c.id == id)
    }
}
