// ── API-to-domain type conversions ──
//
// Bridges raw `patchbay_api` response types into canonical `model` types.
// Outputs need no conversion table: `Output::from_raw` owns that.

use patchbay_api::{MixerChannelState, MixerDetail, MixerSummary};

use crate::model::{Mixer, MixerChannel};

impl From<MixerSummary> for Mixer {
    fn from(m: MixerSummary) -> Self {
        Self {
            id: m.id,
            display_name: m.display_name,
            output_channels: m.output_channels,
            channels: Vec::new(),
        }
    }
}

impl From<MixerDetail> for Mixer {
    fn from(m: MixerDetail) -> Self {
        Self {
            id: m.id,
            display_name: m.display_name,
            output_channels: m.output_channels,
            channels: m.channels.into_iter().map(MixerChannel::from).collect(),
        }
    }
}

impl From<MixerChannelState> for MixerChannel {
    fn from(c: MixerChannelState) -> Self {
        Self {
            id: c.id,
            volume: c.volume,
            input: c.input,
        }
    }
}
