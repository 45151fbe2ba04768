// patchbay-api: Async Rust client for the patchbay audio-routing backend

pub mod client;
pub mod error;
pub mod mixers;
pub mod models;
pub mod outputs;
pub mod socket;
pub mod transport;

pub use client::AudioClient;
pub use error::Error;
pub use models::{
    CreateMixerRequest, MixerChannelState, MixerChannelUpdate, MixerDetail, MixerSummary,
    RawOutput,
};
