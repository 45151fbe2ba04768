// patchbay-core: Output model, synchronized store and creation workflow.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;
pub mod workflow;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{SessionConfig, TlsVerification};
pub use error::{CoreError, FailureKind};
pub use session::Session;
pub use store::OutputStore;
pub use stream::{OutputSnapshot, OutputStream};
pub use workflow::{
    NewOutputWorkflow, OutputRequest, OutputSelection, WorkflowOutcome, WorkflowState,
};

pub use model::{Mixer, MixerChannel, Output, OutputId, OutputKind, OutputVariant, Parameters};

// Wire-level types consumers may need without depending on patchbay-api.
pub use patchbay_api::socket::{BackendEvent, ReconnectConfig};
