// ── Domain model ──
//
// Canonical representations of backend entities. Consumers (the CLI)
// depend on these, never on the raw wire types in patchbay-api.

pub mod mixer;
pub mod output;

pub use mixer::{Mixer, MixerChannel};
pub use output::{Output, OutputId, OutputKind, OutputVariant, Parameters};
