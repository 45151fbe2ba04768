// ── Remote collection store ──

mod collection;
mod output_store;

pub use output_store::{EVENT_OUTPUT_CREATE, EVENT_OUTPUT_REMOVE, OutputStore};
