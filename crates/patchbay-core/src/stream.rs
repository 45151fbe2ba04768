// ── Output list subscriptions ──

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Output;

/// Ordered list snapshot shared between the store and its readers.
pub type OutputSnapshot = Arc<Vec<Arc<Output>>>;

/// A subscription to the output list.
///
/// Holds the snapshot seen at creation and wakes on every list mutation.
pub struct OutputStream {
    current: OutputSnapshot,
    receiver: watch::Receiver<OutputSnapshot>,
}

impl OutputStream {
    pub(crate) fn new(receiver: watch::Receiver<OutputSnapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot as of creation or the last [`changed`](Self::changed).
    pub fn current(&self) -> &OutputSnapshot {
        &self.current
    }

    pub fn latest(&self) -> OutputSnapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next mutation. `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<OutputSnapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` yielding the current list, then every change.
    pub fn into_stream(self) -> OutputWatchStream {
        OutputWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter over the store's watch channel.
pub struct OutputWatchStream {
    inner: WatchStream<OutputSnapshot>,
}

impl Stream for OutputWatchStream {
    type Item = OutputSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
