// ── Ordered reactive output list ──
//
// Backend order is meaningful, and removal works by reference identity,
// so outputs live in a plain `Vec<Arc<Output>>` published through a
// `watch` channel. Every mutation goes through the sender, which
// serializes writers; readers hold cheap `Arc` snapshots.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{Output, OutputId};
use crate::stream::OutputSnapshot;

pub(crate) struct OutputList {
    snapshot: watch::Sender<OutputSnapshot>,
}

impl OutputList {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self { snapshot }
    }

    /// Replace the whole list, keeping the given order.
    pub(crate) fn replace_all(&self, outputs: Vec<Output>) {
        let fresh: Vec<Arc<Output>> = outputs.into_iter().map(Arc::new).collect();
        self.snapshot.send_replace(Arc::new(fresh));
    }

    /// Append outputs in order. An output whose id is already present
    /// replaces the existing entry at its current position, unless the
    /// two are equal, in which case the existing `Arc` is kept so handles
    /// to it stay valid.
    ///
    /// Returns the resulting entries in input order.
    pub(crate) fn merge(&self, outputs: Vec<Output>) -> Vec<Arc<Output>> {
        if outputs.is_empty() {
            return Vec::new();
        }

        let mut inserted = Vec::with_capacity(outputs.len());
        self.snapshot.send_if_modified(|list| {
            let mut modified = false;
            for output in outputs {
                let existing = output
                    .id()
                    .and_then(|id| list.iter().position(|o| o.id() == Some(id)));
                match existing {
                    Some(pos) if *list[pos] == output => {
                        inserted.push(Arc::clone(&list[pos]));
                    }
                    Some(pos) => {
                        let output = Arc::new(output);
                        Arc::make_mut(list)[pos] = Arc::clone(&output);
                        inserted.push(output);
                        modified = true;
                    }
                    None => {
                        let output = Arc::new(output);
                        Arc::make_mut(list).push(Arc::clone(&output));
                        inserted.push(output);
                        modified = true;
                    }
                }
            }
            modified
        });
        inserted
    }

    /// Remove the exact entry `target` points at. Returns `false` (and
    /// notifies nobody) when it is no longer in the list.
    pub(crate) fn remove_ptr(&self, target: &Arc<Output>) -> bool {
        self.snapshot.send_if_modified(|list| {
            match list.iter().position(|o| Arc::ptr_eq(o, target)) {
                Some(pos) => {
                    Arc::make_mut(list).remove(pos);
                    true
                }
                None => false,
            }
        })
    }

    pub(crate) fn remove_by_id(&self, id: &OutputId) -> Option<Arc<Output>> {
        let mut removed = None;
        self.snapshot.send_if_modified(|list| {
            match list.iter().position(|o| o.id() == Some(id)) {
                Some(pos) => {
                    removed = Some(Arc::make_mut(list).remove(pos));
                    true
                }
                None => false,
            }
        });
        removed
    }

    pub(crate) fn get(&self, id: &OutputId) -> Option<Arc<Output>> {
        self.snapshot
            .borrow()
            .iter()
            .find(|o| o.id() == Some(id))
            .cloned()
    }

    pub(crate) fn snapshot(&self) -> OutputSnapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<OutputSnapshot> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }
}
