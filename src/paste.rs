//! Clipboard paste bookkeeping.
//!
//! Reading a pasted blob into a data URL is asynchronous. Every image item of
//! a paste gets a [`PasteTicket`] with its own [`PasteOpId`]; the tracker
//! knows which operations are still pending, so a read that finishes after
//! its operation was cancelled (page hidden) or already settled is dropped
//! instead of writing records.

#[cfg(test)]
#[path = "paste_test.rs"]
mod paste_test;

use std::collections::BTreeSet;
use std::fmt;

use crate::geometry::Position;

/// Whether a clipboard item's media type indicates an image.
#[must_use]
pub fn is_image_type(mime: &str) -> bool {
    mime.contains("image")
}

/// Identifier of one in-flight image read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PasteOpId(u64);

impl PasteOpId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PasteOpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "paste#{}", self.0)
    }
}

/// Handle for one image item of a paste.
#[derive(Debug, Clone, PartialEq)]
pub struct PasteTicket {
    pub op: PasteOpId,
    /// Index of the item in the clipboard item list.
    pub item_index: usize,
    /// Where the image will be placed, captured when the paste happened.
    pub position: Position,
}

/// Tracks pending paste operations.
#[derive(Debug, Clone, Default)]
pub struct PasteTracker {
    next: u64,
    pending: BTreeSet<PasteOpId>,
}

impl PasteTracker {
    /// Register a new pending operation.
    pub fn begin(&mut self) -> PasteOpId {
        self.next += 1;
        let op = PasteOpId(self.next);
        self.pending.insert(op);
        op
    }

    /// Settle `op`. Returns `false` if it was not pending (cancelled or already settled).
    pub fn finish(&mut self, op: PasteOpId) -> bool {
        self.pending.remove(&op)
    }

    /// Cancel every pending operation and return their ids.
    pub fn cancel_all(&mut self) -> Vec<PasteOpId> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    #[must_use]
    pub fn is_pending(&self, op: PasteOpId) -> bool {
        self.pending.contains(&op)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
