//! Append-only conversation transcript.

use crate::turn::Turn;
use tokio::sync::watch;

/// Ordered log of conversation turns.
///
/// Turns can only be appended. Every append is published to subscribers in
/// the order it was issued, so a renderer that follows [`Transcript::subscribe`]
/// never sees a later turn before an earlier one.
#[derive(Debug)]
pub struct Transcript {
    turns: watch::Sender<Vec<Turn>>,
}

impl Transcript {
    pub fn new() -> Self {
        let (turns, _rx) = watch::channel(Vec::new());
        Self { turns }
    }

    pub fn append(&self, turn: Turn) {
        tracing::trace!(role = ?turn.role(), "Appending turn");
        self.turns.send_modify(|turns| turns.push(turn));
    }

    /// Snapshot of every turn, oldest first.
    pub fn all(&self) -> Vec<Turn> {
        self.turns.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.turns.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.borrow().is_empty()
    }

    pub fn last(&self) -> Option<Turn> {
        self.turns.borrow().last().cloned()
    }

    /// Receive a fresh snapshot after every append.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Turn>> {
        self.turns.subscribe()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
