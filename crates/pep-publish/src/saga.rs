//! Compensation for multi-system writes.
//!
//! Each forward step that succeeds registers an undo future. On failure the
//! undo list runs in reverse registration order. Undo failures are collected
//! and logged but never replace the error that triggered the rollback.

use futures::future::BoxFuture;

type UndoResult = Result<(), String>;

/// A failed compensation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoFailure {
    pub step: &'static str,
    pub message: String,
}

/// Ordered list of pending compensations.
#[derive(Default)]
pub struct Saga<'a> {
    undo: Vec<(&'static str, BoxFuture<'a, UndoResult>)>,
}

impl<'a> Saga<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self { undo: Vec::new() }
    }

    /// Register the compensation for a step that just succeeded.
    pub fn push(&mut self, step: &'static str, undo: BoxFuture<'a, UndoResult>) {
        self.undo.push((step, undo));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    /// Forget all compensations; the forward path committed.
    pub fn commit(self) {
        drop(self);
    }

    /// Run every compensation, newest first. Returns the ones that failed.
    pub async fn compensate(self) -> Vec<UndoFailure> {
        let mut failures = Vec::new();
        for (step, undo) in self.undo.into_iter().rev() {
            match undo.await {
                Ok(()) => tracing::debug!(step, "compensation applied"),
                Err(message) => {
                    tracing::warn!(step, %message, "compensation failed");
                    failures.push(UndoFailure { step, message });
                }
            }
        }
        failures
    }
}
