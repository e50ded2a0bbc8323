//! Generation counter for long-running rebuild tasks.
//!
//! Each rebuild begins by taking a token; a newer `begin` invalidates every
//! older token, so a superseded task discovers at its next checkpoint that
//! its results should be dropped. There is no mutual exclusion here: stale
//! work is allowed to run to completion, its output just gets discarded.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct GenerationGuard {
    generation: AtomicU64,
}

/// Token handed out by [`GenerationGuard::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationToken(u64);

impl GenerationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, invalidating all previously issued tokens.
    pub fn begin(&self) -> GenerationToken {
        GenerationToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether the token still belongs to the latest generation.
    pub fn is_current(&self, token: GenerationToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }
}
