//! Single-slot holder for the most recent extraction.
//!
//! The slot is not keyed by caller or source: whichever pipeline finishes last wins.

use crate::{Error, Result, SourceKind};
use serde::Serialize;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastResult {
    pub text: String,
    pub source: SourceKind,
    pub url: String,
}

#[derive(Debug, Default)]
pub struct LastResultStore {
    slot: RwLock<Option<Arc<LastResult>>>,
}

impl LastResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot unconditionally.
    pub fn set(&self, result: LastResult) {
        let next = Arc::new(result);
        // A poisoned lock still holds a complete value; the write below is a pointer swap.
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(next);
    }

    pub fn get(&self) -> Result<Arc<LastResult>> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.clone()
            .ok_or_else(|| Error::NotFound("no extraction has completed yet".to_string()))
    }
}
