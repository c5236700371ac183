//! Core circuit data model
//!
//! This module defines the identifiers, blocks, wires and typed configuration
//! records that make up a diagram, together with the [`Document`] that owns them.

pub mod block;
pub mod config;
pub mod document;
pub mod parameter;
pub mod wire;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use block::{Block, BlockConfig, BlockKind, Capability};
pub use config::EditorConfig;
pub use document::{Document, DocumentError};
pub use parameter::{ConfigError, FieldValue};
pub use wire::{Endpoint, ResolvedEdge, Wire, WireEnd};

/// Unique identifier for a placed block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a placed wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireId(pub u64);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic identity counter shared by blocks and wires.
///
/// Ids are never reused within a session. Only [`IdAllocator::reset`] (called
/// when a document is cleared) starts the sequence over. Once `u64::MAX` has
/// been handed out or reserved the allocator is exhausted and hands out nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: Option<u64>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: Some(0) }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next entity will receive, `None` once exhausted
    pub fn peek(&self) -> Option<u64> {
        self.next
    }

    pub fn next_block(&mut self) -> Option<BlockId> {
        self.bump().map(BlockId)
    }

    pub fn next_wire(&mut self) -> Option<WireId> {
        self.bump().map(WireId)
    }

    /// Make sure `id` (and everything below it) is never handed out again
    pub fn advance_past(&mut self, id: u64) {
        self.next = match (self.next, id.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
    }

    pub fn reset(&mut self) {
        self.next = Some(0);
    }

    fn bump(&mut self) -> Option<u64> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(id)
    }
}
