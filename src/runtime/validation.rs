//! Graph validation
//!
//! Checks that every block-to-block wire leaves a block that can drive an
//! output and enters a block that can take an input. The first offending
//! wire is removed from the diagram and reported.

use log::warn;
use std::fmt;

use crate::core::{Block, BlockId, BlockKind, Wire, WireId};

/// Which side of a wire broke the capability rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySide {
    /// The source block has no output
    MissingOutput,
    /// The sink block has no input
    MissingInput,
}

impl fmt::Display for CapabilitySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilitySide::MissingOutput => f.write_str("cannot drive an output"),
            CapabilitySide::MissingInput => f.write_str("cannot take an input"),
        }
    }
}

/// A wire that was removed for connecting incompatible blocks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Wire {wire} removed: {kind} {block} {side}")]
pub struct CapabilityMismatch {
    pub wire: WireId,
    pub side: CapabilitySide,
    /// The block on the offending side
    pub block: BlockId,
    pub kind: BlockKind,
}

// ── Validator ───────────────────────────────────────────────────────────────

pub struct GraphValidator;

impl GraphValidator {
    /// Check wires in creation order and stop at the first violation.
    ///
    /// The source is checked before the sink, so a wire leaving an Output
    /// block always reports `MissingOutput`. The offending wire is removed
    /// from `wires`; wires after it are not examined.
    pub fn validate(blocks: &[Block], wires: &mut Vec<Wire>) -> Result<(), CapabilityMismatch> {
        let violation = wires
            .iter()
            .enumerate()
            .find_map(|(index, wire)| Self::check_wire(blocks, wire).map(|m| (index, m)));

        match violation {
            Some((index, mismatch)) => {
                wires.remove(index);
                warn!("{}", mismatch);
                Err(mismatch)
            }
            None => Ok(()),
        }
    }

    /// Run [`GraphValidator::validate`] until it passes, collecting every
    /// removed wire in order
    pub fn purge(blocks: &[Block], wires: &mut Vec<Wire>) -> Vec<CapabilityMismatch> {
        let mut removed = Vec::new();
        while let Err(mismatch) = Self::validate(blocks, wires) {
            removed.push(mismatch);
        }
        removed
    }

    fn check_wire(blocks: &[Block], wire: &Wire) -> Option<CapabilityMismatch> {
        let (source_id, sink_id) = wire.terminals()?;
        let source = find(blocks, source_id)?;
        let sink = find(blocks, sink_id)?;

        if !source.capability().supports_output {
            return Some(CapabilityMismatch {
                wire: wire.id,
                side: CapabilitySide::MissingOutput,
                block: source.id,
                kind: source.kind(),
            });
        }
        if !sink.capability().supports_input {
            return Some(CapabilityMismatch {
                wire: wire.id,
                side: CapabilitySide::MissingInput,
                block: sink.id,
                kind: sink.kind(),
            });
        }
        None
    }
}

fn find(blocks: &[Block], id: BlockId) -> Option<&Block> {
    blocks.iter().find(|b| b.id == id)
}
