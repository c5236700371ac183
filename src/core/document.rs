//! Diagram document
//!
//! The document owns every placed block and wire in insertion order, the id
//! allocator they draw from, and the editor settings. All placement goes
//! through the geometry checks, so the collections never hold an overlapping
//! or malformed shape.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    Block, BlockId, BlockKind, ConfigError, EditorConfig, Endpoint, FieldValue, IdAllocator,
    ResolvedEdge, Wire, WireId,
};
use crate::geometry::placement::{check_rect_placement, check_segment_placement, PlacementConflict};
use crate::geometry::{Rect, Segment};
use crate::runtime::codegen::GenerateOptions;
use crate::runtime::resolver::{self, ConnectivityResolver, UnresolvedConnection};
use crate::runtime::validation::{CapabilityMismatch, GraphValidator};
use crate::runtime::PipelineError;

/// On-disk form of a document
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    blocks: Vec<Block>,
    #[serde(default)]
    wires: Vec<Wire>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    blocks: &'a [Block],
    wires: &'a [Wire],
}

/// Entity read back from a snapshot, replayed in id order
enum Stored {
    Block(Block),
    Wire(Wire),
}

impl Stored {
    fn id(&self) -> u64 {
        match self {
            Stored::Block(b) => b.id.0,
            Stored::Wire(w) => w.id.0,
        }
    }
}

/// A circuit diagram
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
    wires: Vec<Wire>,
    ids: IdAllocator,
    config: EditorConfig,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Blocks in creation order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Wires in creation order
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.wires.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.iter().find(|w| w.id == id)
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// Place a block of `kind` with its default configuration
    ///
    /// # Returns
    /// * `Ok(BlockId)` for the new block
    /// * `Err(PlacementConflict)` if the rectangle overlaps a block, covers a
    ///   wire or has no area, or if no ids are left. Nothing is inserted in
    ///   that case.
    pub fn place_block(
        &mut self,
        kind: BlockKind,
        rect: Rect,
    ) -> Result<BlockId, PlacementConflict> {
        if let Err(conflict) = check_rect_placement(&rect, &self.blocks, &self.wires) {
            warn!("Rejected {} placement at ({}, {}): {}", kind, rect.x, rect.y, conflict);
            return Err(conflict);
        }
        let id = self.ids.next_block().ok_or_else(|| {
            warn!("Rejected {} placement: ids exhausted", kind);
            PlacementConflict::IdsExhausted
        })?;
        debug!("Placed {} as block {}", kind, id);
        self.blocks.push(Block::new(id, kind, rect));
        Ok(id)
    }

    /// Place a wire. Endpoints inside blocks are retracted to the block
    /// border before the wire is stored.
    pub fn place_wire(&mut self, segment: Segment) -> Result<WireId, PlacementConflict> {
        let placed = match check_segment_placement(
            &segment,
            &self.blocks,
            &self.wires,
            self.config.retract_step_fraction,
        ) {
            Ok(placed) => placed,
            Err(conflict) => {
                warn!("Rejected wire placement: {}", conflict);
                return Err(conflict);
            }
        };
        let id = self.ids.next_wire().ok_or_else(|| {
            warn!("Rejected wire placement: ids exhausted");
            PlacementConflict::IdsExhausted
        })?;
        debug!("Placed wire {}", id);
        self.wires.push(Wire::new(id, placed, self.config.arrow_length));
        Ok(id)
    }

    // ── Mutation ────────────────────────────────────────────────────────

    pub fn set_block_field(
        &mut self,
        id: BlockId,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), DocumentError> {
        self.block_mut(id)?.set_field(name, value)?;
        Ok(())
    }

    /// Set a block field from property-editor text
    pub fn set_block_field_text(
        &mut self,
        id: BlockId,
        name: &str,
        text: &str,
    ) -> Result<(), DocumentError> {
        self.block_mut(id)?.set_field_text(name, text)?;
        Ok(())
    }

    pub fn set_bit_slice(
        &mut self,
        id: WireId,
        lsb: impl Into<String>,
        msb: impl Into<String>,
    ) -> Result<(), DocumentError> {
        self.wire_mut(id)?.set_bit_slice(lsb, msb);
        Ok(())
    }

    pub fn set_clock_line(&mut self, id: WireId, clock_line: bool) -> Result<(), DocumentError> {
        self.wire_mut(id)?.clock_line = clock_line;
        Ok(())
    }

    /// Remove a block. Wire ends that referred to it become unresolved.
    pub fn delete_block(&mut self, id: BlockId) -> Result<Block, DocumentError> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or(DocumentError::BlockNotFound(id))?;
        let removed = self.blocks.remove(index);
        self.clear_references(Endpoint::Block(id));
        info!("Deleted block {}", id);
        Ok(removed)
    }

    /// Remove a wire. Other wires that referred to it become unresolved there.
    pub fn delete_wire(&mut self, id: WireId) -> Result<Wire, DocumentError> {
        let index = self
            .wires
            .iter()
            .position(|w| w.id == id)
            .ok_or(DocumentError::WireNotFound(id))?;
        let removed = self.wires.remove(index);
        self.clear_references(Endpoint::Wire(id));
        info!("Deleted wire {}", id);
        Ok(removed)
    }

    /// Remove everything and restart ids from zero
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.wires.clear();
        self.ids.reset();
        info!("Cleared document");
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut Block, DocumentError> {
        self.blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(DocumentError::BlockNotFound(id))
    }

    fn wire_mut(&mut self, id: WireId) -> Result<&mut Wire, DocumentError> {
        self.wires
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(DocumentError::WireNotFound(id))
    }

    fn clear_references(&mut self, target: Endpoint) {
        for wire in &mut self.wires {
            if wire.clear_references_to(target) {
                debug!("Wire {} no longer refers to {}", wire.id, target);
            }
        }
    }

    // ── Connectivity ────────────────────────────────────────────────────

    /// Match every wire end and collapse wire chains. On failure no wire is
    /// changed.
    pub fn resolve_connections(&mut self) -> Result<(), UnresolvedConnection> {
        let resolution = ConnectivityResolver::new(self.config.proximity_threshold)
            .resolve(&self.blocks, &self.wires)?;
        resolution.apply(&mut self.wires);
        Ok(())
    }

    /// Check capabilities of every block-to-block wire, removing the first
    /// offending wire
    pub fn validate_connections(&mut self) -> Result<(), CapabilityMismatch> {
        GraphValidator::validate(&self.blocks, &mut self.wires)
    }

    /// Edges of wires whose two ends are blocks, in wire creation order
    pub fn resolved_edges(&self) -> Vec<ResolvedEdge> {
        resolver::resolved_edges(&self.wires)
    }

    /// Resolve, validate and generate the program text
    pub fn generate(
        &mut self,
        auxiliary: &str,
        options: &GenerateOptions,
    ) -> Result<String, PipelineError> {
        crate::runtime::generate(self, auxiliary, options)
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, DocumentError> {
        let snapshot = SnapshotRef {
            blocks: &self.blocks,
            wires: &self.wires,
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Rebuild a document from a snapshot.
    ///
    /// Every entity is replayed through placement validation in id order and
    /// keeps its stored id. Block configurations are checked against their
    /// field declarations. Wire endpoints are not stored; resolve again after
    /// loading.
    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, DocumentError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;

        let mut stored: Vec<Stored> = snapshot
            .blocks
            .into_iter()
            .map(Stored::Block)
            .chain(snapshot.wires.into_iter().map(Stored::Wire))
            .collect();
        stored.sort_by_key(Stored::id);
        if let Some(pair) = stored.windows(2).find(|pair| pair[0].id() == pair[1].id()) {
            return Err(DocumentError::DuplicateId(pair[0].id()));
        }

        let mut document = Self::with_config(config);
        for entity in stored {
            document.replay(entity)?;
        }
        info!(
            "Loaded {} blocks and {} wires",
            document.blocks.len(),
            document.wires.len()
        );
        Ok(document)
    }

    fn replay(&mut self, entity: Stored) -> Result<(), DocumentError> {
        let id = entity.id();
        match entity {
            Stored::Block(block) => {
                block.config.validate()?;
                check_rect_placement(&block.rect, &self.blocks, &self.wires)
                    .map_err(|source| DocumentError::Replay { id, source })?;
                self.blocks.push(block);
            }
            Stored::Wire(stored) => {
                let placed = check_segment_placement(
                    &stored.segment,
                    &self.blocks,
                    &self.wires,
                    self.config.retract_step_fraction,
                )
                .map_err(|source| DocumentError::Replay { id, source })?;
                let mut wire = Wire::new(stored.id, placed, self.config.arrow_length);
                wire.set_bit_slice(stored.lsb, stored.msb);
                wire.clock_line = stored.clock_line;
                self.wires.push(wire);
            }
        }
        self.ids.advance_past(id);
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>, config: EditorConfig) -> Result<Self, DocumentError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json, config)
    }

    /// The id the next placed entity will receive, `None` once ids run out
    pub fn next_id(&self) -> Option<u64> {
        self.ids.peek()
    }
}

/// Document errors
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// No block with this id
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    /// No wire with this id
    #[error("Wire not found: {0}")]
    WireNotFound(WireId),

    /// Two snapshot entities share an id
    #[error("Duplicate id in snapshot: {0}")]
    DuplicateId(u64),

    /// A snapshot entity no longer passes placement
    #[error("Entity {id} cannot be placed: {source}")]
    Replay {
        id: u64,
        #[source]
        source: PlacementConflict,
    },

    /// Field update rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Snapshot file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot is not valid JSON
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
