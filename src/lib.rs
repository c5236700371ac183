//! Circuit Blocks - placement, connectivity and code generation core
//!
//! This crate holds the model behind a block-diagram circuit editor: typed
//! blocks and directional wires, geometric placement checks, resolution of
//! drawn wires into a block-to-block graph, capability validation and
//! generation of the `pydig` simulation program.

pub mod core;
pub mod geometry;
pub mod runtime;
mod tests;

#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

// Re-export commonly used types
pub use core::{Block, BlockId, BlockKind, Document, DocumentError, EditorConfig, Wire, WireId};
pub use geometry::placement::PlacementConflict;
pub use geometry::{Point, Rect, Segment};
pub use runtime::codegen::{CodeGenerator, GenerateOptions};
pub use runtime::{generate, PipelineError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
