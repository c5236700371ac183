//! Program generation
//!
//! Serializes blocks and validated edges into a `pydig` simulation script.
//! The layout is fixed and the output depends only on the inputs, so the
//! same diagram always produces byte-identical text.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::{Block, BlockId, BlockKind, ResolvedEdge};

pub const IMPORT_LINE: &str = "import pydig";
pub const CONTEXT_LINE: &str = "pysim = pydig.pydig(name = \"Pydig\")";
pub const TRACE_LINE: &str = "pysim.generateCSV()";

/// Options for the trailing directives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Ask the simulator to write a CSV trace
    pub emit_trace: bool,
    /// Simulation time passed to `run(until = ...)`
    pub run_duration: i64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            emit_trace: false,
            run_duration: 10,
        }
    }
}

pub struct CodeGenerator;

impl CodeGenerator {
    /// Generate the full program.
    ///
    /// `blocks` are declared in slice order and `edges` connected in slice
    /// order; callers pass both in creation order.
    pub fn generate(
        blocks: &[Block],
        edges: &[ResolvedEdge],
        auxiliary: &str,
        options: &GenerateOptions,
    ) -> String {
        let mut out = String::new();

        out.push_str(IMPORT_LINE);
        out.push_str("\n\n");
        out.push_str(CONTEXT_LINE);
        out.push_str("\n\n");
        out.push_str(auxiliary);
        out.push_str("\n\n");

        for block in blocks {
            out.push_str(&Self::declaration(block));
            out.push('\n');
        }

        for edge in edges {
            match Self::connection(blocks, edge) {
                Some(line) => {
                    out.push_str(&line);
                    out.push('\n');
                }
                None => warn!("Skipping wire {}: endpoint block missing", edge.wire),
            }
        }

        if options.emit_trace {
            out.push_str(TRACE_LINE);
            out.push('\n');
        }
        out.push_str(&format!("pysim.run(until = {})\n", options.run_duration));

        out
    }

    /// `{prefix}{id} = {constructor}({field} = {value}, ...)`
    pub fn declaration(block: &Block) -> String {
        let args = block
            .config
            .entries()
            .into_iter()
            .map(|(name, value)| format!("{} = {}", name, value.render()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} = {}({})", block.object_name(), block.kind().constructor(), args)
    }

    /// `{source}.output({slice}) > {sink}.input()`, or `.clock()` for a
    /// clock-tagged wire from a Clock into a state machine
    pub fn connection(blocks: &[Block], edge: &ResolvedEdge) -> Option<String> {
        let source = find(blocks, edge.source)?;
        let sink = find(blocks, edge.sink)?;

        let args = edge
            .bit_slice
            .map(|s| format!("{}, {}", s.lsb, s.msb))
            .unwrap_or_default();
        let clocked = source.kind() == BlockKind::Clock
            && sink.kind().is_state_machine()
            && edge.clock_line;
        let pin = if clocked {
            "clock"
        } else {
            "input"
        };

        Some(format!(
            "{}.output({}) > {}.{}()",
            source.object_name(),
            args,
            sink.object_name(),
            pin
        ))
    }
}

fn find(blocks: &[Block], id: BlockId) -> Option<&Block> {
    blocks.iter().find(|b| b.id == id)
}
