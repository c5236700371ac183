//! Generation pipeline
//!
//! Resolution, validation and code generation, run in that order when the
//! user asks for a program.

pub mod codegen;
pub mod resolver;
pub mod validation;

use log::info;

use crate::core::Document;
use codegen::{CodeGenerator, GenerateOptions};
use resolver::UnresolvedConnection;
use validation::CapabilityMismatch;

/// Why generation stopped
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// A wire end could not be matched, or wires form a cycle
    #[error("Connection could not be resolved: {0}")]
    Unresolved(#[from] UnresolvedConnection),

    /// A wire joins incompatible blocks; it has been removed
    #[error("Invalid connection: {0}")]
    Capability(#[from] CapabilityMismatch),
}

/// Resolve connections, validate them and generate the program text.
///
/// A resolution failure leaves every wire untouched. A capability failure
/// removes the offending wire from `document` before returning.
pub fn generate(
    document: &mut Document,
    auxiliary: &str,
    options: &GenerateOptions,
) -> Result<String, PipelineError> {
    info!(
        "Resolving {} wires against {} blocks",
        document.wires().len(),
        document.blocks().len()
    );
    document.resolve_connections()?;

    info!("Validating connections");
    document.validate_connections()?;

    let edges = document.resolved_edges();
    let program = CodeGenerator::generate(document.blocks(), &edges, auxiliary, options);
    info!(
        "Generated {} bytes ({} declarations, {} connections)",
        program.len(),
        document.blocks().len(),
        edges.len()
    );
    Ok(program)
}
