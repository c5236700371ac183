//! WASM API: `#[wasm_bindgen]` exports for a browser editing surface.
//!
//! This module is only compiled when targeting `wasm32`. It provides:
//! - `init_document` / `destroy_document` / `clear_document`: lifecycle
//! - `place_block` / `place_wire`: placement with geometry checks
//! - `set_block_field` / `set_bit_slice` / `set_clock_line`: property edits
//! - `delete_block` / `delete_wire`: removal
//! - `save_document` / `load_document`: snapshots
//! - `generate`: resolve, validate and emit the program
//!
//! Every call returns a JSON string, either a success payload or `{"error": ...}`.

use std::cell::RefCell;
use std::str::FromStr;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::core::parameter::FieldKind;
use crate::core::{BlockId, BlockKind, Document, EditorConfig, WireId};
use crate::geometry::{Rect, Segment};
use crate::runtime::codegen::GenerateOptions;
use crate::runtime::PipelineError;

// ── Global state ────────────────────────────────────────────────────────────

thread_local! {
    static DOCUMENT: RefCell<Option<Document>> = RefCell::new(None);
}

fn with_document<R>(f: impl FnOnce(&mut Document) -> R) -> Result<R, String> {
    DOCUMENT.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(doc) => Ok(f(doc)),
            None => Err("Document not initialized. Call init_document() first.".into()),
        }
    })
}

// ── Response types ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct IdResponse {
    id: u64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ProgramResponse {
    program: String,
}

/// Failed generation; `removed_wire` is set when validation deleted a wire
#[derive(Serialize)]
struct GenerateErrorResponse {
    error: String,
    removed_wire: Option<u64>,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Serialize)]
struct FieldInfo {
    name: &'static str,
    kind: FieldKind,
    min: Option<i64>,
    max: Option<i64>,
}

#[derive(Serialize)]
struct BlockTypeInfo {
    kind: BlockKind,
    name: &'static str,
    supports_output: bool,
    supports_input: bool,
    fields: Vec<FieldInfo>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn json_id(id: u64) -> String {
    to_json(&IdResponse { id })
}

fn json_ok() -> String {
    to_json(&OkResponse { ok: true })
}

fn json_err(msg: impl Into<String>) -> String {
    to_json(&ErrorResponse { error: msg.into() })
}

fn respond<E: std::fmt::Display>(result: Result<Result<String, E>, String>) -> String {
    match result {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => json_err(e.to_string()),
        Err(e) => json_err(e),
    }
}

// ── Exported functions ──────────────────────────────────────────────────────

/// Start a new empty document. `config_json` may be empty for defaults.
#[wasm_bindgen]
pub fn init_document(config_json: &str) -> String {
    console_error_panic_hook::set_once();

    let config = if config_json.trim().is_empty() {
        EditorConfig::default()
    } else {
        match EditorConfig::from_json_str(config_json) {
            Ok(c) => c,
            Err(e) => return json_err(e.to_string()),
        }
    };

    DOCUMENT.with(|cell| {
        *cell.borrow_mut() = Some(Document::with_config(config));
    });
    json_ok()
}

#[wasm_bindgen]
pub fn destroy_document() {
    DOCUMENT.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

#[wasm_bindgen]
pub fn clear_document() -> String {
    respond(with_document(|doc| {
        doc.clear();
        Ok::<_, String>(json_ok())
    }))
}

#[wasm_bindgen]
pub fn place_block(kind: &str, x: f64, y: f64, width: f64, height: f64) -> String {
    let kind = match BlockKind::from_str(kind) {
        Ok(k) => k,
        Err(e) => return json_err(e.to_string()),
    };
    respond(with_document(|doc| {
        doc.place_block(kind, Rect::new(x, y, width, height))
            .map(|id| json_id(id.0))
    }))
}

#[wasm_bindgen]
pub fn place_wire(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    respond(with_document(|doc| {
        doc.place_wire(Segment::from_coords(x1, y1, x2, y2))
            .map(|id| json_id(id.0))
    }))
}

/// Set a block field from the text typed into its property editor
#[wasm_bindgen]
pub fn set_block_field(block_id: u32, name: &str, text: &str) -> String {
    respond(with_document(|doc| {
        doc.set_block_field_text(BlockId(u64::from(block_id)), name, text)
            .map(|()| json_ok())
    }))
}

#[wasm_bindgen]
pub fn set_bit_slice(wire_id: u32, lsb: &str, msb: &str) -> String {
    respond(with_document(|doc| {
        doc.set_bit_slice(WireId(u64::from(wire_id)), lsb, msb)
            .map(|()| json_ok())
    }))
}

#[wasm_bindgen]
pub fn set_clock_line(wire_id: u32, clock_line: bool) -> String {
    respond(with_document(|doc| {
        doc.set_clock_line(WireId(u64::from(wire_id)), clock_line)
            .map(|()| json_ok())
    }))
}

#[wasm_bindgen]
pub fn delete_block(block_id: u32) -> String {
    respond(with_document(|doc| {
        doc.delete_block(BlockId(u64::from(block_id))).map(|_| json_ok())
    }))
}

#[wasm_bindgen]
pub fn delete_wire(wire_id: u32) -> String {
    respond(with_document(|doc| {
        doc.delete_wire(WireId(u64::from(wire_id))).map(|_| json_ok())
    }))
}

/// Snapshot of the current document
#[wasm_bindgen]
pub fn save_document() -> String {
    respond(with_document(|doc| doc.to_json()))
}

/// Replace the current document with a snapshot, keeping its settings
#[wasm_bindgen]
pub fn load_document(snapshot_json: &str) -> String {
    respond(with_document(|doc| {
        Document::from_json(snapshot_json, doc.config().clone()).map(|loaded| {
            *doc = loaded;
            json_ok()
        })
    }))
}

#[wasm_bindgen]
pub fn generate(auxiliary: &str, emit_trace: bool, run_duration: i32) -> String {
    let options = GenerateOptions {
        emit_trace,
        run_duration: i64::from(run_duration),
    };
    match with_document(|doc| doc.generate(auxiliary, &options)) {
        Ok(Ok(program)) => to_json(&ProgramResponse { program }),
        Ok(Err(e)) => {
            let removed_wire = match &e {
                PipelineError::Capability(mismatch) => Some(mismatch.wire.0),
                PipelineError::Unresolved(_) => None,
            };
            to_json(&GenerateErrorResponse {
                error: e.to_string(),
                removed_wire,
            })
        }
        Err(e) => json_err(e),
    }
}

/// Block kinds with their capabilities and declared fields
#[wasm_bindgen]
pub fn get_block_types() -> String {
    let types: Vec<BlockTypeInfo> = BlockKind::ALL
        .iter()
        .map(|kind| {
            let capability = kind.capability();
            BlockTypeInfo {
                kind: *kind,
                name: kind.display_name(),
                supports_output: capability.supports_output,
                supports_input: capability.supports_input,
                fields: kind
                    .fields()
                    .iter()
                    .map(|f| FieldInfo {
                        name: f.name,
                        kind: f.kind,
                        min: f.min,
                        max: f.max,
                    })
                    .collect(),
            }
        })
        .collect();
    to_json(&types)
}
