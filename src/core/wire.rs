//! Wires and endpoint references
//!
//! A wire is a directed segment drawn from a tail to an arrowhead tip. Its
//! `start` and `end` references stay unresolved until the connectivity
//! resolver matches each physical end to a block corner or to another wire.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{BlockId, WireId};
use crate::geometry::{Point, Segment};

/// Bit-slice text of a wire that has none set
pub const UNSET_SLICE: &str = "--";

/// What a wire end refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Block(BlockId),
    Wire(WireId),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Block(id) => write!(f, "block {}", id),
            Endpoint::Wire(id) => write!(f, "wire {}", id),
        }
    }
}

/// Physical end of a wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireEnd {
    Tail,
    Head,
}

impl fmt::Display for WireEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireEnd::Tail => f.write_str("tail"),
            WireEnd::Head => f.write_str("head"),
        }
    }
}

/// Output bit range, LSB inclusive and MSB exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitSlice {
    pub lsb: i64,
    pub msb: i64,
}

/// Triangle drawn at the head of a wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arrowhead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

impl Arrowhead {
    /// Arrowhead at the segment head, barbs `length` back at 30 degrees either side
    pub fn for_segment(segment: &Segment, length: f64) -> Self {
        let angle = segment.dy().atan2(segment.dx());
        let spread = std::f64::consts::FRAC_PI_6;
        let tip = segment.head;
        let barb = |a: f64| Point::new(tip.x - length * a.cos(), tip.y - length * a.sin());
        Self {
            tip,
            left: barb(angle - spread),
            right: barb(angle + spread),
        }
    }
}

/// A placed wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: WireId,
    pub segment: Segment,
    pub arrowhead: Arrowhead,
    /// Least significant bit, inclusive
    pub lsb: String,
    /// Most significant bit, exclusive
    pub msb: String,
    /// Drives the clock pin of a state machine
    pub clock_line: bool,
    #[serde(skip)]
    start: Option<Endpoint>,
    #[serde(skip)]
    end: Option<Endpoint>,
}

impl Wire {
    pub fn new(id: WireId, segment: Segment, arrow_length: f64) -> Self {
        Self {
            id,
            segment,
            arrowhead: Arrowhead::for_segment(&segment, arrow_length),
            lsb: UNSET_SLICE.to_string(),
            msb: UNSET_SLICE.to_string(),
            clock_line: false,
            start: None,
            end: None,
        }
    }

    pub fn tail(&self) -> Point {
        self.segment.tail
    }

    /// Arrowhead tip, which is also the segment head
    pub fn tip(&self) -> Point {
        self.arrowhead.tip
    }

    pub fn start(&self) -> Option<Endpoint> {
        self.start
    }

    pub fn end(&self) -> Option<Endpoint> {
        self.end
    }

    /// Attach an endpoint: the start if it is still open, otherwise the end
    pub fn attach(&mut self, endpoint: Endpoint) {
        if self.start.is_none() {
            self.start = Some(endpoint);
        } else {
            self.end = Some(endpoint);
        }
    }

    pub fn detach_all(&mut self) {
        self.start = None;
        self.end = None;
    }

    /// Drop any reference to `target`. Returns true if something was cleared.
    pub fn clear_references_to(&mut self, target: Endpoint) -> bool {
        let mut cleared = false;
        if self.start == Some(target) {
            self.start = None;
            cleared = true;
        }
        if self.end == Some(target) {
            self.end = None;
            cleared = true;
        }
        cleared
    }

    /// Both ends resolved to blocks
    pub fn terminals(&self) -> Option<(BlockId, BlockId)> {
        match (self.start, self.end) {
            (Some(Endpoint::Block(source)), Some(Endpoint::Block(sink))) => Some((source, sink)),
            _ => None,
        }
    }

    /// The bit slice, when both bounds parse as integers
    pub fn bit_slice(&self) -> Option<BitSlice> {
        let lsb = self.lsb.parse().ok()?;
        let msb = self.msb.parse().ok()?;
        Some(BitSlice { lsb, msb })
    }

    pub fn set_bit_slice(&mut self, lsb: impl Into<String>, msb: impl Into<String>) {
        self.lsb = lsb.into();
        self.msb = msb.into();
    }
}

/// A wire collapsed to its two terminal blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEdge {
    pub wire: WireId,
    pub source: BlockId,
    pub sink: BlockId,
    pub bit_slice: Option<BitSlice>,
    pub clock_line: bool,
}

impl ResolvedEdge {
    /// Edge for a wire whose start and end are both blocks
    pub fn from_wire(wire: &Wire) -> Option<Self> {
        let (source, sink) = wire.terminals()?;
        Some(Self {
            wire: wire.id,
            source,
            sink,
            bit_slice: wire.bit_slice(),
            clock_line: wire.clock_line,
        })
    }
}
