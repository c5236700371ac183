//! Placement validity checks
//!
//! Pure functions deciding whether a new block rectangle or wire segment may
//! be added to the diagram. Nothing here mutates the collections: a wire
//! check hands back the (possibly retracted) segment for the caller to keep.

use super::{Point, Rect, Segment};
use crate::core::{Block, BlockId, Wire, WireId};

/// Most blocks a single wire may pass through
pub const MAX_BLOCK_CROSSINGS: usize = 2;

/// Why a placement was refused
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementConflict {
    /// Rectangle with no area
    #[error("Block rectangle has no area")]
    DegenerateRect,

    /// Rectangle overlaps an existing block
    #[error("Block would overlap block {0}")]
    BlockOverlap(BlockId),

    /// An existing wire runs through the rectangle
    #[error("Wire {0} passes through the block")]
    WireThroughBlock(WireId),

    /// Wire with zero length, before or after retraction
    #[error("Wire has zero length")]
    ZeroLengthWire,

    /// Both wire ends lie in the same block
    #[error("Wire lies entirely inside block {0}")]
    WireInsideBlock(BlockId),

    /// Wire passes through too many blocks
    #[error("Wire crosses {0} blocks, at most {MAX_BLOCK_CROSSINGS} allowed")]
    TooManyCrossings(usize),

    /// An end is still inside a block once the retraction steps run out
    #[error("Wire end could not be pulled out of block {0}")]
    EndInsideBlock(BlockId),

    /// Wire touches or crosses an existing wire
    #[error("Wire would intersect wire {0}")]
    WireCrossing(WireId),

    /// The document has handed out every id
    #[error("No ids left to assign")]
    IdsExhausted,
}

/// Check whether a block rectangle may be placed
pub fn check_rect_placement(
    candidate: &Rect,
    blocks: &[Block],
    wires: &[Wire],
) -> Result<(), PlacementConflict> {
    if candidate.is_degenerate() {
        return Err(PlacementConflict::DegenerateRect);
    }
    if let Some(block) = blocks.iter().find(|b| candidate.overlaps(&b.rect)) {
        return Err(PlacementConflict::BlockOverlap(block.id));
    }
    if let Some(wire) = wires.iter().find(|w| candidate.crosses_interior(&w.segment)) {
        return Err(PlacementConflict::WireThroughBlock(wire.id));
    }
    Ok(())
}

pub fn rect_placement_valid(candidate: &Rect, blocks: &[Block], wires: &[Wire]) -> bool {
    check_rect_placement(candidate, blocks, wires).is_ok()
}

/// Check whether a wire segment may be placed.
///
/// Endpoints that land strictly inside a block are pulled back along the
/// segment, tail first, in steps of `step_fraction` of the segment length
/// until they sit on or outside the block border. On success the returned
/// segment is the one to store.
pub fn check_segment_placement(
    candidate: &Segment,
    blocks: &[Block],
    wires: &[Wire],
    step_fraction: f64,
) -> Result<Segment, PlacementConflict> {
    if candidate.is_degenerate() {
        return Err(PlacementConflict::ZeroLengthWire);
    }

    if let Some(block) = blocks.iter().find(|b| {
        b.rect.contains_closed(&candidate.tail) && b.rect.contains_closed(&candidate.head)
    }) {
        return Err(PlacementConflict::WireInsideBlock(block.id));
    }

    let crossings = blocks
        .iter()
        .filter(|b| b.rect.crosses_interior(candidate))
        .count();
    if crossings > MAX_BLOCK_CROSSINGS {
        return Err(PlacementConflict::TooManyCrossings(crossings));
    }

    let step = candidate.length() * step_fraction;
    let tail = retract(candidate.tail, candidate.head, step, step_fraction, blocks);
    let head = retract(candidate.head, tail, step, step_fraction, blocks);
    let retracted = Segment::new(tail, head);
    if retracted.is_degenerate() {
        return Err(PlacementConflict::ZeroLengthWire);
    }
    if let Some(block) = blocks
        .iter()
        .find(|b| b.rect.contains_strict(&tail) || b.rect.contains_strict(&head))
    {
        return Err(PlacementConflict::EndInsideBlock(block.id));
    }

    if let Some(wire) = wires.iter().find(|w| retracted.intersects(&w.segment)) {
        return Err(PlacementConflict::WireCrossing(wire.id));
    }

    Ok(retracted)
}

pub fn segment_placement_valid(
    candidate: &Segment,
    blocks: &[Block],
    wires: &[Wire],
    step_fraction: f64,
) -> bool {
    check_segment_placement(candidate, blocks, wires, step_fraction).is_ok()
}

/// Move `point` toward `toward` until no block strictly contains it.
/// Bounded by the number of steps it takes to cover the whole segment.
fn retract(point: Point, toward: Point, step: f64, step_fraction: f64, blocks: &[Block]) -> Point {
    let distance = point.distance(&toward);
    if !(distance > 0.0) || !(step > 0.0) {
        return point;
    }
    let ux = (toward.x - point.x) / distance;
    let uy = (toward.y - point.y) / distance;
    let max_steps = (1.0 / step_fraction).ceil() as usize;

    let mut current = point;
    let mut steps = 0;
    while steps < max_steps && blocks.iter().any(|b| b.rect.contains_strict(&current)) {
        current = Point::new(current.x + ux * step, current.y + uy * step);
        steps += 1;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BlockKind;

    fn block(id: u64, x: f64, y: f64) -> Block {
        Block::new(BlockId(id), BlockKind::Combinational, Rect::new(x, y, 50.0, 50.0))
    }

    fn wire(id: u64, x1: f64, y1: f64, x2: f64, y2: f64) -> Wire {
        Wire::new(WireId(id), Segment::from_coords(x1, y1, x2, y2), 10.0)
    }

    #[test]
    fn test_rect_overlap_rejected() {
        let blocks = vec![block(0, 0.0, 0.0)];
        let candidate = Rect::new(25.0, 25.0, 50.0, 50.0);
        assert_eq!(
            check_rect_placement(&candidate, &blocks, &[]),
            Err(PlacementConflict::BlockOverlap(BlockId(0)))
        );
    }

    #[test]
    fn test_rect_sharing_edge_allowed() {
        let blocks = vec![block(0, 0.0, 0.0)];
        let candidate = Rect::new(50.0, 0.0, 50.0, 50.0);
        assert!(rect_placement_valid(&candidate, &blocks, &[]));
    }

    #[test]
    fn test_rect_over_wire_rejected() {
        let wires = vec![wire(1, 0.0, 25.0, 200.0, 25.0)];
        let candidate = Rect::new(50.0, 0.0, 50.0, 50.0);
        assert_eq!(
            check_rect_placement(&candidate, &[], &wires),
            Err(PlacementConflict::WireThroughBlock(WireId(1)))
        );
    }

    #[test]
    fn test_rect_flush_with_wire_allowed() {
        let wires = vec![wire(1, 0.0, 0.0, 200.0, 0.0)];
        let candidate = Rect::new(50.0, 0.0, 50.0, 50.0);
        assert!(rect_placement_valid(&candidate, &[], &wires));
    }

    #[test]
    fn test_degenerate_rect_rejected() {
        let candidate = Rect::new(0.0, 0.0, 0.0, 10.0);
        assert_eq!(
            check_rect_placement(&candidate, &[], &[]),
            Err(PlacementConflict::DegenerateRect)
        );
    }

    #[test]
    fn test_wire_inside_single_block_rejected() {
        let blocks = vec![block(0, 0.0, 0.0)];
        let candidate = Segment::from_coords(10.0, 10.0, 40.0, 40.0);
        assert_eq!(
            check_segment_placement(&candidate, &blocks, &[], 0.01),
            Err(PlacementConflict::WireInsideBlock(BlockId(0)))
        );
    }

    #[test]
    fn test_zero_length_wire_rejected() {
        let candidate = Segment::from_coords(5.0, 5.0, 5.0, 5.0);
        assert_eq!(
            check_segment_placement(&candidate, &[], &[], 0.01),
            Err(PlacementConflict::ZeroLengthWire)
        );
    }

    #[test]
    fn test_wire_through_three_blocks_rejected() {
        let blocks = vec![block(0, 0.0, 0.0), block(1, 100.0, 0.0), block(2, 200.0, 0.0)];
        let candidate = Segment::from_coords(-10.0, 25.0, 300.0, 25.0);
        assert_eq!(
            check_segment_placement(&candidate, &blocks, &[], 0.01),
            Err(PlacementConflict::TooManyCrossings(3))
        );
    }

    #[test]
    fn test_endpoints_retracted_out_of_blocks() {
        let blocks = vec![block(0, 0.0, 0.0), block(1, 150.0, 0.0)];
        let candidate = Segment::from_coords(25.0, 25.0, 175.0, 25.0);
        let placed = check_segment_placement(&candidate, &blocks, &[], 0.01).unwrap();
        assert!(!blocks[0].rect.contains_strict(&placed.tail));
        assert!(!blocks[1].rect.contains_strict(&placed.head));
        assert!(placed.tail.x >= 50.0 && placed.tail.x < 52.0);
        assert!(placed.head.x <= 150.0 && placed.head.x > 148.0);
        assert_eq!(placed.tail.y, 25.0);
    }

    /// Stepping out of one block straight into its neighbour runs out of steps
    #[test]
    fn test_end_stuck_in_adjacent_block_rejected() {
        let blocks = vec![block(0, 0.0, 0.0), block(1, 50.0, 0.0)];
        let candidate = Segment::from_coords(25.0, 25.0, 75.0, 25.0);
        assert_eq!(
            check_segment_placement(&candidate, &blocks, &[], 0.07),
            Err(PlacementConflict::EndInsideBlock(BlockId(1)))
        );
    }

    #[test]
    fn test_wire_outside_blocks_kept_as_is() {
        let blocks = vec![block(0, 0.0, 0.0)];
        let candidate = Segment::from_coords(60.0, 10.0, 120.0, 10.0);
        assert_eq!(
            check_segment_placement(&candidate, &blocks, &[], 0.01),
            Ok(candidate)
        );
    }

    #[test]
    fn test_crossing_existing_wire_rejected() {
        let wires = vec![wire(3, 50.0, 0.0, 50.0, 100.0)];
        let candidate = Segment::from_coords(0.0, 50.0, 100.0, 50.0);
        assert_eq!(
            check_segment_placement(&candidate, &[], &wires, 0.01),
            Err(PlacementConflict::WireCrossing(WireId(3)))
        );
    }

    #[test]
    fn test_touching_existing_wire_rejected() {
        let wires = vec![wire(3, 0.0, 0.0, 100.0, 0.0)];
        let candidate = Segment::from_coords(100.0, 0.0, 100.0, 100.0);
        assert!(!segment_placement_valid(&candidate, &[], &wires, 0.01));
    }
}
