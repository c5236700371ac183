//! Connectivity resolution
//!
//! Turns drawn coordinates into references. Each wire end is matched to the
//! nearest block corner or opposite wire end, then chains of wires are
//! collapsed so every wire start names the block that ultimately drives it.

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::core::config::DEFAULT_PROXIMITY_THRESHOLD;
use crate::core::{Block, Endpoint, ResolvedEdge, Wire, WireEnd, WireId};

/// Resolution failures. Nothing is committed when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnresolvedConnection {
    /// No block or other wire to match against
    #[error("Wire {wire} {end} has nothing to connect to")]
    NoCandidate { wire: WireId, end: WireEnd },

    /// The nearest candidate is beyond the proximity threshold
    #[error("Wire {wire} {end} is {distance:.1} away from the nearest connection (limit {threshold})")]
    TooFar {
        wire: WireId,
        end: WireEnd,
        distance: f64,
        threshold: f64,
    },

    /// Following wire starts leads back to a wire already visited
    #[error("Wire {wire} is part of a cycle: {chain:?}")]
    Cycle { wire: WireId, chain: Vec<WireId> },

    /// A wire start names a wire that does not exist
    #[error("Wire {wire} refers to missing wire {missing}")]
    Dangling { wire: WireId, missing: WireId },
}

/// Resolved endpoints for one wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub wire: WireId,
    pub start: Endpoint,
    pub end: Endpoint,
}

/// Outcome of a successful resolution, not yet applied to the wires
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    links: Vec<Link>,
}

impl Resolution {
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn start_of(&self, wire: WireId) -> Option<Endpoint> {
        self.link(wire).map(|l| l.start)
    }

    pub fn end_of(&self, wire: WireId) -> Option<Endpoint> {
        self.link(wire).map(|l| l.end)
    }

    /// Commit to the wires: every endpoint is reset, then start and end are
    /// attached in that order. Wires without a link are left detached.
    pub fn apply(&self, wires: &mut [Wire]) {
        for wire in wires.iter_mut() {
            wire.detach_all();
            if let Some(link) = self.link(wire.id) {
                wire.attach(link.start);
                wire.attach(link.end);
            }
        }
    }

    fn link(&self, wire: WireId) -> Option<&Link> {
        self.links.iter().find(|l| l.wire == wire)
    }
}

/// Nearest-endpoint matcher with a single proximity threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityResolver {
    threshold: f64,
}

impl Default for ConnectivityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_THRESHOLD)
    }
}

impl ConnectivityResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Resolve every wire in `wires`. Pure: the wires are not touched.
    pub fn resolve(
        &self,
        blocks: &[Block],
        wires: &[Wire],
    ) -> Result<Resolution, UnresolvedConnection> {
        let mut provisional = Vec::with_capacity(wires.len());
        for wire in wires {
            let start = self.nearest(wire, WireEnd::Tail, blocks, wires)?;
            let end = self.nearest(wire, WireEnd::Head, blocks, wires)?;
            provisional.push(Link {
                wire: wire.id,
                start,
                end,
            });
        }
        let links = collapse_chains(&provisional)?;
        Ok(Resolution { links })
    }

    /// Closest candidate for one physical end of `wire`. Block corners come
    /// first, then the opposite ends of the other wires; ties keep the first.
    fn nearest(
        &self,
        wire: &Wire,
        end: WireEnd,
        blocks: &[Block],
        wires: &[Wire],
    ) -> Result<Endpoint, UnresolvedConnection> {
        let point = match end {
            WireEnd::Tail => wire.tail(),
            WireEnd::Head => wire.tip(),
        };

        let corners = blocks
            .iter()
            .flat_map(|b| b.rect.corners().into_iter().map(move |c| (Endpoint::Block(b.id), c)));
        let wire_ends = wires.iter().filter(|o| o.id != wire.id).map(|o| {
            let opposite = match end {
                WireEnd::Tail => o.tip(),
                WireEnd::Head => o.tail(),
            };
            (Endpoint::Wire(o.id), opposite)
        });

        let mut best: Option<(Endpoint, f64)> = None;
        for (candidate, at) in corners.chain(wire_ends) {
            let distance = point.distance(&at);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((candidate, distance));
            }
        }

        match best {
            None => Err(UnresolvedConnection::NoCandidate { wire: wire.id, end }),
            Some((_, distance)) if distance > self.threshold => Err(UnresolvedConnection::TooFar {
                wire: wire.id,
                end,
                distance,
                threshold: self.threshold,
            }),
            Some((candidate, distance)) => {
                debug!(
                    "Wire {} {} at ({}, {}) matched {} ({:.2} away)",
                    wire.id, end, point.x, point.y, candidate, distance
                );
                Ok(candidate)
            }
        }
    }
}

/// Rewrite each start that names a wire with the block at the far end of
/// the chain. A chain that revisits a wire is a cycle.
pub fn collapse_chains(links: &[Link]) -> Result<Vec<Link>, UnresolvedConnection> {
    let starts: HashMap<WireId, Endpoint> = links.iter().map(|l| (l.wire, l.start)).collect();

    links
        .iter()
        .map(|link| {
            let mut current = link.start;
            let mut chain = vec![link.wire];
            let mut visited = HashSet::from([link.wire]);
            while let Endpoint::Wire(next) = current {
                if !visited.insert(next) {
                    chain.push(next);
                    return Err(UnresolvedConnection::Cycle {
                        wire: link.wire,
                        chain,
                    });
                }
                chain.push(next);
                current = *starts.get(&next).ok_or(UnresolvedConnection::Dangling {
                    wire: link.wire,
                    missing: next,
                })?;
            }
            if chain.len() > 1 {
                debug!("Collapsed chain {:?} to {}", chain, current);
            }
            Ok(Link {
                start: current,
                ..*link
            })
        })
        .collect()
}

/// Edges for wires whose start and end are both blocks, in wire order
pub fn resolved_edges(wires: &[Wire]) -> Vec<ResolvedEdge> {
    wires.iter().filter_map(ResolvedEdge::from_wire).collect()
}
