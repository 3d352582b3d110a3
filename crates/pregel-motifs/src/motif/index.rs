//! Neighbor knowledge rebuilt from one superstep's inbound messages
//!
//! The engine only gives a vertex its outgoing edges. Everything it knows
//! about other vertices' edges comes from the announcements delivered this
//! superstep, and is thrown away when the superstep ends.

use std::collections::{BTreeMap, BTreeSet};

use super::codec::{NeighborMessage, NeighborRole};
use crate::pregel::{PregelError, VertexId};

static EMPTY: BTreeSet<VertexId> = BTreeSet::new();

/// Per-superstep index of announced in/out neighbors
///
/// Only vertices named as the origin of some message have entries; a
/// lookup for any other vertex reads as the empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborIndex {
    known_in: BTreeMap<VertexId, BTreeSet<VertexId>>,
    known_out: BTreeMap<VertexId, BTreeSet<VertexId>>,
    /// Every distinct origin, the candidates for pairwise checks
    in_neighbors: BTreeSet<VertexId>,
    /// Every distinct announced neighbor id, re-announced next superstep
    vids: BTreeSet<VertexId>,
    messages: usize,
}

impl NeighborIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from decoded messages, stopping at the first failure
    pub fn try_from_messages<I>(messages: I) -> Result<Self, PregelError>
    where
        I: IntoIterator<Item = Result<NeighborMessage, PregelError>>,
    {
        let mut index = Self::new();
        for message in messages {
            index.insert(&message?);
        }
        Ok(index)
    }

    pub fn insert(&mut self, message: &NeighborMessage) {
        let known = match message.role {
            NeighborRole::In => &mut self.known_in,
            NeighborRole::Out => &mut self.known_out,
        };
        known.entry(message.origin).or_default().insert(message.neighbor);
        self.in_neighbors.insert(message.origin);
        self.vids.insert(message.neighbor);
        self.messages += 1;
    }

    /// Announced in-neighbors of `vertex`
    pub fn known_in(&self, vertex: VertexId) -> &BTreeSet<VertexId> {
        self.known_in.get(&vertex).unwrap_or(&EMPTY)
    }

    /// Announced out-neighbors of `vertex`
    pub fn known_out(&self, vertex: VertexId) -> &BTreeSet<VertexId> {
        self.known_out.get(&vertex).unwrap_or(&EMPTY)
    }

    pub fn in_neighbors(&self) -> &BTreeSet<VertexId> {
        &self.in_neighbors
    }

    pub fn vids(&self) -> &BTreeSet<VertexId> {
        &self.vids
    }

    /// Number of messages folded in, duplicates included
    pub fn message_count(&self) -> usize {
        self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages == 0
    }
}

impl Extend<NeighborMessage> for NeighborIndex {
    fn extend<T: IntoIterator<Item = NeighborMessage>>(&mut self, iter: T) {
        for message in iter {
            self.insert(&message);
        }
    }
}

impl FromIterator<NeighborMessage> for NeighborIndex {
    fn from_iter<T: IntoIterator<Item = NeighborMessage>>(iter: T) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: u64) -> VertexId {
        VertexId::new(id)
    }

    fn set(ids: &[u64]) -> BTreeSet<VertexId> {
        ids.iter().copied().map(VertexId::new).collect()
    }

    #[test]
    fn test_build_from_messages() {
        let index: NeighborIndex = [
            NeighborMessage::out_neighbor(1u64, 2u64),
            NeighborMessage::out_neighbor(1u64, 3u64),
            NeighborMessage::in_neighbor(1u64, 4u64),
            NeighborMessage::in_neighbor(5u64, 1u64),
        ]
        .into_iter()
        .collect();

        assert_eq!(index.known_out(v(1)), &set(&[2, 3]));
        assert_eq!(index.known_in(v(1)), &set(&[4]));
        assert_eq!(index.known_in(v(5)), &set(&[1]));
        assert_eq!(index.in_neighbors(), &set(&[1, 5]));
        assert_eq!(index.vids(), &set(&[1, 2, 3, 4]));
        assert_eq!(index.message_count(), 4);
    }

    #[test]
    fn test_absent_vertex_reads_empty() {
        let index = NeighborIndex::new();
        assert!(index.known_out(v(42)).is_empty());
        assert!(index.known_in(v(42)).is_empty());
        assert!(!index.in_neighbors().contains(&v(42)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let msg = NeighborMessage::out_neighbor(7u64, 8u64);
        let index: NeighborIndex = std::iter::repeat(msg).take(3).collect();

        assert_eq!(index.known_out(v(7)).len(), 1);
        assert_eq!(index.in_neighbors().len(), 1);
        assert_eq!(index.message_count(), 3);
    }

    #[test]
    fn test_order_does_not_matter() {
        let messages = vec![
            NeighborMessage::out_neighbor(1u64, 2u64),
            NeighborMessage::in_neighbor(3u64, 1u64),
            NeighborMessage::out_neighbor(3u64, 2u64),
        ];
        let forward: NeighborIndex = messages.iter().copied().collect();
        let backward: NeighborIndex = messages.iter().rev().copied().collect();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_try_from_messages_stops_on_error() {
        let messages = vec![
            Ok(NeighborMessage::out_neighbor(1u64, 2u64)),
            Err(PregelError::malformed_message(v(9), "invalid role tag: 3")),
            Ok(NeighborMessage::out_neighbor(1u64, 3u64)),
        ];
        let err = NeighborIndex::try_from_messages(messages).unwrap_err();
        assert!(matches!(err, PregelError::MalformedMessage { .. }));
    }
}
