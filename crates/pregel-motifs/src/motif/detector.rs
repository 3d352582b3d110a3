//! Local pattern detection over one superstep's neighbor index

use super::counter::Counter;
use super::index::NeighborIndex;
use crate::pregel::VertexId;

/// Count mutual pairs, shared successors and 2-hop return paths
///
/// `successors` are the targets of this vertex's own outgoing edges, one
/// entry per edge. The result is a fresh snapshot; callers replace the
/// stored counter with it.
pub fn detect_patterns(index: &NeighborIndex, successors: &[VertexId]) -> Counter {
    let candidates: Vec<VertexId> = index.in_neighbors().iter().copied().collect();
    let mut counter = Counter::default();

    // Each unordered pair once: (candidates[i], candidates[j]) with i < j
    for (i, &a) in candidates.iter().enumerate() {
        let a_out = index.known_out(a);
        for &b in &candidates[i + 1..] {
            if a_out.contains(&b) {
                counter.incoming += 1;
                counter.outgoing += 1;
            }
            if index.known_out(b).contains(&a) {
                counter.incoming += 1;
                counter.outgoing += 1;
            }
        }
    }

    for &a in &candidates {
        let a_out = index.known_out(a);
        let a_in = index.known_in(a);
        for target in successors {
            if a_out.contains(target) {
                counter.through += 1;
            } else if a_in.contains(target) {
                counter.cycle += 1;
            }
        }
    }

    counter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motif::codec::NeighborMessage;

    fn ids(raw: &[u64]) -> Vec<VertexId> {
        raw.iter().copied().map(VertexId::new).collect()
    }

    #[test]
    fn test_empty_index_counts_nothing() {
        let counter = detect_patterns(&NeighborIndex::new(), &ids(&[1, 2, 3]));
        assert!(counter.is_zero());
    }

    #[test]
    fn test_mutual_pair_counts_twice() {
        let index: NeighborIndex = [
            NeighborMessage::out_neighbor(1u64, 2u64),
            NeighborMessage::out_neighbor(2u64, 1u64),
        ]
        .into_iter()
        .collect();

        let counter = detect_patterns(&index, &[]);
        assert_eq!(counter, Counter::new(2, 2, 0, 0));
    }

    #[test]
    fn test_one_directional_pair_counts_once() {
        let index: NeighborIndex = [
            NeighborMessage::out_neighbor(1u64, 2u64),
            NeighborMessage::out_neighbor(2u64, 9u64),
        ]
        .into_iter()
        .collect();

        let counter = detect_patterns(&index, &[]);
        assert_eq!(counter, Counter::new(1, 1, 0, 0));
    }

    #[test]
    fn test_independent_candidates_count_nothing() {
        let index: NeighborIndex = [
            NeighborMessage::out_neighbor(1u64, 5u64),
            NeighborMessage::out_neighbor(2u64, 6u64),
            NeighborMessage::out_neighbor(3u64, 7u64),
        ]
        .into_iter()
        .collect();

        assert!(detect_patterns(&index, &[]).is_zero());
    }

    #[test]
    fn test_each_unordered_pair_visited_once() {
        // Complete directed graph on three candidates: 3 pairs, both directions
        let mut messages = Vec::new();
        for a in 1..=3u64 {
            for b in 1..=3u64 {
                if a != b {
                    messages.push(NeighborMessage::out_neighbor(a, b));
                }
            }
        }
        let index: NeighborIndex = messages.into_iter().collect();

        let counter = detect_patterns(&index, &[]);
        assert_eq!(counter.incoming, 6);
        assert_eq!(counter.outgoing, 6);
    }

    #[test]
    fn test_shared_successor_is_through() {
        // A announces it points at T, and so do we
        let index: NeighborIndex = [
            NeighborMessage::out_neighbor(1u64, 7u64),
            NeighborMessage::in_neighbor(1u64, 7u64),
        ]
        .into_iter()
        .collect();

        let counter = detect_patterns(&index, &ids(&[7]));
        assert_eq!(counter.through, 1);
        // else-if: the in-neighbor match is not counted as well
        assert_eq!(counter.cycle, 0);
    }

    #[test]
    fn test_return_path_is_cycle() {
        let index: NeighborIndex = [NeighborMessage::in_neighbor(1u64, 7u64)]
            .into_iter()
            .collect();

        let counter = detect_patterns(&index, &ids(&[7]));
        assert_eq!(counter.through, 0);
        assert_eq!(counter.cycle, 1);
    }

    #[test]
    fn test_counts_per_candidate_and_edge() {
        let index: NeighborIndex = [
            NeighborMessage::out_neighbor(1u64, 7u64),
            NeighborMessage::out_neighbor(1u64, 8u64),
            NeighborMessage::out_neighbor(2u64, 7u64),
            NeighborMessage::in_neighbor(2u64, 8u64),
        ]
        .into_iter()
        .collect();

        let counter = detect_patterns(&index, &ids(&[7, 8, 9]));
        assert_eq!(counter.through, 3);
        assert_eq!(counter.cycle, 1);
        assert_eq!(counter.incoming, 0);
    }
}
