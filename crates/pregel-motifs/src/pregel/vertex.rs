//! Vertex abstractions for the Pregel runtime
//!
//! A vertex owns a mutable value and an immutable list of outgoing edges.
//! The computation itself lives in a single [`VertexProgram`] shared by every
//! vertex; the runtime calls it once per active vertex per superstep.

use async_trait::async_trait;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use super::aggregator::Aggregator;
use super::error::PregelError;
use super::message::{MessageIter, VertexMessage};

/// Unique identifier for a vertex, assigned at load time
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VertexId(pub u64);

impl VertexId {
    /// Create a new VertexId
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for VertexId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vertex execution state (Pregel's "vote to halt" mechanism)
///
/// - `Active`: Vertex will compute in the next superstep
/// - `Halted`: Vertex has voted to halt (will reactivate on message receipt)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VertexState {
    /// Vertex is active and will compute in next superstep
    #[default]
    Active,
    /// Vertex has voted to halt (will reactivate on message receipt)
    Halted,
}

impl VertexState {
    /// Check if the vertex is active
    pub fn is_active(&self) -> bool {
        matches!(self, VertexState::Active)
    }

    /// Check if the vertex is halted (can be reactivated)
    pub fn is_halted(&self) -> bool {
        matches!(self, VertexState::Halted)
    }
}

/// Outgoing edge with its numeric weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub target: VertexId,
    #[serde(default)]
    pub weight: f64,
}

impl Edge {
    /// Edge with the default weight of 0
    pub fn new(target: impl Into<VertexId>) -> Self {
        Self {
            target: target.into(),
            weight: 0.0,
        }
    }

    pub fn with_weight(target: impl Into<VertexId>, weight: f64) -> Self {
        Self {
            target: target.into(),
            weight,
        }
    }
}

/// Context provided to a vertex during computation
///
/// Provides access to:
/// - The vertex value (read/write) and its outgoing edges
/// - Incoming messages, decoded lazily from the delivered records
/// - Outbox for sending messages
/// - Registered aggregators (contribute now, read the previous superstep's merge)
pub struct ComputeContext<'a, V, M: VertexMessage> {
    /// Current superstep number (0-indexed)
    pub superstep: usize,
    vertex_id: VertexId,
    value: &'a mut V,
    edges: &'a [Edge],
    inbox: &'a [u8],
    aggregators: &'a [Arc<dyn Aggregator>],
    worker: usize,
    /// Outgoing encoded messages (target vertex -> records)
    outbox: HashMap<VertexId, BytesMut>,
    sent: usize,
    _message: PhantomData<M>,
}

impl<'a, V, M: VertexMessage> ComputeContext<'a, V, M> {
    /// Create a new compute context
    pub fn new(
        vertex_id: VertexId,
        superstep: usize,
        value: &'a mut V,
        edges: &'a [Edge],
        inbox: &'a [u8],
        aggregators: &'a [Arc<dyn Aggregator>],
        worker: usize,
    ) -> Self {
        Self {
            superstep,
            vertex_id,
            value,
            edges,
            inbox,
            aggregators,
            worker,
            outbox: HashMap::new(),
            sent: 0,
            _message: PhantomData,
        }
    }

    /// Get the current vertex ID
    pub fn id(&self) -> VertexId {
        self.vertex_id
    }

    pub fn superstep(&self) -> usize {
        self.superstep
    }

    /// Check if this is the first superstep
    pub fn is_first_superstep(&self) -> bool {
        self.superstep == 0
    }

    pub fn value(&self) -> &V {
        &*self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut *self.value
    }

    pub fn out_edges(&self) -> &[Edge] {
        self.edges
    }

    /// Number of complete records in the inbox
    pub fn message_count(&self) -> usize {
        self.inbox.len() / M::WIRE_SIZE
    }

    /// Iterate over the inbound messages, decoding each record
    ///
    /// A record that fails to decode yields `PregelError::MalformedMessage`.
    pub fn messages(&self) -> MessageIter<'a, M> {
        MessageIter::new(self.vertex_id, self.inbox)
    }

    /// Send a message to another vertex
    ///
    /// Messages will be delivered at the start of the next superstep.
    pub fn send_message(&mut self, target: impl Into<VertexId>, message: &M) {
        let buf = self.outbox.entry(target.into()).or_default();
        message.encode(buf);
        self.sent += 1;
    }

    /// Send a message along every outgoing edge of this vertex
    pub fn send_to_all_neighbors(&mut self, message: &M) {
        let edges = self.edges;
        for edge in edges {
            self.send_message(edge.target, message);
        }
    }

    /// Number of messages sent so far in this compute call
    pub fn sent_count(&self) -> usize {
        self.sent
    }

    /// Contribute a value to a registered aggregator for this superstep
    pub fn accumulate(&self, aggregator: usize, value: i64) -> Result<(), PregelError> {
        let agg = self
            .aggregators
            .get(aggregator)
            .ok_or(PregelError::UnknownAggregator(aggregator))?;
        agg.accumulate(self.worker, value);
        Ok(())
    }

    /// Value merged at the end of the previous superstep
    pub fn aggregated(&self, aggregator: usize) -> Result<i64, PregelError> {
        self.aggregators
            .get(aggregator)
            .map(|agg| agg.global())
            .ok_or(PregelError::UnknownAggregator(aggregator))
    }

    /// Consume the context and return the outbox
    pub fn into_outbox(self) -> HashMap<VertexId, BytesMut> {
        self.outbox
    }
}

/// The core trait for Pregel computation
///
/// One program instance is shared by every vertex of the graph. During each
/// superstep the runtime calls `compute` for every active vertex, possibly
/// from several worker tasks at once, so the program itself is immutable and
/// all per-vertex state lives in `Self::Value`.
///
/// # Example
///
/// ```ignore
/// struct MaxValue;
///
/// #[async_trait]
/// impl VertexProgram for MaxValue {
///     type Value = u64;
///     type Message = MaxMessage;
///
///     async fn compute(
///         &self,
///         ctx: &mut ComputeContext<'_, u64, MaxMessage>,
///     ) -> Result<ComputeResult, PregelError> {
///         let mut best = *ctx.value();
///         for msg in ctx.messages() {
///             best = best.max(msg?.0);
///         }
///         if best == *ctx.value() && !ctx.is_first_superstep() {
///             return Ok(ComputeResult::halt());
///         }
///         *ctx.value_mut() = best;
///         ctx.send_to_all_neighbors(&MaxMessage(best));
///         Ok(ComputeResult::active())
///     }
/// }
/// ```
#[async_trait]
pub trait VertexProgram: Send + Sync + 'static {
    /// Per-vertex value persisted across supersteps
    type Value: Clone + Send + Sync + 'static;
    /// Message exchanged between vertices
    type Message: VertexMessage;

    /// Value a vertex holds before superstep 0
    fn initial_value(&self, id: VertexId) -> Self::Value;

    /// Execute the vertex's computation for one superstep
    async fn compute(
        &self,
        ctx: &mut ComputeContext<'_, Self::Value, Self::Message>,
    ) -> Result<ComputeResult, PregelError>;

    /// Called when the vertex receives messages while halted
    ///
    /// By default, returns `Active` to reactivate the vertex.
    fn on_reactivation(&self, _id: VertexId, _pending: usize) -> VertexState {
        VertexState::Active
    }
}

/// Result of a vertex computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeResult {
    /// New vertex state
    pub state: VertexState,
}

impl ComputeResult {
    /// Create a result that keeps the vertex active
    pub fn active() -> Self {
        Self {
            state: VertexState::Active,
        }
    }

    /// Create a result that halts the vertex
    pub fn halt() -> Self {
        Self {
            state: VertexState::Halted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pregel::aggregator::SumAggregator;
    use bytes::{Buf, BufMut};

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(u64);

    impl VertexMessage for Ping {
        const WIRE_SIZE: usize = 8;

        fn encode(&self, buf: &mut BytesMut) {
            buf.put_u64_le(self.0);
        }

        fn decode<B: Buf>(buf: &mut B) -> Result<Self, crate::pregel::DecodeError> {
            Ok(Ping(buf.get_u64_le()))
        }
    }

    // Echoes every received ping along its out-edges, then halts
    struct EchoProgram;

    #[async_trait]
    impl VertexProgram for EchoProgram {
        type Value = u64;
        type Message = Ping;

        fn initial_value(&self, _id: VertexId) -> u64 {
            0
        }

        async fn compute(
            &self,
            ctx: &mut ComputeContext<'_, u64, Ping>,
        ) -> Result<ComputeResult, PregelError> {
            for msg in ctx.messages() {
                let msg = msg?;
                *ctx.value_mut() += msg.0;
                ctx.send_to_all_neighbors(&msg);
            }
            Ok(ComputeResult::halt())
        }
    }

    fn encoded(pings: &[u64]) -> BytesMut {
        let mut buf = BytesMut::new();
        for p in pings {
            Ping(*p).encode(&mut buf);
        }
        buf
    }

    #[test]
    fn test_vertex_id_display_and_order() {
        let a = VertexId::new(3);
        let b = VertexId::from(7u64);
        assert_eq!(a.to_string(), "3");
        assert!(a < b);
        assert_eq!(b.get(), 7);
    }

    #[test]
    fn test_vertex_state_helpers() {
        assert!(VertexState::default().is_active());
        assert!(VertexState::Halted.is_halted());
        assert!(!VertexState::Halted.is_active());
    }

    #[tokio::test]
    async fn test_program_compute_echoes_to_neighbors() {
        let edges = vec![Edge::new(2u64), Edge::new(3u64)];
        let inbox = encoded(&[5, 6]);
        let aggregators: Vec<Arc<dyn Aggregator>> = vec![];
        let mut value = 0u64;

        let mut ctx = ComputeContext::<u64, Ping>::new(
            VertexId::new(1),
            1,
            &mut value,
            &edges,
            &inbox,
            &aggregators,
            0,
        );

        assert_eq!(ctx.message_count(), 2);
        let result = EchoProgram.compute(&mut ctx).await.unwrap();
        assert!(result.state.is_halted());
        assert_eq!(ctx.sent_count(), 4);

        let outbox = ctx.into_outbox();
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.get(&VertexId::new(2)).unwrap().len(), 16);
        assert_eq!(value, 11);
    }

    #[test]
    fn test_compute_context_helpers() {
        let aggregators: Vec<Arc<dyn Aggregator>> = vec![];
        let mut value = 0u64;
        let ctx = ComputeContext::<u64, Ping>::new(
            VertexId::new(9),
            0,
            &mut value,
            &[],
            &[],
            &aggregators,
            0,
        );

        assert!(ctx.is_first_superstep());
        assert_eq!(ctx.message_count(), 0);
        assert_eq!(ctx.id(), VertexId::new(9));
        assert!(ctx.out_edges().is_empty());
    }

    #[test]
    fn test_compute_context_send() {
        let aggregators: Vec<Arc<dyn Aggregator>> = vec![];
        let mut value = 0u64;
        let mut ctx = ComputeContext::<u64, Ping>::new(
            VertexId::new(1),
            1,
            &mut value,
            &[],
            &[],
            &aggregators,
            0,
        );

        for target in [2u64, 3, 4] {
            ctx.send_message(target, &Ping(1));
        }
        ctx.send_message(2u64, &Ping(2));

        let outbox = ctx.into_outbox();
        assert_eq!(outbox.len(), 3);
        assert_eq!(outbox.get(&VertexId::new(2)).unwrap().len(), 16);
    }

    #[test]
    fn test_compute_context_aggregators() {
        let sum = Arc::new(SumAggregator::new(2));
        let aggregators: Vec<Arc<dyn Aggregator>> = vec![sum.clone()];
        let mut value = 0u64;
        let ctx = ComputeContext::<u64, Ping>::new(
            VertexId::new(1),
            1,
            &mut value,
            &[],
            &[],
            &aggregators,
            1,
        );

        ctx.accumulate(0, 4).unwrap();
        // Contribution is not visible until the runtime merges
        assert_eq!(ctx.aggregated(0).unwrap(), 0);
        assert_eq!(sum.merge(), 4);
        assert_eq!(ctx.aggregated(0).unwrap(), 4);

        assert!(matches!(
            ctx.accumulate(3, 1),
            Err(PregelError::UnknownAggregator(3))
        ));
    }
}
