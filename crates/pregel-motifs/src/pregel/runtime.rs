//! Pregel Runtime - Core execution engine for vertex programs
//!
//! The runtime executes a vertex program through synchronized supersteps.
//! Each superstep follows the sequence: Deliver → Compute → Merge → Route.
//! Vertices are partitioned over the configured workers and every worker
//! partition runs as one tokio task; the join of all tasks is the barrier.

use bytes::BytesMut;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::aggregator::Aggregator;
use super::config::PregelConfig;
use super::error::PregelError;
use super::message::VertexMessage;
use super::vertex::{ComputeContext, Edge, VertexId, VertexProgram, VertexState};

/// Result of a job execution
#[derive(Debug, Clone)]
pub struct JobResult<V> {
    /// Identifier used in logs for this run
    pub job_id: String,
    /// Number of supersteps executed
    pub supersteps: usize,
    /// Whether every vertex halted with no messages in flight
    pub converged: bool,
    /// Final value of every vertex, ordered by id
    pub values: BTreeMap<VertexId, V>,
    /// Final states of all vertices
    pub vertex_states: BTreeMap<VertexId, VertexState>,
    /// Global value of each aggregator after the last merge
    pub aggregates: Vec<i64>,
    /// Total messages delivered over the run
    pub messages_routed: u64,
}

/// Per-superstep counters, logged at DEBUG
#[derive(Debug, Clone, Copy, Default)]
pub struct SuperstepStats {
    pub computed: usize,
    pub halted: usize,
    pub messages_routed: u64,
    pub messages_dropped: u64,
}

/// Storage for one vertex owned by a worker
struct VertexSlot<V> {
    id: VertexId,
    value: V,
    edges: Vec<Edge>,
    state: VertexState,
    /// Records being consumed in the current superstep
    inbox: BytesMut,
    /// Records routed during the current superstep, delivered next superstep
    pending: BytesMut,
}

/// The vertices owned by one worker
struct Partition<V> {
    slots: Vec<VertexSlot<V>>,
    index: HashMap<VertexId, usize>,
}

impl<V> Default for Partition<V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }
}

/// What a worker task hands back at the barrier
struct WorkerOutput<V> {
    worker: usize,
    partition: Partition<V>,
    outcome: Result<WorkerReport, PregelError>,
}

#[derive(Default)]
struct WorkerReport {
    computed: usize,
    halted: usize,
    outbox: Vec<(VertexId, BytesMut)>,
}

/// Pregel Runtime for executing a vertex program over a graph
///
/// Manages the execution of vertices through synchronized supersteps,
/// handling message passing, aggregation, and termination detection.
pub struct PregelRuntime<P: VertexProgram> {
    /// Configuration for the runtime
    config: PregelConfig,
    /// The program every vertex runs
    program: Arc<P>,
    /// One partition per configured worker
    partitions: Vec<Partition<P::Value>>,
    /// Registered aggregators, addressed by index
    aggregators: Vec<Arc<dyn Aggregator>>,
    edge_count: usize,
    /// Unique identifier for this job instance (used in logs)
    job_id: String,
}

impl<P: VertexProgram> PregelRuntime<P> {
    /// Create a new runtime with default configuration
    pub fn new(program: P) -> Self {
        let config = PregelConfig::default();
        let partitions = (0..config.worker_count()).map(|_| Partition::default()).collect();
        Self {
            config,
            program: Arc::new(program),
            partitions,
            aggregators: Vec::new(),
            edge_count: 0,
            job_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(program: P, config: PregelConfig) -> Result<Self, PregelError> {
        config.validate()?;
        let partitions = (0..config.worker_count()).map(|_| Partition::default()).collect();
        Ok(Self {
            config,
            program: Arc::new(program),
            partitions,
            aggregators: Vec::new(),
            edge_count: 0,
            job_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Get the job ID
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Get the configuration
    pub fn config(&self) -> &PregelConfig {
        &self.config
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    /// Register an aggregator and return its index
    pub fn register_aggregator(&mut self, aggregator: Arc<dyn Aggregator>) -> usize {
        self.aggregators.push(aggregator);
        self.aggregators.len() - 1
    }

    fn worker_of(&self, id: VertexId) -> usize {
        (id.get() % self.partitions.len() as u64) as usize
    }

    /// Add a vertex with its outgoing edges
    ///
    /// Re-adding an existing vertex replaces its edges; its value is kept.
    pub fn add_vertex(&mut self, id: impl Into<VertexId>, edges: Vec<Edge>) -> &mut Self {
        let id = id.into();
        let worker = self.worker_of(id);
        self.edge_count += edges.len();

        let partition = &mut self.partitions[worker];
        if let Some(&pos) = partition.index.get(&id) {
            let slot = &mut partition.slots[pos];
            self.edge_count -= slot.edges.len();
            tracing::warn!(vertex = %id, "Vertex added twice, replacing its edges");
            slot.edges = edges;
            return self;
        }

        let value = self.program.initial_value(id);
        partition.index.insert(id, partition.slots.len());
        partition.slots.push(VertexSlot {
            id,
            value,
            edges,
            state: VertexState::Active,
            inbox: BytesMut::new(),
            pending: BytesMut::new(),
        });
        self
    }

    /// Add an edge, creating either endpoint as needed
    pub fn add_edge(
        &mut self,
        from: impl Into<VertexId>,
        to: impl Into<VertexId>,
        weight: f64,
    ) -> &mut Self {
        let from = from.into();
        let to = to.into();
        if !self.contains_vertex(to) {
            self.add_vertex(to, Vec::new());
        }
        if !self.contains_vertex(from) {
            self.add_vertex(from, Vec::new());
        }
        let worker = self.worker_of(from);
        let partition = &mut self.partitions[worker];
        if let Some(&pos) = partition.index.get(&from) {
            partition.slots[pos].edges.push(Edge::with_weight(to, weight));
            self.edge_count += 1;
        }
        self
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.partitions[self.worker_of(id)].index.contains_key(&id)
    }

    pub fn vertex_count(&self) -> usize {
        self.partitions.iter().map(|p| p.slots.len()).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Current value of a vertex
    pub fn value(&self, id: VertexId) -> Option<&P::Value> {
        let partition = &self.partitions[self.worker_of(id)];
        partition.index.get(&id).map(|&pos| &partition.slots[pos].value)
    }

    /// Current state of a vertex
    pub fn vertex_state(&self, id: VertexId) -> Option<VertexState> {
        let partition = &self.partitions[self.worker_of(id)];
        partition.index.get(&id).map(|&pos| partition.slots[pos].state)
    }

    /// Run the job to completion
    ///
    /// Enforces the configured `job_timeout` - if the job takes longer
    /// than this duration, it will return a `JobTimeout` error. Worker tasks
    /// still running at that point are aborted and the partitions they held
    /// are lost, so the runtime must not be run again after a timeout.
    pub async fn run(&mut self) -> Result<JobResult<P::Value>, PregelError> {
        let job_timeout = self.config.job_timeout;

        match timeout(job_timeout, self.run_inner()).await {
            Ok(result) => result,
            Err(_) => Err(PregelError::JobTimeout(job_timeout)),
        }
    }

    /// Internal run loop (extracted for timeout wrapping)
    async fn run_inner(&mut self) -> Result<JobResult<P::Value>, PregelError> {
        for aggregator in &self.aggregators {
            aggregator.init();
        }

        tracing::info!(
            job_id = %self.job_id,
            vertices = self.vertex_count(),
            edges = self.edge_count,
            workers = self.partitions.len(),
            aggregators = self.aggregators.len(),
            "Job starting"
        );

        let mut superstep = 0;
        let mut messages_routed = 0u64;

        loop {
            // Check if the job should terminate
            if self.should_terminate() {
                tracing::info!(
                    job_id = %self.job_id,
                    supersteps = superstep,
                    messages_routed,
                    "Job converged"
                );
                return Ok(self.collect_result(superstep, messages_routed));
            }

            // Check max supersteps limit
            if superstep >= self.config.max_supersteps {
                tracing::warn!(
                    job_id = %self.job_id,
                    supersteps = superstep,
                    "Superstep limit reached before convergence"
                );
                return Err(PregelError::MaxSuperstepsExceeded(superstep));
            }

            // Execute one superstep
            let stats = self.execute_superstep(superstep).await?;
            messages_routed += stats.messages_routed;

            if self.config.tracing_enabled {
                tracing::debug!(
                    job_id = %self.job_id,
                    superstep,
                    computed = stats.computed,
                    halted = stats.halted,
                    messages = stats.messages_routed,
                    dropped = stats.messages_dropped,
                    aggregates = ?self.aggregators.iter().map(|a| a.global()).collect::<Vec<_>>(),
                    "Superstep complete"
                );
            }

            superstep += 1;
        }
    }

    /// Check if the job should terminate
    ///
    /// All vertices halted AND no pending messages.
    pub(crate) fn should_terminate(&self) -> bool {
        self.partitions.iter().flat_map(|p| &p.slots).all(|slot| {
            !slot.state.is_active() && slot.pending.is_empty()
        })
    }

    /// Execute a single superstep
    pub(crate) async fn execute_superstep(
        &mut self,
        superstep: usize,
    ) -> Result<SuperstepStats, PregelError> {
        // 1. Deliver messages and reactivate halted vertices that received some
        self.deliver_messages();

        // 2. Compute every partition in parallel; joining all tasks is the barrier
        let reports = self.compute_partitions(superstep).await?;

        // 3. Merge aggregator partials; visible to vertices from the next superstep
        for aggregator in &self.aggregators {
            aggregator.merge();
        }

        // 4. Route outboxes into the target vertices' pending buffers
        let mut stats = SuperstepStats::default();
        for report in reports {
            stats.computed += report.computed;
            stats.halted += report.halted;
            for (target, records) in report.outbox {
                let count = (records.len() / <P::Message as VertexMessage>::WIRE_SIZE) as u64;
                if self.route(target, &records) {
                    stats.messages_routed += count;
                } else {
                    stats.messages_dropped += count;
                }
            }
        }

        Ok(stats)
    }

    /// Move pending records to vertex inboxes
    fn deliver_messages(&mut self) {
        let program = &self.program;
        let wire = <P::Message as VertexMessage>::WIRE_SIZE;
        for slot in self.partitions.iter_mut().flat_map(|p| p.slots.iter_mut()) {
            slot.inbox = std::mem::take(&mut slot.pending);
            if slot.state.is_halted() && !slot.inbox.is_empty() {
                slot.state = program.on_reactivation(slot.id, slot.inbox.len() / wire);
            }
        }
    }

    /// Compute all worker partitions, at most `parallelism` at a time
    async fn compute_partitions(
        &mut self,
        superstep: usize,
    ) -> Result<Vec<WorkerReport>, PregelError> {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let aggregators: Arc<[Arc<dyn Aggregator>]> = self.aggregators.clone().into();
        let mut tasks = WorkerTasks(Vec::with_capacity(self.partitions.len()));

        for (worker, partition) in self.partitions.iter_mut().enumerate() {
            let partition = std::mem::take(partition);
            let program = Arc::clone(&self.program);
            let aggregators = Arc::clone(&aggregators);
            let sem_clone = Arc::clone(&semaphore);

            let handle = tokio::spawn(async move {
                // Acquire semaphore permit for parallelism control
                let _permit = sem_clone.acquire_owned().await;
                compute_partition(worker, partition, program, aggregators, superstep).await
            });
            tasks.0.push((worker, handle));
        }

        // Every partition is put back before any error is surfaced
        let mut reports = Vec::with_capacity(tasks.0.len());
        let mut first_error = None;
        for (worker, handle) in tasks.0.iter_mut() {
            match handle.await {
                Ok(output) => {
                    self.partitions[output.worker] = output.partition;
                    match output.outcome {
                        Ok(report) => reports.push(report),
                        Err(e) => {
                            first_error.get_or_insert(e);
                        }
                    }
                }
                Err(e) => {
                    first_error.get_or_insert(PregelError::WorkerJoin {
                        worker: *worker,
                        message: e.to_string(),
                    });
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }

    /// Append records to the target's pending buffer; false if the target is unknown
    fn route(&mut self, target: VertexId, records: &[u8]) -> bool {
        let worker = self.worker_of(target);
        let partition = &mut self.partitions[worker];
        match partition.index.get(&target) {
            Some(&pos) => {
                partition.slots[pos].pending.extend_from_slice(records);
                true
            }
            None => {
                tracing::warn!(target = %target, "Dropping messages for unknown vertex");
                false
            }
        }
    }

    fn collect_result(&self, supersteps: usize, messages_routed: u64) -> JobResult<P::Value> {
        let slots = self.partitions.iter().flat_map(|p| &p.slots);
        JobResult {
            job_id: self.job_id.clone(),
            supersteps,
            converged: true,
            values: slots.clone().map(|s| (s.id, s.value.clone())).collect(),
            vertex_states: slots.map(|s| (s.id, s.state)).collect(),
            aggregates: self.aggregators.iter().map(|a| a.global()).collect(),
            messages_routed,
        }
    }
}

/// Partition tasks of one superstep; any still running when this is dropped
/// (the job timed out mid-superstep) are aborted
struct WorkerTasks<V>(Vec<(usize, JoinHandle<WorkerOutput<V>>)>);

impl<V> Drop for WorkerTasks<V> {
    fn drop(&mut self) {
        for (_, handle) in &self.0 {
            handle.abort();
        }
    }
}

/// Run every active vertex of one partition for one superstep
async fn compute_partition<P: VertexProgram>(
    worker: usize,
    mut partition: Partition<P::Value>,
    program: Arc<P>,
    aggregators: Arc<[Arc<dyn Aggregator>]>,
    superstep: usize,
) -> WorkerOutput<P::Value> {
    let mut report = WorkerReport::default();
    let mut outboxes: HashMap<VertexId, BytesMut> = HashMap::new();

    for slot in partition.slots.iter_mut() {
        if !slot.state.is_active() {
            slot.inbox.clear();
            continue;
        }

        let VertexSlot {
            id,
            value,
            edges,
            state,
            inbox,
            ..
        } = slot;

        let mut ctx =
            ComputeContext::new(*id, superstep, value, edges, inbox, &aggregators, worker);
        let result = program.compute(&mut ctx).await;
        let outbox = ctx.into_outbox();
        inbox.clear();

        match result {
            Ok(result) => {
                report.computed += 1;
                if result.state.is_halted() {
                    report.halted += 1;
                }
                *state = result.state;
                for (target, records) in outbox {
                    outboxes.entry(target).or_default().extend_from_slice(&records);
                }
            }
            Err(e) => {
                return WorkerOutput {
                    worker,
                    partition,
                    outcome: Err(e),
                };
            }
        }
    }

    report.outbox = outboxes.into_iter().collect();
    WorkerOutput {
        worker,
        partition,
        outcome: Ok(report),
    }
}
