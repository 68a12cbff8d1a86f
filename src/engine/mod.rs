/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The engine coordinator.
//!
//! A [`GraphEngine`] owns the vertex states, the index and the worker pool,
//! and drives the outer iteration loop: `Idle → Starting → Level(k) →
//! Barrier → {Level(k + 1) | Complete}`. A `start` variant seeds the level-0
//! frontier and spawns the workers;
//! [`wait_for_complete`](GraphEngine::wait_for_complete) joins them and
//! returns the typed outcome.

pub mod context;
pub mod dispatcher;
pub mod frontier;
pub mod message;
pub mod store;
pub mod trace;
mod worker;

use crate::config::GraphConfig;
use crate::error::{EngineError, RunOutcome};
use crate::graph::header::GraphHeader;
use crate::graph::index::GraphIndex;
use crate::graph::{EdgeKind, VertexId};
use crate::io::{FileIoFactory, IoFactory, MmapIoFactory};
use crate::traits::{QueryContext, VertexAlgorithm, VertexQuery, VertexScheduler};
use self::dispatcher::{IoDispatcher, SubmitQueue};
use self::frontier::Frontier;
use self::message::build_grid;
use self::store::{Partitioner, VertexStore};
use self::trace::TraceLogger;
use self::worker::{RunShared, Worker};
use anyhow::{ensure, Context, Result};
use dsi_progress_logger::{progress_logger, ProgressLog};
use rayon::prelude::*;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread::JoinHandle;

/// Cancels a run cooperatively from another thread.
///
/// Workers observe the flag between batches, drain to a consistent barrier
/// point, and the run ends with [`RunOutcome::Cancelled`].
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests cancellation of the current (or next) run.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

struct RunHandle<V: VertexAlgorithm> {
    shared: Arc<RunShared<V>>,
    handles: Vec<JoinHandle<V::Program>>,
}

/// The semi-external-memory graph engine, generic over a
/// [`VertexAlgorithm`].
///
/// Adjacency data stays on disk and is read on demand through the block-I/O
/// substrate; one in-memory state per vertex is partitioned over the worker
/// threads.
pub struct GraphEngine<V: VertexAlgorithm> {
    config: GraphConfig,
    num_workers: usize,
    header: GraphHeader,
    index: Arc<GraphIndex>,
    io_factory: Arc<dyn IoFactory>,
    store: Arc<VertexStore<V::State>>,
    algo: Arc<V>,
    partitioner: Partitioner,
    scheduler: Option<Arc<dyn VertexScheduler>>,
    trace: Option<Arc<TraceLogger>>,
    cancel: Arc<AtomicBool>,
    programs: Vec<V::Program>,
    run: Option<RunHandle<V>>,
}

impl<V: VertexAlgorithm> GraphEngine<V> {
    /// Opens a graph and its index and creates one state per vertex.
    ///
    /// Fails on malformed files, on an index inconsistent with the graph
    /// header, and on impossible configurations.
    pub fn create(
        graph_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
        config: GraphConfig,
        algo: V,
    ) -> Result<Self> {
        config.validate()?;
        let graph_path = graph_path.as_ref();

        let file = std::fs::File::open(graph_path)
            .with_context(|| format!("Cannot open graph file {}", graph_path.display()))?;
        let header = GraphHeader::read(&mut BufReader::new(file))?;
        log::info!(
            "Graph {}: {} vertices, {} edges, {}",
            graph_path.display(),
            header.num_vertices,
            header.num_edges,
            if header.directed {
                "directed"
            } else {
                "undirected"
            }
        );

        let index = Arc::new(GraphIndex::load(index_path, &header)?);

        let io_factory: Arc<dyn IoFactory> = if config.preload_graph {
            Arc::new(MmapIoFactory::open(graph_path, true)?)
        } else {
            Arc::new(FileIoFactory::open(graph_path)?)
        };
        if header.num_vertices > 0 {
            let last = index.extent(header.num_vertices - 1, EdgeKind::Both);
            ensure!(
                last.end() <= io_factory.file_len(),
                "Index points past the end of {} ({} > {})",
                graph_path.display(),
                last.end(),
                io_factory.file_len()
            );
        }

        // More workers than vertices would only produce empty partitions.
        let num_workers = config.num_workers.min(header.num_vertices.max(1) as usize);
        if num_workers < config.num_workers {
            log::info!(
                "Capping workers at the number of vertices ({num_workers} of {})",
                config.num_workers
            );
        }
        log::info!(
            "{num_workers} workers over {} NUMA nodes",
            config.num_nodes
        );
        let partitioner = Partitioner::new(header.num_vertices, num_workers);

        let algo = Arc::new(algo);
        let mut pl = progress_logger![item_name = "vertex"];
        pl.start(format!(
            "Creating {} vertex states...",
            header.num_vertices
        ));
        let store = {
            let algo = algo.clone();
            let index = index.clone();
            Arc::new(VertexStore::new(partitioner, move |id| {
                algo.init(id, &index)
            }))
        };
        pl.update_with_count(header.num_vertices as usize);
        pl.done();

        let trace = config
            .trace_log_path
            .as_ref()
            .map(|path| TraceLogger::create(path).map(Arc::new))
            .transpose()?;

        Ok(Self {
            num_workers,
            header,
            index,
            io_factory,
            store,
            algo,
            partitioner,
            scheduler: None,
            trace,
            cancel: Arc::new(AtomicBool::new(false)),
            programs: Vec::new(),
            config,
            run: None,
        })
    }

    /// The graph header.
    pub fn header(&self) -> &GraphHeader {
        &self.header
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> u32 {
        self.header.num_vertices
    }

    /// Number of edges.
    pub fn num_edges(&self) -> u64 {
        self.header.num_edges
    }

    /// Whether the graph is directed.
    pub fn is_directed(&self) -> bool {
        self.header.directed
    }

    /// The vertex index.
    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    /// The algorithm descriptor the engine was created with.
    pub fn algo(&self) -> &V {
        &self.algo
    }

    /// Registers a scheduler that reorders each batch of activations.
    pub fn set_vertex_scheduler(&mut self, scheduler: Arc<dyn VertexScheduler>) {
        self.scheduler = Some(scheduler);
    }

    /// A handle that cancels runs cooperatively.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    /// Starts a run with exactly the given vertices in the level-0
    /// frontier.
    pub fn start(&mut self, ids: &[VertexId]) -> Result<()> {
        let seeds = self.route_seeds(ids)?;
        self.spawn_run(seeds)
    }

    /// Like [`start`](Self::start), but applies `init` to each seed vertex
    /// first.
    pub fn start_with_init(
        &mut self,
        ids: &[VertexId],
        init: impl Fn(&mut V::State) + Sync,
    ) -> Result<()> {
        ensure!(self.run.is_none(), "start while a run is in progress");
        self.init_vertices(ids, init)?;
        self.start(ids)
    }

    /// Starts a run with every vertex in the level-0 frontier.
    pub fn start_all(&mut self) -> Result<()> {
        let seeds = (0..self.num_workers)
            .map(|w| self.partitioner.partition_range(w).collect())
            .collect();
        self.spawn_run(seeds)
    }

    /// Like [`start_all`](Self::start_all), but applies `init` to every
    /// vertex first.
    pub fn start_all_with_init(&mut self, init: impl Fn(&mut V::State) + Sync) -> Result<()>
    where
        <V as VertexAlgorithm>::Program: Sync,
    {
        ensure!(self.run.is_none(), "start while a run is in progress");
        self.init_all_vertices(init)?;
        self.start_all()
    }

    /// Applies `filter` to all vertices in parallel; those where it returns
    /// true form the level-0 frontier.
    pub fn start_filtered(&mut self, filter: impl Fn(&V::State) -> bool + Sync) -> Result<()> {
        ensure!(self.run.is_none(), "start while a run is in progress");
        let store = &self.store;
        let partitioner = self.partitioner;
        let seeds: Vec<Vec<VertexId>> = (0..self.num_workers)
            .into_par_iter()
            .map(|w| {
                let partition = store.lock_partition(w);
                let base = partitioner.partition_range(w).start;
                partition
                    .iter()
                    .enumerate()
                    .filter(|(_, state)| filter(state))
                    .map(|(local, _)| base + local as VertexId)
                    .collect()
            })
            .collect();
        self.spawn_run(seeds)
    }

    /// Applies `init` to the given vertices. May only be called while no
    /// run is in progress.
    pub fn init_vertices(
        &self,
        ids: &[VertexId],
        init: impl Fn(&mut V::State) + Sync,
    ) -> Result<()> {
        ensure!(
            self.run.is_none(),
            "init_vertices while a run is in progress"
        );
        for &id in ids {
            self.store.with_vertex_mut(id, &init);
        }
        Ok(())
    }

    /// Applies `init` to every vertex in parallel. May only be called while
    /// no run is in progress.
    pub fn init_all_vertices(&self, init: impl Fn(&mut V::State) + Sync) -> Result<()>
    where
        <V as VertexAlgorithm>::Program: Sync,
    {
        ensure!(
            self.run.is_none(),
            "init_all_vertices while a run is in progress"
        );
        (0..self.num_workers).into_par_iter().for_each(|w| {
            let mut partition = self.store.lock_partition(w);
            partition.iter_mut().for_each(&init);
        });
        Ok(())
    }

    fn route_seeds(&self, ids: &[VertexId]) -> Result<Vec<Vec<VertexId>>> {
        let mut seeds: Vec<Vec<VertexId>> = vec![Vec::new(); self.num_workers];
        for &id in ids {
            ensure!(
                id < self.header.num_vertices,
                "seed vertex {id} out of range"
            );
            seeds[self.partitioner.owner_worker(id)].push(id);
        }
        Ok(seeds)
    }

    fn spawn_run(&mut self, seeds: Vec<Vec<VertexId>>) -> Result<()> {
        ensure!(self.run.is_none(), "start while a run is in progress");

        let (outboxes, inboxes) = build_grid::<V::Message>(
            self.num_workers,
            self.config.message_buffer_bytes,
        );
        let shared = Arc::new(RunShared {
            algo: self.algo.clone(),
            store: self.store.clone(),
            index: self.index.clone(),
            partitioner: self.partitioner,
            scheduler: self.scheduler.clone(),
            trace: self.trace.clone(),
            batch_size: self.config.batch_size,
            barrier_quiesce: Barrier::new(self.num_workers),
            barrier_release: Barrier::new(self.num_workers),
            level: AtomicUsize::new(0),
            any_work: AtomicBool::new(false),
            continue_flag: AtomicBool::new(false),
            active_this_level: AtomicUsize::new(0),
            cancel: self.cancel.clone(),
            abort: AtomicBool::new(false),
            error: Mutex::new(None),
        });

        // Build every worker before spawning any thread, so a failure here
        // cannot leave part of the pool waiting at a barrier.
        let mut workers = Vec::with_capacity(self.num_workers);
        for (worker_id, ((outboxes, inboxes), seed)) in
            outboxes.into_iter().zip(inboxes).zip(seeds).enumerate()
        {
            let mut frontier = Frontier::new(self.partitioner.partition_range(worker_id));
            for id in seed {
                frontier.activate_current(id);
            }
            let dispatcher = IoDispatcher::new(
                self.io_factory.open()?,
                self.config.max_in_flight_io_per_worker,
                self.header.directed,
                self.header.edge_data_size,
            );
            workers.push(Worker {
                worker_id,
                shared: shared.clone(),
                dispatcher,
                queue: SubmitQueue::new(),
                outboxes,
                inboxes,
                frontier,
            });
        }

        let mut handles = Vec::with_capacity(self.num_workers);
        for worker in workers {
            let name = format!("graph-worker-{}", worker.worker_id);
            handles.push(
                std::thread::Builder::new()
                    .name(name.clone())
                    .spawn(move || worker.run())
                    .with_context(|| format!("Cannot spawn {name}"))?,
            );
        }

        self.run = Some(RunHandle { shared, handles });
        Ok(())
    }

    /// Blocks until the run reaches a fixpoint, is cancelled, or fails.
    ///
    /// # Panics
    ///
    /// Panics if no run was started.
    pub fn wait_for_complete(&mut self) -> std::result::Result<RunOutcome, EngineError> {
        let run = self
            .run
            .take()
            .expect("wait_for_complete without a running start");

        let mut programs = Vec::with_capacity(run.handles.len());
        let mut died = None;
        for (worker, handle) in run.handles.into_iter().enumerate() {
            match handle.join() {
                Ok(program) => programs.push(program),
                Err(_) => died = Some(worker),
            }
        }

        let levels = run.shared.level.load(Ordering::Acquire) + 1;
        let cancelled = self.cancel.swap(false, Ordering::AcqRel);

        if let Some(worker) = died {
            return Err(EngineError::WorkerDied { worker });
        }
        if let Some(error) = run
            .shared
            .error
            .lock()
            .expect("error slot poisoned")
            .take()
        {
            return Err(error);
        }

        self.programs = programs;
        if cancelled {
            log::info!("Run cancelled after {levels} levels");
            Ok(RunOutcome::Cancelled { levels })
        } else {
            log::info!("Run complete after {levels} levels");
            Ok(RunOutcome::Complete { levels })
        }
    }

    /// The per-worker programs of the last completed run, in worker order.
    pub fn vertex_programs(&self) -> &[V::Program] {
        &self.programs
    }

    /// Consumes the per-worker programs of the last completed run.
    pub fn take_vertex_programs(&mut self) -> Vec<V::Program> {
        std::mem::take(&mut self.programs)
    }

    /// Runs a read-only query over all vertex states in parallel: one clone
    /// of `query` per partition, merged pairwise back into `query`.
    ///
    /// Valid on a freshly-created engine, where it observes default states.
    ///
    /// # Panics
    ///
    /// Panics if a run is in progress.
    pub fn query_on_all<Q: VertexQuery<V>>(&self, query: &mut Q)
    where
        <V as VertexAlgorithm>::Program: Sync,
    {
        assert!(
            self.run.is_none(),
            "query_on_all while a run is in progress"
        );
        let ctx = QueryContext::new(&self.index, &self.header);
        let proto: Q = query.clone();
        let merged = (0..self.num_workers)
            .into_par_iter()
            .map(|w| {
                let partition = self.store.lock_partition(w);
                let mut local = proto.clone();
                for state in partition.iter() {
                    local.run(&ctx, state);
                }
                local
            })
            .reduce_with(|mut a, b| {
                a.merge(b);
                a
            });
        if let Some(merged) = merged {
            query.merge(merged);
        }
    }

    /// Runs `f` on the state of vertex `id`. May only be called while no
    /// run is in progress.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range or a run is in progress.
    pub fn with_vertex<R>(&self, id: VertexId, f: impl FnOnce(&V::State) -> R) -> R {
        assert!(self.run.is_none(), "vertex access while a run is in progress");
        self.store.with_vertex(id, f)
    }

    /// Maps every vertex state to a value, in vertex-id order, in parallel.
    /// May only be called while no run is in progress.
    ///
    /// # Panics
    ///
    /// Panics if a run is in progress.
    pub fn map_states<R: Send>(&self, f: impl Fn(&V::State) -> R + Sync) -> Vec<R>
    where
        <V as VertexAlgorithm>::Program: Sync,
    {
        assert!(self.run.is_none(), "vertex access while a run is in progress");
        let mut per_partition: Vec<Vec<R>> = (0..self.num_workers)
            .into_par_iter()
            .map(|w| {
                let partition = self.store.lock_partition(w);
                partition.iter().map(&f).collect()
            })
            .collect();
        let mut all = Vec::with_capacity(self.header.num_vertices as usize);
        for partition in &mut per_partition {
            all.append(partition);
        }
        all
    }
}
