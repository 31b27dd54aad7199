//! The generator families and their shared scaffolding.
//!
//! Each family walks the chunks assigned to this participant and decides
//! every candidate edge locally, keyed on the global seed. No edges are
//! exchanged; running the same configuration on any number of participants
//! reproduces the same global edge set.

pub mod gnm;
pub mod gnp;
pub mod grid;

pub use gnm::Gnm;
pub use gnp::Gnp;
pub use grid::Grid;

use std::ops::Range;

use log::info;
use rayon::prelude::*;

use crate::comm::Communicator;
use crate::config::GeneratorConfig;
use crate::sink::{EdgeConsumer, EdgeSink, SinkMode};
use crate::{Edge, Error, NodeId, VertexRange};

/// A generator is single-use: construct, [`generate`](Generator::generate)
/// once, then read.
pub trait Generator {
    /// Emits the local edge subset into the sink. Errors on a second call.
    fn generate(&mut self) -> Result<(), Error>;

    /// First and last (inclusive) vertex id owned by this participant.
    /// Pure in the configuration; valid at any time.
    fn vertex_range(&self) -> VertexRange;

    /// Number of edges accepted locally so far.
    fn num_edges(&self) -> u64;

    /// The locally emitted edges. Errors before [`generate`](Generator::generate).
    fn edges(&self) -> Result<&[Edge], Error>;

    /// The local degree histogram. Errors before [`generate`](Generator::generate).
    fn degrees(&self) -> Result<&[u64], Error>;

    /// Writes the configured output. Collective in degrees and single-file
    /// modes: every participant of `comm` must call it.
    fn output<C: Communicator>(&self, comm: &C) -> Result<(), Error>
    where
        Self: Sized;

    /// Consumes the generator and returns its sink.
    fn into_sink(self) -> EdgeSink;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum State {
    Unstarted,
    Finished,
}

/// Per-edge user callback, invoked in addition to the sink.
pub type EdgeCallback = Box<dyn FnMut(NodeId, NodeId)>;

/// The state every family shares: validated config, owned chunk range,
/// vertex range, sink, optional callback, and the one-way run flag.
pub(crate) struct Scaffold {
    pub config: GeneratorConfig,
    pub owned_chunks: Range<u64>,
    pub first_node: NodeId,
    pub last_node: NodeId,
    pub sink: EdgeSink,
    pub callback: Option<EdgeCallback>,
    pub state: State,
}

impl Scaffold {
    pub fn new(
        config: GeneratorConfig,
        owned_chunks: Range<u64>,
        first_node: NodeId,
        last_node: NodeId,
    ) -> Self {
        let sink = match config.sink_mode {
            SinkMode::Edges => EdgeSink::for_edges(),
            SinkMode::Degrees => EdgeSink::for_degrees(config.dist_size),
        };
        Self {
            config,
            owned_chunks,
            first_node,
            last_node,
            sink,
            callback: None,
            state: State::Unstarted,
        }
    }

    pub fn begin(&mut self) -> Result<(), Error> {
        if self.state == State::Finished {
            return Err(Error::AlreadyGenerated);
        }
        Ok(())
    }

    pub fn finish(&mut self) {
        self.state = State::Finished;
    }

    pub fn finished(&self) -> Result<(), Error> {
        if self.state != State::Finished {
            return Err(Error::NotGenerated);
        }
        Ok(())
    }

    #[inline]
    pub fn emit(&mut self, source: NodeId, target: NodeId) {
        if let Some(callback) = &mut self.callback {
            callback(source, target);
        }
        self.sink.add_edge(source, target);
    }

    pub fn vertex_range(&self) -> VertexRange {
        (self.first_node, self.last_node)
    }
}

/// What a completed run hands back to the driver: the local edge subset (or
/// degree histogram) together with the owned vertex range.
#[derive(Debug)]
pub struct Generated {
    pub edges: Vec<Edge>,
    pub degrees: Vec<u64>,
    pub vertex_range: VertexRange,
    pub num_edges: u64,
}

/// Constructs the generator for `config.model`, runs it, and returns the
/// local result. Output files are not written; drive
/// [`Generator::output`] or [`crate::output::write`] for that.
pub fn generate<C: Communicator>(
    config: &GeneratorConfig,
    comm: &C,
) -> Result<Generated, Error> {
    let rank = comm.rank();
    let size = comm.size();
    let model = config.model;
    if model.is_gnp() {
        run(Gnp::new(config.clone(), rank, size)?)
    } else if model.is_gnm() {
        run(Gnm::new(config.clone(), rank, size)?)
    } else {
        run(Grid::new(config.clone(), rank, size)?)
    }
}

fn run<G: Generator>(mut generator: G) -> Result<Generated, Error> {
    generator.generate()?;
    let vertex_range = generator.vertex_range();
    let num_edges = generator.num_edges();
    let (edges, degrees) = generator.into_sink().into_parts();
    Ok(Generated {
        edges,
        degrees,
        vertex_range,
        num_edges,
    })
}

/// Sorts an edge list into the canonical comparison order used by the
/// determinism checks.
pub fn sort_edges(edges: &mut [Edge]) {
    edges.par_sort_unstable();
}

pub(crate) fn log_run(model: &str, chunks: u64, edges: u64, start: std::time::Instant) {
    let elapsed = start.elapsed().as_millis() as f64 / 1000.0;
    info!("{model}: emitted {edges} edges from {chunks} chunks in {elapsed:.2}s");
}
