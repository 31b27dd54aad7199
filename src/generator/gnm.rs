//! The G(n,m) families.
//!
//! The exact edge count `m` is distributed over the chunks of the candidate
//! space by descending a binary tree of hypergeometric splits. Every split is
//! keyed on the seed and the tree node id, so each participant recomputes the
//! counts along the paths to its own chunks and arrives at the same
//! distribution as every other participant. Within an owned chunk, the
//! assigned number of distinct cells is drawn and decoded into pairs.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::chunk::{balanced_slice, slice_start, CellSpace, VertexChunks};
use crate::comm::Communicator;
use crate::config::GeneratorConfig;
use crate::generator::{log_run, EdgeCallback, Generator, Scaffold};
use crate::output;
use crate::random::{hash, hypergeometric};
use crate::sink::{EdgeSink, SinkMode};
use crate::{Edge, Error, VertexRange};

/// Root id of the implicit split tree; children of `i` are `2i` and `2i + 1`.
const SPLIT_ROOT: u64 = 1;

pub struct Gnm {
    core: Scaffold,
    cells: CellSpace,
}

impl Gnm {
    pub fn new(config: GeneratorConfig, rank: usize, size: usize) -> Result<Self, Error> {
        if !config.model.is_gnm() {
            return Err(Error::InvalidConfig(format!(
                "{:?} is not a G(n,m) model",
                config.model
            )));
        }
        config.validate(size)?;

        let chunks = VertexChunks::new(config.n, config.k);
        let owned = chunks.assigned(rank, size);
        let (first, last) = chunks.vertex_range(rank, size);
        let cells = config.cell_space();

        Ok(Self {
            core: Scaffold::new(config, owned, first, last),
            cells,
        })
    }

    pub fn set_edge_callback(&mut self, callback: EdgeCallback) {
        self.core.callback = Some(callback);
    }

    fn cell_start(&self, chunk: u64) -> u64 {
        slice_start(self.cells.total(), self.core.config.k, chunk)
    }

    /// Walks the split tree and collects `(chunk, edge count)` for the owned
    /// chunks. Subtrees that do not intersect the owned range are pruned;
    /// their internal splits are never drawn.
    fn split_owned(&self) -> Vec<(u64, u64)> {
        let mut leaves = Vec::with_capacity(
            (self.core.owned_chunks.end - self.core.owned_chunks.start) as usize,
        );
        self.descend(
            SPLIT_ROOT,
            0,
            self.core.config.k,
            self.core.config.m,
            &mut leaves,
        );
        leaves
    }

    fn descend(&self, node: u64, lo: u64, hi: u64, m_node: u64, leaves: &mut Vec<(u64, u64)>) {
        let owned = &self.core.owned_chunks;
        if hi <= owned.start || lo >= owned.end {
            return;
        }
        if hi - lo == 1 {
            leaves.push((lo, m_node));
            return;
        }

        let mid = lo + (hi - lo) / 2;
        let left_cells = self.cell_start(mid) - self.cell_start(lo);
        let node_cells = self.cell_start(hi) - self.cell_start(lo);
        let m_left = hypergeometric(
            hash(self.core.config.seed ^ node),
            left_cells,
            node_cells,
            m_node,
        );

        self.descend(2 * node, lo, mid, m_left, leaves);
        self.descend(2 * node + 1, mid, hi, m_node - m_left, leaves);
    }

    /// Draws `amount` distinct cells of `chunk` and emits the decoded pairs,
    /// in ascending cell order.
    fn sample_chunk(&mut self, node: u64, chunk: u64, amount: u64) {
        if amount == 0 {
            return;
        }
        let range = balanced_slice(self.cells.total(), self.core.config.k, chunk);
        let area = range.end - range.start;
        debug_assert!(amount <= area);

        let mut rng = StdRng::seed_from_u64(hash(self.core.config.seed ^ node));
        let sampled = rand::seq::index::sample(&mut rng, area as usize, amount as usize);
        let mut cells: Vec<u64> = sampled.into_iter().map(|i| range.start + i as u64).collect();
        cells.sort_unstable();

        for cell in cells {
            let (u, v) = self.cells.decode(cell);
            self.core.emit(u, v);
        }
    }

    /// Tree node id of the leaf covering `chunk`.
    fn leaf_node(&self, chunk: u64) -> u64 {
        let mut node = SPLIT_ROOT;
        let mut lo = 0;
        let mut hi = self.core.config.k;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if chunk < mid {
                node *= 2;
                hi = mid;
            } else {
                node = 2 * node + 1;
                lo = mid;
            }
        }
        node
    }
}

impl Generator for Gnm {
    fn generate(&mut self) -> Result<(), Error> {
        self.core.begin()?;
        let start = Instant::now();

        let assigned = self.split_owned();
        if self.core.sink.mode() == SinkMode::Edges {
            self.core
                .sink
                .reserve(assigned.iter().map(|(_, m)| m).sum());
        }

        for (chunk, amount) in assigned {
            let node = self.leaf_node(chunk);
            self.sample_chunk(node, chunk, amount);
        }

        self.core.finish();
        let owned = self.core.owned_chunks.clone();
        log_run("gnm", owned.end - owned.start, self.core.sink.num_edges(), start);
        Ok(())
    }

    fn vertex_range(&self) -> VertexRange {
        self.core.vertex_range()
    }

    fn num_edges(&self) -> u64 {
        self.core.sink.num_edges()
    }

    fn edges(&self) -> Result<&[Edge], Error> {
        self.core.finished()?;
        Ok(self.core.sink.edges())
    }

    fn degrees(&self) -> Result<&[u64], Error> {
        self.core.finished()?;
        Ok(self.core.sink.degrees())
    }

    fn output<C: Communicator>(&self, comm: &C) -> Result<(), Error> {
        self.core.finished()?;
        output::write_sink(&self.core.config, comm, &self.core.sink)
    }

    fn into_sink(self) -> EdgeSink {
        self.core.sink
    }
}
