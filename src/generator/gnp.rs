//! The G(n,p) families.
//!
//! Every candidate pair belongs to exactly one chunk of the linearized
//! candidate space. A participant scans the cells of its chunks in order and
//! flips one coin per cell, keyed on the pair itself, so any two participants
//! agree on every pair without communication.

use std::time::Instant;

use crate::chunk::{balanced_slice, CellSpace, VertexChunks};
use crate::comm::Communicator;
use crate::config::GeneratorConfig;
use crate::generator::{log_run, EdgeCallback, Generator, Scaffold};
use crate::output;
use crate::random::{bernoulli, hash};
use crate::sink::{EdgeSink, SinkMode};
use crate::{Edge, Error, VertexRange};

pub struct Gnp {
    core: Scaffold,
    cells: CellSpace,
}

impl Gnp {
    pub fn new(config: GeneratorConfig, rank: usize, size: usize) -> Result<Self, Error> {
        if !config.model.is_gnp() {
            return Err(Error::InvalidConfig(format!(
                "{:?} is not a G(n,p) model",
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

    fn generate_chunk(&mut self, chunk: u64) {
        let config = &self.core.config;
        let (seed, p, k) = (config.seed, config.p, config.k);
        for cell in balanced_slice(self.cells.total(), k, chunk) {
            let (u, v) = self.cells.decode(cell);
            let h = hash(seed ^ self.cells.edge_key(u, v));
            if bernoulli(h, p) {
                self.core.emit(u, v);
            }
        }
    }
}

impl Generator for Gnp {
    fn generate(&mut self) -> Result<(), Error> {
        self.core.begin()?;
        let start = Instant::now();

        let owned = self.core.owned_chunks.clone();
        let total = self.cells.total();
        let owned_cells = crate::chunk::slice_start(total, self.core.config.k, owned.end)
            - crate::chunk::slice_start(total, self.core.config.k, owned.start);
        if self.core.sink.mode() == SinkMode::Edges {
            self.core
                .sink
                .reserve((owned_cells as f64 * self.core.config.p) as u64);
        }

        for chunk in owned.clone() {
            self.generate_chunk(chunk);
        }

        self.core.finish();
        log_run("gnp", owned.end - owned.start, self.core.sink.num_edges(), start);
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
