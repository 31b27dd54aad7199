//! The 2D and 3D lattice families.
//!
//! Each lattice vertex queries its axis neighbors; the coin for an adjacency
//! is keyed on the unordered pair, so both endpoints reach the same decision
//! independently. An adjacency is visited from both sides (possibly on two
//! different participants), and only the visit from the smaller endpoint
//! emits, which gives exactly one emission per retained edge globally.

use std::time::Instant;

use crate::chunk::{balanced_slice, ChunkGrid};
use crate::comm::Communicator;
use crate::config::GeneratorConfig;
use crate::generator::{log_run, EdgeCallback, Generator, Scaffold};
use crate::output;
use crate::random::{bernoulli, hash};
use crate::sink::{EdgeSink, SinkMode};
use crate::{Edge, Error, NodeId, VertexRange};

/// Unit steps along the three axes, in query order.
const DIRECTIONS: [[i64; 3]; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

pub struct Grid {
    core: Scaffold,
    grid: ChunkGrid,
    /// 4 in 2D, 6 in 3D.
    num_directions: usize,
    num_nodes: u64,
}

impl Grid {
    pub fn new(config: GeneratorConfig, rank: usize, size: usize) -> Result<Self, Error> {
        if !config.model.is_grid() {
            return Err(Error::InvalidConfig(format!(
                "{:?} is not a lattice model",
                config.model
            )));
        }
        config.validate(size)?;

        let grid = config.chunk_grid()?;
        let owned = balanced_slice(grid.chunk_count(), size as u64, rank as u64);
        let first = grid.offset_for_chunk(owned.start);
        let last = grid.offset_for_chunk(owned.end) - 1;
        let num_directions = if config.model == crate::config::Model::Grid2d {
            4
        } else {
            6
        };
        let num_nodes = grid.num_nodes();

        Ok(Self {
            core: Scaffold::new(config, owned, first, last),
            grid,
            num_directions,
            num_nodes,
        })
    }

    pub fn set_edge_callback(&mut self, callback: EdgeCallback) {
        self.core.callback = Some(callback);
    }

    fn generate_chunk(&mut self, chunk: u64) {
        let first = self.grid.offset_for_chunk(chunk);
        let last = self.grid.offset_for_chunk(chunk + 1);
        for vertex in first..last {
            for dir in 0..self.num_directions {
                self.query_direction(chunk, vertex, DIRECTIONS[dir]);
            }
        }
    }

    /// Resolves the neighbor of `vertex` one step along `delta` and flips the
    /// coin for the adjacency. Neighbors beyond the chunk are located through
    /// the neighboring chunk; neighbors beyond the lattice wrap when periodic
    /// and are skipped otherwise.
    fn query_direction(&mut self, chunk: u64, vertex: NodeId, delta: [i64; 3]) {
        // Both directions along a periodic axis of two cells meet the same
        // neighbor; only the positive step queries it.
        if self.core.config.periodic {
            for axis in 0..3 {
                if delta[axis] < 0 && self.grid.dims()[axis] == 2 {
                    return;
                }
            }
        }

        let offset = self.grid.offset_for_chunk(chunk);
        let coords = self.grid.decode_chunk(chunk);
        let extent = self.grid.extent(coords);

        let local = vertex - offset;
        let position = [
            local % extent[0],
            (local / extent[0]) % extent[1],
            local / (extent[0] * extent[1]),
        ];

        let mut inside = true;
        let mut neighbor = [0u64; 3];
        for axis in 0..3 {
            let stepped = position[axis] as i64 + delta[axis];
            if stepped < 0 || stepped as u64 >= extent[axis] {
                inside = false;
                break;
            }
            neighbor[axis] = stepped as u64;
        }

        if inside {
            let target = offset
                + neighbor[0]
                + neighbor[1] * extent[0]
                + neighbor[2] * extent[0] * extent[1];
            self.try_edge(vertex, target);
            return;
        }

        // The neighbor lies in the adjacent chunk along the stepped axis.
        let chunk_dims = self.grid.chunk_dims();
        let mut next_coords = [0u64; 3];
        for axis in 0..3 {
            let mut stepped = coords[axis] as i64 + delta[axis];
            if self.core.config.periodic {
                stepped = (stepped + chunk_dims[axis] as i64) % chunk_dims[axis] as i64;
            }
            if stepped < 0 || stepped as u64 >= chunk_dims[axis] {
                return;
            }
            next_coords[axis] = stepped as u64;
        }

        let next_chunk = self.grid.encode_chunk(next_coords);
        let next_offset = self.grid.offset_for_chunk(next_chunk);
        let next_extent = self.grid.extent(next_coords);

        // The stepped axis lands on the facing boundary of the neighbor
        // chunk; the other axes keep their local position.
        let mut landing = position;
        for axis in 0..3 {
            if delta[axis] > 0 {
                landing[axis] = 0;
            } else if delta[axis] < 0 {
                landing[axis] = next_extent[axis] - 1;
            }
        }

        let target = next_offset
            + landing[0]
            + landing[1] * next_extent[0]
            + landing[2] * next_extent[0] * next_extent[1];
        self.try_edge(vertex, target);
    }

    fn try_edge(&mut self, source: NodeId, target: NodeId) {
        if source == target {
            // A periodic axis of length one folds onto itself.
            return;
        }
        let key = source.min(target) * self.num_nodes + source.max(target);
        let h = hash(self.core.config.seed.wrapping_add(key));
        if bernoulli(h, self.core.config.p) && source < target {
            self.core.emit(source, target);
        }
    }
}

impl Generator for Grid {
    fn generate(&mut self) -> Result<(), Error> {
        self.core.begin()?;
        let start = Instant::now();

        let owned = self.core.owned_chunks.clone();
        if self.core.sink.mode() == SinkMode::Edges {
            let owned_cells = self.grid.offset_for_chunk(owned.end)
                - self.grid.offset_for_chunk(owned.start);
            let expected =
                owned_cells as f64 * self.num_directions as f64 / 2.0 * self.core.config.p;
            self.core.sink.reserve(expected as u64);
        }

        for chunk in owned.clone() {
            self.generate_chunk(chunk);
        }

        self.core.finish();
        log_run("grid", owned.end - owned.start, self.core.sink.num_edges(), start);
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
