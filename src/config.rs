//! Generator configuration.
//!
//! A [`GeneratorConfig`] is built fluently, validated once, and shared
//! read-only by the generator afterwards. Validation is the single gate for
//! every fatal-at-construction condition; generators assume a validated
//! config and never re-check.

use std::path::PathBuf;

use crate::chunk::{CellSpace, ChunkGrid};
use crate::sink::SinkMode;
use crate::Error;

/// The graph model to sample from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    /// Erdős–Rényi with fixed edge probability, ordered pairs.
    GnpDirected,
    /// Erdős–Rényi with fixed edge probability, unordered pairs.
    GnpUndirected,
    /// Fixed edge count, ordered pairs.
    GnmDirected,
    /// Fixed edge count, unordered pairs.
    GnmUndirected,
    /// 2D lattice with per-adjacency retention probability.
    Grid2d,
    /// 3D lattice with per-adjacency retention probability.
    Grid3d,
}

impl Model {
    pub fn directed(self) -> bool {
        matches!(self, Model::GnpDirected | Model::GnmDirected)
    }

    pub(crate) fn is_gnp(self) -> bool {
        matches!(self, Model::GnpDirected | Model::GnpUndirected)
    }

    pub(crate) fn is_gnm(self) -> bool {
        matches!(self, Model::GnmDirected | Model::GnmUndirected)
    }

    pub(crate) fn is_grid(self) -> bool {
        matches!(self, Model::Grid2d | Model::Grid3d)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// ASCII lines, `e <u> <v>`, optional `p <n> <m>` header. Ids are 1-based.
    EdgeList,
    /// Pairs of 64-bit little-endian ids, optional `n m` header. 1-based.
    BinaryEdgeList,
}

/// Where and how [`crate::generator::Generator::output`] writes.
#[derive(Clone, Debug)]
pub struct OutputConfig {
    /// Path prefix. Per-rank mode appends `_<rank>`.
    pub file: PathBuf,
    pub format: OutputFormat,
    /// Gather everything into one file written in rank order, instead of one
    /// file per participant.
    pub single_file: bool,
    /// Prepend the `n m` header.
    pub header: bool,
}

impl OutputConfig {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            format: OutputFormat::EdgeList,
            single_file: false,
            header: true,
        }
    }

    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn single_file(mut self, single_file: bool) -> Self {
        self.single_file = single_file;
        self
    }

    #[must_use]
    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }
}

/// All recognized model and output options.
///
/// # Example
///
/// ```
/// use graph_gen::{GeneratorConfig, Model};
///
/// let config = GeneratorConfig::new(Model::GnpUndirected)
///     .nodes(100)
///     .probability(0.1)
///     .chunks(4)
///     .seed(42);
///
/// assert!(config.validate(1).is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub model: Model,
    /// Global vertex count. For grids, derived from the dimensions when zero.
    pub n: u64,
    /// Global edge count (G(n,m) only).
    pub m: u64,
    /// Bernoulli probability (G(n,p) and grids).
    pub p: f64,
    /// Number of chunks.
    pub k: u64,
    /// Root randomness seed.
    pub seed: u64,
    /// Permit loops `(u, u)` (G(n,p) and G(n,m)).
    pub self_loops: bool,
    /// Wrap lattice boundaries.
    pub periodic: bool,
    pub grid_x: u64,
    pub grid_y: u64,
    pub grid_z: u64,
    pub sink_mode: SinkMode,
    /// Size of the degree histogram in degrees mode.
    pub dist_size: u64,
    pub output: Option<OutputConfig>,
}

impl GeneratorConfig {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            n: 0,
            m: 0,
            p: 0.0,
            k: 1,
            seed: 0,
            self_loops: false,
            periodic: false,
            grid_x: 0,
            grid_y: 0,
            grid_z: 0,
            sink_mode: SinkMode::Edges,
            dist_size: 0,
            output: None,
        }
    }

    #[must_use]
    pub fn nodes(mut self, n: u64) -> Self {
        self.n = n;
        self
    }

    #[must_use]
    pub fn edges(mut self, m: u64) -> Self {
        self.m = m;
        self
    }

    #[must_use]
    pub fn probability(mut self, p: f64) -> Self {
        self.p = p;
        self
    }

    #[must_use]
    pub fn chunks(mut self, k: u64) -> Self {
        self.k = k;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn self_loops(mut self, self_loops: bool) -> Self {
        self.self_loops = self_loops;
        self
    }

    #[must_use]
    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    #[must_use]
    pub fn grid_2d(mut self, x: u64, y: u64) -> Self {
        self.grid_x = x;
        self.grid_y = y;
        self.grid_z = 1;
        self
    }

    #[must_use]
    pub fn grid_3d(mut self, x: u64, y: u64, z: u64) -> Self {
        self.grid_x = x;
        self.grid_y = y;
        self.grid_z = z;
        self
    }

    /// Switches the sink to a degree histogram of the given size.
    #[must_use]
    pub fn degree_distribution(mut self, dist_size: u64) -> Self {
        self.sink_mode = SinkMode::Degrees;
        self.dist_size = dist_size;
        self
    }

    #[must_use]
    pub fn output(mut self, output: OutputConfig) -> Self {
        self.output = Some(output);
        self
    }

    /// The global vertex count, deriving it from the lattice dimensions for
    /// grid models.
    pub fn effective_n(&self) -> u64 {
        if self.model.is_grid() {
            self.grid_x * self.grid_y * self.grid_z
        } else {
            self.n
        }
    }

    /// The candidate-pair space of a G(n,p) / G(n,m) model.
    pub(crate) fn cell_space(&self) -> CellSpace {
        CellSpace::new(self.effective_n(), self.model.directed(), self.self_loops)
    }

    /// Checks every fatal-at-construction condition for a run on
    /// `num_participants` cooperating participants.
    pub fn validate(&self, num_participants: usize) -> Result<(), Error> {
        if num_participants == 0 {
            return Err(Error::InvalidConfig("no participants".into()));
        }
        if self.k == 0 {
            return Err(Error::InvalidConfig("chunk count must be positive".into()));
        }
        if self.k < num_participants as u64 {
            return Err(Error::InvalidConfig(format!(
                "{} chunks cannot cover {} participants",
                self.k, num_participants
            )));
        }

        if self.model.is_grid() {
            let dims = [self.grid_x, self.grid_y, self.grid_z];
            if dims.iter().any(|&d| d == 0) {
                return Err(Error::InvalidConfig("grid dimensions must be positive".into()));
            }
            if self.model == Model::Grid2d && self.grid_z != 1 {
                return Err(Error::InvalidConfig("2D grids must have grid_z = 1".into()));
            }
            let cells = dims.iter().product::<u64>();
            if self.n != 0 && self.n != cells {
                return Err(Error::InvalidConfig(format!(
                    "n = {} does not match the {} lattice cells",
                    self.n, cells
                )));
            }
            // Rejects chunk counts that are not perfect powers, and chunk
            // rows that would leave a chunk empty.
            self.chunk_grid()?;
        } else {
            if self.n == 0 {
                return Err(Error::InvalidConfig("vertex count must be positive".into()));
            }
            if self.k > self.n {
                return Err(Error::InvalidConfig(format!(
                    "{} chunks cannot cover {} vertices",
                    self.k, self.n
                )));
            }
        }

        if (self.model.is_gnp() || self.model.is_grid()) && !(0.0..=1.0).contains(&self.p) {
            return Err(Error::InvalidConfig(format!(
                "probability {} outside [0, 1]",
                self.p
            )));
        }

        if self.model.is_gnm() {
            let total = self.cell_space().total();
            if self.m > total {
                return Err(Error::InvalidConfig(format!(
                    "m = {} exceeds the {} candidate edges",
                    self.m, total
                )));
            }
        }

        if self.sink_mode == SinkMode::Degrees && self.dist_size == 0 {
            return Err(Error::InvalidConfig(
                "degree distribution needs a positive dist_size".into(),
            ));
        }

        Ok(())
    }

    pub(crate) fn chunk_grid(&self) -> Result<ChunkGrid, Error> {
        match self.model {
            Model::Grid2d => ChunkGrid::new_2d(self.grid_x, self.grid_y, self.k),
            Model::Grid3d => ChunkGrid::new_3d(self.grid_x, self.grid_y, self.grid_z, self.k),
            _ => Err(Error::InvalidConfig(format!(
                "{:?} is not a lattice model",
                self.model
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_plain_gnp_config() {
        let config = GeneratorConfig::new(Model::GnpDirected)
            .nodes(64)
            .probability(0.5)
            .chunks(8);
        assert!(config.validate(2).is_ok());
    }

    #[test]
    fn rejects_zero_nodes_and_zero_chunks() {
        let config = GeneratorConfig::new(Model::GnpDirected).probability(0.5);
        assert!(config.validate(1).is_err());

        let config = GeneratorConfig::new(Model::GnpDirected).nodes(10).chunks(0);
        assert!(config.validate(1).is_err());
    }

    #[test]
    fn rejects_probability_outside_unit_interval() {
        for p in [-0.1, 1.1] {
            let config = GeneratorConfig::new(Model::GnpUndirected)
                .nodes(10)
                .probability(p);
            assert!(config.validate(1).is_err());
        }
    }

    #[test]
    fn rejects_more_participants_than_chunks() {
        let config = GeneratorConfig::new(Model::GnpDirected)
            .nodes(100)
            .probability(0.5)
            .chunks(2);
        assert!(config.validate(4).is_err());
    }

    #[test]
    fn rejects_mismatched_grid_dimensions() {
        let config = GeneratorConfig::new(Model::Grid2d)
            .grid_2d(4, 4)
            .nodes(15)
            .probability(1.0)
            .chunks(4);
        assert!(config.validate(1).is_err());
    }

    #[test]
    fn derives_n_from_grid_dimensions() {
        let config = GeneratorConfig::new(Model::Grid3d)
            .grid_3d(3, 3, 3)
            .probability(1.0)
            .chunks(27);
        assert_eq!(config.effective_n(), 27);
        assert!(config.validate(3).is_ok());
    }

    #[test]
    fn rejects_non_cubic_chunk_count_for_3d() {
        let config = GeneratorConfig::new(Model::Grid3d)
            .grid_3d(4, 4, 4)
            .probability(0.5)
            .chunks(9);
        assert!(config.validate(1).is_err());
    }

    #[test]
    fn rejects_oversized_edge_count() {
        let config = GeneratorConfig::new(Model::GnmUndirected)
            .nodes(10)
            .edges(46)
            .chunks(2);
        assert!(config.validate(1).is_err(), "only 45 candidate edges exist");
    }

    #[test]
    fn rejects_degree_mode_without_histogram() {
        let mut config = GeneratorConfig::new(Model::GnpDirected)
            .nodes(10)
            .probability(0.5);
        config.sink_mode = SinkMode::Degrees;
        assert!(config.validate(1).is_err());
    }
}
