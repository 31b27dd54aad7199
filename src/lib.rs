//! A library for generating massive random graphs on cooperating
//! participants without communication.
//!
//! Every participant owns a deterministic slice of the graph and reproduces
//! exactly its share of the global edge set from nothing but the model
//! parameters, a seed, and its rank. Randomness is recomputed, never
//! exchanged: the coin for a candidate edge is keyed on the edge itself, so
//! any participant that looks at the same pair reaches the same decision.
//!
//! Three model families are provided:
//!
//! * **G(n,p)** — directed or undirected Erdős–Rényi graphs with a fixed
//!   edge probability,
//! * **G(n,m)** — directed or undirected graphs with an exact edge count,
//!   distributed over chunks by hypergeometric splitting,
//! * **Grid** — 2D and 3D lattices with per-adjacency Bernoulli retention
//!   and optional periodic boundaries.
//!
//! # Generating a graph
//!
//! ```
//! use graph_gen::prelude::*;
//!
//! let config = GeneratorConfig::new(Model::GnpUndirected)
//!     .nodes(100)
//!     .probability(1.0)
//!     .chunks(4)
//!     .seed(7);
//!
//! let result = generate(&config, &SingleProcess).unwrap();
//!
//! // p = 1.0 yields the complete graph: every unordered pair once.
//! assert_eq!(result.edges.len(), 100 * 99 / 2);
//! assert_eq!(result.vertex_range, (0, 99));
//! ```
//!
//! # Lattices
//!
//! ```
//! use graph_gen::prelude::*;
//!
//! let config = GeneratorConfig::new(Model::Grid2d)
//!     .grid_2d(4, 4)
//!     .probability(1.0)
//!     .chunks(4)
//!     .seed(1);
//!
//! let result = generate(&config, &SingleProcess).unwrap();
//!
//! // A 4x4 aperiodic lattice has 2 * 4 * 3 = 24 adjacencies.
//! assert_eq!(result.edges.len(), 24);
//! ```
//!
//! # Distributed runs
//!
//! Pass a [`comm::Communicator`] with more than one participant; each
//! participant computes its own fragment. The union over all participants is
//! identical to a single-participant run of the same configuration:
//!
//! ```
//! use graph_gen::prelude::*;
//!
//! let config = GeneratorConfig::new(Model::GnmDirected)
//!     .nodes(50)
//!     .edges(200)
//!     .chunks(8)
//!     .seed(3);
//!
//! let mut edges = Vec::new();
//! for comm in LocalCommunicator::create(2) {
//!     let fragment = generate(&config, &comm).unwrap();
//!     edges.extend(fragment.edges);
//! }
//! sort_edges(&mut edges);
//!
//! let mut whole = generate(&config, &SingleProcess).unwrap().edges;
//! sort_edges(&mut whole);
//! assert_eq!(edges, whole);
//! ```

pub mod chunk;
pub mod comm;
pub mod config;
pub mod csr;
pub mod generator;
pub mod input;
pub mod output;
pub mod prelude;
pub mod random;
pub mod sink;

pub use crate::comm::{Communicator, LocalCommunicator, SingleProcess};
pub use crate::config::{GeneratorConfig, Model, OutputConfig, OutputFormat};
pub use crate::generator::{generate, sort_edges, Generated, Generator};
pub use crate::sink::{EdgeConsumer, EdgeSink, SinkMode};

use thiserror::Error;

/// A vertex id, globally unique in `[0, n)`.
pub type NodeId = u64;

/// An edge as stored in sinks and files. Undirected models keep the
/// canonical orientation `source < target`.
pub type Edge = (NodeId, NodeId);

/// First and last (inclusive) vertex id owned by a participant.
pub type VertexRange = (NodeId, NodeId);

/// Rank of a participant.
pub type PeId = usize;

#[derive(Error, Debug)]
pub enum Error {
    #[error("error while writing or reading a graph")]
    IoError {
        #[from]
        source: std::io::Error,
    },
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
    #[error("the generator has already run")]
    AlreadyGenerated,
    #[error("the generator has not run yet")]
    NotGenerated,
    #[error("no output target configured")]
    NoOutput,
    #[error("malformed edge list: {0}")]
    InvalidFormat(String),
    #[error("edge source {0} outside the local vertex range")]
    InvalidPartitioning(NodeId),
}
