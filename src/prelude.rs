pub use crate::chunk::balanced_slice;
pub use crate::comm::{Communicator, LocalCommunicator, SingleProcess};
pub use crate::config::{GeneratorConfig, Model, OutputConfig, OutputFormat};
pub use crate::csr::CsrFragment;
pub use crate::generator::{generate, sort_edges, Generated, Generator, Gnm, Gnp, Grid};
pub use crate::input::{read_binary_edge_list, read_edge_list};
pub use crate::output::write;
pub use crate::sink::{EdgeConsumer, EdgeSink, SinkMode};
pub use crate::{Edge, Error, NodeId, VertexRange};
