//! Compressed sparse row conversion of a generated fragment.
//!
//! Downstream solvers usually want adjacency offsets rather than an edge
//! list. The conversion is local and pure: it covers the vertex range the
//! fragment owns and requires every edge source to fall into that range,
//! which holds for gathered whole-graph results and for lattice fragments.

use crate::generator::Generated;
use crate::{Edge, Error, VertexRange};

/// Offsets and targets of a local adjacency structure. `offsets` has one
/// entry per owned vertex plus one; the targets of vertex `v` occupy
/// `targets[offsets[v - first] .. offsets[v - first + 1]]`, sorted.
#[derive(Debug, PartialEq, Eq)]
pub struct CsrFragment {
    pub first_node: u64,
    pub offsets: Vec<u64>,
    pub targets: Vec<u64>,
}

impl CsrFragment {
    pub fn from_edges(vertex_range: VertexRange, edges: &[Edge]) -> Result<Self, Error> {
        let (first, last) = vertex_range;
        let node_count = (last - first + 1) as usize;

        let mut sorted = edges.to_vec();
        sorted.sort_unstable();

        let mut offsets = vec![0u64; node_count + 1];
        for &(source, _) in &sorted {
            if source < first || source > last {
                return Err(Error::InvalidPartitioning(source));
            }
            offsets[(source - first) as usize + 1] += 1;
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        let targets = sorted.into_iter().map(|(_, target)| target).collect();
        Ok(Self {
            first_node: first,
            offsets,
            targets,
        })
    }

    pub fn node_count(&self) -> u64 {
        self.offsets.len() as u64 - 1
    }

    pub fn degree(&self, node: u64) -> u64 {
        let i = (node - self.first_node) as usize;
        self.offsets[i + 1] - self.offsets[i]
    }

    pub fn neighbors(&self, node: u64) -> &[u64] {
        let i = (node - self.first_node) as usize;
        &self.targets[self.offsets[i] as usize..self.offsets[i + 1] as usize]
    }
}

impl Generated {
    /// Consumes the result and builds the local CSR fragment from the
    /// emitted edges.
    pub fn into_csr(self) -> Result<CsrFragment, Error> {
        CsrFragment::from_edges(self.vertex_range, &self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_offsets_and_sorted_targets() {
        let csr =
            CsrFragment::from_edges((0, 3), &[(2, 0), (0, 2), (0, 1), (2, 3)]).unwrap();

        assert_eq!(csr.node_count(), 4);
        assert_eq!(csr.offsets, vec![0, 2, 2, 4, 4]);
        assert_eq!(csr.neighbors(0), &[1, 2]);
        assert_eq!(csr.neighbors(1), &[] as &[u64]);
        assert_eq!(csr.neighbors(2), &[0, 3]);
        assert_eq!(csr.degree(2), 2);
    }

    #[test]
    fn respects_a_shifted_vertex_range() {
        let csr = CsrFragment::from_edges((10, 11), &[(11, 3), (10, 7)]).unwrap();
        assert_eq!(csr.node_count(), 2);
        assert_eq!(csr.neighbors(10), &[7]);
        assert_eq!(csr.neighbors(11), &[3]);
    }

    #[test]
    fn rejects_sources_outside_the_range() {
        let result = CsrFragment::from_edges((0, 1), &[(5, 0)]);
        assert!(matches!(result, Err(Error::InvalidPartitioning(5))));
    }
}
