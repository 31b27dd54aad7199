//! The collective runtime seam.
//!
//! Generation itself is communication-free; only [`crate::generator::Generator::output`]
//! needs collectives (a SUM reduction for degree histograms, barriers and an
//! allreduce for single-file writing). Those are expressed against the
//! [`Communicator`] trait so a run is tied to an explicitly passed handle
//! instead of a process-wide global, and multiple runs can coexist in one
//! process.
//!
//! Two implementations ship with the crate: [`SingleProcess`] for `P = 1`,
//! and [`LocalCommunicator`], which runs `P` participants on threads of one
//! process and backs the integration tests. An MPI-backed implementation
//! would live outside this crate and only needs these six operations.

use std::sync::{Arc, Barrier};

use parking_lot::Mutex;

use crate::{Edge, PeId};

pub(crate) const ROOT: PeId = 0;

/// Collective operations over a fixed set of cooperating participants.
///
/// Every operation is collective: all participants of the communicator must
/// call it, in the same order. A participant that skips a collective call
/// leaves its peers blocked; there is no detection or recovery.
pub trait Communicator {
    fn rank(&self) -> PeId;

    fn size(&self) -> usize;

    fn barrier(&self);

    /// Sums `value` over all participants; every participant receives the sum.
    fn allreduce_sum(&self, value: u64) -> u64;

    /// Element-wise sum of equally sized slices; `Some` on the root only.
    fn reduce_sum(&self, values: &[u64]) -> Option<Vec<u64>>;

    /// Concatenates the participants' edges in rank order; `Some` on the
    /// root only.
    fn gather_edges(&self, edges: &[Edge]) -> Option<Vec<Edge>>;
}

/// The trivial communicator for a single participant.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> PeId {
        ROOT
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn allreduce_sum(&self, value: u64) -> u64 {
        value
    }

    fn reduce_sum(&self, values: &[u64]) -> Option<Vec<u64>> {
        Some(values.to_vec())
    }

    fn gather_edges(&self, edges: &[Edge]) -> Option<Vec<Edge>> {
        Some(edges.to_vec())
    }
}

struct Slots {
    scalars: Mutex<Vec<u64>>,
    vectors: Mutex<Vec<Vec<u64>>>,
    edges: Mutex<Vec<Vec<Edge>>>,
    barrier: Barrier,
}

/// Runs `P` participants as threads of one process.
///
/// Collectives deposit into shared slots guarded by a mutex and synchronize
/// on a barrier; a second barrier ends each collective so the slots can be
/// reused by the next one.
pub struct LocalCommunicator {
    rank: PeId,
    shared: Arc<Slots>,
}

impl LocalCommunicator {
    /// Creates one handle per participant. Each handle must be moved to its
    /// own thread; the collectives block until all handles take part.
    pub fn create(size: usize) -> Vec<LocalCommunicator> {
        assert!(size > 0);
        let shared = Arc::new(Slots {
            scalars: Mutex::new(vec![0; size]),
            vectors: Mutex::new(vec![Vec::new(); size]),
            edges: Mutex::new(vec![Vec::new(); size]),
            barrier: Barrier::new(size),
        });
        (0..size)
            .map(|rank| LocalCommunicator {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> PeId {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.scalars.lock().len()
    }

    fn barrier(&self) {
        self.shared.barrier.wait();
    }

    fn allreduce_sum(&self, value: u64) -> u64 {
        self.shared.scalars.lock()[self.rank] = value;
        self.shared.barrier.wait();
        let sum = self.shared.scalars.lock().iter().sum();
        self.shared.barrier.wait();
        sum
    }

    fn reduce_sum(&self, values: &[u64]) -> Option<Vec<u64>> {
        self.shared.vectors.lock()[self.rank] = values.to_vec();
        self.shared.barrier.wait();
        let result = (self.rank == ROOT).then(|| {
            let deposits = self.shared.vectors.lock();
            let mut sum = vec![0; values.len()];
            for deposit in deposits.iter() {
                debug_assert_eq!(deposit.len(), sum.len());
                for (slot, value) in sum.iter_mut().zip(deposit) {
                    *slot += value;
                }
            }
            sum
        });
        self.shared.barrier.wait();
        result
    }

    fn gather_edges(&self, edges: &[Edge]) -> Option<Vec<Edge>> {
        self.shared.edges.lock()[self.rank] = edges.to_vec();
        self.shared.barrier.wait();
        let result = (self.rank == ROOT).then(|| {
            let deposits = self.shared.edges.lock();
            deposits.iter().flatten().copied().collect()
        });
        self.shared.barrier.wait();
        result
    }
}
