use ahash::AHashMap;
use ndarray::{ArrayD, Dimension, IxDyn};

/// Dense storage stays tractable up to two parents plus six probands; larger
/// pedigrees fall back to a hash map keyed by the full index tuple.
const MAX_DENSE_AXES: usize = 8;

#[derive(Debug, Clone)]
enum Table {
    Dense(ArrayD<f64>),
    Sparse(AHashMap<Vec<usize>, f64>),
}

/// The joint copy-number table of one segment.
///
/// One axis per sample — parent one, parent two, then every proband — each of
/// length `max_copy_number`. Every cell records the *maximum* joint likelihood
/// observed among the enumeration tuples mapping to its index, and the peak
/// over all cells is tracked alongside.
#[derive(Debug, Clone)]
pub struct CopyNumberDistribution {
    table: Table,
    axes: usize,
    states: usize,
    peak: f64,
}

impl CopyNumberDistribution {
    #[must_use]
    pub fn new(axes: usize, states: usize) -> Self {
        let table = if axes <= MAX_DENSE_AXES {
            Table::Dense(ArrayD::zeros(IxDyn(&vec![states; axes])))
        } else {
            Table::Sparse(AHashMap::new())
        };
        Self{table, axes, states, peak: 0.0}
    }

    #[must_use]
    pub fn axes(&self) -> usize {
        self.axes
    }

    /// Record a likelihood, keeping the maximum per cell.
    pub fn record_max(&mut self, index: &[usize], likelihood: f64) {
        debug_assert_eq!(index.len(), self.axes);
        match &mut self.table {
            Table::Dense(table) => {
                let cell = &mut table[index];
                if likelihood > *cell {
                    *cell = likelihood;
                }
            },
            Table::Sparse(table) => {
                let cell = table.entry(index.to_vec()).or_insert(0.0);
                if likelihood > *cell {
                    *cell = likelihood;
                }
            },
        }
        if likelihood > self.peak {
            self.peak = likelihood;
        }
    }

    #[must_use]
    pub fn get(&self, index: &[usize]) -> f64 {
        debug_assert_eq!(index.len(), self.axes);
        match &self.table {
            Table::Dense(table) => table[index],
            Table::Sparse(table) => table.get(index).copied().unwrap_or(0.0),
        }
    }

    /// Sum the table over every axis but `axis`, yielding that sample's
    /// marginal likelihood vector.
    #[must_use]
    pub fn marginal(&self, axis: usize) -> Vec<f64> {
        debug_assert!(axis < self.axes);
        let mut marginal = vec![0.0; self.states];
        match &self.table {
            Table::Dense(table) => {
                for (index, value) in table.indexed_iter() {
                    marginal[index.slice()[axis]] += value;
                }
            },
            Table::Sparse(table) => {
                for (index, value) in table {
                    marginal[index[axis]] += value;
                }
            },
        }
        marginal
    }

    /// Largest likelihood recorded so far.
    #[must_use]
    pub fn peak(&self) -> f64 {
        self.peak
    }
}
