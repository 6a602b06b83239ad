use ndarray::Array2;
use statrs::distribution::{Discrete, Poisson};

/// Parent-to-offspring allele transmission probabilities.
///
/// Row `cn` holds `P(transmitted allele count = g | parent copy number = cn)`
/// under a Poisson model with rate `max(cn / 2, 0.1)`. A parent carrying zero
/// copies transmits zero copies with certainty, so row 0 is the point mass
/// `[1, 0, 0, ...]`.
#[derive(Debug, Clone)]
pub struct TransitionMatrix {
    probabilities: Array2<f64>,
}

impl TransitionMatrix {
    #[must_use]
    pub fn new(max_copy_number: usize) -> Self {
        let mut probabilities = Array2::zeros((max_copy_number, max_copy_number));
        probabilities[[0, 0]] = 1.0;
        for parent_cn in 1..max_copy_number {
            let rate = (parent_cn as f64 / 2.0).max(0.1);
            let poisson = Poisson::new(rate).expect("positive transmission rate");
            for transmitted in 0..max_copy_number {
                probabilities[[parent_cn, transmitted]] = poisson.pmf(transmitted as u64);
            }
        }
        Self{probabilities}
    }

    /// `P(transmitted allele count | parent copy number)`.
    #[must_use]
    pub fn probability(&self, parent_cn: usize, transmitted: usize) -> f64 {
        self.probabilities[[parent_cn, transmitted]]
    }

    #[must_use]
    pub fn states(&self) -> usize {
        self.probabilities.nrows()
    }
}
