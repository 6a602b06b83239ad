use ahash::AHashSet;
use itertools::Itertools;

/// An ordered pair of per-haplotype allele counts.
///
/// `count_a` copies were transmitted on the first haplotype (in a pedigree:
/// by parent one), `count_b` on the second. The segment's total copy number
/// is the sum of both counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Genotype {
    pub count_a: usize,
    pub count_b: usize,
}

impl Genotype {
    #[must_use]
    pub const fn new(count_a: usize, count_b: usize) -> Self {
        Self{count_a, count_b}
    }

    /// Total copy number carried by this genotype.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.count_a + self.count_b
    }

    /// The larger of the two allele counts.
    #[must_use]
    pub fn major_count(&self) -> usize {
        self.count_a.max(self.count_b)
    }
}

/// Every genotype `(a, b)` with `a + b < max_copy_number`, ordered by total
/// copy number ascending, then by `a` ascending. The list therefore carries
/// `M(M+1)/2` entries for `M` copy-number states.
#[must_use]
pub fn parental_genotypes(max_copy_number: usize) -> Vec<Genotype> {
    let mut genotypes = Vec::with_capacity(max_copy_number * (max_copy_number + 1) / 2);
    for total in 0..max_copy_number {
        for count_a in 0..=total {
            genotypes.push(Genotype::new(count_a, total - count_a));
        }
    }
    genotypes
}

/// The `offspring`-fold Cartesian product of `parental`, one genotype per
/// child, in row-major order (last child varies fastest).
///
/// Products larger than `cap` are uniformly subsampled without replacement
/// down to exactly `cap` entries. Sampling draws index tuples from the
/// implicit product and deduplicates, so oversized products are never
/// materialized; the draw sequence, and therefore the output, is fully
/// determined by the state of `rng`.
#[must_use]
pub fn offspring_genotypes(
    parental: &[Genotype],
    offspring: usize,
    cap: usize,
    rng: &mut fastrand::Rng,
) -> Vec<Vec<Genotype>> {
    if offspring == 0 {
        return vec![Vec::new()]
    }
    if parental.is_empty() {
        return Vec::new()
    }

    let combinations = (parental.len() as u128).checked_pow(offspring as u32);
    if combinations.is_some_and(|total| total <= cap as u128) {
        return (0..offspring)
            .map(|_| parental.iter().copied())
            .multi_cartesian_product()
            .collect()
    }

    let mut seen: AHashSet<Vec<usize>> = AHashSet::with_capacity(cap);
    let mut subsampled = Vec::with_capacity(cap);
    while subsampled.len() < cap {
        let tuple: Vec<usize> = (0..offspring).map(|_| rng.usize(0..parental.len())).collect();
        if seen.insert(tuple.clone()) {
            subsampled.push(tuple.iter().map(|&i| parental[i]).collect());
        }
    }
    subsampled
}

/// Duplicate-free union, over `r` in `1..=max_allele_number`, of every
/// `r`-subset of the copy-number states `0..max_copy_number`.
#[must_use]
pub fn copy_number_combinations(max_copy_number: usize, max_allele_number: usize) -> Vec<Vec<usize>> {
    (1..=max_allele_number.min(max_copy_number))
        .flat_map(|r| (0..max_copy_number).combinations(r))
        .collect()
}

/// The set of allele counts a single chromosome may carry under a given total
/// copy number.
#[must_use]
pub fn cn_allele_set(copy_number: usize) -> Vec<usize> {
    match copy_number {
        0 => vec![0],
        1 => vec![0, 1],
        _ => (1..=copy_number).collect(),
    }
}

/// Genotype candidates per copy number: entry `cn` lists `(a, cn - a)` for
/// `a` in `0..=cn`, so it always carries `cn + 1` candidates.
#[must_use]
pub fn genotypes_by_cn(max_copy_number: usize) -> Vec<Vec<Genotype>> {
    (0..max_copy_number)
        .map(|cn| (0..=cn).map(|a| Genotype::new(a, cn - a)).collect())
        .collect()
}
