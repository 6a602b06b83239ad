use std::{ops::Range, sync::Mutex, thread};

use indicatif::ProgressBar;
use log::debug;

use super::{process_set, CallContext};
use crate::{error::CallerError, segments::SegmentSet};

/// Partition `0..n` into contiguous inclusive-step ranges, one per worker.
///
/// With `step = n / workers`, the ranges are `[0, step]`,
/// `[step + 1, 2·step + 1]`, and so on, the final range closing at `n - 1`.
/// The output always covers `0..n` disjointly; when `n < workers` the step
/// degenerates to zero and every range holds a single index.
#[must_use]
pub fn partition_ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new()
    }
    let step = n / workers.max(1);
    let mut ranges = Vec::new();
    let mut begin = 0;
    while begin < n {
        let end = (begin + step).min(n - 1);
        ranges.push(begin..end + 1);
        begin = end + 1;
    }
    ranges
}

/// Sweep every segment set with a pool of workers.
///
/// Workers own disjoint contiguous slices of the set list; everything else
/// they touch is read-only, so no synchronization happens beyond the final
/// error collection. The optional progress bar advances once per finished
/// set.
pub fn call_segment_sets(
    sets: &mut [SegmentSet],
    context: &CallContext,
    progress: Option<&ProgressBar>,
) -> Result<(), CallerError> {
    let hardware = thread::available_parallelism().map_or(1, usize::from);
    let workers = hardware.min(context.params().max_core_number).max(1);
    let ranges = partition_ranges(sets.len(), workers);
    debug!(
        "Sweeping {} segment set(s) across {} worker(s), {} range(s)",
        sets.len(), workers, ranges.len(),
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(CallerError::BuildThreadPool)?;

    let failure: Mutex<Option<CallerError>> = Mutex::new(None);
    pool.scope(|scope| {
        let mut rest: &mut [SegmentSet] = sets;
        for range in &ranges {
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            rest = tail;
            let failure = &failure;
            scope.spawn(move |_| {
                for set in chunk {
                    match process_set(set, context) {
                        Ok(()) => {
                            if let Some(bar) = progress {
                                bar.inc(1);
                            }
                        },
                        Err(error) => {
                            let mut slot = failure.lock().expect("poisoned failure slot");
                            slot.get_or_insert(error);
                            return
                        },
                    }
                }
            });
        }
    });

    match failure.into_inner().expect("poisoned failure slot") {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
