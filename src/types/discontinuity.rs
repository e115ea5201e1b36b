//! Type 0 discontinuity-segment preprocessing, for 1-input sampled
//! functions only.
//!
//! After unpack, each output channel's sample curve is compressed into a
//! set of straight-line "segments" within a linearity tolerance. The
//! per-channel segment lists are then merged into one channel-agnostic
//! list of boundary indices, used by `find_discontinuity` to suppress
//! false positives inside confirmed-linear stretches.

/// The result of segment analysis for a single-input Type 0 function: the
/// merged boundary list plus the overall linearity flag.
#[derive(Debug, Clone)]
pub struct SegmentTable {
    /// True iff every output channel is linear end-to-end; when true,
    /// `find_discontinuity` always reports "none".
    pub all_linear: bool,
    /// Sorted, duplicate-free union of segment boundary sample indices
    /// across all channels.
    pub boundaries: Vec<usize>,
    /// Linearity tolerance used to build this table, in grid units.
    pub tolerance: f64,
}

/// Build a [`SegmentTable`] for a single output channel's sample curve
/// (`size` grid points, raw quantised sample values for this one channel,
/// i.e. every `n_channels`-th entry of the flat grid already extracted).
fn channel_segments(samples: &[f64], tolerance: f64) -> (bool, Vec<usize>) {
    let len = samples.len();
    if len <= 1 {
        return (true, Vec::new());
    }
    if samples.iter().all(|&v| (v - samples[0]).abs() < f64::EPSILON) {
        return (true, Vec::new());
    }

    let mut confirmed: Vec<(usize, usize)> = Vec::new();
    bisect(samples, 0, len - 1, tolerance, &mut confirmed);
    confirmed.sort_unstable();
    let merged = merge_colinear(samples, confirmed, tolerance);

    let all_linear = merged.len() == 1 && merged[0] == (0, len - 1);
    let mut boundaries: Vec<usize> = Vec::new();
    for (lo, hi) in &merged {
        boundaries.push(*lo);
        boundaries.push(*hi);
    }
    boundaries.sort_unstable();
    boundaries.dedup();
    (all_linear, boundaries)
}

/// Predicted value at `mid` on the line through `(lo, samples[lo])` and
/// `(hi, samples[hi])`.
fn line_predict(samples: &[f64], lo: usize, hi: usize, mid: usize) -> f64 {
    if hi == lo {
        return samples[lo];
    }
    let t = (mid - lo) as f64 / (hi - lo) as f64;
    samples[lo] + t * (samples[hi] - samples[lo])
}

/// Recursively bisect `[lo, hi]`: if the whole range is within tolerance of
/// the `lo`-`hi` line, record it as a confirmed linear segment; otherwise
/// split at the midpoint and recurse on each half with its own endpoints.
fn bisect(samples: &[f64], lo: usize, hi: usize, tolerance: f64, confirmed: &mut Vec<(usize, usize)>) {
    if hi <= lo + 1 {
        confirmed.push((lo, hi));
        return;
    }
    if range_is_linear(samples, lo, hi, tolerance) {
        confirmed.push((lo, hi));
        return;
    }
    let mid = lo + (hi - lo) / 2;
    bisect(samples, lo, mid, tolerance, confirmed);
    bisect(samples, mid, hi, tolerance, confirmed);
}

fn range_is_linear(samples: &[f64], lo: usize, hi: usize, tolerance: f64) -> bool {
    (lo..=hi).all(|k| (samples[k] - line_predict(samples, lo, hi, k)).abs() <= tolerance)
}

/// Merge adjacent confirmed segments that are co-linear across their
/// combined span, using the same tolerance test over all enclosed samples.
fn merge_colinear(samples: &[f64], confirmed: Vec<(usize, usize)>, tolerance: f64) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (lo, hi) in confirmed {
        match merged.last_mut() {
            Some(last) if last.1 >= lo => {
                let candidate_hi = hi.max(last.1);
                if range_is_linear(samples, last.0, candidate_hi, tolerance) {
                    last.1 = candidate_hi;
                } else {
                    merged.push((lo, hi));
                }
            }
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Build the merged, channel-agnostic [`SegmentTable`] for an `n`-channel
/// flat sample grid (`grid[i * n + c]`).
pub fn build(grid: &[u32], size: usize, n_channels: usize, tolerance: f64) -> SegmentTable {
    if size == 0 || n_channels == 0 {
        return SegmentTable { all_linear: true, boundaries: Vec::new(), tolerance };
    }
    let mut all_linear = true;
    let mut boundaries: Vec<usize> = Vec::new();
    for c in 0..n_channels {
        let channel: Vec<f64> = (0..size).map(|i| grid[i * n_channels + c] as f64).collect();
        let (linear, segs) = channel_segments(&channel, tolerance);
        all_linear &= linear;
        boundaries.extend(segs);
    }
    boundaries.sort_unstable();
    boundaries.dedup();
    SegmentTable { all_linear, boundaries, tolerance }
}

impl SegmentTable {
    /// True iff sample index `idx` falls strictly inside a single confirmed
    /// linear segment (i.e. is not itself a segment boundary), meaning a
    /// candidate discontinuity there should be suppressed.
    pub fn inside_linear_segment(&self, idx: usize) -> bool {
        if self.all_linear {
            return true;
        }
        match self.boundaries.binary_search(&idx) {
            Ok(_) => false,
            Err(pos) => pos > 0 && pos < self.boundaries.len(),
        }
    }
}
