use rand::Rng;

/// `cumBins[i] = sum(bins[0..=i])`, used for inverse-CDF sampling and for
/// the profiler's "size too large" check against `sizeClasses.back()`.
pub fn cumulative_sum(bins: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(bins.len());
    let mut running = 0u64;
    for &b in bins {
        running += b;
        out.push(running);
    }
    out
}

/// Smallest index `i` with `cum_bins[i] >= target`, used both by the
/// profiler (binning a request size against `sizeClasses`) and the
/// litterer (inverse-CDF sampling against a cumulative-sum table). Returns
/// `cum.len()` if no element covers `target`; callers are responsible for
/// only asking for targets within range (the profiler checks `size >
/// sizeClasses.back()` itself, the litterer draws within `[1, total]`).
pub fn draw_index(cum: &[u64], target: u64) -> usize {
    cum.partition_point(|&c| c < target)
}

/// Partial Fisher–Yates: places a uniform random sample of size
/// `min(n, v.len() - 2)` into the first `n` positions of `v`, leaving the
/// last two positions untouched as candidates. This mirrors
/// `distribution::litterer::detail::partial_shuffle` in the upstream
/// C++ implementation, including its `len - 2` bound (see design notes:
/// the reason for protecting the last two slots is not documented
/// upstream, but the behavior is preserved for compatibility).
pub fn partial_shuffle<T, R: Rng + ?Sized>(v: &mut [T], n: usize, rng: &mut R) {
    if v.len() < 2 {
        return;
    }
    let m = n.min(v.len() - 2);
    for i in 0..m {
        let j = rng.gen_range(i..v.len());
        v.swap(i, j);
    }
}
