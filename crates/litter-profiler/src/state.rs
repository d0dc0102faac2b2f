use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use litter_core::DistributionArtifact;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::ProfilerConfig;

/// Process-wide profiler state: the histogram, live-allocation counters,
/// and the initialized flag that gates observation. A single opaque
/// object with atomic fields, per the re-architecture guidance, rather
/// than ambient globals scattered across the crate.
pub(crate) struct ProfilerState {
    pub(crate) initialized: AtomicBool,
    current: AtomicI64,
    max: AtomicI64,
    ignored: AtomicU64,
    size_classes: OnceLock<Vec<u64>>,
    bins: OnceLock<Vec<AtomicU64>>,
    output_path: OnceLock<std::path::PathBuf>,
    log_guard: Mutex<Option<WorkerGuard>>,
}

pub(crate) static STATE: ProfilerState = ProfilerState::new();

impl ProfilerState {
    const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            current: AtomicI64::new(0),
            max: AtomicI64::new(0),
            ignored: AtomicU64::new(0),
            size_classes: OnceLock::new(),
            bins: OnceLock::new(),
            output_path: OnceLock::new(),
            log_guard: Mutex::new(None),
        }
    }

    fn size_classes(&self) -> &[u64] {
        self.size_classes
            .get()
            .expect("profiler state read before initialization")
    }

    fn bins(&self) -> &[AtomicU64] {
        self.bins
            .get()
            .expect("profiler state read before initialization")
    }

    /// Observe a request of `size` bytes. `newly_live` distinguishes a
    /// fresh allocation (live count increases) from a reallocation target
    /// (live count untouched, size still sampled). Zero-size requests and
    /// calls outside the initialized window are silently skipped — these
    /// are observation misses, not errors.
    pub(crate) fn observe_allocation(&self, size: usize, newly_live: bool) {
        if size == 0 || !self.initialized.load(Ordering::Acquire) {
            return;
        }

        let size_classes = self.size_classes();
        let bins = self.bins();
        let size = size as u64;

        if size > *size_classes.last().expect("size classes non-empty") {
            self.ignored.fetch_add(1, Ordering::Relaxed);
        } else {
            let index = litter_core::draw_index(size_classes, size);
            bins[index].fetch_add(1, Ordering::Relaxed);
        }

        if newly_live {
            let current = self.current.fetch_add(1, Ordering::AcqRel) + 1;
            let mut observed_max = self.max.load(Ordering::Acquire);
            while current > observed_max {
                match self.max.compare_exchange_weak(
                    observed_max,
                    current,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => break,
                    Err(actual) => observed_max = actual,
                }
            }
        }
    }

    /// Observe a release of `ptr`. Null is a no-op. No size information is
    /// recorded — the original size is not available without side tables
    /// and is not required by the litterer.
    pub(crate) fn observe_release(&self, ptr: *mut c_void) {
        if ptr.is_null() || !self.initialized.load(Ordering::Acquire) {
            return;
        }
        self.current.fetch_sub(1, Ordering::AcqRel);
    }

    fn snapshot(&self) -> DistributionArtifact {
        let size_classes = self
            .size_classes()
            .iter()
            .map(|&s| s as usize)
            .collect::<Vec<_>>();
        let bins = self
            .bins()
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect::<Vec<_>>();
        DistributionArtifact {
            size_classes,
            bins,
            max_live_allocations: self.max.load(Ordering::Relaxed),
            ignored: Some(self.ignored.load(Ordering::Relaxed)),
        }
    }
}

/// Process startup: read configuration, allocate (and, in append mode,
/// seed) the histogram, then mark the profiler initialized. Must run
/// before any observed allocation — attached to the shared library's
/// load hook via `#[ctor]`.
pub(crate) fn init(state: &ProfilerState) {
    let config = ProfilerConfig::from_env();

    let (size_classes, initial_bins, initial_ignored) = match config.resume_from {
        Some(artifact) => {
            let size_classes = artifact.size_classes.iter().map(|&s| s as u64).collect();
            (size_classes, artifact.bins, artifact.ignored.unwrap_or(0))
        }
        None => {
            let table = config.scheme.table();
            let size_classes = table.iter().map(|&s| s as u64).collect();
            (size_classes, vec![0u64; table.len()], 0)
        }
    };

    let bins = initial_bins
        .into_iter()
        .map(AtomicU64::new)
        .collect::<Vec<_>>();

    let _ = state.size_classes.set(size_classes);
    let _ = state.bins.set(bins);
    let _ = state.output_path.set(config.output_path);
    state.ignored.store(initial_ignored, Ordering::Relaxed);

    let guard = crate::hooks::init_logging(config.log_path.as_deref());
    *state.log_guard.lock().expect("log guard mutex poisoned") = guard;

    state.initialized.store(true, Ordering::Release);
    tracing::info!(target: "litter_profiler", "profiler initialized");
}

/// Process teardown: serialize the artifact. Called after `initialized`
/// has already been cleared by the caller, so no observer can race the
/// snapshot.
///
/// Uses `eprintln!` rather than `tracing`, unlike the rest of this crate:
/// a `#[dtor]` runs via `__cxa_finalize`, after thread-locals may already
/// be torn down, and `tracing-subscriber`'s formatting layer reaches into
/// one — logging through it here intermittently aborts the process.
pub(crate) fn finalize(state: &ProfilerState) {
    let artifact = state.snapshot();
    let output_path = state
        .output_path
        .get()
        .expect("profiler state read before initialization");
    if let Err(err) = artifact.save(output_path) {
        eprintln!("litter-profiler: failed to write {}: {err}", output_path.display());
    } else {
        eprintln!(
            "litter-profiler: wrote {} ({} allocations, max_live={})",
            output_path.display(),
            artifact.total_allocations(),
            artifact.max_live_allocations
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_state(size_classes: Vec<u64>) -> ProfilerState {
        let len = size_classes.len();
        let state = ProfilerState::new();
        let _ = state.size_classes.set(size_classes);
        let _ = state.bins.set((0..len).map(|_| AtomicU64::new(0)).collect());
        state.initialized.store(true, Ordering::Release);
        state
    }

    #[test]
    fn zero_size_is_not_binned_and_does_not_affect_live_count() {
        let state = fresh_state((1..=4096).collect());
        state.observe_allocation(0, true);
        assert_eq!(state.bins().iter().map(|b| b.load(Ordering::Relaxed)).sum::<u64>(), 0);
        assert_eq!(state.current.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn release_of_null_is_a_no_op() {
        let state = fresh_state((1..=4096).collect());
        state.observe_release(std::ptr::null_mut());
        assert_eq!(state.current.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn scenario_s1_sequence() {
        // allocate(8), allocate(16), release(first), allocate(8), exit
        let state = fresh_state((1..=4096).collect());
        state.observe_allocation(8, true);
        state.observe_allocation(16, true);
        state.observe_release(std::ptr::dangling_mut::<c_void>());
        state.observe_allocation(8, true);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.bins[7], 2);
        assert_eq!(snapshot.bins[15], 1);
        assert_eq!(snapshot.max_live_allocations, 2);
        assert_eq!(snapshot.ignored, Some(0));
    }

    #[test]
    fn scenario_s2_oversized_request_is_ignored_not_binned() {
        let state = fresh_state((1..=4096).collect());
        state.observe_allocation(5000, true);
        let snapshot = state.snapshot();
        assert!(snapshot.bins.iter().all(|&b| b == 0));
        assert_eq!(snapshot.ignored, Some(1));
        assert_eq!(snapshot.max_live_allocations, 1);
    }

    #[test]
    fn scenario_s3_zero_alloc_then_null_release() {
        let state = fresh_state((1..=4096).collect());
        state.observe_allocation(0, true);
        state.observe_release(std::ptr::null_mut());
        let snapshot = state.snapshot();
        assert!(snapshot.bins.iter().all(|&b| b == 0));
        assert_eq!(snapshot.max_live_allocations, 0);
    }

    #[test]
    fn p4_live_count_is_max_over_prefixes() {
        let state = fresh_state((1..=4096).collect());
        // +1 +1 -1 +1 +1 -1 -1 => running: 1,2,1,2,3,2,1 => max 3
        state.observe_allocation(8, true);
        state.observe_allocation(8, true);
        state.observe_release(std::ptr::dangling_mut::<c_void>());
        state.observe_allocation(8, true);
        state.observe_allocation(8, true);
        state.observe_release(std::ptr::dangling_mut::<c_void>());
        state.observe_release(std::ptr::dangling_mut::<c_void>());
        assert_eq!(state.max.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn reallocation_target_is_sampled_but_does_not_change_live_count() {
        let state = fresh_state((1..=4096).collect());
        state.observe_allocation(8, true); // baseline live allocation
        state.observe_allocation(64, false); // realloc target, same slot
        let snapshot = state.snapshot();
        assert_eq!(snapshot.bins[7], 1);
        assert_eq!(snapshot.bins[63], 1);
        assert_eq!(snapshot.max_live_allocations, 1);
    }

    #[test]
    fn observation_before_initialization_is_skipped() {
        let state = ProfilerState::new();
        let _ = state.size_classes.set((1..=4096).collect());
        let _ = state.bins.set((0..4096).map(|_| AtomicU64::new(0)).collect());
        // initialized left false
        state.observe_allocation(8, true);
        assert_eq!(state.current.load(Ordering::Relaxed), 0);
    }
}
