use std::ffi::c_void;
use std::time::Instant;

use litter_core::{DistributionArtifact, LitterError};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::config::LittererConfig;

/// Resolve the shared object providing the process's `malloc`, for the
/// diagnostic banner line. Resolution failure is not fatal (statically
/// linked allocators have no resolvable source object).
fn malloc_source_object() -> Option<String> {
    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    let status = unsafe { libc::dladdr(libc::malloc as *const c_void, &mut info) };
    if status == 0 || info.dli_fname.is_null() {
        return None;
    }
    let name = unsafe { std::ffi::CStr::from_ptr(info.dli_fname) };
    Some(name.to_string_lossy().into_owned())
}

/// Drives the artifact into a physical heap state: draws `N = maxLive *
/// multiplier` objects by inverse-CDF sampling over the recorded
/// distribution, frees a `(1 - occupancy)` fraction of them (shuffled or
/// sorted per configuration), then returns after the optional debug
/// sleep and the marker syscall.
pub fn run_with_config(config: &LittererConfig) -> Result<(), LitterError> {
    if !config.data_path.exists() {
        return Err(LitterError::ArtifactMissing {
            path: config.data_path.clone(),
        });
    }
    let artifact = DistributionArtifact::load(&config.data_path)?;

    let n_allocations = artifact.total_allocations();
    if n_allocations == 0 {
        return Err(LitterError::Configuration(
            "distribution artifact has no recorded allocations".to_string(),
        ));
    }
    let n_litter = (artifact.max_live_allocations.max(0) as u64 * config.multiplier) as usize;

    tracing::info!(
        target: "litter_litterer",
        malloc_source_object = malloc_source_object().as_deref().unwrap_or("<unknown>"),
        seed = config.seed,
        occupancy = config.occupancy,
        shuffle = config.shuffle,
        sort = config.sort,
        sleep = config.sleep_secs,
        multiplier = config.multiplier,
        max_live_allocations = artifact.max_live_allocations,
        litter = n_litter,
        "starting litterer"
    );

    let cum_bins = litter_core::cumulative_sum(&artifact.bins);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut objects = Vec::<*mut c_void>::with_capacity(n_litter);

    let start = Instant::now();

    for _ in 0..n_litter {
        let target = rng.gen_range(1..=n_allocations);
        let bin = litter_core::draw_index(&cum_bins, target);
        let size = artifact.size_classes[bin];
        let ptr = unsafe { libc::malloc(size) };
        if ptr.is_null() {
            return Err(LitterError::System(format!(
                "host allocator returned null for a request of {size} bytes"
            )));
        }
        objects.push(ptr);
    }

    let n_to_free = ((1.0 - config.occupancy) * n_litter as f64) as usize;

    if config.shuffle {
        tracing::info!(target: "litter_litterer", n_to_free, "shuffling objects to be freed");
        litter_core::partial_shuffle(&mut objects, n_to_free, &mut rng);
    } else if config.sort {
        tracing::info!(target: "litter_litterer", count = objects.len(), "sorting all objects by descending address");
        objects.sort_unstable_by_key(|&p| std::cmp::Reverse(p as usize));
    }

    for &ptr in &objects[..n_to_free] {
        unsafe { libc::free(ptr) };
    }

    let elapsed = start.elapsed();
    tracing::info!(
        target: "litter_litterer",
        elapsed_secs = elapsed.as_secs(),
        "finished littering"
    );

    if config.sleep_secs != 0 {
        tracing::info!(
            target: "litter_litterer",
            pid = std::process::id(),
            seconds = config.sleep_secs,
            "sleeping before resuming"
        );
        std::thread::sleep(std::time::Duration::from_secs(config.sleep_secs));
        tracing::info!(target: "litter_litterer", "resuming program now");
    }

    // Marker syscall: its only purpose is to give an external
    // dynamic-instrumentation tool a boundary to gate tracking on.
    unsafe { libc::getpid() };

    Ok(())
}
