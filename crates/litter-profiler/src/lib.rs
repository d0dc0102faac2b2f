//! Shared library preloaded into the target process. Records the
//! distribution of allocation request sizes and the peak live-allocation
//! count into a [`litter_core::DistributionArtifact`] on process exit.

mod config;
mod hooks;
mod state;

use std::sync::atomic::Ordering;

use ctor::{ctor, dtor};

use state::STATE;

// Gated out of `cargo test` builds: the unit test binary statically links
// this crate's object code too, and these hooks are only meaningful for a
// shared library preloaded ahead of the target process's own allocator.
// Left active, `on_load` would initialize the process-wide `STATE` inside
// the test harness itself and `on_unload` would serialize a real artifact
// to the test's working directory on exit.
#[cfg(not(test))]
#[ctor]
fn on_load() {
    state::init(&STATE);
}

#[cfg(not(test))]
#[dtor]
fn on_unload() {
    // First: stop observing. Any allocator calls made during the rest of
    // process teardown must not touch bins/counters that are about to be
    // serialized and dropped.
    STATE.initialized.store(false, Ordering::SeqCst);
    state::finalize(&STATE);
}
