//! Shared library that pre-ages a process's heap from a recorded
//! [`litter_core::DistributionArtifact`] before the host program's own
//! logic runs, approximating the fragmented state of the profiled run.

mod config;
mod engine;

pub use config::LittererConfig;
pub use engine::run_with_config;

/// Reads configuration from the environment and runs the litterer.
/// Exposed as ordinary Rust so a host can call it from its own startup
/// path, not only via the `cdylib`'s constructor.
pub fn run_litterer() -> Result<(), litter_core::LitterError> {
    let config = LittererConfig::from_env()?;
    let _guard = init_logging(config.log_path.as_deref());
    engine::run_with_config(&config)
}

fn init_logging(log_path: Option<&std::path::Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    match log_path {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt().with_writer(writer).with_ansi(false).try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt().with_writer(std::io::stderr).try_init();
            None
        }
    }
}

// Gated out of `cargo test` builds: see the matching note in
// litter-profiler's lib.rs. Littering the test harness's own heap on
// load would be both wasteful and order-dependent across test binaries.
#[cfg(not(test))]
#[ctor::ctor]
fn on_load() {
    if let Err(err) = run_litterer() {
        eprintln!("litter-litterer: {err}");
        std::process::exit(1);
    }
}
