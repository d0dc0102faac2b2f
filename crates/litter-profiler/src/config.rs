use std::path::PathBuf;

use litter_core::{DistributionArtifact, SizeClassScheme};

pub const DEFAULT_DATA_FILENAME: &str = "distribution.json";

pub struct ProfilerConfig {
    pub output_path: PathBuf,
    pub log_path: Option<PathBuf>,
    /// `Some` when continuing an existing artifact (`LITTER_DETECTOR_APPEND`
    /// and the file already exists); `LITTER_SIZE_CLASSES` is ignored in
    /// that case.
    pub resume_from: Option<DistributionArtifact>,
    pub scheme: SizeClassScheme,
}

impl ProfilerConfig {
    pub fn from_env() -> Self {
        let output_path = std::env::var_os("LITTER_DATA_FILENAME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILENAME));
        let log_path = std::env::var_os("LITTER_LOG_FILENAME").map(PathBuf::from);

        let append = std::env::var("LITTER_DETECTOR_APPEND")
            .map(|v| v != "0" && !v.is_empty())
            .unwrap_or(false);

        let resume_from = if append && output_path.exists() {
            match DistributionArtifact::load(&output_path) {
                Ok(artifact) => Some(artifact),
                Err(err) => {
                    tracing::warn!(
                        target: "litter_profiler",
                        %err,
                        "LITTER_DETECTOR_APPEND set but existing artifact could not be loaded; starting fresh"
                    );
                    None
                }
            }
        } else {
            None
        };

        // LITTER_SIZE_CLASSES is ignored entirely when resuming an
        // existing artifact, so an invalid value must not fail the
        // process in that case either.
        let scheme = if resume_from.is_some() {
            SizeClassScheme::default()
        } else {
            let scheme_name = std::env::var("LITTER_SIZE_CLASSES")
                .unwrap_or_else(|_| "under-4096".to_string());
            match SizeClassScheme::parse(&scheme_name) {
                Ok(scheme) => scheme,
                Err(err) => {
                    eprintln!("litter-profiler: {err}");
                    std::process::abort();
                }
            }
        };

        Self {
            output_path,
            log_path,
            resume_from,
            scheme,
        }
    }
}
