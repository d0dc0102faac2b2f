use std::io::Write;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::error::LitterError;

/// The persisted result of a profile run: the size-class table used, the
/// per-class request counts, and the peak live-allocation count. Never
/// mutated in place; an append-mode profiler run re-reads and replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistributionArtifact {
    #[serde(rename = "sizeClasses")]
    pub size_classes: Vec<usize>,
    pub bins: Vec<u64>,
    #[serde(rename = "maxLiveAllocations")]
    pub max_live_allocations: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored: Option<u64>,
}

impl DistributionArtifact {
    /// Total number of binned allocation-like requests (`ignored` excluded).
    pub fn total_allocations(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn load(path: &Path) -> Result<Self, LitterError> {
        if !path.exists() {
            return Err(LitterError::ArtifactMissing {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        let artifact: Self =
            serde_json::from_slice(&bytes).map_err(|source| LitterError::ArtifactMalformed {
                path: path.to_path_buf(),
                source,
            })?;

        if artifact.bins.len() != artifact.size_classes.len() {
            return Err(LitterError::ArtifactMalformed {
                path: path.to_path_buf(),
                source: serde_json::Error::custom(format!(
                    "bins has {} entries but sizeClasses has {}",
                    artifact.bins.len(),
                    artifact.size_classes.len()
                )),
            });
        }

        Ok(artifact)
    }

    /// Serialize as pretty-printed, 4-space-indented UTF-8 JSON with a
    /// single trailing newline, matching the original `nlohmann::json`
    /// `dump(4) << std::endl` output byte-for-byte in shape.
    pub fn save(&self, path: &Path) -> Result<(), LitterError> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)
            .map_err(|source| LitterError::ArtifactMalformed {
                path: path.to_path_buf(),
                source,
            })?;
        buf.push(b'\n');

        let mut file = std::fs::File::create(path)?;
        file.write_all(&buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DistributionArtifact {
        DistributionArtifact {
            size_classes: vec![1, 2, 3, 4],
            bins: vec![0, 10, 0, 0],
            max_live_allocations: 1,
            ignored: None,
        }
    }

    #[test]
    fn round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distribution.json");
        let original = sample();
        original.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        assert!(text.starts_with('{'));

        let loaded = DistributionArtifact::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn round_trip_is_stable_under_re_serialization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distribution.json");
        sample().save(&path).unwrap();
        let once = std::fs::read_to_string(&path).unwrap();

        let loaded = DistributionArtifact::load(&path).unwrap();
        loaded.save(&path).unwrap();
        let twice = std::fs::read_to_string(&path).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn ignored_is_omitted_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distribution.json");
        sample().save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("ignored"));
    }

    #[test]
    fn load_missing_file_is_artifact_missing() {
        let err = DistributionArtifact::load(Path::new("/nonexistent/distribution.json"))
            .unwrap_err();
        assert!(matches!(err, LitterError::ArtifactMissing { .. }));
    }

    #[test]
    fn load_malformed_json_is_artifact_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distribution.json");
        std::fs::write(&path, b"not json").unwrap();
        let err = DistributionArtifact::load(&path).unwrap_err();
        assert!(matches!(err, LitterError::ArtifactMalformed { .. }));
    }

    #[test]
    fn load_rejects_mismatched_bins_and_size_classes_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distribution.json");
        std::fs::write(
            &path,
            br#"{"sizeClasses": [1, 2, 3], "bins": [0, 1], "maxLiveAllocations": 1}"#,
        )
        .unwrap();
        let err = DistributionArtifact::load(&path).unwrap_err();
        assert!(matches!(err, LitterError::ArtifactMalformed { .. }));
    }

    #[test]
    fn accepts_any_strictly_increasing_size_classes_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distribution.json");
        let artifact = DistributionArtifact {
            size_classes: vec![8, 64, 512, 8192],
            bins: vec![3, 1, 0, 2],
            max_live_allocations: 4,
            ignored: Some(0),
        };
        artifact.save(&path).unwrap();
        let loaded = DistributionArtifact::load(&path).unwrap();
        assert_eq!(loaded, artifact);
    }
}
