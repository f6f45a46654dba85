//! Few-shot prompt artifacts.
//!
//! An artifact lives at `{artifacts_path}/{signature name}.json`:
//!
//! ```json
//! {"version": 1, "demos": [{"input": {...}, "output": {...}}]}
//! ```
//!
//! Missing artifacts mean zero-shot prompting. A malformed artifact, or one
//! compiled for another signature version, is a configuration error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use clank_core::{Error, Result};

/// One worked example shown to the model before the real input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demo {
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub output: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub version: u32,
    #[serde(default)]
    pub demos: Vec<Demo>,
}

pub fn artifact_path(artifacts_path: &Path, name: &str) -> PathBuf {
    artifacts_path.join(format!("{}.json", name))
}

/// Load the demos compiled for signature `name` at `version`.
pub fn load_demos(artifacts_path: &Path, name: &str, version: u32) -> Result<Vec<Demo>> {
    let path = artifact_path(artifacts_path, name);

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No artifact for {} at {}", name, path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let artifact: Artifact = serde_json::from_str(&raw).map_err(|e| {
        Error::Config(format!("Malformed artifact {}: {}", path.display(), e))
    })?;

    if artifact.version != version {
        return Err(Error::Config(format!(
            "Artifact {} has version {}, expected {}",
            path.display(),
            artifact.version,
            version
        )));
    }

    debug!("Loaded {} demos for {}", artifact.demos.len(), name);
    Ok(artifact.demos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_has_no_demos() {
        let dir = tempfile::tempdir().unwrap();
        let demos = load_demos(dir.path(), "translator/feedback_translator", 1).unwrap();
        assert!(demos.is_empty());
    }

    #[test]
    fn test_loads_nested_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("aggregator")).unwrap();
        std::fs::write(
            dir.path().join("aggregator/issue_merger.json"),
            r#"{"version": 2, "demos": [{"input": {"a": 1}, "output": {"b": 2}}]}"#,
        )
        .unwrap();

        let demos = load_demos(dir.path(), "aggregator/issue_merger", 2).unwrap();
        assert_eq!(demos.len(), 1);
        assert_eq!(demos[0].output["b"], 2);
        assert!(demos[0].reasoning.is_none());
    }

    #[test]
    fn test_version_mismatch_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sig.json"), r#"{"version": 1, "demos": []}"#).unwrap();
        let err = load_demos(dir.path(), "sig", 3).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sig.json"), "{not json").unwrap();
        let err = load_demos(dir.path(), "sig", 1).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
