//! Serialization and persistence of generated datasets.
//!
//! Artifacts are UTF-8 JSON, optionally gzip-compressed for static hosting.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the per-date/per-region cases dataset.
pub const CASE_DATA_FILE: &str = "covid_data.json";

/// File name of the per-region new-case dataset.
pub const NEW_CASE_DATA_FILE: &str = "new_case_data.json";

/// File name of the FIPS reference lookup.
pub const FIPS_DATA_FILE: &str = "fips_data.json";

/// A serialized dataset ready to be written or uploaded.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Logical name, e.g. `covid_data.json`. Never carries a `.gz` suffix.
    pub name: String,
    pub body: Vec<u8>,
    pub gzipped: bool,
}

impl Artifact {
    /// Serializes `value` to compact JSON, gzip-compressing it if requested.
    pub fn from_json(name: &str, value: &impl Serialize, gzip: bool) -> Result<Self> {
        let json = serde_json::to_vec(value)?;
        let body = if gzip { gzip_bytes(&json)? } else { json };

        debug!(name, bytes = body.len(), gzip, "Serialized artifact");
        Ok(Self {
            name: name.to_string(),
            body,
            gzipped: gzip,
        })
    }

    /// On-disk file name: the logical name, plus `.gz` when compressed.
    pub fn file_name(&self) -> String {
        if self.gzipped {
            format!("{}.gz", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Gzip-compresses `data` at the default level.
pub fn gzip_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Writes `artifact` into `dir`, creating the directory if needed. Returns
/// the path written.
pub fn write_artifact(dir: &Path, artifact: &Artifact) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(artifact.file_name());
    fs::write(&path, &artifact.body)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), bytes = artifact.body.len(), "Wrote artifact");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::collections::BTreeMap;
    use std::env;
    use std::io::Read;

    fn temp_dir(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample() -> BTreeMap<String, Vec<f64>> {
        BTreeMap::from([("53".to_string(), vec![1.0, 2.5])])
    }

    #[test]
    fn test_plain_artifact_is_json() {
        let artifact = Artifact::from_json(NEW_CASE_DATA_FILE, &sample(), false).unwrap();
        assert_eq!(artifact.file_name(), "new_case_data.json");
        assert_eq!(
            String::from_utf8(artifact.body).unwrap(),
            r#"{"53":[1.0,2.5]}"#
        );
    }

    #[test]
    fn test_gzipped_artifact_decompresses_to_json() {
        let artifact = Artifact::from_json(NEW_CASE_DATA_FILE, &sample(), true).unwrap();
        assert_eq!(artifact.file_name(), "new_case_data.json.gz");
        assert_eq!(artifact.name, "new_case_data.json");

        let mut decoded = String::new();
        GzDecoder::new(artifact.body.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, r#"{"53":[1.0,2.5]}"#);
    }

    #[test]
    fn test_write_artifact_creates_directory() {
        let dir = temp_dir("case_growth_test_write_artifact");
        let _ = fs::remove_dir_all(&dir); // clean up any prior run

        let artifact = Artifact::from_json(CASE_DATA_FILE, &sample(), true).unwrap();
        let path = write_artifact(&dir, &artifact).unwrap();

        assert_eq!(path, dir.join("covid_data.json.gz"));
        assert_eq!(fs::read(&path).unwrap(), artifact.body);

        fs::remove_dir_all(&dir).unwrap();
    }
}
