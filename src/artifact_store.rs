//! Locates and loads the model/preprocessor pair from the artifact directory.
//!
//! # Layout
//!
//! - `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`: zero or more model files.
//! - `preprocessor.json` (configurable): exactly one fixed-name preprocessor.
//!
//! The latest model is the candidate with the newest modification time.
//! Equal modification times are broken by the lexicographically greatest
//! file name, which under the naming convention is also the newest stamp.
//!
//! Loading is all-or-nothing: either both artifacts come back validated and
//! consistent with each other, or an error does.

use crate::config::Config;
use crate::errors::PipelineError;
use crate::preprocessing::FittedPreprocessor;
use crate::regressor::TreeEnsemble;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const VERSION_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Facts about the loaded model, reported by `/health` and `/model`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetadata {
    pub file_name: String,
    /// Creation stamp parsed from the file name, when it follows the convention.
    pub version: Option<NaiveDateTime>,
    /// SHA-256 of the model file bytes, hex encoded.
    pub fingerprint: String,
    pub n_features: usize,
    pub n_trees: usize,
}

/// A validated model/preprocessor pair.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub model: TreeEnsemble,
    pub preprocessor: FittedPreprocessor,
    pub metadata: ModelMetadata,
}

/// Read-only view of an artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    prefix: String,
    extension: String,
    preprocessor_file: String,
}

impl ArtifactStore {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        extension: impl Into<String>,
        preprocessor_file: impl Into<String>,
    ) -> Self {
        let extension: String = extension.into();
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            extension: extension.trim_start_matches('.').to_string(),
            preprocessor_file: preprocessor_file.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.model_dir.clone(),
            config.model_prefix.clone(),
            config.model_extension.clone(),
            config.preprocessor_file.clone(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.dir.join(&self.preprocessor_file)
    }

    /// Path of the model file that [`load_latest`](Self::load_latest) would pick.
    pub fn latest_model_path(&self) -> Result<PathBuf, PipelineError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            PipelineError::ArtifactNotFound(format!(
                "cannot read artifact directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut latest: Option<(SystemTime, String, PathBuf)> = None;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
            else {
                continue;
            };
            if file_name == self.preprocessor_file {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", file_name, e);
                    continue;
                }
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

            let newer = match &latest {
                None => true,
                Some((best_time, best_name, _)) => {
                    (modified, file_name.as_str()) > (*best_time, best_name.as_str())
                }
            };
            if newer {
                latest = Some((modified, file_name, path));
            }
        }

        latest.map(|(_, _, path)| path).ok_or_else(|| {
            PipelineError::ArtifactNotFound(format!(
                "no model files (*.{}) in {}",
                self.extension,
                self.dir.display()
            ))
        })
    }

    /// Loads the newest model and the fixed-name preprocessor.
    pub fn load_latest(&self) -> Result<LoadedArtifacts, PipelineError> {
        let model_path = self.latest_model_path()?;
        let preprocessor_path = self.preprocessor_path();
        if !preprocessor_path.is_file() {
            return Err(PipelineError::ArtifactNotFound(format!(
                "preprocessor file {} is missing",
                preprocessor_path.display()
            )));
        }

        let model_bytes = read_artifact(&model_path)?;
        let model: TreeEnsemble = parse_artifact(&model_path, &model_bytes)?;
        model
            .validate()
            .map_err(|reason| corrupt(&model_path, reason))?;
        tracing::info!("Loaded latest model: {}", model_path.display());

        let preprocessor_bytes = read_artifact(&preprocessor_path)?;
        let preprocessor: FittedPreprocessor =
            parse_artifact(&preprocessor_path, &preprocessor_bytes)?;
        preprocessor
            .validate()
            .map_err(|reason| corrupt(&preprocessor_path, reason))?;
        tracing::info!("Loaded preprocessor: {}", preprocessor_path.display());

        if model.n_features != preprocessor.width() {
            return Err(corrupt(
                &model_path,
                format!(
                    "model expects {} features but the preprocessor produces {}",
                    model.n_features,
                    preprocessor.width()
                ),
            ));
        }

        let file_name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata = ModelMetadata {
            version: parse_model_version(&self.prefix, &self.extension, &file_name),
            fingerprint: fingerprint(&model_bytes),
            n_features: model.n_features,
            n_trees: model.n_trees(),
            file_name,
        };

        Ok(LoadedArtifacts {
            model,
            preprocessor,
            metadata,
        })
    }
}

/// File name the training side writes for a model created at `timestamp`.
pub fn versioned_model_name(prefix: &str, extension: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        timestamp.format(VERSION_FORMAT),
        extension.trim_start_matches('.')
    )
}

/// Creation stamp embedded in a conventional model file name.
pub fn parse_model_version(prefix: &str, extension: &str, file_name: &str) -> Option<NaiveDateTime> {
    let pattern = format!(
        r"^{}_(\d{{8}}_\d{{6}})\.{}$",
        regex::escape(prefix),
        regex::escape(extension.trim_start_matches('.'))
    );
    let re = Regex::new(&pattern).ok()?;
    let stamp = re.captures(file_name)?.get(1)?.as_str();
    NaiveDateTime::parse_from_str(stamp, VERSION_FORMAT).ok()
}

/// Hex SHA-256 of an artifact's bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, PipelineError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            PipelineError::ArtifactNotFound(format!("{} disappeared before loading", path.display()))
        }
        _ => corrupt(path, e.to_string()),
    })
}

fn parse_artifact<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, PipelineError> {
    serde_json::from_slice(bytes).map_err(|e| corrupt(path, e.to_string()))
}

fn corrupt(path: &Path, reason: impl Into<String>) -> PipelineError {
    PipelineError::ArtifactCorrupt {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .and_then(|d| d.and_hms_opt(13, 5, 9))
            .unwrap()
    }

    #[test]
    fn versioned_name_follows_convention() {
        assert_eq!(
            versioned_model_name("xgboost_model", ".json", stamp()),
            "xgboost_model_20240701_130509.json"
        );
    }

    #[test]
    fn version_parses_back_from_name() {
        let name = versioned_model_name("xgboost_model", "json", stamp());
        assert_eq!(
            parse_model_version("xgboost_model", "json", &name),
            Some(stamp())
        );
    }

    #[test]
    fn unconventional_names_have_no_version() {
        assert_eq!(parse_model_version("xgboost_model", "json", "model.json"), None);
        assert_eq!(
            parse_model_version("xgboost_model", "json", "xgboost_model_2024_x.json"),
            None
        );
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
