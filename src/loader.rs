//! Reads emitted pipeline definitions back from YAML or JSON files.

use std::fs;
use std::path::{Path, PathBuf};
use glob::glob;
use serde_json::Value;
use tracing::{debug, info};
use crate::error::{BqFlowError, Result};
use crate::pipeline::Pipeline;

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// A file holds one pipeline dictionary or a list of them (the output of a
/// parametrized pipeline).
#[derive(Debug, Default)]
pub struct DefinitionLoader;

impl DefinitionLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<Pipeline>> {
        self.load_file_values(path)?
            .iter()
            .map(Pipeline::from_dict)
            .collect()
    }

    pub fn load_dir(&self, path: impl AsRef<Path>) -> Result<Vec<Pipeline>> {
        self.load_dir_values(path)?
            .iter()
            .map(Pipeline::from_dict)
            .collect()
    }

    /// Raw dictionaries, without reconstructing pipelines.
    pub fn load_file_values(&self, path: impl AsRef<Path>) -> Result<Vec<Value>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|_| BqFlowError::DefinitionFileNotFound(path.display().to_string()))?;

        let value: Value = match extension(path) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => {
                return Err(BqFlowError::InvalidDict(format!(
                    "{}: expected one of .{}",
                    path.display(),
                    EXTENSIONS.join(", .")
                )))
            }
        };

        let definitions = match value {
            Value::Array(items) => items,
            Value::Object(_) => vec![value],
            other => {
                return Err(BqFlowError::InvalidDict(format!(
                    "{}: expected a pipeline object or a list of them, got {}",
                    path.display(),
                    other
                )))
            }
        };
        debug!(path = %path.display(), count = definitions.len(), "Loaded definition file");
        Ok(definitions)
    }

    pub fn load_dir_values(&self, path: impl AsRef<Path>) -> Result<Vec<Value>> {
        let pattern = path.as_ref().join("**/*");
        let pattern_str = pattern.to_string_lossy();

        let files: Vec<PathBuf> = glob(&pattern_str)
            .map_err(|e| BqFlowError::InvalidDict(e.to_string()))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file() && extension(p).is_some_and(|ext| EXTENSIONS.iter().any(|e| *e == ext)))
            .collect();

        info!(dir = %path.as_ref().display(), files = files.len(), "Loading definitions");

        let mut definitions = Vec::new();
        for file in files {
            definitions.extend(self.load_file_values(&file)?);
        }
        Ok(definitions)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let err = DefinitionLoader::new().load_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, BqFlowError::DefinitionFileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(&path, "name = 'x'").unwrap();

        let err = DefinitionLoader::new().load_file(&path).unwrap_err();
        assert!(matches!(err, BqFlowError::InvalidDict(_)));
    }

    #[test]
    fn test_scalar_document_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.yaml");
        fs::write(&path, "just a string").unwrap();

        let err = DefinitionLoader::new().load_file_values(&path).unwrap_err();
        assert!(matches!(err, BqFlowError::InvalidDict(_)));
    }
}
