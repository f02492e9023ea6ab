//! Model lookup by reference
//!
//! A reference is either a path to a model file or a model id. Ids are
//! matched against the file stems in `<storage>/models`: a file belongs to
//! id `abc` when its stem starts with `abc_` or contains `_abc_`.

use crate::config::EngineSettings;
use crate::predictor::{LinearPredictor, Predictor, PredictorError, PredictorResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolves model references against a directory of JSON model files
#[derive(Debug, Clone)]
pub struct ModelDirectory {
    models_dir: PathBuf,
}

impl ModelDirectory {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.models_dir())
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Locate the file for a reference without loading it
    pub fn locate(&self, reference: &str) -> Result<PathBuf, PredictorError> {
        let direct = Path::new(reference);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        let entries = match std::fs::read_dir(&self.models_dir) {
            Ok(entries) => entries,
            Err(_) => return Err(PredictorError::NotFound(reference.to_string())),
        };

        let prefix = format!("{}_", reference);
        let infix = format!("_{}_", reference);
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|stem| stem.starts_with(&prefix) || stem.contains(&infix))
                    .unwrap_or(false)
            })
            .collect();

        // read_dir order is platform dependent
        candidates.sort();
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| PredictorError::NotFound(reference.to_string()))
    }
}

impl PredictorResolver for ModelDirectory {
    fn resolve(&self, reference: &str) -> Result<Arc<dyn Predictor>, PredictorError> {
        let path = self.locate(reference)?;
        let model = LinearPredictor::from_path(&path)?;
        tracing::debug!(
            reference,
            path = %path.display(),
            features = model.feature_names().len(),
            "Resolved predictor"
        );
        Ok(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{"feature_names": ["team_size"], "intercept": 50.0, "coefficients": [1.0]}"#;

    #[test]
    fn test_resolve_by_id_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m42_linear_2024.json"), MODEL).unwrap();
        let registry = ModelDirectory::new(dir.path());

        let model = registry.resolve("m42").unwrap();
        assert_eq!(model.feature_names(), &["team_size".to_string()]);
    }

    #[test]
    fn test_resolve_by_id_infix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("perf_m7_final.json"), MODEL).unwrap();
        let registry = ModelDirectory::new(dir.path());
        assert!(registry.locate("m7").is_ok());
    }

    #[test]
    fn test_resolve_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anything.json");
        std::fs::write(&path, MODEL).unwrap();
        let registry = ModelDirectory::new("/nonexistent");
        assert!(registry.resolve(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_unknown_reference() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelDirectory::new(dir.path());
        assert!(matches!(
            registry.resolve("missing"),
            Err(PredictorError::NotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_model_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad_model.json"), "{not json").unwrap();
        let registry = ModelDirectory::new(dir.path());
        assert!(matches!(
            registry.resolve("bad"),
            Err(PredictorError::InvalidModel { .. })
        ));
    }
}
