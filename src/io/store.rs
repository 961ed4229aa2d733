//! Model artifact storage under the grid directory layout.
//!
//! Each grid point owns one directory,
//! `<root>/<topics>/<prior>/<random_state>/<passes>`, holding the model file
//! plus a sidecar with the hyperparameters it was trained with. Directory
//! existence is the completion marker shared across interrupted runs, so the
//! layout must stay injective over any valid grid.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{HyperParams, TrainSettings};
use crate::error::AppError;
use crate::io::corpus::CorpusStats;
use crate::train::lda::LdaModel;

/// Fixed model filename inside each grid directory.
pub const MODEL_FILE: &str = "lda.model";
/// Sidecar recording provenance next to each model.
pub const META_FILE: &str = "meta.json";

/// Sidecar schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
    pub tool: String,
    pub params: HyperParams,
    pub settings: TrainSettings,
    pub corpus: CorpusStats,
    pub trained_at: DateTime<Utc>,
}

/// Path layout plus save/load for trained models.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

/// A model plus its sidecar, as read back from disk.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: LdaModel,
    pub meta: ModelMeta,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one grid point.
    ///
    /// The iteration cap is deliberately not a segment; grid validation
    /// guarantees it is constant across a sweep.
    pub fn model_dir(&self, params: &HyperParams) -> PathBuf {
        self.root
            .join(params.num_topics.to_string())
            .join(params.dir_prior.to_string())
            .join(params.random_state.to_string())
            .join(params.num_passes.to_string())
    }

    pub fn model_path(&self, params: &HyperParams) -> PathBuf {
        self.model_dir(params).join(MODEL_FILE)
    }

    /// Whether this grid point has already been handled by some run.
    pub fn is_trained(&self, params: &HyperParams) -> bool {
        self.model_dir(params).is_dir()
    }

    /// Create the grid point's directory ahead of training.
    pub fn create_model_dir(&self, params: &HyperParams) -> Result<PathBuf, AppError> {
        let dir = self.model_dir(params);
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::new(4, format!("Failed to create model directory '{}': {e}", dir.display()))
        })?;
        Ok(dir)
    }

    /// Persist a trained model and its sidecar; returns the model path.
    pub fn save(
        &self,
        params: &HyperParams,
        model: &LdaModel,
        settings: &TrainSettings,
        corpus: &CorpusStats,
    ) -> Result<PathBuf, AppError> {
        let dir = self.create_model_dir(params)?;

        let model_path = dir.join(MODEL_FILE);
        let file = File::create(&model_path).map_err(|e| {
            AppError::new(4, format!("Failed to create model file '{}': {e}", model_path.display()))
        })?;
        serde_json::to_writer(file, model).map_err(|e| {
            AppError::new(4, format!("Failed to write model file '{}': {e}", model_path.display()))
        })?;

        let meta = ModelMeta {
            tool: "lda".to_string(),
            params: params.clone(),
            settings: settings.clone(),
            corpus: corpus.clone(),
            trained_at: Utc::now(),
        };
        let meta_path = dir.join(META_FILE);
        let file = File::create(&meta_path).map_err(|e| {
            AppError::new(4, format!("Failed to create sidecar '{}': {e}", meta_path.display()))
        })?;
        serde_json::to_writer_pretty(file, &meta).map_err(|e| {
            AppError::new(4, format!("Failed to write sidecar '{}': {e}", meta_path.display()))
        })?;

        Ok(model_path)
    }

    /// Load a model and its sidecar by grid coordinates.
    pub fn load(&self, params: &HyperParams) -> Result<LoadedModel, AppError> {
        let model_path = self.model_path(params);
        let file = File::open(&model_path).map_err(|e| {
            AppError::new(3, format!("Failed to open model '{}': {e}", model_path.display()))
        })?;
        let model: LdaModel = serde_json::from_reader(file).map_err(|e| {
            AppError::new(3, format!("Invalid model file '{}': {e}", model_path.display()))
        })?;

        let meta_path = self.model_dir(params).join(META_FILE);
        let file = File::open(&meta_path).map_err(|e| {
            AppError::new(3, format!("Failed to open sidecar '{}': {e}", meta_path.display()))
        })?;
        let meta: ModelMeta = serde_json::from_reader(file).map_err(|e| {
            AppError::new(3, format!("Invalid sidecar '{}': {e}", meta_path.display()))
        })?;

        Ok(LoadedModel { model, meta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use ndarray::{Array1, Array2};
    use tempfile::TempDir;

    use crate::domain::DirichletPrior;
    use crate::grid::SearchGrid;
    use crate::io::corpus::CorpusStats;

    fn example_params() -> HyperParams {
        HyperParams {
            num_topics: 5,
            dir_prior: DirichletPrior::Auto,
            random_state: 99,
            num_passes: 10,
            num_iterations: 400,
        }
    }

    fn tiny_model(num_topics: usize, num_terms: usize) -> LdaModel {
        LdaModel {
            num_topics,
            num_terms,
            alpha: vec![1.0 / num_topics as f64; num_topics],
            eta: 1.0 / num_topics as f64,
            topic_word: Array2::zeros((num_topics, num_terms)),
            topic_totals: Array1::zeros(num_topics),
            infer_iterations: 400,
        }
    }

    fn tiny_stats() -> CorpusStats {
        CorpusStats {
            num_docs: 6,
            num_terms: 6,
            nonzero_entries: 18,
            total_tokens: 38.0,
        }
    }

    #[test]
    fn layout_matches_the_directory_contract() {
        let store = ModelStore::new("models");
        assert_eq!(
            store.model_path(&example_params()),
            PathBuf::from("models/5/auto/99/10/lda.model")
        );
    }

    #[test]
    fn numeric_prior_becomes_a_bare_segment() {
        let store = ModelStore::new("models");
        let params = HyperParams {
            dir_prior: DirichletPrior::Concentration(42.0),
            ..example_params()
        };
        assert_eq!(
            store.model_dir(&params),
            PathBuf::from("models/5/42/99/10")
        );
    }

    #[test]
    fn default_sweep_maps_to_distinct_directories() {
        let store = ModelStore::new("models");
        let dirs: HashSet<PathBuf> = SearchGrid::default_sweep()
            .combinations()
            .map(|p| store.model_dir(&p))
            .collect();
        assert_eq!(dirs.len(), 160);
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        let params = example_params();

        assert!(!store.is_trained(&params));
        let model = tiny_model(5, 6);
        let path = store
            .save(&params, &model, &TrainSettings::default(), &tiny_stats())
            .unwrap();
        assert!(path.ends_with("5/auto/99/10/lda.model"));
        assert!(store.is_trained(&params));

        let loaded = store.load(&params).unwrap();
        assert_eq!(loaded.model.num_topics, 5);
        assert_eq!(loaded.model.num_terms, 6);
        assert_eq!(loaded.meta.params, params);
        assert_eq!(loaded.meta.tool, "lda");
        assert_eq!(loaded.meta.corpus.num_docs, 6);
    }

    #[test]
    fn load_fails_cleanly_for_untrained_coordinates() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        let err = store.load(&example_params()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn create_model_dir_marks_the_point_handled() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        let params = example_params();

        store.create_model_dir(&params).unwrap();
        assert!(store.is_trained(&params));
    }
}
