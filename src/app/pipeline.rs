//! Shared grid-run logic used by the CLI subcommands.
//!
//! Keeping this in one place keeps the core workflow linear:
//! load inputs -> walk the grid -> skip or train -> persist
//!
//! The subcommand handlers can then focus on presentation.

use std::time::{Duration, Instant};

use crate::domain::{GridConfig, HyperParams};
use crate::error::AppError;
use crate::grid::SearchGrid;
use crate::io::corpus::{self, Corpus, CorpusStats};
use crate::io::export::DocTopicRow;
use crate::io::store::ModelStore;
use crate::train::TopicModelTrainer;
use crate::train::lda::LdaModel;

/// All outcomes of a single `lda train` run.
#[derive(Debug, Clone)]
pub struct GridRunOutput {
    pub trained: Vec<HyperParams>,
    pub skipped: Vec<HyperParams>,
    pub stats: CorpusStats,
    pub elapsed: Duration,
}

/// Per-grid-point training state, in grid order.
#[derive(Debug, Clone)]
pub struct GridStatus {
    pub rows: Vec<(HyperParams, bool)>,
}

impl GridStatus {
    pub fn trained(&self) -> usize {
        self.rows.iter().filter(|(_, trained)| *trained).count()
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }
}

/// Execute the full grid search and return the outcomes.
///
/// An existing model directory means some earlier run already handled that
/// grid point; it is skipped without looking inside. A training failure
/// aborts the remaining grid, leaving finished models in place.
pub fn run_grid(
    config: &GridConfig,
    trainer: &dyn TopicModelTrainer,
) -> Result<GridRunOutput, AppError> {
    config.grid.validate()?;
    let started = Instant::now();

    // 1) Load inputs. Nothing is written under the save folder before this
    //    succeeds, so a bad input folder leaves no partial grid behind.
    let bundle = corpus::load_corpus_bundle(&config.file_folder)?;
    tracing::info!(
        "loaded corpus: {} docs, {} terms, {} nonzero entries",
        bundle.stats.num_docs,
        bundle.stats.num_terms,
        bundle.stats.nonzero_entries
    );

    let store = ModelStore::new(&config.save_folder);
    let mut trained = Vec::new();
    let mut skipped = Vec::new();

    // 2) Walk the grid in its fixed order.
    for params in config.grid.combinations() {
        if store.is_trained(&params) {
            tracing::info!("model exists, skipping: {params}");
            skipped.push(params);
            continue;
        }

        tracing::info!("training: {params}");
        store.create_model_dir(&params)?;
        let model = trainer
            .train(&bundle.dictionary, &bundle.corpus, &params, &config.settings)
            .map_err(|e| AppError::new(4, format!("Training failed for {params}: {e}")))?;
        let path = store.save(&params, &model, &config.settings, &bundle.stats)?;
        tracing::debug!("saved {}", path.display());
        trained.push(params);
    }

    Ok(GridRunOutput {
        trained,
        skipped,
        stats: bundle.stats,
        elapsed: started.elapsed(),
    })
}

/// Report which grid points already have a model directory.
pub fn grid_status(grid: &SearchGrid, store: &ModelStore) -> Result<GridStatus, AppError> {
    grid.validate()?;
    let rows = grid
        .combinations()
        .map(|params| {
            let trained = store.is_trained(&params);
            (params, trained)
        })
        .collect();
    Ok(GridStatus { rows })
}

/// Infer a topic mixture for every corpus document, in corpus order.
pub fn infer_corpus_topics(model: &LdaModel, corpus: &Corpus) -> Vec<DocTopicRow> {
    corpus
        .documents()
        .iter()
        .enumerate()
        .map(|(doc_id, doc)| DocTopicRow {
            doc_id,
            distribution: model.infer_doc_topics(doc),
        })
        .collect()
}
