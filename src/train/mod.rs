//! Model training.
//!
//! - collapsed Gibbs sampler and fitted-model type (`lda`)
//! - prior resolution and `auto` re-estimation (`priors`)
//!
//! The grid driver goes through [`TopicModelTrainer`] so tests can swap in
//! counting or failing trainers without fitting anything.

pub mod lda;
pub mod priors;

use crate::domain::{HyperParams, TrainSettings};
use crate::io::corpus::{Corpus, Dictionary};
use lda::{LdaModel, TrainError};

/// Anything that can fit a topic model for one grid point.
pub trait TopicModelTrainer {
    fn train(
        &self,
        dictionary: &Dictionary,
        corpus: &Corpus,
        params: &HyperParams,
        settings: &TrainSettings,
    ) -> Result<LdaModel, TrainError>;
}

/// The production trainer: collapsed Gibbs sampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct GibbsTrainer;

impl TopicModelTrainer for GibbsTrainer {
    fn train(
        &self,
        dictionary: &Dictionary,
        corpus: &Corpus,
        params: &HyperParams,
        settings: &TrainSettings,
    ) -> Result<LdaModel, TrainError> {
        lda::train_model(dictionary, corpus, params, settings)
    }
}
