//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while driving the grid search
//! - echoed into the sidecar next to each saved model
//! - reloaded later for inspection commands

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::SearchGrid;

/// Document-topic prior style.
///
/// `Auto` starts symmetric and is re-estimated from the observed topic mix
/// during training. `Symmetric` is `1/K` per topic, `Asymmetric` the common
/// decaying `1/(k + sqrt(K))` shape, and `Concentration(c)` a constant `c`
/// for every topic.
///
/// The string form doubles as the model directory segment, so `Display` and
/// `FromStr` must stay inverses of each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DirichletPrior {
    Auto,
    Symmetric,
    Asymmetric,
    Concentration(f64),
}

impl fmt::Display for DirichletPrior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirichletPrior::Auto => write!(f, "auto"),
            DirichletPrior::Symmetric => write!(f, "symmetric"),
            DirichletPrior::Asymmetric => write!(f, "asymmetric"),
            DirichletPrior::Concentration(c) => {
                // Whole-number concentrations print without a trailing `.0` so
                // the directory segment for `42` is literally `42`.
                if c.fract() == 0.0 && c.abs() < 1e15 {
                    write!(f, "{}", *c as i64)
                } else {
                    write!(f, "{c}")
                }
            }
        }
    }
}

impl FromStr for DirichletPrior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(DirichletPrior::Auto);
        }
        if s.eq_ignore_ascii_case("symmetric") {
            return Ok(DirichletPrior::Symmetric);
        }
        if s.eq_ignore_ascii_case("asymmetric") {
            return Ok(DirichletPrior::Asymmetric);
        }
        match s.parse::<f64>() {
            Ok(c) if c.is_finite() && c > 0.0 => Ok(DirichletPrior::Concentration(c)),
            _ => Err(format!(
                "Invalid Dirichlet prior '{s}'. Expected auto, symmetric, asymmetric, or a positive number."
            )),
        }
    }
}

impl From<DirichletPrior> for String {
    fn from(prior: DirichletPrior) -> Self {
        prior.to_string()
    }
}

impl TryFrom<String> for DirichletPrior {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One grid point: the hyperparameters for a single training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    pub num_topics: usize,
    pub dir_prior: DirichletPrior,
    pub random_state: u64,
    pub num_passes: usize,
    /// Cap on per-document inference refinement; recorded with the model but
    /// not part of the directory layout.
    pub num_iterations: usize,
}

impl fmt::Display for HyperParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "topics={} prior={} seed={} passes={} iterations={}",
            self.num_topics, self.dir_prior, self.random_state, self.num_passes, self.num_iterations
        )
    }
}

/// Fixed per-run training settings shared by every grid point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSettings {
    /// Reporting threshold for document-topic probabilities.
    pub minimum_probability: f64,
    /// If set, log a perplexity estimate every N passes during training.
    pub eval_every: Option<usize>,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            minimum_probability: 0.0,
            eval_every: None,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Folder holding `dictionary.txt` and `corpus.mm`.
    pub file_folder: PathBuf,
    /// Root folder the model tree is written under.
    pub save_folder: PathBuf,
    pub grid: SearchGrid,
    pub settings: TrainSettings,
}
