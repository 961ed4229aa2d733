//! Latent Dirichlet Allocation via collapsed Gibbs sampling.
//!
//! A pass sweeps every token in the corpus once, resampling its topic from
//! the collapsed conditional. The model stores raw assignment counts, not
//! normalized distributions; probabilities are smoothed on demand with the
//! `eta` topic-word prior.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DirichletPrior, HyperParams, TrainSettings};
use crate::io::corpus::{Corpus, Dictionary};
use crate::train::priors::{reestimate_alpha, resolve_alpha};

/// Errors that can occur while fitting a model.
#[derive(Error, Debug)]
pub enum TrainError {
    #[error("Number of topics must be positive")]
    InvalidTopicCount,

    #[error("Corpus contains no documents")]
    EmptyCorpus,

    #[error("Dictionary contains no terms")]
    EmptyVocabulary,

    #[error("Invalid hyperparameter: {0}")]
    InvalidParameter(String),
}

/// A fitted topic model.
///
/// `topic_word` and `topic_totals` hold final Gibbs assignment counts;
/// `alpha` is the document-topic prior after any `auto` re-estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaModel {
    pub num_topics: usize,
    pub num_terms: usize,
    pub alpha: Vec<f64>,
    pub eta: f64,
    pub topic_word: Array2<f64>,
    pub topic_totals: Array1<f64>,
    pub infer_iterations: usize,
}

/// Fit a model on the corpus with the given grid-point hyperparameters.
///
/// Training is deterministic for a fixed `random_state`: the sampler walks
/// documents and tokens in corpus order, drawing from a single seeded RNG.
pub fn train_model(
    dictionary: &Dictionary,
    corpus: &Corpus,
    params: &HyperParams,
    settings: &TrainSettings,
) -> Result<LdaModel, TrainError> {
    let num_topics = params.num_topics;
    if num_topics == 0 {
        return Err(TrainError::InvalidTopicCount);
    }
    if corpus.num_docs() == 0 {
        return Err(TrainError::EmptyCorpus);
    }
    if dictionary.is_empty() {
        return Err(TrainError::EmptyVocabulary);
    }
    if let DirichletPrior::Concentration(c) = params.dir_prior {
        if !(c.is_finite() && c > 0.0) {
            return Err(TrainError::InvalidParameter(
                "prior concentration must be positive".into(),
            ));
        }
    }
    if params.num_passes == 0 {
        return Err(TrainError::InvalidParameter(
            "at least one pass is required".into(),
        ));
    }
    let num_terms = dictionary.len();
    if corpus.num_terms > num_terms {
        return Err(TrainError::InvalidParameter(format!(
            "corpus references {} terms but the dictionary defines {num_terms}",
            corpus.num_terms
        )));
    }

    let mut rng = StdRng::seed_from_u64(params.random_state);

    // Bag-of-words weights become integer token repeats for the sampler.
    let doc_words: Vec<Vec<(usize, usize)>> = corpus
        .documents()
        .iter()
        .map(|doc| {
            doc.iter()
                .filter_map(|&(term, weight)| {
                    let count = weight.round() as usize;
                    (count > 0).then_some((term, count))
                })
                .collect()
        })
        .collect();

    let num_docs = doc_words.len();
    let mut alpha = resolve_alpha(params.dir_prior, num_topics);
    let eta = 1.0 / num_topics as f64;
    let eta_sum = eta * num_terms as f64;

    let mut topic_word = Array2::zeros((num_topics, num_terms));
    let mut doc_topic = Array2::zeros((num_docs, num_topics));
    let mut topic_totals = Array1::zeros(num_topics);

    // Random initial assignment, one entry per token occurrence.
    let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(num_docs);
    for (d, words) in doc_words.iter().enumerate() {
        let mut doc_assignments = Vec::new();
        for &(term, count) in words {
            for _ in 0..count {
                let k = rng.gen_range(0..num_topics);
                doc_assignments.push(k);
                topic_word[[k, term]] += 1.0;
                doc_topic[[d, k]] += 1.0;
                topic_totals[k] += 1.0;
            }
        }
        assignments.push(doc_assignments);
    }

    for pass in 0..params.num_passes {
        let alpha_total: f64 = alpha.iter().sum();
        for (d, words) in doc_words.iter().enumerate() {
            let mut pos = 0;
            for &(term, count) in words {
                for _ in 0..count {
                    let old = assignments[d][pos];
                    topic_word[[old, term]] -= 1.0;
                    doc_topic[[d, old]] -= 1.0;
                    topic_totals[old] -= 1.0;

                    let new = sample_topic(
                        term,
                        d,
                        &topic_word,
                        &doc_topic,
                        &topic_totals,
                        &alpha,
                        alpha_total,
                        eta,
                        eta_sum,
                        &mut rng,
                    );

                    topic_word[[new, term]] += 1.0;
                    doc_topic[[d, new]] += 1.0;
                    topic_totals[new] += 1.0;
                    assignments[d][pos] = new;
                    pos += 1;
                }
            }
        }

        if params.dir_prior == DirichletPrior::Auto {
            reestimate_alpha(&mut alpha, &doc_topic);
        }
        if let Some(every) = settings.eval_every {
            if every > 0 && (pass + 1) % every == 0 {
                let ll = log_likelihood(&topic_word, &doc_topic, &topic_totals, &alpha, eta, eta_sum);
                let tokens = topic_totals.sum();
                if tokens > 0.0 {
                    tracing::info!(
                        "pass {}/{}: perplexity {:.2}",
                        pass + 1,
                        params.num_passes,
                        (-ll / tokens).exp()
                    );
                }
            }
        }
    }

    Ok(LdaModel {
        num_topics,
        num_terms,
        alpha,
        eta,
        topic_word,
        topic_totals,
        infer_iterations: params.num_iterations,
    })
}

/// Draw a new topic for one token from the collapsed conditional.
fn sample_topic(
    term: usize,
    doc: usize,
    topic_word: &Array2<f64>,
    doc_topic: &Array2<f64>,
    topic_totals: &Array1<f64>,
    alpha: &[f64],
    alpha_total: f64,
    eta: f64,
    eta_sum: f64,
    rng: &mut StdRng,
) -> usize {
    let num_topics = alpha.len();
    let mut probs = Vec::with_capacity(num_topics);
    let mut total = 0.0;
    let doc_total = doc_topic.row(doc).sum() + alpha_total;

    for k in 0..num_topics {
        // P(topic | doc) * P(term | topic)
        let theta = (doc_topic[[doc, k]] + alpha[k]) / doc_total;
        let phi = (topic_word[[k, term]] + eta) / (topic_totals[k] + eta_sum);
        let p = theta * phi;
        total += p;
        probs.push(p);
    }

    let threshold = rng.gen_range(0.0..total);
    let mut cumsum = 0.0;
    for (k, &p) in probs.iter().enumerate() {
        cumsum += p;
        if cumsum >= threshold {
            return k;
        }
    }

    num_topics - 1
}

fn log_likelihood(
    topic_word: &Array2<f64>,
    doc_topic: &Array2<f64>,
    topic_totals: &Array1<f64>,
    alpha: &[f64],
    eta: f64,
    eta_sum: f64,
) -> f64 {
    let (num_topics, num_terms) = topic_word.dim();
    let alpha_total: f64 = alpha.iter().sum();
    let mut ll = 0.0;

    for k in 0..num_topics {
        for w in 0..num_terms {
            let count = topic_word[[k, w]];
            if count > 0.0 {
                ll += count * ((count + eta) / (topic_totals[k] + eta_sum)).ln();
            }
        }
    }
    for d in 0..doc_topic.nrows() {
        let doc_total = doc_topic.row(d).sum() + alpha_total;
        for k in 0..num_topics {
            let count = doc_topic[[d, k]];
            if count > 0.0 {
                ll += count * ((count + alpha[k]) / doc_total).ln();
            }
        }
    }

    ll
}

impl LdaModel {
    /// Smoothed probability of `term` under `topic`.
    pub fn topic_term_prob(&self, topic: usize, term: usize) -> f64 {
        let eta_sum = self.eta * self.num_terms as f64;
        (self.topic_word[[topic, term]] + self.eta) / (self.topic_totals[topic] + eta_sum)
    }

    /// Highest-probability terms for one topic, descending.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<(usize, f64)> {
        let mut terms: Vec<(usize, f64)> = (0..self.num_terms)
            .map(|w| (w, self.topic_term_prob(topic, w)))
            .collect();
        terms.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        terms.truncate(n);
        terms
    }

    /// Fraction of all sampled tokens assigned to each topic.
    pub fn topic_shares(&self) -> Vec<f64> {
        let total = self.topic_totals.sum();
        if total <= 0.0 {
            return vec![1.0 / self.num_topics as f64; self.num_topics];
        }
        self.topic_totals.iter().map(|&c| c / total).collect()
    }

    /// Infer a topic mixture for one bag-of-words document.
    ///
    /// Inference is deterministic: tokens move to their argmax topic until
    /// the assignment is stable or the iteration cap is reached. Terms the
    /// model has never seen are ignored.
    pub fn infer_doc_topics(&self, doc: &[(usize, f64)]) -> Vec<f64> {
        let alpha_total: f64 = self.alpha.iter().sum();
        let tokens: Vec<(usize, usize)> = doc
            .iter()
            .filter_map(|&(term, weight)| {
                let count = weight.round() as usize;
                (term < self.num_terms && count > 0).then_some((term, count))
            })
            .collect();

        if tokens.is_empty() {
            return self.alpha.iter().map(|&a| a / alpha_total).collect();
        }

        let mut topic_counts = vec![0.0; self.num_topics];
        let mut assignments = Vec::with_capacity(tokens.len());
        for &(term, count) in &tokens {
            let k = self.best_topic(term, &topic_counts);
            topic_counts[k] += count as f64;
            assignments.push(k);
        }
        for _ in 1..self.infer_iterations.max(1) {
            let mut changed = false;
            for (i, &(term, count)) in tokens.iter().enumerate() {
                let old = assignments[i];
                topic_counts[old] -= count as f64;
                let new = self.best_topic(term, &topic_counts);
                topic_counts[new] += count as f64;
                if new != old {
                    assignments[i] = new;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let total_tokens: f64 = tokens.iter().map(|&(_, c)| c as f64).sum();
        let denom = total_tokens + alpha_total;
        (0..self.num_topics)
            .map(|k| (topic_counts[k] + self.alpha[k]) / denom)
            .collect()
    }

    fn best_topic(&self, term: usize, topic_counts: &[f64]) -> usize {
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for k in 0..self.num_topics {
            let score = (topic_counts[k] + self.alpha[k]) * self.topic_term_prob(k, term);
            if score > best_score {
                best_score = score;
                best = k;
            }
        }
        best
    }
}

/// Index and probability of the strongest entry in a distribution.
///
/// Ties keep the lowest index; an empty slice maps to topic 0.
pub fn dominant_topic(distribution: &[f64]) -> (usize, f64) {
    let mut best = (0, 0.0);
    for (k, &p) in distribution.iter().enumerate() {
        if p > best.1 {
            best = (k, p);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cluster_corpus() -> (Dictionary, Corpus) {
        let tokens = ["market", "price", "trade", "genome", "protein", "cell"]
            .map(String::from)
            .to_vec();
        let docs = vec![
            vec![(0, 9.0), (1, 6.0), (2, 6.0)],
            vec![(0, 6.0), (1, 9.0), (2, 3.0)],
            vec![(0, 3.0), (1, 6.0), (2, 9.0)],
            vec![(3, 9.0), (4, 6.0), (5, 6.0)],
            vec![(3, 6.0), (4, 9.0), (5, 3.0)],
            vec![(3, 3.0), (4, 6.0), (5, 9.0)],
        ];
        (Dictionary::from_tokens(tokens, 6), Corpus::from_documents(docs, 6))
    }

    fn params(num_topics: usize, prior: DirichletPrior, passes: usize) -> HyperParams {
        HyperParams {
            num_topics,
            dir_prior: prior,
            random_state: 42,
            num_passes: passes,
            num_iterations: 50,
        }
    }

    #[test]
    fn seeded_training_is_reproducible() {
        let (dictionary, corpus) = two_cluster_corpus();
        let p = params(3, DirichletPrior::Symmetric, 20);
        let settings = TrainSettings::default();

        let a = train_model(&dictionary, &corpus, &p, &settings).unwrap();
        let b = train_model(&dictionary, &corpus, &p, &settings).unwrap();

        assert_eq!(a.topic_word, b.topic_word);
        assert_eq!(a.alpha, b.alpha);
    }

    #[test]
    fn two_cluster_corpus_separates() {
        let (dictionary, corpus) = two_cluster_corpus();
        let p = params(2, DirichletPrior::Symmetric, 200);
        let model = train_model(&dictionary, &corpus, &p, &TrainSettings::default()).unwrap();

        let dominant: Vec<usize> = corpus
            .documents()
            .iter()
            .map(|doc| dominant_topic(&model.infer_doc_topics(doc)).0)
            .collect();

        assert_eq!(dominant[0], dominant[1]);
        assert_eq!(dominant[1], dominant[2]);
        assert_eq!(dominant[3], dominant[4]);
        assert_eq!(dominant[4], dominant[5]);
        assert_ne!(dominant[0], dominant[3], "clusters should land on different topics");
    }

    #[test]
    fn auto_prior_keeps_a_normalized_concentration() {
        let (dictionary, corpus) = two_cluster_corpus();
        let p = params(2, DirichletPrior::Auto, 10);
        let model = train_model(&dictionary, &corpus, &p, &TrainSettings::default()).unwrap();

        // Re-estimation reshapes alpha each pass but must keep every component
        // positive with the starting concentration of 1.0.
        assert_eq!(model.alpha.len(), 2);
        let total: f64 = model.alpha.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(model.alpha.iter().all(|&a| a > 0.0));
    }

    #[test]
    fn fixed_priors_pass_through_unchanged() {
        let (dictionary, corpus) = two_cluster_corpus();
        let settings = TrainSettings::default();

        let model = train_model(
            &dictionary,
            &corpus,
            &params(2, DirichletPrior::Symmetric, 10),
            &settings,
        )
        .unwrap();
        assert_eq!(model.alpha, vec![0.5, 0.5]);

        let model = train_model(
            &dictionary,
            &corpus,
            &params(2, DirichletPrior::Concentration(42.0), 10),
            &settings,
        )
        .unwrap();
        assert_eq!(model.alpha, vec![42.0, 42.0]);
    }

    #[test]
    fn perplexity_logging_does_not_change_the_fit() {
        let (dictionary, corpus) = two_cluster_corpus();
        let p = params(3, DirichletPrior::Symmetric, 4);

        let quiet = train_model(&dictionary, &corpus, &p, &TrainSettings::default()).unwrap();
        let logged = train_model(
            &dictionary,
            &corpus,
            &p,
            &TrainSettings {
                minimum_probability: 0.0,
                eval_every: Some(1),
            },
        )
        .unwrap();

        assert_eq!(quiet.topic_word, logged.topic_word);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let (dictionary, corpus) = two_cluster_corpus();
        let settings = TrainSettings::default();

        let err = train_model(
            &dictionary,
            &corpus,
            &params(0, DirichletPrior::Auto, 1),
            &settings,
        )
        .unwrap_err();
        assert!(matches!(err, TrainError::InvalidTopicCount));

        let empty = Corpus::from_documents(Vec::new(), 6);
        let err = train_model(
            &dictionary,
            &empty,
            &params(2, DirichletPrior::Auto, 1),
            &settings,
        )
        .unwrap_err();
        assert!(matches!(err, TrainError::EmptyCorpus));

        let err = train_model(
            &dictionary,
            &corpus,
            &params(2, DirichletPrior::Auto, 0),
            &settings,
        )
        .unwrap_err();
        assert!(matches!(err, TrainError::InvalidParameter(_)));
    }

    #[test]
    fn empty_document_gets_the_prior_mixture() {
        let (dictionary, corpus) = two_cluster_corpus();
        let p = params(4, DirichletPrior::Symmetric, 5);
        let model = train_model(&dictionary, &corpus, &p, &TrainSettings::default()).unwrap();

        let mixture = model.infer_doc_topics(&[]);
        assert_eq!(mixture, vec![0.25; 4]);
    }

    #[test]
    fn inferred_mixture_is_a_distribution() {
        let (dictionary, corpus) = two_cluster_corpus();
        let p = params(3, DirichletPrior::Asymmetric, 20);
        let model = train_model(&dictionary, &corpus, &p, &TrainSettings::default()).unwrap();

        let mixture = model.infer_doc_topics(&corpus.documents()[0]);
        assert_eq!(mixture.len(), 3);
        assert!(mixture.iter().all(|&p| p >= 0.0));
        let total: f64 = mixture.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn top_terms_are_sorted_descending() {
        let (dictionary, corpus) = two_cluster_corpus();
        let p = params(2, DirichletPrior::Symmetric, 20);
        let model = train_model(&dictionary, &corpus, &p, &TrainSettings::default()).unwrap();

        let terms = model.top_terms(0, 4);
        assert_eq!(terms.len(), 4);
        assert!(terms.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn dominant_topic_picks_the_first_maximum() {
        assert_eq!(dominant_topic(&[0.2, 0.5, 0.3]), (1, 0.5));
        assert_eq!(dominant_topic(&[0.5, 0.5]), (0, 0.5));
        assert_eq!(dominant_topic(&[]), (0, 0.0));
    }
}
