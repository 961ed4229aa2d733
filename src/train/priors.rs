//! Document-topic prior resolution and re-estimation.
//!
//! A prior choice expands to a per-topic alpha vector before training. The
//! `auto` prior starts symmetric and is re-fit against the observed
//! document-topic counts after every pass.

use ndarray::Array2;

use crate::domain::DirichletPrior;

/// Floor keeping every alpha component strictly positive.
const MIN_ALPHA: f64 = 1e-6;

/// Expand a prior choice into a length-`num_topics` alpha vector.
pub fn resolve_alpha(prior: DirichletPrior, num_topics: usize) -> Vec<f64> {
    let k = num_topics as f64;
    match prior {
        DirichletPrior::Auto | DirichletPrior::Symmetric => vec![1.0 / k; num_topics],
        DirichletPrior::Asymmetric => (0..num_topics)
            .map(|i| 1.0 / (i as f64 + k.sqrt()))
            .collect(),
        DirichletPrior::Concentration(c) => vec![c; num_topics],
    }
}

/// Re-fit alpha against the document-topic counts by moment matching.
///
/// The total concentration is preserved; only the shape moves, toward the
/// mean posterior topic mixture across documents.
pub fn reestimate_alpha(alpha: &mut [f64], doc_topic: &Array2<f64>) {
    let (num_docs, num_topics) = doc_topic.dim();
    if num_docs == 0 || num_topics == 0 {
        return;
    }

    let concentration: f64 = alpha.iter().sum();
    let mut mean = vec![0.0; num_topics];
    for d in 0..num_docs {
        let doc_total = doc_topic.row(d).sum() + concentration;
        for k in 0..num_topics {
            mean[k] += (doc_topic[[d, k]] + alpha[k]) / doc_total;
        }
    }

    for (a, m) in alpha.iter_mut().zip(&mean) {
        *a = (concentration * m / num_docs as f64).max(MIN_ALPHA);
    }

    // The floor can nudge the total; rescale so the concentration is exact.
    let new_total: f64 = alpha.iter().sum();
    if new_total > 0.0 {
        let scale = concentration / new_total;
        for a in alpha.iter_mut() {
            *a *= scale;
        }
    }
}
