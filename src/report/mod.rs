//! Reporting utilities: formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the driver/sampling code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::{GridRunOutput, GridStatus};
use crate::domain::GridConfig;
use crate::io::corpus::Dictionary;
use crate::io::store::ModelMeta;
use crate::train::lda::LdaModel;

/// Format the full run summary (inputs + grid shape + outcome counts).
pub fn format_run_summary(config: &GridConfig, output: &GridRunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== lda - LDA grid search ===\n");
    out.push_str(&format!("Inputs : {}\n", config.file_folder.display()));
    out.push_str(&format!("Models : {}\n", config.save_folder.display()));
    out.push_str(&format!(
        "Corpus : {} docs | {} terms | {} nonzero | {:.0} tokens\n",
        output.stats.num_docs,
        output.stats.num_terms,
        output.stats.nonzero_entries,
        output.stats.total_tokens,
    ));
    out.push_str(&format!(
        "Grid   : {} points ({} topics x {} priors x {} seeds x {} passes)\n",
        config.grid.len(),
        config.grid.topic_counts.len(),
        config.grid.dirichlet_priors.len(),
        config.grid.random_states.len(),
        config.grid.pass_counts.len(),
    ));

    out.push('\n');
    out.push_str(&format!(
        "Trained {} | skipped {} | {:.1}s\n",
        output.trained.len(),
        output.skipped.len(),
        output.elapsed.as_secs_f64(),
    ));

    out
}

/// Format the per-grid-point completion table.
pub fn format_status(status: &GridStatus) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:>6} {:<10} {:>6} {:>6} {:<8}\n",
        "topics", "prior", "seed", "passes", "status"
    ));
    out.push_str(&format!(
        "{:-<6} {:-<10} {:-<6} {:-<6} {:-<8}\n",
        "", "", "", "", ""
    ));

    for (params, trained) in &status.rows {
        out.push_str(&format!(
            "{:>6} {:<10} {:>6} {:>6} {:<8}\n",
            params.num_topics,
            params.dir_prior.to_string(),
            params.random_state,
            params.num_passes,
            if *trained { "trained" } else { "-" },
        ));
    }

    out.push_str(&format!("\nTrained {}/{}\n", status.trained(), status.total()));

    out
}

/// Format one model's topics as ranked term lists.
///
/// Term ids missing from the dictionary print as `term<id>` instead of
/// failing the whole view.
pub fn format_topics(
    model: &LdaModel,
    dictionary: &Dictionary,
    meta: &ModelMeta,
    top_n: usize,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("Model  : {}\n", meta.params));
    out.push_str(&format!(
        "Corpus : {} docs | {} terms\n",
        meta.corpus.num_docs, meta.corpus.num_terms
    ));
    out.push('\n');

    let shares = model.topic_shares();
    for topic in 0..model.num_topics {
        let terms: Vec<String> = model
            .top_terms(topic, top_n)
            .into_iter()
            .map(|(term, prob)| {
                let token = dictionary
                    .token(term)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("term{term}"));
                format!("{token} {prob:.3}")
            })
            .collect();
        out.push_str(&format!(
            "Topic {topic} ({:.1}%): {}\n",
            shares[topic] * 100.0,
            terms.join(", ")
        ));
    }

    out
}
