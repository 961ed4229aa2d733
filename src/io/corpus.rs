//! Dictionary and corpus ingest.
//!
//! This module reads the interchange files produced by standard topic-modeling
//! toolkits:
//!
//! - `dictionary.txt` — one `<id>\t<token>\t<doc_freq>` line per term, after a
//!   header line holding the document count
//! - `corpus.mm` — bag-of-words documents in MatrixMarket coordinate format
//!
//! Design goals:
//! - **Strict schema** with clear errors (exit code 3) naming file and line
//! - **No partial loads**: a malformed file fails the whole run before any
//!   model directory is created
//! - **Separation of concerns**: no training logic here

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;

/// Dictionary filename expected under the input folder.
pub const DICTIONARY_FILE: &str = "dictionary.txt";
/// Corpus filename expected under the input folder.
pub const CORPUS_FILE: &str = "corpus.mm";

/// Upper bound on a single bag-of-words weight; the sampler expands each
/// weight into that many token repeats.
pub const MAX_ENTRY_WEIGHT: f64 = 1e9;

/// Vocabulary mapping term ids to tokens.
#[derive(Debug, Clone)]
pub struct Dictionary {
    /// Document count recorded in the file header.
    pub num_docs: usize,
    tokens: Vec<String>,
}

impl Dictionary {
    /// Build a dictionary from an in-memory token list (position = term id).
    pub fn from_tokens(tokens: Vec<String>, num_docs: usize) -> Self {
        Self { num_docs, tokens }
    }

    /// Load the tab-separated text format.
    pub fn load_text(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::new(3, format!("Failed to open dictionary '{}': {e}", path.display()))
        })?;
        let reader = BufReader::new(file);

        let mut num_docs = None;
        let mut entries: Vec<(usize, String)> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| {
                AppError::new(
                    3,
                    format!("Failed to read dictionary '{}' line {line_no}: {e}", path.display()),
                )
            })?;
            if line.trim().is_empty() {
                continue;
            }

            // First non-empty line is the document-count header.
            if num_docs.is_none() {
                num_docs = Some(line.trim().parse::<usize>().map_err(|_| {
                    AppError::new(
                        3,
                        format!(
                            "Invalid dictionary '{}' line {line_no}: expected a document-count header, got '{}'.",
                            path.display(),
                            line.trim()
                        ),
                    )
                })?);
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                return Err(AppError::new(
                    3,
                    format!(
                        "Invalid dictionary '{}' line {line_no}: expected `id<TAB>token<TAB>doc_freq`, got {} field(s).",
                        path.display(),
                        fields.len()
                    ),
                ));
            }

            let id = fields[0].trim().parse::<usize>().map_err(|_| {
                AppError::new(
                    3,
                    format!("Invalid dictionary '{}' line {line_no}: bad term id '{}'.", path.display(), fields[0]),
                )
            })?;
            let token = fields[1].trim();
            if token.is_empty() {
                return Err(AppError::new(
                    3,
                    format!("Invalid dictionary '{}' line {line_no}: empty token.", path.display()),
                ));
            }
            fields[2].trim().parse::<usize>().map_err(|_| {
                AppError::new(
                    3,
                    format!(
                        "Invalid dictionary '{}' line {line_no}: bad document frequency '{}'.",
                        path.display(),
                        fields[2]
                    ),
                )
            })?;

            entries.push((id, token.to_string()));
        }

        let Some(num_docs) = num_docs else {
            return Err(AppError::new(
                3,
                format!("Empty dictionary '{}'.", path.display()),
            ));
        };

        // Term ids must cover 0..len without gaps or duplicates, so a plain
        // vector can serve as the id-to-token map. Ids are bounded by the
        // entry count up front, so a corrupt id cannot size the table.
        let size = entries.len();
        let mut tokens: Vec<Option<String>> = vec![None; size];
        for (id, token) in entries {
            if id >= size {
                return Err(AppError::new(
                    3,
                    format!(
                        "Invalid dictionary '{}': term id {id} is out of range for {size} term(s).",
                        path.display()
                    ),
                ));
            }
            if tokens[id].is_some() {
                return Err(AppError::new(
                    3,
                    format!("Invalid dictionary '{}': duplicate term id {id}.", path.display()),
                ));
            }
            tokens[id] = Some(token);
        }
        let mut compact = Vec::with_capacity(size);
        for (id, slot) in tokens.into_iter().enumerate() {
            match slot {
                Some(token) => compact.push(token),
                None => {
                    return Err(AppError::new(
                        3,
                        format!(
                            "Invalid dictionary '{}': term ids are not contiguous (id {id} is missing).",
                            path.display()
                        ),
                    ));
                }
            }
        }

        Ok(Self {
            num_docs,
            tokens: compact,
        })
    }

    /// Size of the term-id space.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }
}

/// Bag-of-words corpus, documents in file order.
#[derive(Debug, Clone)]
pub struct Corpus {
    /// Size of the term-id space declared by the file.
    pub num_terms: usize,
    docs: Vec<Vec<(usize, f64)>>,
}

impl Corpus {
    /// Build a corpus from in-memory documents of `(term id, weight)` pairs.
    pub fn from_documents(docs: Vec<Vec<(usize, f64)>>, num_terms: usize) -> Self {
        Self { num_terms, docs }
    }

    /// Load MatrixMarket coordinate format (1-based doc/term indices).
    pub fn load_matrix_market(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::new(3, format!("Failed to open corpus '{}': {e}", path.display()))
        })?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines().enumerate();

        let banner = match lines.next() {
            Some((_, Ok(line))) => line,
            Some((_, Err(e))) => {
                return Err(AppError::new(
                    3,
                    format!("Failed to read corpus '{}': {e}", path.display()),
                ));
            }
            None => {
                return Err(AppError::new(3, format!("Empty corpus '{}'.", path.display())));
            }
        };
        if !banner.to_ascii_lowercase().starts_with("%%matrixmarket matrix coordinate") {
            return Err(AppError::new(
                3,
                format!(
                    "Invalid corpus '{}': expected a MatrixMarket coordinate banner, got '{banner}'.",
                    path.display()
                ),
            ));
        }

        let mut sizes: Option<(usize, usize, usize)> = None;
        let mut docs: Vec<Vec<(usize, f64)>> = Vec::new();
        let mut entries_seen = 0usize;

        for (idx, line) in lines {
            let line_no = idx + 1;
            let line = line.map_err(|e| {
                AppError::new(
                    3,
                    format!("Failed to read corpus '{}' line {line_no}: {e}", path.display()),
                )
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('%') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();

            // First data line declares `num_docs num_terms num_entries`.
            let Some((num_docs, num_terms, num_entries)) = sizes else {
                if fields.len() != 3 {
                    return Err(AppError::new(
                        3,
                        format!(
                            "Invalid corpus '{}' line {line_no}: expected `docs terms entries` size line.",
                            path.display()
                        ),
                    ));
                }
                let parse = |s: &str| -> Result<usize, AppError> {
                    s.parse::<usize>().map_err(|_| {
                        AppError::new(
                            3,
                            format!("Invalid corpus '{}' line {line_no}: bad size value '{s}'.", path.display()),
                        )
                    })
                };
                let header = (parse(fields[0])?, parse(fields[1])?, parse(fields[2])?);
                docs = vec![Vec::new(); header.0];
                sizes = Some(header);
                continue;
            };

            if fields.len() != 3 {
                return Err(AppError::new(
                    3,
                    format!(
                        "Invalid corpus '{}' line {line_no}: expected `doc term weight`, got {} field(s).",
                        path.display(),
                        fields.len()
                    ),
                ));
            }

            let doc = fields[0].parse::<usize>().ok().filter(|&d| d >= 1 && d <= num_docs);
            let term = fields[1].parse::<usize>().ok().filter(|&t| t >= 1 && t <= num_terms);
            let weight = fields[2]
                .parse::<f64>()
                .ok()
                .filter(|w| w.is_finite() && *w > 0.0 && *w <= MAX_ENTRY_WEIGHT);
            let (Some(doc), Some(term), Some(weight)) = (doc, term, weight) else {
                return Err(AppError::new(
                    3,
                    format!(
                        "Invalid corpus '{}' line {line_no}: entry '{trimmed}' is out of range or malformed.",
                        path.display()
                    ),
                ));
            };

            entries_seen += 1;
            if entries_seen > num_entries {
                return Err(AppError::new(
                    3,
                    format!(
                        "Invalid corpus '{}': more than the declared {num_entries} entries.",
                        path.display()
                    ),
                ));
            }
            docs[doc - 1].push((term - 1, weight));
        }

        let Some((_, num_terms, num_entries)) = sizes else {
            return Err(AppError::new(
                3,
                format!("Invalid corpus '{}': missing size line.", path.display()),
            ));
        };
        if entries_seen != num_entries {
            return Err(AppError::new(
                3,
                format!(
                    "Invalid corpus '{}': declared {num_entries} entries but found {entries_seen}.",
                    path.display()
                ),
            ));
        }

        Ok(Self { num_terms, docs })
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    /// Documents as `(term id, weight)` pairs, 0-based ids.
    pub fn documents(&self) -> &[Vec<(usize, f64)>] {
        &self.docs
    }
}

/// Summary stats about the loaded inputs (for logs and the sidecar).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub num_docs: usize,
    pub num_terms: usize,
    pub nonzero_entries: usize,
    pub total_tokens: f64,
}

/// Loaded inputs: vocabulary + bag-of-words corpus + summary stats.
#[derive(Debug, Clone)]
pub struct CorpusBundle {
    pub dictionary: Dictionary,
    pub corpus: Corpus,
    pub stats: CorpusStats,
}

/// Load dictionary and corpus from the input folder, cross-checking the pair.
pub fn load_corpus_bundle(file_folder: &Path) -> Result<CorpusBundle, AppError> {
    let dictionary = Dictionary::load_text(&file_folder.join(DICTIONARY_FILE))?;
    let corpus = Corpus::load_matrix_market(&file_folder.join(CORPUS_FILE))?;

    if corpus.num_terms > dictionary.len() {
        return Err(AppError::new(
            3,
            format!(
                "Corpus references {} terms but the dictionary defines only {}.",
                corpus.num_terms,
                dictionary.len()
            ),
        ));
    }
    if dictionary.num_docs != 0 && dictionary.num_docs != corpus.num_docs() {
        warn!(
            "dictionary header says {} documents, corpus has {}",
            dictionary.num_docs,
            corpus.num_docs()
        );
    }

    let nonzero_entries = corpus.documents().iter().map(Vec::len).sum();
    let total_tokens = corpus
        .documents()
        .iter()
        .flat_map(|doc| doc.iter().map(|(_, w)| w))
        .sum();
    let stats = CorpusStats {
        num_docs: corpus.num_docs(),
        num_terms: dictionary.len(),
        nonzero_entries,
        total_tokens,
    };

    Ok(CorpusBundle {
        dictionary,
        corpus,
        stats,
    })
}
