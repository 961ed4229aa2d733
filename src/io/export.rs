//! Export per-document topic mixtures to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::train::lda::dominant_topic;

/// One corpus document's inferred topic mixture.
#[derive(Debug, Clone)]
pub struct DocTopicRow {
    pub doc_id: usize,
    pub distribution: Vec<f64>,
}

/// Write rows as `doc_id,dominant_topic,dominant_prob,topic_0..topic_{K-1}`.
///
/// Cells below `minimum_probability` are left empty so the sparsity of each
/// mixture shows up directly in the sheet.
pub fn write_doc_topics_csv(
    path: &Path,
    rows: &[DocTopicRow],
    num_topics: usize,
    minimum_probability: f64,
) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create doc-topics CSV '{}': {e}", path.display())))?;

    // Header
    let topic_cols: Vec<String> = (0..num_topics).map(|k| format!("topic_{k}")).collect();
    writeln!(file, "doc_id,dominant_topic,dominant_prob,{}", topic_cols.join(","))
        .map_err(|e| AppError::new(4, format!("Failed to write doc-topics CSV header: {e}")))?;

    for row in rows {
        let (topic, prob) = dominant_topic(&row.distribution);
        let cells: Vec<String> = row
            .distribution
            .iter()
            .map(|&p| if p >= minimum_probability { format!("{p:.6}") } else { String::new() })
            .collect();
        writeln!(file, "{},{topic},{prob:.6},{}", row.doc_id, cells.join(","))
            .map_err(|e| AppError::new(4, format!("Failed to write doc-topics CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::TempDir;

    fn sample_rows() -> Vec<DocTopicRow> {
        vec![
            DocTopicRow { doc_id: 0, distribution: vec![0.7, 0.3] },
            DocTopicRow { doc_id: 1, distribution: vec![0.2, 0.8] },
        ]
    }

    #[test]
    fn writes_header_and_distributions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc_topics.csv");

        write_doc_topics_csv(&path, &sample_rows(), 2, 0.0).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "doc_id,dominant_topic,dominant_prob,topic_0,topic_1");
        assert_eq!(lines[1], "0,0,0.700000,0.700000,0.300000");
        assert_eq!(lines[2], "1,1,0.800000,0.200000,0.800000");
    }

    #[test]
    fn blanks_cells_below_the_probability_floor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc_topics.csv");

        write_doc_topics_csv(&path, &sample_rows(), 2, 0.5).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "0,0,0.700000,0.700000,");
        assert_eq!(lines[2], "1,1,0.800000,,0.800000");
    }

    #[test]
    fn fails_when_the_target_directory_is_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("doc_topics.csv");
        let err = write_doc_topics_csv(&path, &sample_rows(), 2, 0.0).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
