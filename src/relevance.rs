//! LLM relevance screening of corpus abstracts.
//!
//! Each TEI document's abstract is rated several times (the label is
//! stochastic at non-zero temperature); per-iteration labels, rationales and
//! the mean over parseable ratings are written as CSV. The output is saved
//! after every article so an interrupted run loses at most one article.

use crate::error::Result;
use crate::llm::{split_label_rationale, ChatClient};
use crate::prompts::relevance::SYSTEM_PROMPT;
use crate::tei::TeiDocument;
use std::path::Path;
use tracing::{info, warn};

/// Rating rows for one article.
#[derive(Debug, Clone)]
pub struct RelevanceRow {
    pub filename: String,
    pub title: String,
    pub doi: String,
    pub date: String,
    pub authors: String,
    pub abstract_text: String,
    /// Per-iteration label id: 1 = relevant, 0 = irrelevant, None = unparseable.
    pub ratings: Vec<Option<u8>>,
    /// Per-iteration rationale ("NA" when unparseable).
    pub rationales: Vec<String>,
}

impl RelevanceRow {
    /// Mean over the iterations that produced a parseable label.
    pub fn mean_rating(&self) -> Option<f64> {
        let parsed: Vec<u8> = self.ratings.iter().flatten().copied().collect();
        if parsed.is_empty() {
            None
        } else {
            Some(parsed.iter().map(|&r| r as f64).sum::<f64>() / parsed.len() as f64)
        }
    }
}

/// Counts for one rating run.
#[derive(Debug, Clone, Default)]
pub struct RelevanceReport {
    pub articles: usize,
    pub rated: usize,
    /// Documents skipped before rating (unparseable or no abstract).
    pub skipped: usize,
}

/// Map a reply label to its numeric id.
fn label_id(label: &str) -> Option<u8> {
    match label {
        "relevant" => Some(1),
        "irrelevant" => Some(0),
        _ => None,
    }
}

/// Rate every TEI document in a directory, writing the CSV after each article.
pub async fn rate_directory(
    client: &ChatClient,
    input_dir: &Path,
    output_csv: &Path,
    iterations: usize,
) -> Result<RelevanceReport> {
    let files = crate::corpus::list_xml_files(input_dir)?;
    let mut report = RelevanceReport {
        articles: files.len(),
        ..Default::default()
    };
    let mut rows: Vec<RelevanceRow> = Vec::new();

    info!(articles = files.len(), iterations, "Rating abstracts for relevance");

    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let doc = match TeiDocument::from_file(&path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(file = %filename, error = %e, "Unparseable document, skipping");
                report.skipped += 1;
                continue;
            }
        };

        let abstract_text = match doc.abstract_text.clone() {
            Some(text) => text,
            None => {
                warn!(file = %filename, "Document has no abstract, skipping");
                report.skipped += 1;
                continue;
            }
        };

        let mut row = RelevanceRow {
            filename: filename.clone(),
            title: doc.title.clone().unwrap_or_default(),
            doi: doc.doi.clone().unwrap_or_default(),
            date: doc.date.clone().unwrap_or_default(),
            authors: doc.authors.join("\n"),
            abstract_text: abstract_text.clone(),
            ratings: Vec::with_capacity(iterations),
            rationales: Vec::with_capacity(iterations),
        };

        for iteration in 0..iterations {
            match client.complete(SYSTEM_PROMPT, &abstract_text).await {
                Ok(reply) => match split_label_rationale(&reply) {
                    Some((label, rationale)) => {
                        row.ratings.push(label_id(&label));
                        row.rationales.push(rationale);
                    }
                    None => {
                        warn!(file = %filename, iteration, "Unparseable reply");
                        row.ratings.push(None);
                        row.rationales.push("NA".to_string());
                    }
                },
                Err(e) => {
                    warn!(file = %filename, iteration, error = %e, "Rating request failed");
                    row.ratings.push(None);
                    row.rationales.push("NA".to_string());
                }
            }
        }

        info!(file = %filename, mean = ?row.mean_rating(), "Article rated");
        rows.push(row);
        report.rated += 1;

        // Incremental save: an interrupted run keeps everything rated so far.
        write_ratings(output_csv, &rows, iterations)?;
    }

    Ok(report)
}

/// Write rating rows with per-iteration columns and the mean.
pub fn write_ratings(path: &Path, rows: &[RelevanceRow], iterations: usize) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "filename".to_string(),
        "title".to_string(),
        "abstract".to_string(),
        "DOI".to_string(),
        "date".to_string(),
        "authors".to_string(),
    ];
    for i in 1..=iterations {
        header.push(format!("rating_relevance{}", i));
        header.push(format!("rationale{}", i));
    }
    header.push("mean_rating_relevance".to_string());
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.filename.clone(),
            row.title.clone(),
            row.abstract_text.clone(),
            row.doi.clone(),
            row.date.clone(),
            row.authors.clone(),
        ];
        for i in 0..iterations {
            record.push(
                row.ratings
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "NA".to_string()),
            );
            record.push(
                row.rationales
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| "NA".to_string()),
            );
        }
        record.push(
            row.mean_rating()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "NA".to_string()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_ratings(ratings: Vec<Option<u8>>) -> RelevanceRow {
        RelevanceRow {
            filename: "a.xml".to_string(),
            title: "T".to_string(),
            doi: "10.1/aaa".to_string(),
            date: "2020".to_string(),
            authors: "A".to_string(),
            abstract_text: "text".to_string(),
            rationales: vec!["r".to_string(); ratings.len()],
            ratings,
        }
    }

    #[test]
    fn test_mean_ignores_unparseable_iterations() {
        let row = row_with_ratings(vec![Some(1), None, Some(0), Some(1)]);
        let mean = row.mean_rating().unwrap();
        assert!((mean - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_is_none_when_nothing_parsed() {
        let row = row_with_ratings(vec![None, None]);
        assert_eq!(row.mean_rating(), None);
    }

    #[test]
    fn test_label_id_mapping() {
        assert_eq!(label_id("relevant"), Some(1));
        assert_eq!(label_id("irrelevant"), Some(0));
        assert_eq!(label_id("maybe"), None);
    }

    #[test]
    fn test_write_ratings_headers_and_na() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![row_with_ratings(vec![Some(1), None])];

        write_ratings(&path, &rows, 2).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.contains("rating_relevance1"));
        assert!(header.contains("rationale2"));
        assert!(header.contains("mean_rating_relevance"));
        assert!(content.lines().nth(1).unwrap().contains("NA"));
    }
}
