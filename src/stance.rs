//! LLM stance classification of article paragraphs.
//!
//! Input is a CSV with paragraph columns (`p1`, `p2`, ...); each paragraph is
//! classified into one of four stance categories toward memory decay. The
//! enriched CSV gains a `p{n}_rating_category` and `p{n}_rating_rationale`
//! column per paragraph and is rewritten after every row.

use crate::error::{CuratorError, Result};
use crate::llm::{split_label_rationale, ChatClient};
use crate::prompts::stance::SYSTEM_PROMPT;
use regex::Regex;
use std::path::Path;
use tracing::{info, warn};

/// Counts for one classification run.
#[derive(Debug, Clone, Default)]
pub struct StanceReport {
    pub rows: usize,
    pub paragraphs_classified: usize,
    /// Paragraphs that were empty or whose reply was unparseable.
    pub paragraphs_unrated: usize,
}

/// Map a reply label to its numeric stance id.
fn stance_id(label: &str) -> Option<u8> {
    match label {
        "ambiguous" => Some(0),
        "against" => Some(1),
        "support" => Some(2),
        "tacit_acceptance" | "tacit acceptance" => Some(3),
        _ => None,
    }
}

/// Classify every paragraph column of every row, writing after each row.
pub async fn classify_csv(
    client: &ChatClient,
    input_csv: &Path,
    output_csv: &Path,
) -> Result<StanceReport> {
    let mut reader = csv::Reader::from_path(input_csv)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let paragraph_re = Regex::new(r"^p\d+$")
        .map_err(|e| CuratorError::Config(format!("Invalid paragraph pattern: {}", e)))?;
    let paragraph_cols: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| paragraph_re.is_match(h))
        .map(|(i, _)| i)
        .collect();

    if paragraph_cols.is_empty() {
        return Err(CuratorError::Validation(format!(
            "No paragraph columns (p1, p2, ...) in {}",
            input_csv.display()
        )));
    }

    let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    let mut report = StanceReport {
        rows: rows.len(),
        ..Default::default()
    };

    info!(
        rows = rows.len(),
        paragraphs_per_row = paragraph_cols.len(),
        "Classifying paragraph stances"
    );

    // Output rows grow two columns per paragraph column.
    let mut out_rows: Vec<Vec<String>> = Vec::with_capacity(rows.len());

    for (row_idx, row) in rows.iter().enumerate() {
        let mut out_row: Vec<String> = row.iter().map(|f| f.to_string()).collect();

        for &col in &paragraph_cols {
            let paragraph = row.get(col).unwrap_or_default().trim().to_string();
            if paragraph.is_empty() {
                out_row.push("NA".to_string());
                out_row.push("NA".to_string());
                report.paragraphs_unrated += 1;
                continue;
            }

            let (category, rationale) = match client.complete(SYSTEM_PROMPT, &paragraph).await {
                Ok(reply) => match split_label_rationale(&reply).and_then(|(label, rationale)| {
                    stance_id(&label).map(|id| (id, rationale))
                }) {
                    Some((id, rationale)) => {
                        report.paragraphs_classified += 1;
                        (id.to_string(), rationale)
                    }
                    None => {
                        warn!(row = row_idx, column = %headers[col], "Unparseable reply");
                        report.paragraphs_unrated += 1;
                        ("NA".to_string(), "NA".to_string())
                    }
                },
                Err(e) => {
                    warn!(row = row_idx, column = %headers[col], error = %e, "Classification failed");
                    report.paragraphs_unrated += 1;
                    ("NA".to_string(), "NA".to_string())
                }
            };

            out_row.push(category);
            out_row.push(rationale);
        }

        out_rows.push(out_row);

        // Incremental save after each row.
        write_output(output_csv, &headers, &paragraph_cols, &out_rows)?;
    }

    Ok(report)
}

fn write_output(
    path: &Path,
    headers: &[String],
    paragraph_cols: &[usize],
    rows: &[Vec<String>],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = headers.to_vec();
    for &col in paragraph_cols {
        header.push(format!("{}_rating_category", headers[col]));
        header.push(format!("{}_rating_rationale", headers[col]));
    }
    writer.write_record(&header)?;

    for row in rows {
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}
