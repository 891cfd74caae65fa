//! Article record store backed by CSV files.
//!
//! One row per known article. Rows are loaded into memory, mutated in place by
//! the reconciler, and persisted back without a row-index column. Columns
//! outside the core schema pass through untouched: the output table has the
//! same columns as the input, enriched.

use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Core columns, in output order. `date` and `authors` may be absent from the
/// input; they load as empty strings and are created on the next save.
const COLUMNS: [&str; 6] = ["filename", "title", "abstract", "DOI", "date", "authors"];

/// One article row in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleRecord {
    pub filename: String,
    pub title: String,
    pub abstract_text: String,
    pub doi: String,
    pub date: String,
    pub authors: String,
    /// Input columns outside the core schema, in input order. Preserved
    /// verbatim on save.
    pub extra: Vec<(String, String)>,
}

impl ArticleRecord {
    /// True when any of the reconcilable fields is still empty.
    pub fn is_incomplete(&self) -> bool {
        self.title.trim().is_empty()
            || self.authors.trim().is_empty()
            || self.date.trim().is_empty()
    }
}

/// Load article records from a CSV file.
///
/// Core columns are matched by header name; every other column is kept as a
/// pass-through `extra` pair.
pub fn load_records(path: &Path) -> Result<Vec<ArticleRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = ArticleRecord::default();
        for (i, header) in headers.iter().enumerate() {
            let value = row.get(i).unwrap_or_default().to_string();
            match header.as_str() {
                "filename" => record.filename = value,
                "title" => record.title = value,
                "abstract" => record.abstract_text = value,
                "DOI" => record.doi = value,
                "date" => record.date = value,
                "authors" => record.authors = value,
                _ => record.extra.push((header.clone(), value)),
            }
        }
        records.push(record);
    }

    info!(count = records.len(), path = %path.display(), "Loaded article records");
    Ok(records)
}

/// Save article records to a CSV file (headers included, no index column).
///
/// Writes the core columns followed by every pass-through column, in
/// first-seen order across the records.
pub fn save_records(path: &Path, records: &[ArticleRecord]) -> Result<()> {
    let mut extra_keys: Vec<&str> = Vec::new();
    for record in records {
        for (key, _) in &record.extra {
            if !extra_keys.contains(&key.as_str()) {
                extra_keys.push(key);
            }
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    let mut header: Vec<&str> = COLUMNS.to_vec();
    header.extend(extra_keys.iter().copied());
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.filename.as_str(),
            record.title.as_str(),
            record.abstract_text.as_str(),
            record.doi.as_str(),
            record.date.as_str(),
            record.authors.as_str(),
        ];
        for key in &extra_keys {
            row.push(
                record
                    .extra
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(count = records.len(), path = %path.display(), "Saved article records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_creates_missing_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "DOI,title").unwrap();
        writeln!(file, "10.1/aaa,Some Title").unwrap();
        file.flush().unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doi, "10.1/aaa");
        assert_eq!(records[0].title, "Some Title");
        assert_eq!(records[0].date, "");
        assert_eq!(records[0].authors, "");
        assert!(records[0].extra.is_empty());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let records = vec![ArticleRecord {
            filename: "a.xml".to_string(),
            title: "A Title".to_string(),
            abstract_text: "An abstract".to_string(),
            doi: "10.1/aaa".to_string(),
            date: "2020-01-02".to_string(),
            authors: "Doe, J.".to_string(),
            extra: Vec::new(),
        }];

        save_records(&path, &records).unwrap();
        let reloaded = load_records(&path).unwrap();
        assert_eq!(reloaded, records);
    }

    #[test]
    fn test_extra_columns_pass_through() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "DOI,title,journal").unwrap();
        writeln!(file, "10.1/aaa,Some Title,Nature").unwrap();
        file.flush().unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(
            records[0].extra,
            vec![("journal".to_string(), "Nature".to_string())]
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        save_records(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.ends_with(",journal"));
        assert!(content.lines().nth(1).unwrap().ends_with(",Nature"));

        let reloaded = load_records(&path).unwrap();
        assert_eq!(reloaded, records);
    }

    #[test]
    fn test_extra_keys_union_across_rows() {
        let records = vec![
            ArticleRecord {
                doi: "10.1/aaa".to_string(),
                extra: vec![("journal".to_string(), "Nature".to_string())],
                ..Default::default()
            },
            ArticleRecord {
                doi: "10.1/bbb".to_string(),
                extra: vec![("year".to_string(), "2020".to_string())],
                ..Default::default()
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        save_records(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.ends_with(",journal,year"));
        // Missing pass-through values are written empty.
        assert!(content.lines().nth(2).unwrap().ends_with(",,2020"));
    }

    #[test]
    fn test_is_incomplete() {
        let mut record = ArticleRecord {
            title: "T".to_string(),
            authors: "A".to_string(),
            date: "2020-01-01".to_string(),
            ..Default::default()
        };
        assert!(!record.is_incomplete());

        record.authors.clear();
        assert!(record.is_incomplete());
    }
}
