//! Corpus filtering: duplicate removal and completeness checks.
//!
//! Both passes walk a directory of TEI XML documents in lexicographic
//! filename order (explicit, so results are reproducible across platforms),
//! decide which files to remove, and either report (dry-run, the default) or
//! delete in place. Deletion is irreversible and per-file; an interrupted run
//! leaves already-deleted files deleted.
//!
//! Documents missing the field a pass depends on are skipped with a recorded
//! reason, never silently and never fatally.

use crate::error::Result;
use crate::tei::TeiDocument;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Whether a filter pass reports removals or performs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// List the files that would be removed, touch nothing.
    DryRun,
    /// Delete flagged files in place.
    Delete,
}

/// A document a pass could not evaluate, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Typed result of one filter pass.
#[derive(Debug, Clone, Default)]
pub struct FilterReport {
    /// XML files examined.
    pub scanned: usize,
    /// Files flagged for removal (deleted when the mode was `Delete`).
    pub removed: Vec<PathBuf>,
    /// Files that could not be evaluated, with reasons.
    pub skipped: Vec<SkippedDocument>,
    /// True when flagged files were actually deleted.
    pub deleted: bool,
}

impl FilterReport {
    /// Files that survive the pass.
    pub fn kept(&self) -> usize {
        self.scanned - self.removed.len()
    }
}

/// Remove duplicate corpus documents.
///
/// The declared MD5 identity (`idno[@type="MD5"]`) identifies an article's
/// content. The first file presenting a given identity is kept; every later
/// file with the same identity is flagged as a duplicate. Files without an
/// identity are skipped and reported.
pub fn dedup_corpus(dir: &Path, mode: FilterMode) -> Result<FilterReport> {
    let files = list_xml_files(dir)?;
    let mut report = FilterReport::default();
    let mut seen: HashSet<String> = HashSet::new();

    for path in files {
        report.scanned += 1;
        let doc = match TeiDocument::from_file(&path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unparseable document, skipping");
                report.skipped.push(SkippedDocument {
                    path,
                    reason: format!("parse error: {}", e),
                });
                continue;
            }
        };

        match doc.md5 {
            Some(hash) => {
                if !seen.insert(hash) {
                    report.removed.push(path);
                }
            }
            None => {
                warn!(path = %path.display(), "Document has no MD5 identity, skipping");
                report.skipped.push(SkippedDocument {
                    path,
                    reason: "missing MD5 identity".to_string(),
                });
            }
        }
    }

    apply_removals(&mut report, mode)?;
    info!(
        scanned = report.scanned,
        duplicates = report.removed.len(),
        skipped = report.skipped.len(),
        deleted = report.deleted,
        "Deduplication pass complete"
    );
    Ok(report)
}

/// Remove corpus documents that lack a non-empty abstract.
pub fn filter_missing_abstracts(dir: &Path, mode: FilterMode) -> Result<FilterReport> {
    let files = list_xml_files(dir)?;
    let mut report = FilterReport::default();

    for path in files {
        report.scanned += 1;
        match TeiDocument::from_file(&path) {
            Ok(doc) => {
                if !doc.has_abstract() {
                    report.removed.push(path);
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unparseable document, skipping");
                report.skipped.push(SkippedDocument {
                    path,
                    reason: format!("parse error: {}", e),
                });
            }
        }
    }

    apply_removals(&mut report, mode)?;
    info!(
        scanned = report.scanned,
        missing_abstract = report.removed.len(),
        skipped = report.skipped.len(),
        deleted = report.deleted,
        "Abstract completeness pass complete"
    );
    Ok(report)
}

/// XML files in the directory, sorted lexicographically by filename.
pub(crate) fn list_xml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().map(|ext| ext == "xml").unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Delete flagged files when the mode asks for it.
fn apply_removals(report: &mut FilterReport, mode: FilterMode) -> Result<()> {
    if mode == FilterMode::Delete {
        for path in &report.removed {
            std::fs::remove_file(path)?;
        }
        report.deleted = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tei_with_md5(hash: &str) -> String {
        format!(
            r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc><sourceDesc><biblStruct><analytic>
      <idno type="MD5">{hash}</idno>
    </analytic></biblStruct></sourceDesc></fileDesc>
    <profileDesc><abstract><p>Some abstract.</p></abstract></profileDesc>
  </teiHeader>
</TEI>"#
        )
    }

    fn tei_without_abstract() -> &'static str {
        r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc><sourceDesc><biblStruct><analytic>
      <idno type="MD5">FFFF</idno>
    </analytic></biblStruct></sourceDesc></fileDesc>
  </teiHeader>
</TEI>"#
    }

    #[test]
    fn test_dedup_keeps_first_in_filename_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), tei_with_md5("H1")).unwrap();
        fs::write(dir.path().join("b.xml"), tei_with_md5("H2")).unwrap();
        fs::write(dir.path().join("c.xml"), tei_with_md5("H1")).unwrap();

        let report = dedup_corpus(dir.path(), FilterMode::Delete).unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.removed, vec![dir.path().join("c.xml")]);
        assert!(dir.path().join("a.xml").exists());
        assert!(dir.path().join("b.xml").exists());
        assert!(!dir.path().join("c.xml").exists());
    }

    #[test]
    fn test_dedup_dry_run_deletes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.xml"), tei_with_md5("H1")).unwrap();
        fs::write(dir.path().join("b.xml"), tei_with_md5("H1")).unwrap();

        let report = dedup_corpus(dir.path(), FilterMode::DryRun).unwrap();

        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.kept(), 1);
        assert!(!report.deleted);
        assert!(dir.path().join("b.xml").exists());
    }

    #[test]
    fn test_dedup_skips_documents_without_identity() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.xml"),
            r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><teiHeader/></TEI>"#,
        )
        .unwrap();
        fs::write(dir.path().join("b.xml"), tei_with_md5("H1")).unwrap();

        let report = dedup_corpus(dir.path(), FilterMode::Delete).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, dir.path().join("a.xml"));
        assert!(report.removed.is_empty());
        assert!(dir.path().join("a.xml").exists());
    }

    #[test]
    fn test_surviving_identities_are_pairwise_distinct() {
        let dir = tempfile::tempdir().unwrap();
        for (name, hash) in [("a.xml", "X"), ("b.xml", "Y"), ("c.xml", "X"), ("d.xml", "Y")] {
            fs::write(dir.path().join(name), tei_with_md5(hash)).unwrap();
        }

        dedup_corpus(dir.path(), FilterMode::Delete).unwrap();

        let mut seen = HashSet::new();
        for path in list_xml_files(dir.path()).unwrap() {
            let doc = TeiDocument::from_file(&path).unwrap();
            assert!(seen.insert(doc.md5.unwrap()));
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_abstract_filter_removes_incomplete_documents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok.xml"), tei_with_md5("H1")).unwrap();
        fs::write(dir.path().join("bad.xml"), tei_without_abstract()).unwrap();

        let report = filter_missing_abstracts(dir.path(), FilterMode::Delete).unwrap();

        assert_eq!(report.removed, vec![dir.path().join("bad.xml")]);
        assert!(dir.path().join("ok.xml").exists());
        assert!(!dir.path().join("bad.xml").exists());

        // Every survivor has a non-empty abstract.
        for path in list_xml_files(dir.path()).unwrap() {
            assert!(TeiDocument::from_file(&path).unwrap().has_abstract());
        }
    }

    #[test]
    fn test_non_xml_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not xml").unwrap();
        fs::write(dir.path().join("a.xml"), tei_with_md5("H1")).unwrap();

        let report = dedup_corpus(dir.path(), FilterMode::Delete).unwrap();
        assert_eq!(report.scanned, 1);
        assert!(dir.path().join("notes.txt").exists());
    }
}
