//! Metadata reconciliation against the EBSCO reference index.
//!
//! Best-effort enrichment: records with incomplete metadata are looked up by
//! DOI first, then by title. A unique match populates title, authors and date
//! together from that one entry; ambiguous or missing matches leave the record
//! untouched and are counted instead of raised.

use crate::ebsco::{BibEntry, Lookup, ReferenceIndex};
use crate::records::ArticleRecord;
use tracing::{debug, info};

/// Outcome counts for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Rows considered.
    pub total: usize,
    /// Rows enriched via a unique DOI containment match.
    pub matched_by_doi: usize,
    /// Rows enriched via a unique title containment match.
    pub matched_by_title: usize,
    /// Rows with neither a unique DOI nor a unique title match.
    pub unmatched: usize,
    /// Rows whose metadata was already complete and were left alone.
    pub skipped_complete: usize,
}

/// Reconcile every incomplete record against the reference index, in place.
///
/// Never fails: lookups that are ambiguous or empty simply count as unmatched.
pub fn reconcile(records: &mut [ArticleRecord], index: &ReferenceIndex) -> ReconcileReport {
    let mut report = ReconcileReport {
        total: records.len(),
        ..Default::default()
    };

    for record in records.iter_mut() {
        if !record.is_incomplete() {
            report.skipped_complete += 1;
            continue;
        }

        match index.find_by_doi(&record.doi) {
            Lookup::Found(entry) => {
                merge_entry(record, entry);
                report.matched_by_doi += 1;
                continue;
            }
            Lookup::Ambiguous(n) => {
                debug!(doi = %record.doi, candidates = n, "Ambiguous DOI match, falling back to title");
            }
            Lookup::NotFound => {}
        }

        match index.find_by_title(&record.title) {
            Lookup::Found(entry) => {
                merge_entry(record, entry);
                report.matched_by_title += 1;
            }
            Lookup::Ambiguous(n) => {
                debug!(title = %record.title, candidates = n, "Ambiguous title match");
                report.unmatched += 1;
            }
            Lookup::NotFound => {
                report.unmatched += 1;
            }
        }
    }

    info!(
        total = report.total,
        matched_by_doi = report.matched_by_doi,
        matched_by_title = report.matched_by_title,
        unmatched = report.unmatched,
        skipped_complete = report.skipped_complete,
        "Reconciliation complete"
    );

    report
}

/// Copy title, authors and date from a single matched entry into the record.
///
/// Fields the entry cannot supply keep their prior value; the date is only
/// written when all of year/month/day are present (no partial dates).
fn merge_entry(record: &mut ArticleRecord, entry: &BibEntry) {
    if let Some(title) = entry.atl.as_deref().filter(|t| !t.is_empty()) {
        record.title = title.to_string();
    }

    if !entry.authors.is_empty() {
        record.authors = entry.authors.join(", \n");
    }

    if let Some(date) = entry.date.as_ref().and_then(|d| d.as_iso()) {
        record.date = date;
    }
}
