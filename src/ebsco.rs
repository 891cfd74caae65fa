//! Reference index built from an EBSCO XML export.
//!
//! The export is a tree of `<rec>` records whose control info carries a unique
//! identifier leaf (`ui`), title leaves (`btl`, `atl`), author leaves (`au`)
//! and a date node (`dt`) with year/month/day attributes. The index answers
//! DOI and title queries with conservative containment semantics: a query
//! matches only if it is a case-insensitive substring of exactly one entry's
//! field. Ties are reported as `Ambiguous` rather than guessed.

use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use tracing::info;

/// A single bibliographic record from the EBSCO export. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibEntry {
    /// Unique identifier (DOI-like string), from `ui`.
    pub ui: String,
    /// Bibliographic title, from `btl`. Queried by title lookups.
    pub btl: String,
    /// Article title, from the first `atl` leaf.
    pub atl: Option<String>,
    /// Author names, from `au` leaves, in document order.
    pub authors: Vec<String>,
    /// Structured date from the `dt` node attributes.
    pub date: Option<EntryDate>,
}

/// Year/month/day attributes of a `dt` node. Any attribute may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDate {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
}

impl EntryDate {
    /// `YYYY-MM-DD` only when all three parts are present.
    pub fn as_iso(&self) -> Option<String> {
        match (&self.year, &self.month, &self.day) {
            (Some(y), Some(m), Some(d)) => Some(format!("{}-{}-{}", y, m, d)),
            _ => None,
        }
    }
}

/// Typed outcome of an index lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Exactly one entry contained the query.
    Found(T),
    /// No entry contained the query, or the query was blank.
    NotFound,
    /// More than one entry contained the query; treated as no-match.
    Ambiguous(usize),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// In-memory index over the bibliographic export.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    entries: Vec<BibEntry>,
}

impl ReferenceIndex {
    /// Parse an EBSCO XML export file into an index.
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        let index = Self::from_xml(&xml)?;
        info!(entries = index.len(), path = %path.display(), "Built reference index");
        Ok(index)
    }

    /// Parse EBSCO export XML into an index.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        let mut current: Option<BibEntry> = None;
        let mut in_ui = false;
        let mut in_btl = false;
        let mut in_atl = false;
        let mut in_au = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"rec" => current = Some(BibEntry::default()),
                    b"ui" => in_ui = true,
                    b"btl" => in_btl = true,
                    b"atl" => in_atl = true,
                    b"au" => in_au = true,
                    b"dt" => {
                        if let Some(ref mut entry) = current {
                            entry.date = Some(read_date_attrs(e)?);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => {
                    if e.name().as_ref() == b"dt" {
                        if let Some(ref mut entry) = current {
                            entry.date = Some(read_date_attrs(e)?);
                        }
                    }
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if let Some(ref mut entry) = current {
                        if in_ui && entry.ui.is_empty() {
                            entry.ui = text;
                        } else if in_btl && entry.btl.is_empty() {
                            entry.btl = text;
                        } else if in_atl && entry.atl.is_none() {
                            entry.atl = Some(text);
                        } else if in_au {
                            entry.authors.push(text);
                        }
                    }
                }
                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"ui" => in_ui = false,
                    b"btl" => in_btl = false,
                    b"atl" => in_atl = false,
                    b"au" => in_au = false,
                    b"rec" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry whose identifier contains the DOI (case-insensitive).
    ///
    /// Blank queries return `NotFound`: an empty string would containment-match
    /// every entry.
    pub fn find_by_doi(&self, doi: &str) -> Lookup<&BibEntry> {
        let query = doi.trim().to_lowercase();
        self.find_containment(&query, |entry| entry.ui.as_str())
    }

    /// Look up an entry whose title contains the query (case-insensitive).
    ///
    /// Double-quote characters are stripped from the query before matching.
    pub fn find_by_title(&self, title: &str) -> Lookup<&BibEntry> {
        let query = title.trim().to_lowercase().replace('"', "");
        self.find_containment(&query, |entry| entry.btl.as_str())
    }

    /// Exactly-one containment match, or a typed miss.
    fn find_containment<'a, F>(&'a self, query: &str, field: F) -> Lookup<&'a BibEntry>
    where
        F: Fn(&BibEntry) -> &str,
    {
        if query.is_empty() {
            return Lookup::NotFound;
        }

        let mut matches = self
            .entries
            .iter()
            .filter(|entry| field(entry).to_lowercase().contains(query));

        match (matches.next(), matches.next()) {
            (Some(entry), None) => Lookup::Found(entry),
            (None, _) => Lookup::NotFound,
            (Some(_), Some(_)) => Lookup::Ambiguous(2 + matches.count()),
        }
    }
}

/// Read year/month/day attributes off a `dt` element.
fn read_date_attrs(e: &quick_xml::events::BytesStart<'_>) -> Result<EntryDate> {
    let mut date = EntryDate::default();
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().unwrap_or_default().to_string();
        match attr.key.as_ref() {
            b"year" => date.year = Some(value),
            b"month" => date.month = Some(value),
            b"day" => date.day = Some(value),
            _ => {}
        }
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_export() -> &'static str {
        r#"<?xml version="1.0"?>
<records>
  <rec>
    <header>
      <controlInfo>
        <artinfo>
          <ui>10.1/aaa</ui>
          <tig><atl>First Article</atl></tig>
          <aug><au>Smith, J.</au><au>Jones, K.</au></aug>
        </artinfo>
        <bkinfo><btl>Memory and Decay</btl></bkinfo>
        <pubinfo><dt year="2019" month="03" day="15"/></pubinfo>
      </controlInfo>
    </header>
  </rec>
  <rec>
    <header>
      <controlInfo>
        <artinfo>
          <ui>10.1/bbb</ui>
          <tig><atl>Second Article</atl></tig>
          <aug><au>Brown, L.</au></aug>
        </artinfo>
        <bkinfo><btl>Forgetting Curves</btl></bkinfo>
        <pubinfo><dt year="2021"/></pubinfo>
      </controlInfo>
    </header>
  </rec>
</records>"#
    }

    #[test]
    fn test_parse_export() {
        let index = ReferenceIndex::from_xml(sample_export()).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_unique_substring_matches() {
        let index = ReferenceIndex::from_xml(sample_export()).unwrap();

        // Distinct substring, single containment match.
        let entry = index.find_by_doi("10.1/aa").found().unwrap();
        assert_eq!(entry.ui, "10.1/aaa");
        assert_eq!(entry.atl.as_deref(), Some("First Article"));
        assert_eq!(entry.authors, vec!["Smith, J.", "Jones, K."]);
    }

    #[test]
    fn test_shared_prefix_is_ambiguous() {
        let index = ReferenceIndex::from_xml(sample_export()).unwrap();
        assert_eq!(index.find_by_doi("10.1/"), Lookup::Ambiguous(2));
    }

    #[test]
    fn test_doi_match_is_case_insensitive() {
        let index = ReferenceIndex::from_xml(sample_export()).unwrap();
        assert!(matches!(index.find_by_doi("10.1/BBB"), Lookup::Found(_)));
    }

    #[test]
    fn test_title_match_strips_quotes() {
        let index = ReferenceIndex::from_xml(sample_export()).unwrap();
        let entry = index.find_by_title("\"memory and decay\"").found().unwrap();
        assert_eq!(entry.ui, "10.1/aaa");
    }

    #[test]
    fn test_blank_query_is_not_found() {
        let index = ReferenceIndex::from_xml(sample_export()).unwrap();
        assert_eq!(index.find_by_doi(""), Lookup::NotFound);
        assert_eq!(index.find_by_title("  "), Lookup::NotFound);
    }

    #[test]
    fn test_partial_date_has_no_iso_form() {
        let index = ReferenceIndex::from_xml(sample_export()).unwrap();
        let entry = index.find_by_doi("10.1/bbb").found().unwrap();
        assert_eq!(entry.date.as_ref().and_then(|d| d.as_iso()), None);

        let entry = index.find_by_doi("10.1/aaa").found().unwrap();
        assert_eq!(
            entry.date.as_ref().and_then(|d| d.as_iso()),
            Some("2019-03-15".to_string())
        );
    }
}
