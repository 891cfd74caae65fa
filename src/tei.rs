//! TEI document reader.
//!
//! Corpus documents are TEI-encoded full texts (GROBID/EBSCO output). The
//! corpus filters need the declared MD5 identity and the abstract; the
//! relevance rater additionally needs title, DOI, date and authors from the
//! `fileDesc` header. Everything is resolved against the TEI namespace.

use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::path::Path;

/// TEI namespace used by all corpus documents.
pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

/// Metadata extracted from one TEI document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeiDocument {
    /// Declared content identity, from `idno[@type="MD5"]`.
    pub md5: Option<String>,
    /// DOI, from `idno[@type="DOI"]`.
    pub doi: Option<String>,
    /// First `title` leaf under `fileDesc`.
    pub title: Option<String>,
    /// First `date` leaf under `fileDesc`.
    pub date: Option<String>,
    /// `persName` subtrees under `fileDesc`, text concatenated per author.
    pub authors: Vec<String>,
    /// All descendant text of the `abstract` element, trimmed.
    pub abstract_text: Option<String>,
}

impl TeiDocument {
    /// Parse a TEI file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// Parse TEI XML.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut doc = TeiDocument::default();
        let mut in_file_desc = false;
        let mut in_abstract = false;
        let mut in_title = false;
        let mut in_date = false;
        let mut in_pers_name = false;
        // Which idno we are inside, by its type attribute.
        let mut idno_type: Option<String> = None;
        let mut abstract_parts: Vec<String> = Vec::new();
        let mut name_parts: Vec<String> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_resolved_event_into(&mut buf)? {
                (ResolveResult::Bound(Namespace(ns)), Event::Start(ref e))
                    if ns == TEI_NS.as_bytes() =>
                {
                    match e.local_name().as_ref() {
                        b"fileDesc" => in_file_desc = true,
                        b"abstract" => in_abstract = true,
                        b"title" if in_file_desc && doc.title.is_none() => in_title = true,
                        b"date" if in_file_desc && doc.date.is_none() => in_date = true,
                        b"persName" if in_file_desc => {
                            in_pers_name = true;
                            name_parts.clear();
                        }
                        b"idno" => {
                            idno_type = e
                                .attributes()
                                .flatten()
                                .find(|a| a.key.as_ref() == b"type")
                                .map(|a| a.unescape_value().unwrap_or_default().to_string());
                        }
                        _ => {}
                    }
                }
                (_, Event::Text(ref e)) => {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if in_abstract {
                        abstract_parts.push(text.clone());
                    }
                    if in_pers_name {
                        name_parts.push(text.clone());
                    } else if in_title {
                        doc.title = Some(text.clone());
                    } else if in_date {
                        doc.date = Some(text.clone());
                    }
                    match idno_type.as_deref() {
                        Some("MD5") => doc.md5 = Some(text),
                        Some("DOI") => doc.doi = Some(text),
                        _ => {}
                    }
                }
                (ResolveResult::Bound(Namespace(ns)), Event::End(ref e))
                    if ns == TEI_NS.as_bytes() =>
                {
                    match e.local_name().as_ref() {
                        b"fileDesc" => in_file_desc = false,
                        b"abstract" => in_abstract = false,
                        b"title" => in_title = false,
                        b"date" => in_date = false,
                        b"persName" => {
                            if in_pers_name && !name_parts.is_empty() {
                                doc.authors.push(name_parts.join(" "));
                            }
                            in_pers_name = false;
                        }
                        b"idno" => idno_type = None,
                        _ => {}
                    }
                }
                (_, Event::Eof) => break,
                _ => {}
            }
            buf.clear();
        }

        let joined = abstract_parts.join(" ");
        let trimmed = joined.trim();
        if !trimmed.is_empty() {
            doc.abstract_text = Some(trimmed.to_string());
        }

        Ok(doc)
    }

    /// True when the document carries a non-empty abstract.
    pub fn has_abstract(&self) -> bool {
        self.abstract_text
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tei() -> &'static str {
        r#"<?xml version="1.0"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc>
      <titleStmt><title>Decay of Short-Term Traces</title></titleStmt>
      <sourceDesc><biblStruct><analytic>
        <author><persName><forename>Anna</forename><surname>Keller</surname></persName></author>
        <author><persName><forename>Ben</forename><surname>Meier</surname></persName></author>
        <idno type="DOI">10.5/xyz</idno>
        <idno type="MD5">ABCD1234</idno>
      </analytic>
      <monogr><imprint><date type="published">2018-05-01</date></imprint></monogr>
      </biblStruct></sourceDesc>
    </fileDesc>
    <profileDesc>
      <abstract><p>Traces fade over time.</p><p>We test this claim.</p></abstract>
    </profileDesc>
  </teiHeader>
</TEI>"#
    }

    #[test]
    fn test_parse_tei_header_fields() {
        let doc = TeiDocument::from_xml(sample_tei()).unwrap();
        assert_eq!(doc.md5.as_deref(), Some("ABCD1234"));
        assert_eq!(doc.doi.as_deref(), Some("10.5/xyz"));
        assert_eq!(doc.title.as_deref(), Some("Decay of Short-Term Traces"));
        assert_eq!(doc.date.as_deref(), Some("2018-05-01"));
        assert_eq!(doc.authors, vec!["Anna Keller", "Ben Meier"]);
    }

    #[test]
    fn test_abstract_gathers_descendant_text() {
        let doc = TeiDocument::from_xml(sample_tei()).unwrap();
        assert_eq!(
            doc.abstract_text.as_deref(),
            Some("Traces fade over time. We test this claim.")
        );
        assert!(doc.has_abstract());
    }

    #[test]
    fn test_missing_abstract() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader><fileDesc><titleStmt><title>No Abstract Here</title></titleStmt></fileDesc></teiHeader>
</TEI>"#;
        let doc = TeiDocument::from_xml(xml).unwrap();
        assert!(!doc.has_abstract());
        assert!(doc.md5.is_none());
    }

    #[test]
    fn test_empty_abstract_element_counts_as_missing() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader><profileDesc><abstract></abstract></profileDesc></teiHeader>
</TEI>"#;
        let doc = TeiDocument::from_xml(xml).unwrap();
        assert!(!doc.has_abstract());
    }

    #[test]
    fn test_non_tei_namespace_is_ignored() {
        let xml = r#"<TEI xmlns="http://example.org/other">
  <teiHeader><profileDesc><abstract><p>Text</p></abstract></profileDesc></teiHeader>
</TEI>"#;
        let doc = TeiDocument::from_xml(xml).unwrap();
        assert!(!doc.has_abstract());
    }
}
