//! # litcurator
//!
//! Literature Review Corpus Curation Pipeline
//!
//! ## Modules
//!
//! - [`records`] - CSV-backed article record store
//! - [`ebsco`] - Reference index over an EBSCO XML export
//! - [`reconcile`] - Metadata reconciliation of records against the index
//! - [`tei`] - TEI corpus document reader
//! - [`corpus`] - Duplicate and missing-abstract filters
//! - [`crossref`] - Crossref DOI link lookup
//! - [`llm`] - Chat-completion client with backoff
//! - [`relevance`] / [`stance`] - LLM classification stages
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use litcurator::{ebsco::ReferenceIndex, records, reconcile};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut rows = records::load_records(Path::new("articles.csv"))?;
//!     let index = ReferenceIndex::from_file(Path::new("ebsco_export.xml"))?;
//!     let report = reconcile::reconcile(&mut rows, &index);
//!     println!("{} rows unmatched", report.unmatched);
//!     Ok(())
//! }
//! ```

pub mod corpus;
pub mod crossref;
pub mod ebsco;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod reconcile;
pub mod records;
pub mod relevance;
pub mod stance;
pub mod tei;

pub use error::{CuratorError, Result};
