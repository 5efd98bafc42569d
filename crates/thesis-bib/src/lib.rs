//! Bibliography reconciliation for documents assembled from several articles.
//!
//! Each article brings its own bibliography file. This crate loads them,
//! recognizes records that describe the same work under different keys, and
//! collapses them into one canonical record per work, producing a
//! [`RenameMap`] so citations in the documents can be rewritten to match.
//!
//! # Pipeline
//!
//! ```text
//! .bib text ──parse──▶ RecordCollection ──combine──▶ RecordCollection
//!                                           │          (+ collision renames)
//!                                           ▼
//!                                     Deduplicator::merge_all
//!                                           │
//!                                           ▼
//!                        canonical RecordCollection + RenameMap
//! ```
//!
//! # Example
//!
//! ```
//! use thesis_bib::{DatabaseMerger, Deduplicator, RecordCollection, SimilarityEngine};
//!
//! let a = RecordCollection::parse("@article{LeCun2015,\n title = {Deep Learning}\n}\n")?;
//! let b = RecordCollection::parse("@article{lecun_deep,\n title = {{Deep} learning},\n year = {2015}\n}\n")?;
//!
//! let engine = SimilarityEngine::default();
//! let mut outcome = DatabaseMerger::new(&engine).combine(a, b);
//! let renames = Deduplicator::new(&engine).merge_all(&mut outcome.collection)?;
//!
//! assert_eq!(outcome.collection.len(), 1);
//! assert_eq!(renames.get("lecun_deep"), Some("LeCun2015"));
//! # Ok::<(), thesis_bib::Error>(())
//! ```

pub mod collection;
pub mod dedup;
pub mod error;
pub mod fields;
pub mod merger;
pub mod record;
pub mod rename;
pub mod report;
pub mod similarity;

pub use collection::{ParseOptions, RecordCollection};
pub use dedup::{Deduplicator, DuplicateGroup};
pub use error::{Error, Result};
pub use fields::FieldMap;
pub use merger::{DatabaseMerger, MergeOutcome};
pub use record::{BibRecord, normalize_author, parse_fields};
pub use rename::RenameMap;
pub use report::{DuplicateReport, ReportedGroup};
pub use similarity::{SimilarityConfig, SimilarityEngine};
