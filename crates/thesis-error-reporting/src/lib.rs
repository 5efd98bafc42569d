//! Structured diagnostic messages for the thesis toolchain.
//!
//! Library crates never print. Conditions worth a human's attention (a key
//! collision while combining bibliographies, a merged duplicate, a missing
//! `\input` target) are returned as [`DiagnosticMessage`] values, and the
//! caller decides whether to log, display, or ignore them.
//!
//! # Structure
//!
//! A message follows the tidyverse layout:
//!
//! - [`DiagnosticMessage`]: kind, optional code, title, problem, details, hints
//! - [`DiagnosticMessageBuilder`]: fluent construction
//! - [`catalog`]: the `T-<subsystem>-<n>` code catalog embedded at compile time
//!
//! # Example
//!
//! ```
//! use thesis_error_reporting::DiagnosticMessageBuilder;
//!
//! let msg = DiagnosticMessageBuilder::warning("Conflicting Duplicate Key")
//!     .with_code("T-1-3")
//!     .problem("Key `smith2020` is used by two different records")
//!     .add_info("The incoming record was renamed to `smith2020Copy1`")
//!     .build();
//!
//! assert!(msg.to_text().starts_with("Warning [T-1-3]"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
