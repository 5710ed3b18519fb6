//! Script handling.
//!
//! This module turns configured script sources into executable statements:
//! - Source resolution and loading
//! - Statement batch extraction
//! - Statement classification

pub mod batch;
pub mod classify;
pub mod source;

pub use batch::{COMMENT_MARKER, PREVIEW_CHARS, STATEMENT_DELIMITER, StatementBatch, preview};
pub use classify::{StatementCategory, StatementInfo, classify};
pub use source::{ScriptSource, SourceOrigin, SourceText};
