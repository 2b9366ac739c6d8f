//! Archive extraction and file copying
//!
//! This module provides:
//! - tar.gz extraction with strip-components and traversal protection
//! - Lexical path normalization and containment checks
//! - File and tree copies that keep mode bits and ownership

mod copy;
mod extract;
mod path;

pub use copy::{copy_file, copy_recursive};
pub use extract::{extract, ExtractSummary, Extractor};
pub use path::{is_within, normalize_lexically, strip_components};
