//! Source positions carried by IR values and instructions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A resolved source location, rendered as `file:line:column`.
///
/// Positions are optional throughout the IR; synthetic instructions carry
/// none and the analyzer falls back to a neighbouring position where the
/// rendering needs one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Render an optional position, `-` when absent.
pub fn display_opt(pos: Option<&SourcePos>) -> String {
    match pos {
        Some(p) => p.to_string(),
        None => "-".to_string(),
    }
}
