//! Statement batch extraction.
//!
//! A script is cut into statements on every `;`. The split is purely textual:
//! a delimiter inside a string literal or a comment still ends a statement.
//! Fragments that are blank or start with `--` are dropped.

/// Character that ends a statement.
pub const STATEMENT_DELIMITER: char = ';';

/// Fragments starting with this marker are treated as comments and never executed.
pub const COMMENT_MARKER: &str = "--";

/// Number of characters kept in a statement preview.
pub const PREVIEW_CHARS: usize = 100;

/// Ordered statements extracted from one script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBatch {
    statements: Vec<String>,
}

impl StatementBatch {
    /// Parse raw script text into a batch, preserving source order.
    pub fn parse(raw: &str) -> Self {
        let statements = raw
            .split(STATEMENT_DELIMITER)
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty() && !fragment.starts_with(COMMENT_MARKER))
            .map(String::from)
            .collect();
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(String::as_str)
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }
}

impl<'a> IntoIterator for &'a StatementBatch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

/// Single-line preview of a statement, truncated to [`PREVIEW_CHARS`] characters.
pub fn preview(statement: &str) -> String {
    let collapsed = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_CHARS {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(PREVIEW_CHARS).collect();
    truncated.push_str("...");
    truncated
}
