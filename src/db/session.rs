//! Session context statements.
//!
//! Role and compute target are applied with backend-specific statements right
//! after the connection opens. Identifiers are always quoted so configured
//! names are used verbatim.

use crate::models::DatabaseType;

/// Statements that switch the session to `role` and `compute_target`.
///
/// Returns an empty list for backends without a session context (SQLite).
pub fn session_statements(
    db_type: DatabaseType,
    role: &str,
    compute_target: &str,
) -> Vec<String> {
    match db_type {
        DatabaseType::PostgreSQL => vec![
            format!("SET ROLE {}", quote_ident(role, '"')),
            format!("SET search_path TO {}", quote_ident(compute_target, '"')),
        ],
        DatabaseType::MySQL => vec![
            format!("SET ROLE {}", quote_ident(role, '`')),
            format!("USE {}", quote_ident(compute_target, '`')),
        ],
        DatabaseType::SQLite => Vec::new(),
    }
}

/// Quote an identifier, doubling any embedded quote character.
fn quote_ident(ident: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    format!(
        "{quote}{}{quote}",
        ident.replace(quote, &doubled),
        quote = quote
    )
}
