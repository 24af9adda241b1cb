use std::collections::HashMap;

use thiserror::Error;

/// Prefix marking a stored-statement reference in request SQL.
pub const STORED_STATEMENT_SIGIL: char = '#';

/// Client-side resolution failures; both map to a request-shape error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("stored statement '{0}' not found")]
    NotFound(String),

    #[error("only stored statements are allowed")]
    OnlyStoredStatements,
}

/// Resolve a request item's SQL against the database's stored statements.
///
/// Text beginning with `#` is a reference: the remainder is the stored
/// statement id. Anything else passes through verbatim unless the database
/// is configured to accept stored statements only.
///
/// # Errors
///
/// Returns `ResolveError` for a missing stored statement id, or for plain
/// SQL on a stored-statements-only database.
pub fn resolve<'a>(
    sql: &'a str,
    stored: &'a HashMap<String, String>,
    stored_only: bool,
) -> Result<&'a str, ResolveError> {
    if let Some(id) = sql.strip_prefix(STORED_STATEMENT_SIGIL) {
        stored
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| ResolveError::NotFound(id.to_owned()))
    } else if stored_only {
        Err(ResolveError::OnlyStoredStatements)
    } else {
        Ok(sql)
    }
}
