//! PostgreSQL implementations of the store traits.

pub mod attachment;
pub mod category;
pub mod category_link;

pub use attachment::AttachmentRepository;
pub use category::CategoryRepository;
pub use category_link::CategoryLinkRepository;

use catalog_core::error::{AppError, ErrorKind};

/// Map a write failure, turning foreign-key violations into `Conflict`.
pub(crate) fn write_error(context: &str, err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::with_source(
                ErrorKind::Conflict,
                format!("{context}: still referenced or referencing a missing row"),
                err,
            )
        }
        other => AppError::with_source(ErrorKind::Database, context.to_string(), other),
    }
}

/// Escape `%`, `_` and `\` so user input matches literally in `ILIKE`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("huts"), "%huts%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
