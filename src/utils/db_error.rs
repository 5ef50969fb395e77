//! Classification of database errors.

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Returns true if `e` reports a violated unique constraint.
///
/// Checks the driver's SQLSTATE first and falls back to the message text for
/// drivers or proxies that do not forward the code.
pub fn is_duplicate_key(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) || db_err.is_unique_violation() {
        return true;
    }

    is_duplicate_key_message(db_err.message())
}

/// Textual fallback for [`is_duplicate_key`].
pub fn is_duplicate_key_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("duplicate key") || message.contains("violates unique constraint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_message_is_duplicate() {
        assert!(is_duplicate_key_message(
            r#"duplicate key value violates unique constraint "urls_short_code_key""#
        ));
        assert!(is_duplicate_key_message("ERROR: Violates Unique Constraint"));
    }

    #[test]
    fn test_other_messages_are_not_duplicate() {
        assert!(!is_duplicate_key_message("connection refused"));
        assert!(!is_duplicate_key_message(
            "null value in column \"long_url\" violates not-null constraint"
        ));
    }

    #[test]
    fn test_non_database_error_is_not_duplicate() {
        assert!(!is_duplicate_key(&sqlx::Error::RowNotFound));
        assert!(!is_duplicate_key(&sqlx::Error::PoolTimedOut));
    }
}
