use tracing::warn;

use crate::DbError;

/// Result of a write against the record store.
///
/// Writes never return `Err`: storage failures degrade to a non-applied
/// outcome. [`WriteOutcome::applied`] is the boolean view callers branch on;
/// the variant keeps the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Exactly one row was written.
    Applied,
    /// No row matched the key.
    NotFound,
    /// Reconcile was asked to merge into an absent or empty list.
    Unseeded,
    ConstraintViolation(String),
    /// The stored document could not be decoded, or the new one encoded.
    Malformed(String),
    Storage(String),
}

impl WriteOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::NotFound => "not_found",
            Self::Unseeded => "unseeded",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::Malformed(_) => "malformed_document",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Map an affected-row count to an outcome.
    pub fn from_rows(rows_affected: u64) -> Self {
        match rows_affected {
            1 => Self::Applied,
            0 => Self::NotFound,
            n => Self::ConstraintViolation(format!("{n} rows affected by a keyed write")),
        }
    }

    /// Collapse a write result, logging anything that is not a clean apply or miss.
    pub(crate) fn settle(result: Result<u64, DbError>, op: &'static str) -> Self {
        let outcome = match result {
            Ok(rows) => Self::from_rows(rows),
            Err(e) => Self::from(e),
        };
        match &outcome {
            Self::Applied | Self::NotFound | Self::Unseeded => {}
            other => warn!(op, code = other.code(), detail = ?other, "write not applied"),
        }
        outcome
    }
}

impl From<DbError> for WriteOutcome {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Document(e) => Self::Malformed(e.to_string()),
            DbError::Sqlx(sqlx::Error::Database(db)) if is_constraint(db.as_ref()) => {
                Self::ConstraintViolation(db.message().to_string())
            }
            other => Self::Storage(other.to_string()),
        }
    }
}

fn is_constraint(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
}

impl From<WriteOutcome> for bool {
    fn from(outcome: WriteOutcome) -> Self {
        outcome.applied()
    }
}
