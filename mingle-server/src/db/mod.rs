pub mod connection;
pub mod repositories;
pub mod schema;

pub use connection::{Database, DbPool};

/// True when an error chain bottoms out in a SQLite constraint violation
/// (duplicate username, duplicate friend edge, self-friend CHECK).
/// Handlers use this to surface conflicts distinctly from generic faults.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
