use serde::Serialize;

/// Normalised outcome of a `run` call.
///
/// `id` carries the identifier generated by an insert-type statement and stays `None` for
/// everything else (updates, deletes, DDL, transaction control). `changes` is the number of
/// rows the statement affected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RunResult {
    pub id: Option<i64>,
    pub changes: u64,
}

impl RunResult {
    /// Result reported for statements that did not touch any rows.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_changes(changes: u64) -> Self {
        Self { id: None, changes }
    }
}
