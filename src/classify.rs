//! Recognises transaction-control pseudo-statements in raw SQL text.
//!
//! Matching is textual: leading whitespace is skipped, keywords are case-insensitive and must
//! end on a word boundary (`BEGINNING` is not `BEGIN`). Nothing here parses SQL.

use std::sync::LazyLock;

use regex::Regex;

/// Category of an outgoing statement as seen by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// `BEGIN ...` or `START TRANSACTION ...`
    Begin,
    /// `COMMIT ...`
    Commit,
    /// `ROLLBACK ...` (but not `ROLLBACK TO <savepoint>`)
    Rollback,
    /// Anything else.
    Ordinary,
}

impl StatementKind {
    #[must_use]
    pub fn is_transaction_control(self) -> bool {
        !matches!(self, StatementKind::Ordinary)
    }
}

static CONTROL_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?P<begin>BEGIN|START\s+TRANSACTION)|(?P<commit>COMMIT)|(?P<rollback>ROLLBACK))\b",
    )
    .expect("control statement pattern is valid")
});

static SAVEPOINT_ROLLBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*ROLLBACK(?:\s+TRANSACTION)?\s+TO\b")
        .expect("savepoint rollback pattern is valid")
});

static INSERT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:INSERT|REPLACE)\b").expect("insert pattern is valid")
});

static RETURNING_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bRETURNING\b").expect("returning pattern is valid"));

/// Classify a statement as begin, commit, rollback, or ordinary.
///
/// ```rust
/// use sql_request_context::classify::{classify, StatementKind};
///
/// assert_eq!(classify("  begin"), StatementKind::Begin);
/// assert_eq!(classify("Start Transaction"), StatementKind::Begin);
/// assert_eq!(classify("COMMIT;"), StatementKind::Commit);
/// assert_eq!(classify("SELECT 1"), StatementKind::Ordinary);
/// ```
#[must_use]
pub fn classify(sql: &str) -> StatementKind {
    let Some(caps) = CONTROL_STATEMENT.captures(sql) else {
        return StatementKind::Ordinary;
    };
    if caps.name("begin").is_some() {
        StatementKind::Begin
    } else if caps.name("commit").is_some() {
        StatementKind::Commit
    } else if SAVEPOINT_ROLLBACK.is_match(sql) {
        StatementKind::Ordinary
    } else {
        StatementKind::Rollback
    }
}

/// True for statements whose generated row id should be reported (`INSERT`, `REPLACE`).
#[must_use]
pub fn is_insert(sql: &str) -> bool {
    INSERT_STATEMENT.is_match(sql)
}

#[must_use]
pub fn has_returning(sql: &str) -> bool {
    RETURNING_CLAUSE.is_match(sql)
}
