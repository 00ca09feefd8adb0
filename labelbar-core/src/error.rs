/// Errors surfaced by the review store, the comment store and the gate.
///
/// A missing required comment is not an error; the gate reports it as
/// `GateOutcome::Blocked`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Db(#[from] tokio_rusqlite::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("no tasks have been imported yet")]
    NoTasks,
    #[error("annotation not found: {0}")]
    UnknownAnnotation(String),
    #[error("no annotation is selected")]
    NoSelection,
    #[error("annotation {0} is not editable")]
    NotEditable(String),
    #[error("a historical revision is selected; it is read-only")]
    ReadOnlyRevision,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
