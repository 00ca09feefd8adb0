use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::error::{Error, Result};
use crate::types::{
    Annotation, AnnotationState, Comment, EntityKind, History, Region, Revision, RevisionAction,
    Task, TaskSeed, Versions,
};

/// Runs `f` on the connection's background thread and lifts its error.
async fn with_db<R, F>(conn: &Connection, f: F) -> Result<R>
where
    F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
{
    Ok(conn.call(f).await?)
}

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all database connections.
/// It sets `busy_timeout` via the `Connection` method (not a PRAGMA string) to
/// ensure the setting takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `Error::Db` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection> {
    let conn = Connection::open(path).await?;
    configure(&conn).await?;
    Ok(conn)
}

/// Opens a private in-memory database with the full schema applied.
///
/// # Errors
///
/// Returns `Error::Db` if the schema DDL fails.
pub async fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().await?;
    configure(&conn).await?;
    Ok(conn)
}

async fn configure(conn: &Connection) -> Result<()> {
    // Connection-level settings re-applied on every open.
    with_db(conn, |db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    })
    .await?;

    // Checkpoint any leftover WAL from a previous run.
    with_db(conn, |db| db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")).await?;

    with_db(conn, crate::schema::migrate).await
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Imports `seed` unless a task with the same id already exists.
///
/// Returns `true` when the task was inserted, `false` when an existing task was
/// kept as-is (its review progress is resumed instead of overwritten).
///
/// # Errors
///
/// Returns `Error::Db` if the `BEGIN IMMEDIATE` transaction fails.
pub async fn import_task(conn: &Connection, seed: &TaskSeed) -> Result<bool> {
    let seed = seed.clone();

    with_db(conn, move |db| {
        let exists: Option<String> = db
            .query_row("SELECT id FROM tasks WHERE id = ?1", [&seed.id], |r| r.get(0))
            .optional()?;
        if exists.is_some() {
            return Ok(false);
        }

        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO tasks (id, description, imported_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![&seed.id, &seed.description, now],
        )?;
        for (position, a) in seed.annotations.iter().enumerate() {
            let id = a
                .id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let has_result = a.sent_user_generate || (!a.user_generate && !a.regions.is_empty());
            tx.execute(
                "INSERT INTO annotations
                     (id, task_id, position, kind, editable, skipped, user_generate,
                      sent_user_generate, ground_truth, state, has_result, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10, ?11)",
                rusqlite::params![
                    &id,
                    &seed.id,
                    position as i64,
                    a.kind.as_str(),
                    a.editable,
                    a.skipped,
                    a.user_generate,
                    a.sent_user_generate,
                    a.ground_truth,
                    has_result,
                    now
                ],
            )?;
            for (idx, label) in a.regions.iter().enumerate() {
                let region = Region::new(label);
                tx.execute(
                    "INSERT INTO regions (id, annotation_id, position, label) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![&region.id, &id, idx as i64, &region.label],
                )?;
            }
        }
        tx.commit()?;
        Ok(true)
    })
    .await
}

/// Returns the id of the most recently imported task.
///
/// # Errors
///
/// Returns `Error::NoTasks` when the database holds no task.
pub async fn latest_task_id(conn: &Connection) -> Result<String> {
    let id = with_db(conn, |db| {
        db.query_row(
            "SELECT id FROM tasks ORDER BY imported_at DESC, rowid DESC LIMIT 1",
            [],
            |r| r.get::<_, String>(0),
        )
        .optional()
    })
    .await?;
    id.ok_or(Error::NoTasks)
}

/// Loads a task with all of its annotations and their persisted regions.
///
/// Each annotation's `results` start equal to its persisted regions and its
/// `history` starts empty.
///
/// # Errors
///
/// Returns `Error::TaskNotFound` if no task has `task_id`.
pub async fn load_task(conn: &Connection, task_id: &str) -> Result<Task> {
    let task_id = task_id.to_owned();
    let lookup = task_id.clone();

    let loaded = with_db(conn, move |db| {
        let description: Option<Option<String>> = db
            .query_row(
                "SELECT description FROM tasks WHERE id = ?1",
                [&lookup],
                |r| r.get(0),
            )
            .optional()?;
        let Some(description) = description else {
            return Ok(None);
        };

        let mut stmt = db.prepare(
            "SELECT id, kind, editable, skipped, user_generate, sent_user_generate,
                    ground_truth, state, has_result
             FROM annotations WHERE task_id = ?1 ORDER BY position",
        )?;
        let mut annotations = stmt
            .query_map([&lookup], |r| {
                let kind: String = r.get(1)?;
                let state: String = r.get(7)?;
                let has_result: bool = r.get(8)?;
                Ok((
                    Annotation {
                        id: r.get(0)?,
                        kind: EntityKind::parse(&kind),
                        editable: r.get(2)?,
                        skipped: r.get(3)?,
                        user_generate: r.get(4)?,
                        sent_user_generate: r.get(5)?,
                        ground_truth: r.get(6)?,
                        state: AnnotationState::parse(&state),
                        versions: Versions::default(),
                        results: Vec::new(),
                        history: History::default(),
                    },
                    has_result,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut regions = db.prepare(
            "SELECT id, label FROM regions WHERE annotation_id = ?1 ORDER BY position",
        )?;
        for (annotation, has_result) in annotations.iter_mut() {
            annotation.results = regions
                .query_map([&annotation.id], |r| {
                    Ok(Region {
                        id: r.get(0)?,
                        label: r.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            if *has_result {
                annotation.versions.result = Some(annotation.results.clone());
            }
        }

        Ok(Some((description, annotations)))
    })
    .await?;

    let (description, annotations) = loaded.ok_or_else(|| Error::TaskNotFound(task_id.clone()))?;
    Ok(Task {
        id: task_id,
        description,
        annotations: annotations.into_iter().map(|(a, _)| a).collect(),
        selected: 0,
    })
}

/// Persists `annotation`'s flags and records a revision for `action`.
///
/// When `write_results` is set the annotation's current results replace its
/// persisted regions and `has_result` is set. The update, region rewrite and
/// revision insert share one `BEGIN IMMEDIATE` transaction.
///
/// # Errors
///
/// Returns `Error::Db` if the transaction fails.
pub async fn record_transition(
    conn: &Connection,
    annotation: &Annotation,
    action: RevisionAction,
    reason: Option<String>,
    write_results: bool,
) -> Result<Revision> {
    let annotation = annotation.clone();

    with_db(conn, move |db| {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE annotations
             SET skipped = ?1, sent_user_generate = ?2, ground_truth = ?3, state = ?4,
                 has_result = has_result OR ?5, updated_at = ?6
             WHERE id = ?7",
            rusqlite::params![
                annotation.skipped,
                annotation.sent_user_generate,
                annotation.ground_truth,
                annotation.state.as_str(),
                write_results,
                now,
                &annotation.id
            ],
        )?;
        if write_results {
            tx.execute("DELETE FROM regions WHERE annotation_id = ?1", [&annotation.id])?;
            for (idx, region) in annotation.results.iter().enumerate() {
                tx.execute(
                    "INSERT INTO regions (id, annotation_id, position, label) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![&region.id, &annotation.id, idx as i64, &region.label],
                )?;
            }
        }

        let revision = Revision {
            id: uuid::Uuid::new_v4().to_string(),
            annotation_id: annotation.id.clone(),
            action,
            reason,
            labels: annotation.results.iter().map(|r| r.label.clone()).collect(),
            created_at: now,
        };
        tx.execute(
            "INSERT INTO revisions (id, annotation_id, action, reason, labels, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &revision.id,
                &revision.annotation_id,
                revision.action.as_str(),
                &revision.reason,
                revision.labels.join("\n"),
                now
            ],
        )?;
        tx.commit()?;
        Ok(revision)
    })
    .await
}

/// Loads all revisions of `annotation_id`, newest first.
///
/// # Errors
///
/// Returns `Error::Db` if the query fails.
pub async fn load_revisions(conn: &Connection, annotation_id: &str) -> Result<Vec<Revision>> {
    let annotation_id = annotation_id.to_owned();

    with_db(conn, move |db| {
        let mut stmt = db.prepare(
            "SELECT id, annotation_id, action, reason, labels, created_at
             FROM revisions WHERE annotation_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map([&annotation_id], |r| {
                let action: String = r.get(2)?;
                let labels: String = r.get(4)?;
                Ok((
                    Revision {
                        id: r.get(0)?,
                        annotation_id: r.get(1)?,
                        action: RevisionAction::Submitted,
                        reason: r.get(3)?,
                        labels: labels
                            .lines()
                            .filter(|l| !l.is_empty())
                            .map(str::to_owned)
                            .collect(),
                        created_at: r.get(5)?,
                    },
                    action,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        // The CHECK constraint keeps `action` within the known set.
        Ok(rows
            .into_iter()
            .filter_map(|(mut rev, action)| {
                rev.action = RevisionAction::parse(&action)?;
                Some(rev)
            })
            .collect())
    })
    .await
}

/// Persists the ground-truth flag of one annotation.
///
/// # Errors
///
/// Returns `Error::Db` if the update fails.
pub async fn set_ground_truth(conn: &Connection, annotation_id: &str, value: bool) -> Result<()> {
    let annotation_id = annotation_id.to_owned();

    with_db(conn, move |db| {
        db.execute(
            "UPDATE annotations SET ground_truth = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![value, now_secs(), &annotation_id],
        )?;
        Ok(())
    })
    .await
}

/// Inserts a committed comment for `annotation_id`.
///
/// # Errors
///
/// Returns `Error::Db` if the insert fails (for example an unknown annotation).
pub async fn insert_comment(conn: &Connection, annotation_id: &str, body: &str) -> Result<Comment> {
    let comment = Comment {
        id: uuid::Uuid::new_v4().to_string(),
        annotation_id: annotation_id.to_owned(),
        body: body.to_owned(),
        created_at: now_secs(),
    };
    let row = comment.clone();

    with_db(conn, move |db| {
        db.execute(
            "INSERT INTO comments (id, annotation_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![&row.id, &row.annotation_id, &row.body, row.created_at],
        )?;
        Ok(())
    })
    .await?;
    Ok(comment)
}

/// Loads the comments of `annotation_id`, oldest first.
///
/// # Errors
///
/// Returns `Error::Db` if the query fails.
pub async fn load_comments(conn: &Connection, annotation_id: &str) -> Result<Vec<Comment>> {
    let annotation_id = annotation_id.to_owned();

    with_db(conn, move |db| {
        let mut stmt = db.prepare(
            "SELECT id, annotation_id, body, created_at FROM comments
             WHERE annotation_id = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt
            .query_map([&annotation_id], |r| {
                Ok(Comment {
                    id: r.get(0)?,
                    annotation_id: r.get(1)?,
                    body: r.get(2)?,
                    created_at: r.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}
