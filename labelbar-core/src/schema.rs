/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the full v1 schema.
///
/// Contains five tables:
/// - `tasks`: one row per imported task.
/// - `annotations`: annotations and predictions of a task, with review flags.
/// - `regions`: the persisted result items of an annotation, in order.
/// - `comments`: committed review comments.
/// - `revisions`: one read-only snapshot per store transition.
///
/// All tables use `STRICT` mode. Child rows cascade on delete.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id          TEXT    PRIMARY KEY,
        description TEXT,
        imported_at INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS annotations (
        id                 TEXT    PRIMARY KEY,
        task_id            TEXT    NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        position           INTEGER NOT NULL,
        kind               TEXT    NOT NULL
                                   CHECK(kind IN ('annotation', 'prediction')),
        editable           INTEGER NOT NULL DEFAULT 1,
        skipped            INTEGER NOT NULL DEFAULT 0,
        user_generate      INTEGER NOT NULL DEFAULT 1,
        sent_user_generate INTEGER NOT NULL DEFAULT 0,
        ground_truth       INTEGER NOT NULL DEFAULT 0,
        state              TEXT    NOT NULL DEFAULT 'pending'
                                   CHECK(state IN ('pending', 'submitted', 'accepted', 'rejected')),
        has_result         INTEGER NOT NULL DEFAULT 0,
        updated_at         INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS regions (
        id            TEXT    PRIMARY KEY,
        annotation_id TEXT    NOT NULL REFERENCES annotations(id) ON DELETE CASCADE,
        position      INTEGER NOT NULL,
        label         TEXT    NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS comments (
        id            TEXT    PRIMARY KEY,
        annotation_id TEXT    NOT NULL REFERENCES annotations(id) ON DELETE CASCADE,
        body          TEXT    NOT NULL,
        created_at    INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS revisions (
        id            TEXT    PRIMARY KEY,
        annotation_id TEXT    NOT NULL REFERENCES annotations(id) ON DELETE CASCADE,
        action        TEXT    NOT NULL
                              CHECK(action IN ('submitted', 'updated', 'accepted',
                                               'rejected', 'skipped', 'unskipped')),
        reason        TEXT,
        labels        TEXT    NOT NULL DEFAULT '',
        created_at    INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS idx_annotations_task ON annotations(task_id, position);
    CREATE INDEX IF NOT EXISTS idx_comments_annotation ON comments(annotation_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_revisions_annotation ON revisions(annotation_id, created_at);
";

/// Runs forward-only schema migration to migrate the DB to the latest version.
///
/// Idempotent: safe to call on every startup.
///
/// # Process
///
/// 1. Creates the `schema_version` table if it does not exist.
/// 2. Reads the current version (`0` if the table is empty).
/// 3. If the version is below 1, applies `SCHEMA_V1_SQL` inside a
///    `BEGIN IMMEDIATE` transaction and records `version = 1`.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
