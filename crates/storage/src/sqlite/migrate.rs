use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

struct Migration {
    version: i64,
    name: &'static str,
    statements: &'static [&'static str],
}

/// Ordered schema history. Append new versions; never edit an applied one.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create quiz_history",
    statements: &[
        r"
        CREATE TABLE IF NOT EXISTS quiz_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            exam TEXT NOT NULL,
            subject TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score >= 0),
            accuracy REAL NOT NULL CHECK (accuracy >= 0.0 AND accuracy <= 100.0),
            total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
            full_result TEXT NOT NULL
        );
        ",
        r"
        CREATE INDEX IF NOT EXISTS idx_quiz_history_owner_recorded
            ON quiz_history (owner_id, recorded_at);
        ",
    ],
}];

async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
        .bind(version)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Applies pending migrations, each in its own transaction, recording them in
/// `schema_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );
        ",
    )
    .execute(pool)
    .await?;

    for migration in MIGRATIONS {
        if is_applied(pool, migration.version).await? {
            continue;
        }

        let mut tx = pool.begin().await?;
        for &statement in migration.statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query(
            r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(migration.version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            version = migration.version,
            name = migration.name,
            "applied schema migration"
        );
    }

    Ok(())
}
