//! Embedded schema migrations.
//!
//! Every migration under `./migrations` is a reversible pair
//! (`<version>_<name>.up.sql` / `.down.sql`). Versions are timestamps and are
//! applied in ascending order; the `_sqlx_migrations` ledger records which
//! ones are applied. A migration that fails is rolled back with its own
//! transaction and stays pending.

use sqlx::{
    migrate::{Migrate, MigrateError, Migrator},
    PgPool,
};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>, MigrateError> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    let mut versions: Vec<i64> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|x| x.version)
        .collect();
    versions.sort_unstable();
    Ok(versions)
}

pub async fn list_migrations(pool: &PgPool) -> Result<Vec<MigrationStatus>, MigrateError> {
    let applied = applied_versions(pool).await?;
    let mut result: Vec<MigrationStatus> = MIGRATOR
        .iter()
        .filter(|x| !x.migration_type.is_down_migration())
        .map(|x| MigrationStatus {
            version: x.version,
            description: x.description.to_string(),
            applied: applied.contains(&x.version),
        })
        .collect();
    result.sort_by_key(|x| x.version);
    Ok(result)
}

/// Applies every pending migration and returns the versions it applied.
pub async fn run_migrations(pool: &PgPool) -> Result<Vec<i64>, MigrateError> {
    let pending: Vec<i64> = list_migrations(pool)
        .await?
        .into_iter()
        .filter(|x| !x.applied)
        .map(|x| x.version)
        .collect();
    for version in pending.iter() {
        tracing::debug!("pending migration {}", version);
    }
    MIGRATOR.run(pool).await?;
    tracing::info!("applied {} migration(s)", pending.len());
    Ok(pending)
}

/// Reverts only the newest applied migration. Returns its version, or `None`
/// when nothing is applied.
pub async fn revert_latest(pool: &PgPool) -> Result<Option<i64>, MigrateError> {
    let applied = applied_versions(pool).await?;
    let Some(latest) = applied.last().copied() else {
        tracing::info!("no applied migration to revert");
        return Ok(None);
    };
    let target = if applied.len() > 1 {
        applied[applied.len() - 2]
    } else {
        0
    };
    MIGRATOR.undo(pool, target).await?;
    tracing::info!("reverted migration {}", latest);
    Ok(Some(latest))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sqlx::{migrate::MigrateError, PgPool};

    use super::{list_migrations, revert_latest, run_migrations};

    async fn columns(pool: &PgPool, table: &str) -> anyhow::Result<BTreeSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"SELECT column_name::text FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1"#,
        )
        .bind(table)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|x| x.0).collect())
    }

    // Newest first, the order `revert_latest` walks them.
    const COLUMN_MIGRATIONS: [(i64, &str, &str); 5] = [
        (20240420161000, "users", "expiry_at"),
        (20240402083000, "workflows", "deleted_at"),
        (20240318140000, "users", "profile_pic"),
        (20240301101500, "users", "uuid"),
        (20240215093000, "users", "superadmin"),
    ];

    #[sqlx::test(migrations = false)]
    async fn test_run_applies_all_in_order(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let before = list_migrations(&pool).await?;
        assert_eq!(before.len(), 8);
        assert!(before.iter().all(|x| !x.applied));
        assert!(before.windows(2).all(|x| x[0].version < x[1].version));

        // When
        let applied = run_migrations(&pool).await?;

        // Expect
        assert_eq!(applied, before.iter().map(|x| x.version).collect::<Vec<i64>>());
        assert!(list_migrations(&pool).await?.iter().all(|x| x.applied));
        let users = columns(&pool, "users").await?;
        for column in ["superadmin", "uuid", "profile_pic", "expiry_at"] {
            assert!(users.contains(column), "users.{} missing", column);
        }
        assert!(columns(&pool, "workflows").await?.contains("deleted_at"));

        // When run again
        let applied = run_migrations(&pool).await?;

        // Expect nothing left to do
        assert!(applied.is_empty());
        Ok(())
    }

    #[sqlx::test(migrations = false)]
    async fn test_down_reverses_up(pool: PgPool) -> anyhow::Result<()> {
        // Given
        run_migrations(&pool).await?;
        let full_users = columns(&pool, "users").await?;
        let full_workflows = columns(&pool, "workflows").await?;

        for (version, table, column) in COLUMN_MIGRATIONS {
            let before = columns(&pool, table).await?;
            assert!(before.contains(column));

            // When
            let reverted = revert_latest(&pool).await?;

            // Expect only that column is gone
            assert_eq!(reverted, Some(version));
            let after = columns(&pool, table).await?;
            let removed: Vec<&String> = before.difference(&after).collect();
            assert_eq!(removed, vec![column]);
            assert!(after.is_subset(&before));
            let status = list_migrations(&pool).await?;
            let entry = status.iter().find(|x| x.version == version);
            assert_eq!(entry.map(|x| x.applied), Some(false));
        }

        // When re-applied
        let applied = run_migrations(&pool).await?;

        // Expect the original column sets
        assert_eq!(applied.len(), COLUMN_MIGRATIONS.len());
        assert_eq!(columns(&pool, "users").await?, full_users);
        assert_eq!(columns(&pool, "workflows").await?, full_workflows);
        Ok(())
    }

    #[sqlx::test(migrations = false)]
    async fn test_revert_with_nothing_applied(pool: PgPool) -> anyhow::Result<()> {
        assert_eq!(revert_latest(&pool).await?, None);
        Ok(())
    }

    #[sqlx::test(migrations = false)]
    async fn test_revert_everything(pool: PgPool) -> anyhow::Result<()> {
        // Given
        run_migrations(&pool).await?;

        // When
        let mut reverted: Vec<i64> = vec![];
        while let Some(version) = revert_latest(&pool).await? {
            reverted.push(version);
        }

        // Expect
        assert_eq!(reverted.len(), 8);
        assert!(reverted.windows(2).all(|x| x[0] > x[1]));
        assert!(columns(&pool, "users").await?.is_empty());
        assert!(columns(&pool, "workflows").await?.is_empty());
        Ok(())
    }

    #[sqlx::test(migrations = false)]
    async fn test_failed_migration_stays_pending(pool: PgPool) -> anyhow::Result<()> {
        // Given expiry_at exists before its migration runs
        run_migrations(&pool).await?;
        assert_eq!(revert_latest(&pool).await?, Some(20240420161000));
        sqlx::query("ALTER TABLE public.users ADD COLUMN expiry_at TIMESTAMPTZ NULL")
            .execute(&pool)
            .await?;

        // When
        let res = run_migrations(&pool).await;

        // Expect
        assert!(matches!(
            res,
            Err(MigrateError::ExecuteMigration(_, 20240420161000))
        ));
        let status = list_migrations(&pool).await?;
        let entry = status.iter().find(|x| x.version == 20240420161000);
        assert_eq!(entry.map(|x| x.applied), Some(false));
        assert!(status
            .iter()
            .filter(|x| x.version < 20240420161000)
            .all(|x| x.applied));
        Ok(())
    }

    #[sqlx::test(migrations = false)]
    async fn test_soft_delete_column(pool: PgPool) -> anyhow::Result<()> {
        // Given
        run_migrations(&pool).await?;

        // When inserted without deleted_at
        let row: (i32, Option<chrono::DateTime<chrono::Utc>>) = sqlx::query_as(
            "INSERT INTO public.workflows (name) VALUES ('draft') RETURNING id, deleted_at",
        )
        .fetch_one(&pool)
        .await?;

        // Expect
        assert!(row.1.is_none());

        // When explicitly set
        let deleted: (Option<chrono::DateTime<chrono::Utc>>,) = sqlx::query_as(
            "UPDATE public.workflows SET deleted_at = now() WHERE id = $1 RETURNING deleted_at",
        )
        .bind(row.0)
        .fetch_one(&pool)
        .await?;

        // Expect
        assert!(deleted.0.is_some());
        Ok(())
    }
}
