use chrono::{DateTime, FixedOffset, Local};
use sqlx::{Postgres, Transaction};

use crate::model::{
    branch::Branch,
    branch_user::{BranchMember, BranchUser, TABLE_NAME},
    user::{User, TABLE_NAME as USER_TABLE_NAME},
};

pub async fn get_branch_user(
    tx: &mut Transaction<'_, Postgres>,
    branch: &Branch,
    user: &User,
) -> anyhow::Result<Option<BranchUser>> {
    Ok(sqlx::query_as(
        format!(
            r#"SELECT * FROM {}
            WHERE branch_id = $1 AND user_id = $2"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(branch.id)
    .bind(user.id)
    .fetch_optional(&mut **tx)
    .await?)
}

/// Returns `true` when a new row was inserted, `false` when the user was
/// already assigned.
pub async fn assign_user_to_branch(
    tx: &mut Transaction<'_, Postgres>,
    branch: &Branch,
    user: &User,
    now: Option<DateTime<FixedOffset>>,
) -> anyhow::Result<bool> {
    let now = now.unwrap_or(Local::now().fixed_offset());
    let res = sqlx::query(
        format!(
            r#"INSERT INTO {} (branch_id, user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (branch_id, user_id) DO NOTHING"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(branch.id)
    .bind(user.id)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// Returns `true` when a row was removed, `false` when there was nothing to
/// remove.
pub async fn unassign_user_from_branch(
    tx: &mut Transaction<'_, Postgres>,
    branch: &Branch,
    user: &User,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        format!(
            "DELETE FROM {}
            WHERE branch_id = $1 AND user_id = $2",
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(branch.id)
    .bind(user.id)
    .execute(&mut **tx)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn get_branch_members(
    tx: &mut Transaction<'_, Postgres>,
    branch: &Branch,
) -> anyhow::Result<Vec<BranchMember>> {
    Ok(sqlx::query_as(
        format!(
            r#"SELECT u.id, u.user_name, u.email, bu.created_at AS assigned_at
            FROM {} bu
            JOIN {} u ON u.id = bu.user_id
            WHERE bu.branch_id = $1
            ORDER BY bu.created_at ASC, u.id ASC"#,
            TABLE_NAME, USER_TABLE_NAME
        )
        .as_str(),
    )
    .bind(branch.id)
    .fetch_all(&mut **tx)
    .await?)
}
