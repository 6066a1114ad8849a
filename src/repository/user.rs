use chrono::{DateTime, FixedOffset, Local};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    core::sqlx_utils::{binds_query_as, query_builder, SqlxBinds},
    model::user::{User, TABLE_NAME},
};

pub struct NewUser {
    pub user_name: String,
    pub password: String,
    pub email: Option<String>,
    pub superadmin: bool,
    pub profile_pic: Option<String>,
    pub expiry_at: Option<DateTime<FixedOffset>>,
}

pub async fn get_user_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
) -> anyhow::Result<Option<User>> {
    let binds: Vec<SqlxBinds> = vec![SqlxBinds::Int(id)];
    let filters: Vec<String> = vec!["id = $1".to_string()];
    let stmt = query_builder(None, TABLE_NAME, &filters, vec![], None, None);
    let user = binds_query_as::<User>(&stmt, binds)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(user)
}

pub async fn get_user_by_username(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
) -> anyhow::Result<Option<User>> {
    let user: Option<User> = sqlx::query_as(
        format!(
            r#"SELECT *
            FROM {}
            WHERE user_name = $1
            "#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(username)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(user)
}

/// Inserts a user with a freshly generated `uuid`.
pub async fn create_user(
    tx: &mut Transaction<'_, Postgres>,
    new_user: NewUser,
    now: Option<DateTime<FixedOffset>>,
) -> anyhow::Result<User> {
    let now = now.unwrap_or(Local::now().fixed_offset());
    let user: User = sqlx::query_as(
        format!(
            r#"
        INSERT INTO {} (user_name, password, email, superadmin, uuid, profile_pic,
        expiry_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&new_user.user_name)
    .bind(&new_user.password)
    .bind(&new_user.email)
    .bind(new_user.superadmin)
    .bind(Uuid::now_v7().to_string())
    .bind(&new_user.profile_pic)
    .bind(new_user.expiry_at)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;
    Ok(user)
}
