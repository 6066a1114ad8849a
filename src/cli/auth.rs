use chrono::{DateTime, FixedOffset};
use sqlx::PgPool;

use crate::{
    core::security::hash_password,
    model::user::User,
    repository::user::{self, NewUser},
};

pub async fn create_user(
    pool: &PgPool,
    username: &str,
    password: &str,
    superadmin: bool,
    expiry_at: Option<DateTime<FixedOffset>>,
) -> anyhow::Result<User> {
    let mut tx = pool.begin().await?;
    let new_user = NewUser {
        user_name: username.to_string(),
        password: hash_password(password)?,
        email: None,
        superadmin,
        profile_pic: None,
        expiry_at,
    };
    let created = user::create_user(&mut tx, new_user, None).await?;
    tx.commit().await?;
    tracing::info!("created user {} ({})", created.user_name, created.id);
    Ok(created)
}
