use std::sync::Arc;

use redis::ConnectionLike;
use sqlx::PgPool;

use super::security::{generate_refresh_token_from_user, generate_token_from_user, hash_password};
use crate::{
    core::session::add_session,
    model::user::User,
    repository::user::{create_user, NewUser},
    settings::{get_config, Config},
    AppState,
};

/// Config from the environment with the route prefix tests request against.
pub fn test_config() -> anyhow::Result<Config> {
    let mut config = get_config()?;
    config.prefix = Some("/api".to_string());
    Ok(config)
}

pub fn init_test_state(pool: PgPool, config: &Config) -> anyhow::Result<Arc<AppState>> {
    let client = redis::Client::open(config.redis_url.clone())?;
    let redis_pool = r2d2::Pool::builder().build(client)?;
    Ok(Arc::new(AppState {
        db: pool,
        redis_conn: redis_pool,
        config: config.clone(),
    }))
}

pub struct TestUser {
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

/// Creates a user with a live session.
pub async fn generate_test_user<C: ConnectionLike>(
    db: &PgPool,
    redis_conn: &mut C,
    config: &Config,
    username: &str,
    password: &str,
    superadmin: bool,
) -> anyhow::Result<TestUser> {
    let mut tx = db.begin().await?;
    let user = create_user(
        &mut tx,
        NewUser {
            user_name: username.to_string(),
            password: hash_password(password)?,
            email: Some(format!("{}@local.com", username)),
            superadmin,
            profile_pic: None,
            expiry_at: None,
        },
        None,
    )
    .await?;
    tx.commit().await?;

    let token = generate_token_from_user(&user, config)?;
    let refresh_token = generate_refresh_token_from_user(&user, config)?;
    add_session(
        redis_conn,
        &user,
        config,
        token.clone(),
        refresh_token.clone(),
    )?;

    Ok(TestUser {
        user,
        token,
        refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::core::{
        security::get_user_from_token,
        session::get_session,
        test_utils::{generate_test_user, init_test_state, test_config},
    };

    #[sqlx::test]
    async fn test_generate_test_user(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let config = test_config()?;
        let app_state = init_test_state(pool, &config)?;
        let mut redis_conn = app_state.redis_conn.get()?;

        // When
        let res = generate_test_user(
            &app_state.db,
            &mut redis_conn,
            &config,
            "testuser",
            "testpassword",
            true,
        )
        .await?;

        // Expect
        // is user exists on db
        let user: Option<(i32, String, bool)> =
            sqlx::query_as("SELECT id, user_name, superadmin FROM public.users WHERE id = $1")
                .bind(res.user.id)
                .fetch_optional(&app_state.db)
                .await?;
        assert_eq!(user, Some((res.user.id, "testuser".to_string(), true)));

        // is jwt token valid
        let mut tx = app_state.db.begin().await?;
        let user_token =
            get_user_from_token(&mut tx, &mut redis_conn, Some(res.token.clone())).await?;
        assert_eq!(user_token.map(|x| x.user_name), Some("testuser".to_string()));

        // is user exists on redis
        let session = get_session(&mut redis_conn, res.token)?;
        assert_eq!(session.map(|x| x.refresh_token), Some(res.refresh_token));
        Ok(())
    }
}
