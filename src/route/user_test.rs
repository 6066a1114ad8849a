use poem::{http::StatusCode, test::TestClient};
use serde_json::{json, Value::Null};
use sqlx::PgPool;

use crate::{
    core::{
        test_utils::{generate_test_user, init_test_state, test_config},
        utils::datetime_to_string,
    },
    init_openapi_route,
};

#[sqlx::test]
async fn test_current_user_api(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let config = test_config()?;
    let app_state = init_test_state(pool, &config)?;
    let mut redis_conn = app_state.redis_conn.get()?;
    let test_user = generate_test_user(
        &app_state.db,
        &mut redis_conn,
        &config,
        "test_user",
        "password",
        false,
    )
    .await?;
    let cli = TestClient::new(init_openapi_route(app_state.clone(), &config));

    // When
    let resp = cli
        .get("/api/user/me")
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    let user = test_user.user;
    assert!(user.uuid.is_some());
    resp.assert_json(&json!({
        "id": user.id,
        "user_name": "test_user",
        "email": "test_user@local.com",
        "superadmin": false,
        "uuid": user.uuid,
        "profile_pic": Null,
        "expiry_at": Null,
        "created_at": datetime_to_string(user.created_at),
        "updated_at": datetime_to_string(user.updated_at),
    }))
    .await;
    Ok(())
}

#[sqlx::test]
async fn test_current_user_expired_token_stops_resolving(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let config = test_config()?;
    let app_state = init_test_state(pool, &config)?;
    let mut redis_conn = app_state.redis_conn.get()?;
    let test_user = generate_test_user(
        &app_state.db,
        &mut redis_conn,
        &config,
        "test_user",
        "password",
        false,
    )
    .await?;
    let cli = TestClient::new(init_openapi_route(app_state.clone(), &config));
    sqlx::query("UPDATE public.users SET expiry_at = now() - interval '1 minute' WHERE id = $1")
        .bind(test_user.user.id)
        .execute(&app_state.db)
        .await?;

    // When
    let resp = cli
        .get("/api/user/me")
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test]
async fn test_current_user_without_session(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let config = test_config()?;
    let app_state = init_test_state(pool, &config)?;
    let cli = TestClient::new(init_openapi_route(app_state.clone(), &config));

    // When
    let resp = cli
        .get("/api/user/me")
        .header("authorization", "Bearer not-a-session")
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}
