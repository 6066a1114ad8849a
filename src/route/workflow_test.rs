use chrono::{DateTime, FixedOffset, Local};
use poem::{http::StatusCode, test::TestClient};
use serde_json::{json, Value::Null};
use sqlx::PgPool;

use crate::{
    core::{
        test_utils::{generate_test_user, init_test_state, test_config},
        utils::datetime_to_string,
    },
    factory::workflow::WorkflowFactory,
    init_openapi_route,
    model::workflow::Workflow,
};

async fn deleted_at(pool: &PgPool, id: i32) -> anyhow::Result<Option<DateTime<FixedOffset>>> {
    let res: (Option<DateTime<FixedOffset>>,) =
        sqlx::query_as("SELECT deleted_at FROM public.workflows WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(res.0)
}

#[sqlx::test]
async fn test_create_workflow_api(pool: PgPool) -> anyhow::Result<()> {
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
        .post("/api/workflow/")
        .header("authorization", format!("Bearer {}", test_user.token))
        .body_json(&json!({"name": "approval", "description": "two step approval"}))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::CREATED);
    let json = resp.json().await;
    let value = json.value().object();
    value.get("name").assert_string("approval");
    value.get("created_by").assert_i64(test_user.user.id as i64);
    value.get("deleted_at").assert_null();
    let id = value.get("id").i64() as i32;
    assert!(deleted_at(&app_state.db, id).await?.is_none());
    Ok(())
}

#[sqlx::test]
async fn test_soft_delete_workflow_api(pool: PgPool) -> anyhow::Result<()> {
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
    let workflow = WorkflowFactory::<()>::new()
        .generate_one(&app_state.db, ())
        .await?;
    let cli = TestClient::new(init_openapi_route(app_state.clone(), &config));

    // When
    let resp = cli
        .get(format!("/api/workflow/{}", workflow.id))
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect visible before delete
    resp.assert_status_is_ok();
    resp.assert_json(&json!({
        "id": workflow.id,
        "name": workflow.name,
        "description": workflow.description,
        "created_by": Null,
        "created_at": datetime_to_string(workflow.created_at),
        "updated_at": datetime_to_string(workflow.updated_at),
        "deleted_at": Null,
    }))
    .await;

    // When delete
    let resp = cli
        .delete(format!("/api/workflow/{}", workflow.id))
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect row kept with deleted_at set
    resp.assert_status(StatusCode::NO_CONTENT);
    assert!(deleted_at(&app_state.db, workflow.id).await?.is_some());

    // When detail after delete
    let resp = cli
        .get(format!("/api/workflow/{}", workflow.id))
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::NOT_FOUND);

    // When second delete
    let resp = cli
        .delete(format!("/api/workflow/{}", workflow.id))
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test]
async fn test_paginate_workflow_include_deleted(pool: PgPool) -> anyhow::Result<()> {
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
    let mut factory = WorkflowFactory::<()>::new();
    factory.modified_many(|data, idx, _| Workflow {
        deleted_at: if idx < 2 {
            Some(Local::now().fixed_offset())
        } else {
            None
        },
        ..data.clone()
    });
    factory.generate_many(&app_state.db, 5, ()).await?;
    let cli = TestClient::new(init_openapi_route(app_state.clone(), &config));

    // When
    let resp = cli
        .get("/api/workflow/")
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    let json = resp.json().await;
    json.value().object().get("counts").assert_i64(3);
    for item in json.value().object().get("results").object_array() {
        item.get("deleted_at").assert_null();
    }

    // When
    let resp = cli
        .get("/api/workflow/")
        .header("authorization", format!("Bearer {}", test_user.token))
        .query("include_deleted", &true)
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    let json = resp.json().await;
    json.value().object().get("counts").assert_i64(5);
    Ok(())
}

#[sqlx::test]
async fn test_restore_workflow_api(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let config = test_config()?;
    let app_state = init_test_state(pool, &config)?;
    let mut redis_conn = app_state.redis_conn.get()?;
    let admin = generate_test_user(
        &app_state.db,
        &mut redis_conn,
        &config,
        "admin",
        "password",
        true,
    )
    .await?;
    let test_user = generate_test_user(
        &app_state.db,
        &mut redis_conn,
        &config,
        "test_user",
        "password",
        false,
    )
    .await?;
    let mut factory = WorkflowFactory::<()>::new();
    factory.modified_one(|data, _| Workflow {
        deleted_at: Some(Local::now().fixed_offset()),
        ..data.clone()
    });
    let workflow = factory.generate_one(&app_state.db, ()).await?;
    let cli = TestClient::new(init_openapi_route(app_state.clone(), &config));

    // When not a superadmin
    let resp = cli
        .put(format!("/api/workflow/{}/restore", workflow.id))
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::FORBIDDEN);
    assert!(deleted_at(&app_state.db, workflow.id).await?.is_some());

    // When
    let resp = cli
        .put(format!("/api/workflow/{}/restore", workflow.id))
        .header("authorization", format!("Bearer {}", admin.token))
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    let json = resp.json().await;
    json.value().object().get("deleted_at").assert_null();
    assert!(deleted_at(&app_state.db, workflow.id).await?.is_none());

    // When unknown workflow
    let resp = cli
        .put(format!("/api/workflow/{}/restore", workflow.id + 1000))
        .header("authorization", format!("Bearer {}", admin.token))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test]
async fn test_workflow_invalid_id(pool: PgPool) -> anyhow::Result<()> {
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
        .delete("/api/workflow/-4")
        .header("authorization", format!("Bearer {}", test_user.token))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(&json!({
        "message": "\"id\" must be a positive number",
        "details": [{
            "field": "id",
            "location": "params",
            "kind": "number.positive",
            "message": "\"id\" must be a positive number"
        }]
    }))
    .await;
    Ok(())
}
