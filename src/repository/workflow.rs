use chrono::{DateTime, FixedOffset, Local};
use sqlx::{Postgres, Transaction};

use crate::{
    core::sqlx_utils::{
        binds_query, binds_query_as, count_to_total_pages, page_to_limit_offset, query_builder,
        SqlxBinds,
    },
    model::{
        user::User,
        workflow::{Workflow, TABLE_NAME},
    },
};

const NOT_DELETED: &str = "deleted_at IS NULL";

pub async fn paginate_workflow(
    tx: &mut Transaction<'_, Postgres>,
    page: u32,
    page_size: u32,
    search: Option<String>,
    include_deleted: bool,
) -> anyhow::Result<(Vec<Workflow>, u32, u32)> {
    let mut binds: Vec<SqlxBinds> = vec![];
    let mut filters: Vec<String> = vec![];

    if let Some(search) = search {
        binds.push(SqlxBinds::String(format!("%{}%", search)));
        filters.push(format!("name ILIKE ${}", binds.len()));
    }
    if !include_deleted {
        filters.push(NOT_DELETED.to_string());
    }

    let (limit, offset) = page_to_limit_offset(page, page_size);
    let stmt = query_builder(
        None,
        TABLE_NAME,
        &filters,
        vec!["updated_at DESC".to_string(), "id DESC".to_string()],
        Some(limit),
        Some(offset),
    );
    let stmt_count = query_builder(
        Some("count(id)".to_string()),
        TABLE_NAME,
        &filters,
        vec![],
        None,
        None,
    );

    let q = binds_query_as::<Workflow>(&stmt, binds.clone());
    let q_count = binds_query_as::<(i64,)>(&stmt_count, binds);
    let data = q.fetch_all(&mut **tx).await?;
    let count = q_count.fetch_one(&mut **tx).await?;
    let (total, num_page) = count_to_total_pages(count.0, page_size);
    Ok((data, total, num_page))
}

pub async fn get_workflow_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
    include_deleted: bool,
) -> anyhow::Result<Option<Workflow>> {
    let binds: Vec<SqlxBinds> = vec![SqlxBinds::Int(id)];
    let mut filters: Vec<String> = vec!["id = $1".to_string()];
    if !include_deleted {
        filters.push(NOT_DELETED.to_string());
    }
    let stmt = query_builder(None, TABLE_NAME, &filters, vec![], None, None);
    let data = binds_query_as::<Workflow>(&stmt, binds)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(data)
}

pub async fn create_workflow(
    tx: &mut Transaction<'_, Postgres>,
    name: String,
    description: Option<String>,
    request_user: &User,
    now: Option<DateTime<FixedOffset>>,
) -> anyhow::Result<Workflow> {
    let now = now.unwrap_or(Local::now().fixed_offset());
    let workflow: Workflow = sqlx::query_as(
        format!(
            r#"
    INSERT INTO {} (name, description, created_by, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING *"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&name)
    .bind(&description)
    .bind(request_user.id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;
    Ok(workflow)
}

pub async fn soft_delete_workflow(
    tx: &mut Transaction<'_, Postgres>,
    workflow: &mut Workflow,
    now: Option<DateTime<FixedOffset>>,
) -> anyhow::Result<()> {
    let now = now.unwrap_or(Local::now().fixed_offset());
    workflow.updated_at = now;
    workflow.deleted_at = Some(now);
    let stmt = format!(
        "UPDATE {} SET updated_at = $1, deleted_at = $2 WHERE id = $3",
        TABLE_NAME
    );
    binds_query(
        &stmt,
        vec![
            SqlxBinds::DateTimeFixedOffset(now),
            SqlxBinds::DateTimeFixedOffset(now),
            SqlxBinds::Int(workflow.id),
        ],
    )
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn restore_workflow(
    tx: &mut Transaction<'_, Postgres>,
    workflow: &mut Workflow,
    now: Option<DateTime<FixedOffset>>,
) -> anyhow::Result<()> {
    let now = now.unwrap_or(Local::now().fixed_offset());
    workflow.updated_at = now;
    workflow.deleted_at = None;
    let stmt = format!(
        "UPDATE {} SET updated_at = $1, deleted_at = NULL WHERE id = $2",
        TABLE_NAME
    );
    binds_query(
        &stmt,
        vec![
            SqlxBinds::DateTimeFixedOffset(now),
            SqlxBinds::Int(workflow.id),
        ],
    )
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::{
        factory::{user::UserFactory, workflow::WorkflowFactory},
        repository::workflow::{
            create_workflow, get_workflow_by_id, paginate_workflow, restore_workflow,
            soft_delete_workflow,
        },
    };

    #[sqlx::test]
    async fn test_new_workflow_is_not_deleted(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let user = UserFactory::<()>::new().generate_one(&pool, ()).await?;
        let mut tx = pool.begin().await?;

        // When
        let workflow =
            create_workflow(&mut tx, "onboarding".to_string(), None, &user, None).await?;

        // Expect
        assert!(workflow.deleted_at.is_none());
        let row: (Option<chrono::DateTime<chrono::Utc>>,) =
            sqlx::query_as("SELECT deleted_at FROM public.workflows WHERE id = $1")
                .bind(workflow.id)
                .fetch_one(&mut *tx)
                .await?;
        assert!(row.0.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_soft_delete_hides_row(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let workflows = WorkflowFactory::<()>::new()
            .generate_many(&pool, 3, ())
            .await?;
        let mut tx = pool.begin().await?;
        let mut target = workflows[1].clone();

        // When
        soft_delete_workflow(&mut tx, &mut target, None).await?;

        // Expect
        assert!(target.is_deleted());
        let row: (Option<chrono::DateTime<chrono::Utc>>,) =
            sqlx::query_as("SELECT deleted_at FROM public.workflows WHERE id = $1")
                .bind(target.id)
                .fetch_one(&mut *tx)
                .await?;
        assert!(row.0.is_some());
        assert!(get_workflow_by_id(&mut tx, target.id, false).await?.is_none());
        assert!(get_workflow_by_id(&mut tx, target.id, true).await?.is_some());

        let (data, counts, _) = paginate_workflow(&mut tx, 1, 10, None, false).await?;
        assert_eq!(counts, 2);
        assert!(data.iter().all(|x| x.id != target.id));
        let (_, counts, _) = paginate_workflow(&mut tx, 1, 10, None, true).await?;
        assert_eq!(counts, 3);

        // When restored
        restore_workflow(&mut tx, &mut target, None).await?;

        // Expect
        assert!(!target.is_deleted());
        assert!(get_workflow_by_id(&mut tx, target.id, false).await?.is_some());
        Ok(())
    }
}
