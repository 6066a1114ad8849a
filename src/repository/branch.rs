use chrono::{DateTime, FixedOffset, Local};
use sqlx::{Postgres, Transaction};

use crate::{
    core::sqlx_utils::{
        binds_query_as, count_to_total_pages, page_to_limit_offset, query_builder, SqlxBinds,
    },
    model::branch::{Branch, TABLE_NAME},
};

pub async fn paginate_branch(
    tx: &mut Transaction<'_, Postgres>,
    page: u32,
    page_size: u32,
    search: Option<String>,
) -> anyhow::Result<(Vec<Branch>, u32, u32)> {
    let mut binds: Vec<SqlxBinds> = vec![];
    let mut filters: Vec<String> = vec![];

    if let Some(search) = search {
        binds.push(SqlxBinds::String(format!("%{}%", search)));
        filters.push(format!("name ILIKE ${}", binds.len()));
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

    let q = binds_query_as::<Branch>(&stmt, binds.clone());
    let q_count = binds_query_as::<(i64,)>(&stmt_count, binds);
    let data = q.fetch_all(&mut **tx).await?;
    let count = q_count.fetch_one(&mut **tx).await?;
    let (total, num_page) = count_to_total_pages(count.0, page_size);
    Ok((data, total, num_page))
}

pub async fn get_branch_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
) -> anyhow::Result<Option<Branch>> {
    let binds: Vec<SqlxBinds> = vec![SqlxBinds::Int(id)];
    let filters: Vec<String> = vec!["id = $1".to_string()];
    let stmt = query_builder(None, TABLE_NAME, &filters, vec![], None, None);
    let data = binds_query_as::<Branch>(&stmt, binds)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(data)
}

pub async fn create_branch(
    tx: &mut Transaction<'_, Postgres>,
    name: String,
    description: Option<String>,
    now: Option<DateTime<FixedOffset>>,
) -> anyhow::Result<Branch> {
    let now = now.unwrap_or(Local::now().fixed_offset());
    let branch: Branch = sqlx::query_as(
        format!(
            r#"
    INSERT INTO {} (name, description, created_at, updated_at)
    VALUES ($1, $2, $3, $4)
    RETURNING *"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&name)
    .bind(&description)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::{
        factory::branch::BranchFactory,
        model::branch::Branch,
        repository::branch::{create_branch, get_branch_by_id, paginate_branch},
    };

    #[sqlx::test]
    async fn test_create_branch(pool: PgPool) -> anyhow::Result<()> {
        // When
        let mut tx = pool.begin().await?;
        let branch = create_branch(&mut tx, "Surabaya".to_string(), None, None).await?;

        // Expect
        let found = get_branch_by_id(&mut tx, branch.id).await?;
        assert_eq!(found.map(|x| x.name), Some("Surabaya".to_string()));
        assert!(get_branch_by_id(&mut tx, branch.id + 1).await?.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_paginate_branch(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let mut factory = BranchFactory::<()>::new();
        factory.modified_many(|data, idx, _| Branch {
            name: if idx % 2 == 0 {
                format!("north {}", idx)
            } else {
                format!("south {}", idx)
            },
            ..data.clone()
        });
        factory.generate_many(&pool, 7, ()).await?;
        let mut tx = pool.begin().await?;

        // When
        let (data, counts, page_count) = paginate_branch(&mut tx, 2, 3, None).await?;

        // Expect
        assert_eq!(data.len(), 3);
        assert_eq!(counts, 7);
        assert_eq!(page_count, 3);

        // When searched
        let (data, counts, page_count) =
            paginate_branch(&mut tx, 1, 10, Some("NORTH".to_string())).await?;

        // Expect
        assert_eq!(data.len(), 4);
        assert_eq!(counts, 4);
        assert_eq!(page_count, 1);
        Ok(())
    }
}
