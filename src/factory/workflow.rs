use chrono::{DateTime, FixedOffset};
use fake::{faker::lorem::en::Sentence, faker::lorem::en::Words, Dummy, Fake, Faker};
use serde::Deserialize;
use sqlx::{Executor, PgPool, Postgres};

use crate::model::workflow::{Workflow, TABLE_NAME};

pub struct WorkflowFactory<T: Clone> {
    modifier_one: fn(x: &Workflow, ext: T) -> Workflow,
    modifier_many: fn(x: &Workflow, idx: usize, ext: T) -> Workflow,
}

impl<T: Clone> Default for WorkflowFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> WorkflowFactory<T> {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
            modifier_many: |x, _, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &Workflow, ext: T) -> Workflow) {
        self.modifier_one = modifier
    }

    pub fn modified_many(&mut self, modifier: fn(x: &Workflow, idx: usize, ext: T) -> Workflow) {
        self.modifier_many = modifier
    }

    pub async fn generate_one(&mut self, db: &PgPool, ext: T) -> anyhow::Result<Workflow> {
        let data = Faker.fake::<WorkflowDummy>().to_workflow();
        let data = (self.modifier_one)(&data, ext);
        insert_workflow(db, &data).await
    }

    pub async fn generate_many(
        &mut self,
        db: &PgPool,
        num: u32,
        ext: T,
    ) -> anyhow::Result<Vec<Workflow>> {
        let mut result: Vec<Workflow> = vec![];
        let mut tx = db.begin().await?;
        for idx in 0..num as usize {
            let data = Faker.fake::<WorkflowDummy>().to_workflow();
            let data = (self.modifier_many)(&data, idx, ext.clone());
            result.push(insert_workflow(&mut *tx, &data).await?);
        }
        tx.commit().await?;
        Ok(result)
    }
}

async fn insert_workflow<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: &Workflow,
) -> anyhow::Result<Workflow> {
    let workflow: Workflow = sqlx::query_as(
        format!(
            r#"INSERT INTO {} (name, description, created_by, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.created_by)
    .bind(data.created_at)
    .bind(data.updated_at)
    .bind(data.deleted_at)
    .fetch_one(executor)
    .await?;
    Ok(workflow)
}

#[derive(Debug, Deserialize, Dummy, Clone)]
struct WorkflowDummy {
    #[dummy(faker = "Words(1..4)")]
    pub name: Vec<String>,
    #[dummy(faker = "Sentence(3..8)")]
    pub description: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl WorkflowDummy {
    fn to_workflow(&self) -> Workflow {
        Workflow {
            id: 0,
            name: self.name.join(" "),
            description: Some(self.description.clone()),
            created_by: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: None,
        }
    }
}
