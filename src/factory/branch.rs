use chrono::{DateTime, FixedOffset};
use fake::{faker::company::en::CompanyName, faker::lorem::en::Sentence, Dummy, Fake, Faker};
use serde::Deserialize;
use sqlx::{Executor, PgPool, Postgres};

use crate::model::branch::{Branch, TABLE_NAME};

pub struct BranchFactory<T: Clone> {
    modifier_one: fn(x: &Branch, ext: T) -> Branch,
    modifier_many: fn(x: &Branch, idx: usize, ext: T) -> Branch,
}

impl<T: Clone> Default for BranchFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> BranchFactory<T> {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
            modifier_many: |x, _, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &Branch, ext: T) -> Branch) {
        self.modifier_one = modifier
    }

    pub fn modified_many(&mut self, modifier: fn(x: &Branch, idx: usize, ext: T) -> Branch) {
        self.modifier_many = modifier
    }

    pub async fn generate_one(&mut self, db: &PgPool, ext: T) -> anyhow::Result<Branch> {
        let data = Faker.fake::<BranchDummy>().to_branch();
        let data = (self.modifier_one)(&data, ext);
        insert_branch(db, &data).await
    }

    pub async fn generate_many(
        &mut self,
        db: &PgPool,
        num: u32,
        ext: T,
    ) -> anyhow::Result<Vec<Branch>> {
        let mut result: Vec<Branch> = vec![];
        let mut tx = db.begin().await?;
        for idx in 0..num as usize {
            let data = Faker.fake::<BranchDummy>().to_branch();
            let data = (self.modifier_many)(&data, idx, ext.clone());
            result.push(insert_branch(&mut *tx, &data).await?);
        }
        tx.commit().await?;
        Ok(result)
    }
}

async fn insert_branch<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: &Branch,
) -> anyhow::Result<Branch> {
    let branch: Branch = sqlx::query_as(
        format!(
            r#"INSERT INTO {} (name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.created_at)
    .bind(data.updated_at)
    .fetch_one(executor)
    .await?;
    Ok(branch)
}

#[derive(Debug, Deserialize, Dummy, Clone)]
struct BranchDummy {
    #[dummy(faker = "CompanyName()")]
    pub name: String,
    #[dummy(faker = "Sentence(3..8)")]
    pub description: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl BranchDummy {
    fn to_branch(&self) -> Branch {
        Branch {
            id: 0,
            name: self.name.clone(),
            description: Some(self.description.clone()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
