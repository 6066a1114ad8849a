use chrono::{DateTime, FixedOffset, Local};
use fake::{faker::internet::en::Username, Dummy, Fake, Faker};
use serde::Deserialize;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::model::user::{User, TABLE_NAME};

pub struct UserFactory<T: Clone> {
    modifier_one: fn(x: &User, ext: T) -> User,
    modifier_many: fn(x: &User, idx: usize, ext: T) -> User,
}

impl<T: Clone> Default for UserFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> UserFactory<T> {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
            modifier_many: |x, _, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &User, ext: T) -> User) {
        self.modifier_one = modifier
    }

    pub fn modified_many(&mut self, modifier: fn(x: &User, idx: usize, ext: T) -> User) {
        self.modifier_many = modifier
    }

    /// The `id` of the modified row is ignored; the database assigns it.
    pub async fn generate_one(&mut self, db: &PgPool, ext: T) -> anyhow::Result<User> {
        let data = UserDummy::generate_one();
        let data = (self.modifier_one)(&data, ext);
        insert_user(db, &data).await
    }

    pub async fn generate_many(
        &mut self,
        db: &PgPool,
        num: u32,
        ext: T,
    ) -> anyhow::Result<Vec<User>> {
        let data = UserDummy::generate_many(num);
        let mut result: Vec<User> = vec![];
        let mut tx = db.begin().await?;
        for (idx, item) in data.iter().enumerate() {
            let item = (self.modifier_many)(item, idx, ext.clone());
            result.push(insert_user(&mut *tx, &item).await?);
        }
        tx.commit().await?;
        Ok(result)
    }
}

async fn insert_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: &User,
) -> anyhow::Result<User> {
    let user: User = sqlx::query_as(format!(r#"
    INSERT INTO {} (user_name, password, email, superadmin, uuid, profile_pic, expiry_at, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    RETURNING *"#, TABLE_NAME).as_str())
    .bind(&data.user_name)
    .bind(&data.password)
    .bind(&data.email)
    .bind(data.superadmin)
    .bind(&data.uuid)
    .bind(&data.profile_pic)
    .bind(data.expiry_at)
    .bind(data.created_at)
    .bind(data.updated_at)
    .fetch_one(executor)
    .await?;
    Ok(user)
}

#[derive(Debug, Deserialize, Dummy, Clone)]
struct UserDummy {
    #[dummy(faker = "Username()")]
    pub user_name: String,
    pub password: String,
    pub email: Option<String>,
    pub profile_pic: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl UserDummy {
    fn to_user(&self) -> User {
        let now = Local::now().fixed_offset();
        User {
            id: 0,
            // fake usernames repeat often enough to trip the unique index
            user_name: format!("{}_{}", self.user_name, Uuid::now_v7().simple()),
            password: self.password.clone(),
            email: self.email.clone(),
            superadmin: false,
            uuid: Some(Uuid::now_v7().to_string()),
            profile_pic: self.profile_pic.clone(),
            expiry_at: None,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    pub fn generate_one() -> User {
        Faker.fake::<UserDummy>().to_user()
    }

    pub fn generate_many(num: u32) -> Vec<User> {
        (0..num)
            .map(|_| Faker.fake::<UserDummy>().to_user())
            .collect()
    }
}
