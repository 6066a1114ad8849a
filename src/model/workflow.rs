use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use sqlx::FromRow;

pub const TABLE_NAME: &str = "public.workflows";

#[derive(Clone, Debug, Deserialize, FromRow)]
pub struct Workflow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl Workflow {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
