use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use sqlx::FromRow;

pub const TABLE_NAME: &str = "public.branches";

#[derive(Clone, Debug, Deserialize, FromRow)]
pub struct Branch {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}
