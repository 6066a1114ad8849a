use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use sqlx::FromRow;

pub const TABLE_NAME: &str = "public.branch_users";

#[derive(Clone, Debug, Deserialize, FromRow)]
pub struct BranchUser {
    pub id: i32,
    pub branch_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<FixedOffset>,
}

/// A user row joined with the moment it was attached to a branch.
#[derive(Clone, Debug, Deserialize, FromRow)]
pub struct BranchMember {
    pub id: i32,
    pub user_name: String,
    pub email: Option<String>,
    pub assigned_at: DateTime<FixedOffset>,
}
