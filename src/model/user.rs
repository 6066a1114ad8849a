use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use sqlx::prelude::FromRow;

pub const TABLE_NAME: &str = "public.users";

#[derive(Clone, Debug, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub user_name: String,
    pub password: String,
    pub email: Option<String>,
    pub superadmin: bool,
    pub uuid: Option<String>,
    pub profile_pic: Option<String>,
    pub expiry_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl User {
    /// An account with `expiry_at` at or before `now` can no longer sign in.
    pub fn is_expired(&self, now: DateTime<FixedOffset>) -> bool {
        matches!(self.expiry_at, Some(expiry_at) if expiry_at <= now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local};

    use super::User;

    fn user() -> User {
        let now = Local::now().fixed_offset();
        User {
            id: 1,
            user_name: "user".to_string(),
            password: "password".to_string(),
            email: None,
            superadmin: false,
            uuid: None,
            profile_pic: None,
            expiry_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_is_expired() {
        let now = Local::now().fixed_offset();
        let mut data = user();
        assert!(!data.is_expired(now));

        data.expiry_at = Some(now + Duration::days(1));
        assert!(!data.is_expired(now));

        data.expiry_at = Some(now - Duration::seconds(1));
        assert!(data.is_expired(now));

        data.expiry_at = Some(now);
        assert!(data.is_expired(now));
    }
}
