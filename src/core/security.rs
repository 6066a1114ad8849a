use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{Duration, Local};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use poem::Request;
use poem_openapi::{auth::Bearer, SecurityScheme};
use redis::ConnectionLike;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};

use crate::{model::user::User, repository::user::get_user_by_id, settings::Config};

use super::session::get_session;

const REFRESH_TOKEN_TYPE: &str = "refresh";

/// password hashing
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    // Argon2 with default params (Argon2id v19)
    let argon2 = Argon2::default();

    // Hash password to PHC string ($argon2id$v=19$...)
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("hash password: {}", err))?
        .to_string();

    Ok(password_hash)
}

/// password hash verification
pub fn verify_hash_password(password: &str, password_hash: &str) -> anyhow::Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|err| anyhow::anyhow!("parse password hash: {}", err))?;
    let verify = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(verify)
}


pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: i32,
    pub user_name: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_key: Option<String>,
}

impl Claims {
    pub fn new(user: &User, config: &Config) -> Self {
        let exp = (Local::now() + Duration::minutes(config.jwt_exp as i64)).timestamp();
        Self {
            id: user.id,
            user_name: user.user_name.clone(),
            exp,
            type_key: None,
        }
    }

    pub fn new_refresh(user: &User, config: &Config) -> Self {
        let exp = (Local::now() + Duration::minutes(config.jwt_refresh_exp as i64)).timestamp();
        Self {
            id: user.id,
            user_name: user.user_name.clone(),
            exp,
            type_key: Some(REFRESH_TOKEN_TYPE.to_string()),
        }
    }

    pub fn is_refresh(&self) -> bool {
        self.type_key.as_deref() == Some(REFRESH_TOKEN_TYPE)
    }
}

/// Generate token
pub fn encode_token(claims: &Claims, jwt_secret: &str) -> anyhow::Result<String> {
    let keys = Keys::new(jwt_secret.as_bytes());
    let token = encode(&Header::default(), &claims, &keys.encoding)?;
    Ok(token)
}

/// Extract payload and Validate token
pub fn decode_token(token: &str, jwt_secret: &str) -> anyhow::Result<Claims> {
    let keys = Keys::new(jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &keys.decoding, &Validation::default())?;
    Ok(token_data.claims)
}

pub fn generate_token_from_user(user: &User, config: &Config) -> anyhow::Result<String> {
    encode_token(&Claims::new(user, config), &config.jwt_secret)
}

pub fn generate_refresh_token_from_user(user: &User, config: &Config) -> anyhow::Result<String> {
    encode_token(&Claims::new_refresh(user, config), &config.jwt_secret)
}

/// Resolves the session behind an access token. Expired accounts resolve to
/// `None` even while their session is still alive.
pub async fn get_user_from_token<C: ConnectionLike>(
    tx: &mut Transaction<'_, Postgres>,
    redis_conn: &mut C,
    jwt_token: Option<String>,
) -> anyhow::Result<Option<User>> {
    let Some(jwt_token) = jwt_token else {
        return Ok(None);
    };
    let Some(session) = get_session(redis_conn, jwt_token)? else {
        return Ok(None);
    };
    let user = get_user_by_id(tx, session.user_id).await?;
    Ok(user.filter(|x| !x.is_expired(Local::now().fixed_offset())))
}

pub async fn get_user_from_refresh_token(
    tx: &mut Transaction<'_, Postgres>,
    refresh_token: Option<String>,
    config: &Config,
) -> anyhow::Result<Option<User>> {
    let Some(refresh_token) = refresh_token else {
        return Ok(None);
    };
    let claims = match decode_token(refresh_token.as_str(), &config.jwt_secret) {
        Ok(val) => val,
        Err(err) => {
            tracing::debug!("rejected refresh token: {}", err);
            return Ok(None);
        }
    };
    if !claims.is_refresh() {
        return Ok(None);
    }
    let user = get_user_by_id(tx, claims.id).await?;
    Ok(user.filter(|x| !x.is_expired(Local::now().fixed_offset())))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserApiKey {
    pub token: Option<String>,
}

/// ApiKey authorization
#[derive(SecurityScheme)]
#[oai(ty = "bearer", checker = "bearer_checker")]
pub struct BearerAuthorization(pub UserApiKey);

pub async fn bearer_checker(_req: &Request, api_key: Bearer) -> Option<UserApiKey> {
    Some(UserApiKey {
        token: Some(api_key.token),
    })
}
