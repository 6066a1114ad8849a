use std::sync::Arc;

use chrono::{Duration, Local};
use poem::web::Data;
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::{
    core::{
        security::{
            generate_refresh_token_from_user, generate_token_from_user,
            get_user_from_refresh_token, get_user_from_token, verify_hash_password,
            BearerAuthorization,
        },
        session::{add_session, remove_session},
        utils::datetime_to_string,
    },
    model::user::User,
    repository::user::get_user_by_username,
    schema::{
        auth::{
            LoginRequest, LoginResponse, LoginResponses, LogoutResponses, RefreshTokenRequest,
            RefreshTokenResponses,
        },
        common::{BadRequestResponse, InternalServerErrorResponse, UnauthorizedResponse},
    },
    settings::Config,
    AppState,
};

#[derive(Tags)]
enum ApiAuthTags {
    Auth,
}

/// Issues an access/refresh token pair and stores the session.
fn start_session(
    state: &AppState,
    user: &User,
    config: &Config,
) -> Result<LoginResponse, (&'static str, String)> {
    let token = generate_token_from_user(user, config)
        .map_err(|err| ("generate token", err.to_string()))?;
    let refresh_token = generate_refresh_token_from_user(user, config)
        .map_err(|err| ("generate refresh token", err.to_string()))?;
    let mut redis_conn = state
        .redis_conn
        .get()
        .map_err(|err| ("get redis pool connection", err.to_string()))?;
    add_session(
        &mut redis_conn,
        user,
        config,
        token.clone(),
        refresh_token.clone(),
    )
    .map_err(|err| ("add_session to redis", err.to_string()))?;

    let now = Local::now().fixed_offset();
    let exp = now + Duration::minutes(config.jwt_exp as i64);
    let exp_refresh_token = now + Duration::minutes(config.jwt_refresh_exp as i64);
    Ok(LoginResponse {
        exp: datetime_to_string(exp),
        exp_in: config.jwt_exp as i64 * 60,
        exp_refresh_token: datetime_to_string(exp_refresh_token),
        refresh_token,
        token,
        token_type: "Bearer".to_string(),
    })
}

pub struct ApiAuth;

#[OpenApi]
impl ApiAuth {
    #[oai(path = "/auth/login", method = "post", tag = "ApiAuthTags::Auth")]
    async fn auth_login(
        &self,
        json: Json<LoginRequest>,
        state: Data<&Arc<AppState>>,
    ) -> LoginResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_login",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // get username on db
        let user = match get_user_by_username(&mut tx, &json.user_name).await {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_login",
                        "check user on database",
                        &err.to_string(),
                    ),
                ));
            }
        };
        let Some(user) = user else {
            return LoginResponses::BadRequest(Json(BadRequestResponse {
                message: "Invalid credentials".to_string(),
            }));
        };

        // validate user password
        let is_valid = match verify_hash_password(&json.password, &user.password) {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_login",
                    "validate user password",
                    &err.to_string(),
                )))
            }
        };
        if !is_valid {
            return LoginResponses::BadRequest(Json(BadRequestResponse {
                message: "Invalid credentials".to_string(),
            }));
        }
        if user.is_expired(Local::now().fixed_offset()) {
            tracing::info!("login rejected for expired user {}", user.id);
            return LoginResponses::BadRequest(Json(BadRequestResponse {
                message: "Account expired".to_string(),
            }));
        }

        match start_session(&state, &user, &state.config) {
            Ok(val) => LoginResponses::Ok(Json(val)),
            Err((step, err)) => LoginResponses::InternalServerError(Json(
                InternalServerErrorResponse::new("route.auth", "auth_login", step, &err),
            )),
        }
    }

    #[oai(
        path = "/auth/refresh-token",
        method = "post",
        tag = "ApiAuthTags::Auth"
    )]
    async fn auth_refresh_token(
        &self,
        json: Json<RefreshTokenRequest>,
        state: Data<&Arc<AppState>>,
    ) -> RefreshTokenResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return RefreshTokenResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_refresh_token",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        let refresh_token_user = match get_user_from_refresh_token(
            &mut tx,
            Some(json.refresh_token.clone()),
            &state.config,
        )
        .await
        {
            Ok(val) => val,
            Err(err) => {
                return RefreshTokenResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_refresh_token",
                        "get user from refresh token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(refresh_token_user) = refresh_token_user else {
            return RefreshTokenResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        match start_session(&state, &refresh_token_user, &state.config) {
            Ok(val) => RefreshTokenResponses::Ok(Json(val)),
            Err((step, err)) => RefreshTokenResponses::InternalServerError(Json(
                InternalServerErrorResponse::new("route.auth", "auth_refresh_token", step, &err),
            )),
        }
    }

    #[oai(path = "/auth/logout", method = "post", tag = "ApiAuthTags::Auth")]
    async fn auth_logout(
        &self,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> LogoutResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return LogoutResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_logout",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // get redis conn from pool
        let mut redis_conn = match state.redis_conn.get() {
            Ok(val) => val,
            Err(err) => {
                return LogoutResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_logout",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let Some(jwt_token) = auth.0.token else {
            return LogoutResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };
        let user =
            match get_user_from_token(&mut tx, &mut redis_conn, Some(jwt_token.clone())).await {
                Ok(val) => val,
                Err(err) => {
                    return LogoutResponses::InternalServerError(Json(
                        InternalServerErrorResponse::new(
                            "route.auth",
                            "auth_logout",
                            "get user from token",
                            &err.to_string(),
                        ),
                    ))
                }
            };
        if user.is_none() {
            return LogoutResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        }
        if let Err(err) = remove_session(&mut redis_conn, jwt_token) {
            return LogoutResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                "route.auth",
                "auth_logout",
                "remove session",
                &err.to_string(),
            )));
        }
        LogoutResponses::NoContent
    }
}
