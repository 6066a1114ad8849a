use std::sync::Arc;

use poem::web::Data;
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::{
    core::{
        security::{get_user_from_token, BearerAuthorization},
        utils::{datetime_to_string, datetime_to_string_opt},
    },
    schema::{
        common::{InternalServerErrorResponse, UnauthorizedResponse},
        user::{CurrentUserResponse, CurrentUserResponses},
    },
    AppState,
};

#[derive(Tags)]
enum ApiUserTags {
    User,
}

pub struct ApiUser;

#[OpenApi]
impl ApiUser {
    #[oai(path = "/user/me", method = "get", tag = "ApiUserTags::User")]
    async fn current_user_api(
        &self,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> CurrentUserResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return CurrentUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.user",
                        "current_user_api",
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
                return CurrentUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.user",
                        "current_user_api",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let user = match get_user_from_token(&mut tx, &mut redis_conn, auth.0.token).await {
            Ok(val) => val,
            Err(err) => {
                return CurrentUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.user",
                        "current_user_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return CurrentUserResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        CurrentUserResponses::Ok(Json(CurrentUserResponse {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            superadmin: user.superadmin,
            uuid: user.uuid,
            profile_pic: user.profile_pic,
            expiry_at: datetime_to_string_opt(user.expiry_at),
            created_at: datetime_to_string(user.created_at),
            updated_at: datetime_to_string(user.updated_at),
        }))
    }
}
