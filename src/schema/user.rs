use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use super::common::{InternalServerErrorResponse, UnauthorizedResponse};

#[derive(Object, Deserialize, Serialize)]
pub struct CurrentUserResponse {
    pub id: i32,
    pub user_name: String,
    pub email: Option<String>,
    pub superadmin: bool,
    pub uuid: Option<String>,
    pub profile_pic: Option<String>,
    pub expiry_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ApiResponse)]
pub enum CurrentUserResponses {
    #[oai(status = 200)]
    Ok(Json<CurrentUserResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}
