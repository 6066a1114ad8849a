use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::validation::{
    FieldKind, FieldRule, RequestSchema, ValidationError, ValidationOptions,
};

use super::common::{
    ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse, PaginateResponse,
    UnauthorizedResponse, ValidationErrorResponse,
};

/// Accepted shape of `PUT /branch/{id}/assign-user`.
pub const BRANCH_ASSIGN_USER_SCHEMA: RequestSchema = RequestSchema {
    params: &[FieldRule::required("id", FieldKind::PositiveInteger)],
    body: &[
        FieldRule::required("user_id", FieldKind::PositiveInteger),
        FieldRule::required("assign", FieldKind::Boolean),
    ],
};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct BranchAssignUser {
    pub id: i32,
    pub user_id: i32,
    pub assign: bool,
}

pub fn validate_branch_assign_user(
    params: &Value,
    body: &Value,
    options: ValidationOptions,
) -> Result<BranchAssignUser, ValidationError> {
    BRANCH_ASSIGN_USER_SCHEMA.validate_into(params, body, options)
}

#[derive(Object, Deserialize, Serialize)]
pub struct BranchAssignUserResponse {
    pub branch_id: i32,
    pub user_id: i32,
    pub assigned: bool,
}

#[derive(ApiResponse)]
pub enum BranchAssignUserResponses {
    #[oai(status = 200)]
    Ok(Json<BranchAssignUserResponse>),

    #[oai(status = 400)]
    BadRequest(Json<ValidationErrorResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize, Serialize)]
pub struct DetailBranch {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ApiResponse)]
pub enum PaginateBranchResponses {
    #[oai(status = 200)]
    Ok(Json<PaginateResponse<DetailBranch>>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize)]
pub struct BranchCreateRequest {
    #[oai(validator(min_length = 1, max_length = 255))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(ApiResponse)]
pub enum BranchCreateResponses {
    #[oai(status = 201)]
    Ok(Json<DetailBranch>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize, Serialize)]
pub struct BranchMember {
    pub id: i32,
    pub user_name: String,
    pub email: Option<String>,
    pub assigned_at: String,
}

#[derive(ApiResponse)]
pub enum BranchUsersResponses {
    #[oai(status = 200)]
    Ok(Json<Vec<BranchMember>>),

    #[oai(status = 400)]
    BadRequest(Json<ValidationErrorResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}
