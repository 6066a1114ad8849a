use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use super::common::{
    ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse, PaginateResponse,
    UnauthorizedResponse, ValidationErrorResponse,
};

#[derive(Object, Deserialize, Serialize)]
pub struct DetailWorkflow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(ApiResponse)]
pub enum PaginateWorkflowResponses {
    #[oai(status = 200)]
    Ok(Json<PaginateResponse<DetailWorkflow>>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
pub enum WorkflowDetailResponses {
    #[oai(status = 200)]
    Ok(Json<DetailWorkflow>),

    #[oai(status = 400)]
    BadRequest(Json<ValidationErrorResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize)]
pub struct WorkflowCreateRequest {
    #[oai(validator(min_length = 1, max_length = 255))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(ApiResponse)]
pub enum WorkflowCreateResponses {
    #[oai(status = 201)]
    Ok(Json<DetailWorkflow>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
pub enum WorkflowDeleteResponses {
    #[oai(status = 204)]
    NoContent,

    #[oai(status = 400)]
    BadRequest(Json<ValidationErrorResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
pub enum WorkflowRestoreResponses {
    #[oai(status = 200)]
    Ok(Json<DetailWorkflow>),

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
