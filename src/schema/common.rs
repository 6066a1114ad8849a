use poem_openapi::{
    types::{ParseFromJSON, ToJSON},
    Object,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::validation::{
    FieldKind, FieldRule, RequestSchema, ValidationError, ValidationOptions,
};

/// Path parameters of every `/{id}` endpoint.
pub const ID_PARAMS_SCHEMA: RequestSchema = RequestSchema {
    params: &[FieldRule::required("id", FieldKind::PositiveInteger)],
    body: &[],
};

#[derive(Deserialize)]
struct IdParams {
    id: i32,
}

/// Parses the raw `{id}` path segment.
pub fn validate_id_param(id: &str) -> Result<i32, ValidationError> {
    let params: IdParams = ID_PARAMS_SCHEMA.validate_into(
        &json!({ "id": id }),
        &json!({}),
        ValidationOptions::default(),
    )?;
    Ok(params.id)
}

#[derive(Object, Deserialize, Serialize)]
pub struct PaginateResponse<T: ParseFromJSON + ToJSON + Send + Sync> {
    pub counts: u32,
    pub page: u32,
    pub page_count: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

#[derive(Object, Deserialize, Serialize)]
pub struct BadRequestResponse {
    pub message: String,
}

#[derive(Object, Deserialize, Serialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub location: String,
    pub kind: String,
    pub message: String,
}

#[derive(Object, Deserialize, Serialize)]
pub struct ValidationErrorResponse {
    pub message: String,
    pub details: Vec<ValidationErrorDetail>,
}

impl From<ValidationError> for ValidationErrorResponse {
    fn from(value: ValidationError) -> Self {
        Self {
            message: value.to_string(),
            details: value
                .violations
                .into_iter()
                .map(|x| ValidationErrorDetail {
                    field: x.field,
                    location: x.location.as_str().to_string(),
                    kind: x.kind.as_str().to_string(),
                    message: x.message,
                })
                .collect(),
        }
    }
}

#[derive(Object, Deserialize, Serialize)]
pub struct UnauthorizedResponse {
    pub message: String,
}

impl Default for UnauthorizedResponse {
    fn default() -> Self {
        Self {
            message: "Unauthorized".to_string(),
        }
    }
}

#[derive(Object, Deserialize, Serialize)]
pub struct ForbiddenResponse {
    pub message: String,
}

impl Default for ForbiddenResponse {
    fn default() -> Self {
        Self {
            message: "Forbidden".to_string(),
        }
    }
}

#[derive(Object, Deserialize, Serialize)]
pub struct NotFoundResponse {
    pub message: String,
}

#[derive(Object, Deserialize, Serialize)]
pub struct InternalServerErrorResponse {
    pub message: String,
}

impl InternalServerErrorResponse {
    /// Logs where the request failed and hides the cause from the client.
    pub fn new(module: &str, function: &str, step: &str, error: &str) -> Self {
        tracing::error!(module, function, step, error, "request failed");
        Self {
            message: "Internal Server Error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::validation::ViolationKind;

    use super::{validate_id_param, ValidationErrorResponse};

    #[test]
    fn test_validate_id_param() {
        assert_eq!(validate_id_param("42").unwrap(), 42);
        assert_eq!(validate_id_param(" 7 ").unwrap(), 7);

        let err = validate_id_param("abc").unwrap_err();
        assert_eq!(err.kind_of("id"), Some(ViolationKind::NumberBase));
        let err = validate_id_param("0").unwrap_err();
        assert_eq!(err.kind_of("id"), Some(ViolationKind::NumberPositive));
        let err = validate_id_param("99999999999").unwrap_err();
        assert_eq!(err.kind_of("id"), Some(ViolationKind::NumberRange));
    }

    #[test]
    fn test_validation_error_response() {
        let res = ValidationErrorResponse::from(validate_id_param("1.5").unwrap_err());
        assert_eq!(res.message, "\"id\" must be an integer");
        assert_eq!(res.details.len(), 1);
        assert_eq!(res.details[0].field, "id");
        assert_eq!(res.details[0].location, "params");
        assert_eq!(res.details[0].kind, "number.integer");
    }
}
