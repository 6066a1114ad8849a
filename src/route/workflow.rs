use std::sync::Arc;

use poem::web::Data;
use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi, Tags,
};

use crate::{
    core::{
        security::{get_user_from_token, BearerAuthorization},
        utils::{datetime_to_string, datetime_to_string_opt},
    },
    model::workflow::Workflow,
    repository::workflow::{
        create_workflow, get_workflow_by_id, paginate_workflow, restore_workflow,
        soft_delete_workflow,
    },
    schema::{
        common::{
            validate_id_param, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
            PaginateResponse, UnauthorizedResponse, ValidationErrorResponse,
        },
        workflow::{
            DetailWorkflow, PaginateWorkflowResponses, WorkflowCreateRequest,
            WorkflowCreateResponses, WorkflowDeleteResponses, WorkflowDetailResponses,
            WorkflowRestoreResponses,
        },
    },
    AppState,
};

#[derive(Tags)]
enum ApiWorkflowTags {
    Workflow,
}

fn workflow_to_detail(workflow: Workflow) -> DetailWorkflow {
    DetailWorkflow {
        id: workflow.id,
        name: workflow.name,
        description: workflow.description,
        created_by: workflow.created_by,
        created_at: datetime_to_string(workflow.created_at),
        updated_at: datetime_to_string(workflow.updated_at),
        deleted_at: datetime_to_string_opt(workflow.deleted_at),
    }
}

fn workflow_not_found() -> NotFoundResponse {
    NotFoundResponse {
        message: "Workflow not found".to_string(),
    }
}

pub struct ApiWorkflow;

#[OpenApi]
impl ApiWorkflow {
    /// Soft-deleted workflows are listed only with `include_deleted=true`.
    #[oai(path = "/workflow/", method = "get", tag = "ApiWorkflowTags::Workflow")]
    async fn paginate_workflow_api(
        &self,
        Query(page): Query<Option<u32>>,
        Query(page_size): Query<Option<u32>>,
        Query(search): Query<Option<String>>,
        Query(include_deleted): Query<Option<bool>>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> PaginateWorkflowResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return PaginateWorkflowResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "paginate_workflow_api",
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
                return PaginateWorkflowResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "paginate_workflow_api",
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
                return PaginateWorkflowResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "paginate_workflow_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if user.is_none() {
            return PaginateWorkflowResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        }

        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(10);
        let (data, counts, page_count) = match paginate_workflow(
            &mut tx,
            page,
            page_size,
            search,
            include_deleted.unwrap_or(false),
        )
        .await
        {
            Ok(val) => val,
            Err(err) => {
                return PaginateWorkflowResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "paginate_workflow_api",
                        "paginate_workflow",
                        &err.to_string(),
                    ),
                ))
            }
        };

        PaginateWorkflowResponses::Ok(Json(PaginateResponse {
            counts,
            page,
            page_count,
            page_size,
            results: data.into_iter().map(workflow_to_detail).collect(),
        }))
    }

    #[oai(path = "/workflow/", method = "post", tag = "ApiWorkflowTags::Workflow")]
    async fn create_workflow_api(
        &self,
        json: Json<WorkflowCreateRequest>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> WorkflowCreateResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return WorkflowCreateResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "create_workflow_api",
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
                return WorkflowCreateResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "create_workflow_api",
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
                return WorkflowCreateResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "create_workflow_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return WorkflowCreateResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        let workflow = match create_workflow(
            &mut tx,
            json.name.clone(),
            json.description.clone(),
            &user,
            None,
        )
        .await
        {
            Ok(val) => val,
            Err(err) => {
                return WorkflowCreateResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "create_workflow_api",
                        "create_workflow",
                        &err.to_string(),
                    ),
                ))
            }
        };

        if let Err(err) = tx.commit().await {
            return WorkflowCreateResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.workflow",
                    "create_workflow_api",
                    "commit transaction",
                    &err.to_string(),
                ),
            ));
        }
        WorkflowCreateResponses::Ok(Json(workflow_to_detail(workflow)))
    }

    #[oai(
        path = "/workflow/:id",
        method = "get",
        tag = "ApiWorkflowTags::Workflow"
    )]
    async fn detail_workflow_api(
        &self,
        Path(id): Path<String>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> WorkflowDetailResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return WorkflowDetailResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "detail_workflow_api",
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
                return WorkflowDetailResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "detail_workflow_api",
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
                return WorkflowDetailResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "detail_workflow_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if user.is_none() {
            return WorkflowDetailResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        }

        let id = match validate_id_param(&id) {
            Ok(val) => val,
            Err(err) => {
                return WorkflowDetailResponses::BadRequest(Json(ValidationErrorResponse::from(
                    err,
                )))
            }
        };
        match get_workflow_by_id(&mut tx, id, false).await {
            Ok(Some(val)) => WorkflowDetailResponses::Ok(Json(workflow_to_detail(val))),
            Ok(None) => WorkflowDetailResponses::NotFound(Json(workflow_not_found())),
            Err(err) => WorkflowDetailResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.workflow",
                    "detail_workflow_api",
                    "get_workflow_by_id",
                    &err.to_string(),
                ),
            )),
        }
    }

    /// Marks the workflow deleted; the row stays in the table.
    #[oai(
        path = "/workflow/:id",
        method = "delete",
        tag = "ApiWorkflowTags::Workflow"
    )]
    async fn delete_workflow_api(
        &self,
        Path(id): Path<String>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> WorkflowDeleteResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return WorkflowDeleteResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "delete_workflow_api",
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
                return WorkflowDeleteResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "delete_workflow_api",
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
                return WorkflowDeleteResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "delete_workflow_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if user.is_none() {
            return WorkflowDeleteResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        }

        let id = match validate_id_param(&id) {
            Ok(val) => val,
            Err(err) => {
                return WorkflowDeleteResponses::BadRequest(Json(ValidationErrorResponse::from(
                    err,
                )))
            }
        };
        let workflow = match get_workflow_by_id(&mut tx, id, false).await {
            Ok(val) => val,
            Err(err) => {
                return WorkflowDeleteResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "delete_workflow_api",
                        "get_workflow_by_id",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(mut workflow) = workflow else {
            return WorkflowDeleteResponses::NotFound(Json(workflow_not_found()));
        };

        if let Err(err) = soft_delete_workflow(&mut tx, &mut workflow, None).await {
            return WorkflowDeleteResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.workflow",
                    "delete_workflow_api",
                    "soft_delete_workflow",
                    &err.to_string(),
                ),
            ));
        }
        if let Err(err) = tx.commit().await {
            return WorkflowDeleteResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.workflow",
                    "delete_workflow_api",
                    "commit transaction",
                    &err.to_string(),
                ),
            ));
        }
        WorkflowDeleteResponses::NoContent
    }

    #[oai(
        path = "/workflow/:id/restore",
        method = "put",
        tag = "ApiWorkflowTags::Workflow"
    )]
    async fn restore_workflow_api(
        &self,
        Path(id): Path<String>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> WorkflowRestoreResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return WorkflowRestoreResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "restore_workflow_api",
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
                return WorkflowRestoreResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "restore_workflow_api",
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
                return WorkflowRestoreResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "restore_workflow_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return WorkflowRestoreResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };
        if !user.superadmin {
            return WorkflowRestoreResponses::Forbidden(Json(ForbiddenResponse::default()));
        }

        let id = match validate_id_param(&id) {
            Ok(val) => val,
            Err(err) => {
                return WorkflowRestoreResponses::BadRequest(Json(ValidationErrorResponse::from(
                    err,
                )))
            }
        };
        let workflow = match get_workflow_by_id(&mut tx, id, true).await {
            Ok(val) => val,
            Err(err) => {
                return WorkflowRestoreResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "restore_workflow_api",
                        "get_workflow_by_id",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(mut workflow) = workflow else {
            return WorkflowRestoreResponses::NotFound(Json(workflow_not_found()));
        };

        // restoring a live workflow is a no-op
        if workflow.is_deleted() {
            if let Err(err) = restore_workflow(&mut tx, &mut workflow, None).await {
                return WorkflowRestoreResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "restore_workflow_api",
                        "restore_workflow",
                        &err.to_string(),
                    ),
                ));
            }
            if let Err(err) = tx.commit().await {
                return WorkflowRestoreResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.workflow",
                        "restore_workflow_api",
                        "commit transaction",
                        &err.to_string(),
                    ),
                ));
            }
        }
        WorkflowRestoreResponses::Ok(Json(workflow_to_detail(workflow)))
    }
}
