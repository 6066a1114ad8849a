use std::sync::Arc;

use poem::web::Data;
use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi, Tags,
};
use serde_json::{json, Value};

use crate::{
    core::{
        security::{get_user_from_token, BearerAuthorization},
        utils::datetime_to_string,
        validation::ValidationOptions,
    },
    model::branch::Branch,
    repository::{
        branch::{create_branch, get_branch_by_id, paginate_branch},
        branch_user::{assign_user_to_branch, get_branch_members, unassign_user_from_branch},
        user::get_user_by_id,
    },
    schema::{
        branch::{
            validate_branch_assign_user, BranchAssignUserResponse, BranchAssignUserResponses,
            BranchCreateRequest, BranchCreateResponses, BranchMember, BranchUsersResponses,
            DetailBranch, PaginateBranchResponses,
        },
        common::{
            validate_id_param, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
            PaginateResponse, UnauthorizedResponse, ValidationErrorResponse,
        },
    },
    AppState,
};

#[derive(Tags)]
enum ApiBranchTags {
    Branch,
}

fn branch_to_detail(branch: Branch) -> DetailBranch {
    DetailBranch {
        id: branch.id,
        name: branch.name,
        description: branch.description,
        created_at: datetime_to_string(branch.created_at),
        updated_at: datetime_to_string(branch.updated_at),
    }
}

pub struct ApiBranch;

#[OpenApi]
impl ApiBranch {
    #[oai(path = "/branch/", method = "get", tag = "ApiBranchTags::Branch")]
    async fn paginate_branch_api(
        &self,
        Query(page): Query<Option<u32>>,
        Query(page_size): Query<Option<u32>>,
        Query(search): Query<Option<String>>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> PaginateBranchResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return PaginateBranchResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "paginate_branch_api",
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
                return PaginateBranchResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "paginate_branch_api",
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
                return PaginateBranchResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "paginate_branch_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if user.is_none() {
            return PaginateBranchResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        }

        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(10);
        let (data, counts, page_count) =
            match paginate_branch(&mut tx, page, page_size, search).await {
                Ok(val) => val,
                Err(err) => {
                    return PaginateBranchResponses::InternalServerError(Json(
                        InternalServerErrorResponse::new(
                            "route.branch",
                            "paginate_branch_api",
                            "paginate_branch",
                            &err.to_string(),
                        ),
                    ))
                }
            };

        PaginateBranchResponses::Ok(Json(PaginateResponse {
            counts,
            page,
            page_count,
            page_size,
            results: data.into_iter().map(branch_to_detail).collect(),
        }))
    }

    #[oai(path = "/branch/", method = "post", tag = "ApiBranchTags::Branch")]
    async fn create_branch_api(
        &self,
        json: Json<BranchCreateRequest>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> BranchCreateResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return BranchCreateResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "create_branch_api",
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
                return BranchCreateResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "create_branch_api",
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
                return BranchCreateResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "create_branch_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return BranchCreateResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };
        if !user.superadmin {
            return BranchCreateResponses::Forbidden(Json(ForbiddenResponse::default()));
        }

        let branch = match create_branch(
            &mut tx,
            json.name.clone(),
            json.description.clone(),
            None,
        )
        .await
        {
            Ok(val) => val,
            Err(err) => {
                return BranchCreateResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "create_branch_api",
                        "create_branch",
                        &err.to_string(),
                    ),
                ))
            }
        };

        if let Err(err) = tx.commit().await {
            return BranchCreateResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.branch",
                    "create_branch_api",
                    "commit transaction",
                    &err.to_string(),
                ),
            ));
        }
        BranchCreateResponses::Ok(Json(branch_to_detail(branch)))
    }

    /// Attach (`assign = true`) or detach (`assign = false`) a user. Both
    /// directions are idempotent.
    #[oai(
        path = "/branch/:id/assign-user",
        method = "put",
        tag = "ApiBranchTags::Branch"
    )]
    async fn assign_user_branch_api(
        &self,
        Path(id): Path<String>,
        json: Json<Value>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> BranchAssignUserResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return BranchAssignUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "assign_user_branch_api",
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
                return BranchAssignUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "assign_user_branch_api",
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
                return BranchAssignUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "assign_user_branch_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return BranchAssignUserResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };
        if !user.superadmin {
            return BranchAssignUserResponses::Forbidden(Json(ForbiddenResponse::default()));
        }

        // Validate request shape
        let request = match validate_branch_assign_user(
            &json!({ "id": id }),
            &json.0,
            ValidationOptions::default(),
        ) {
            Ok(val) => val,
            Err(err) => {
                return BranchAssignUserResponses::BadRequest(Json(
                    ValidationErrorResponse::from(err),
                ))
            }
        };

        let branch = match get_branch_by_id(&mut tx, request.id).await {
            Ok(val) => val,
            Err(err) => {
                return BranchAssignUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "assign_user_branch_api",
                        "get_branch_by_id",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(branch) = branch else {
            return BranchAssignUserResponses::NotFound(Json(NotFoundResponse {
                message: "Branch not found".to_string(),
            }));
        };
        let target_user = match get_user_by_id(&mut tx, request.user_id).await {
            Ok(val) => val,
            Err(err) => {
                return BranchAssignUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "assign_user_branch_api",
                        "get_user_by_id",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(target_user) = target_user else {
            return BranchAssignUserResponses::NotFound(Json(NotFoundResponse {
                message: "User not found".to_string(),
            }));
        };

        let changed = if request.assign {
            assign_user_to_branch(&mut tx, &branch, &target_user, None).await
        } else {
            unassign_user_from_branch(&mut tx, &branch, &target_user).await
        };
        let changed = match changed {
            Ok(val) => val,
            Err(err) => {
                return BranchAssignUserResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "assign_user_branch_api",
                        "update branch assignment",
                        &err.to_string(),
                    ),
                ))
            }
        };

        if let Err(err) = tx.commit().await {
            return BranchAssignUserResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.branch",
                    "assign_user_branch_api",
                    "commit transaction",
                    &err.to_string(),
                ),
            ));
        }
        tracing::info!(
            "user {} set assignment of user {} on branch {} to {} (changed: {})",
            user.id,
            target_user.id,
            branch.id,
            request.assign,
            changed
        );
        BranchAssignUserResponses::Ok(Json(BranchAssignUserResponse {
            branch_id: branch.id,
            user_id: target_user.id,
            assigned: request.assign,
        }))
    }

    #[oai(path = "/branch/:id/users", method = "get", tag = "ApiBranchTags::Branch")]
    async fn branch_users_api(
        &self,
        Path(id): Path<String>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> BranchUsersResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return BranchUsersResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "branch_users_api",
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
                return BranchUsersResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "branch_users_api",
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
                return BranchUsersResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "branch_users_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if user.is_none() {
            return BranchUsersResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        }

        let id = match validate_id_param(&id) {
            Ok(val) => val,
            Err(err) => {
                return BranchUsersResponses::BadRequest(Json(ValidationErrorResponse::from(err)))
            }
        };
        let branch = match get_branch_by_id(&mut tx, id).await {
            Ok(val) => val,
            Err(err) => {
                return BranchUsersResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "branch_users_api",
                        "get_branch_by_id",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(branch) = branch else {
            return BranchUsersResponses::NotFound(Json(NotFoundResponse {
                message: "Branch not found".to_string(),
            }));
        };

        let members = match get_branch_members(&mut tx, &branch).await {
            Ok(val) => val,
            Err(err) => {
                return BranchUsersResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.branch",
                        "branch_users_api",
                        "get_branch_members",
                        &err.to_string(),
                    ),
                ))
            }
        };
        BranchUsersResponses::Ok(Json(
            members
                .into_iter()
                .map(|x| BranchMember {
                    id: x.id,
                    user_name: x.user_name,
                    email: x.email,
                    assigned_at: datetime_to_string(x.assigned_at),
                })
                .collect(),
        ))
    }
}
