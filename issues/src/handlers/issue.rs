use std::collections::HashMap;

use actix_web::{
    delete, get, post, put,
    web::{self, Json, Query},
};
use common::{context::Context, entities::issue::PublicIssue};

use super::{into_body, Body};
use crate::{
    error::IssueError,
    service::issue::{CreateIssue, DeleteIssue, Fields, IssueResult, IssueService, UpdateIssue},
};

#[utoipa::path(
    params(
        ("project" = String, Path, description = "Project the issues belong to"),
    ),
    responses(
        (status = 200, body = [PublicIssue]),
        (status = 500, body = crate::error::ErrorResponse)
    )
)]
#[get("/api/issues/{project}")]
pub async fn get_issues(
    context: Context,
    project: web::Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<PublicIssue>>, IssueError> {
    Ok(Json(IssueService::new(context).list(&project, &query).await?))
}

#[utoipa::path(
    params(
        ("project" = String, Path, description = "Project the issue belongs to"),
    ),
    request_body(
        content = CreateIssue
    ),
    responses(
        (status = 200, body = PublicIssue),
        (status = 500, body = crate::error::ErrorResponse)
    )
)]
#[post("/api/issues/{project}")]
pub async fn post_issue(
    context: Context,
    project: web::Path<String>,
    body: Body<Fields>,
) -> Result<Json<PublicIssue>, IssueError> {
    Ok(Json(
        IssueService::new(context)
            .create(project.into_inner(), &into_body(body))
            .await?,
    ))
}

#[utoipa::path(
    params(
        ("project" = String, Path, description = "Project the issue belongs to"),
    ),
    request_body(
        content = UpdateIssue
    ),
    responses(
        (status = 200, body = IssueResult)
    )
)]
#[put("/api/issues/{project}")]
pub async fn put_issue(
    context: Context,
    body: Body<Fields>,
) -> Result<Json<IssueResult>, IssueError> {
    Ok(Json(IssueService::new(context).update(&into_body(body)).await?))
}

#[utoipa::path(
    params(
        ("project" = String, Path, description = "Project the issue belongs to"),
    ),
    request_body(
        content = DeleteIssue
    ),
    responses(
        (status = 200, body = IssueResult)
    )
)]
#[delete("/api/issues/{project}")]
pub async fn delete_issue(
    context: Context,
    body: Body<Fields>,
) -> Result<Json<IssueResult>, IssueError> {
    Ok(Json(IssueService::new(context).delete(&into_body(body)).await?))
}
