use common::entities::issue::PublicIssue;
use utoipa::OpenApi;

use crate::{
    error::ErrorResponse,
    handlers,
    service::issue::{CreateIssue, DeleteIssue, IssueResult, UpdateIssue},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::issue::get_issues,
        handlers::issue::post_issue,
        handlers::issue::put_issue,
        handlers::issue::delete_issue,
    ),
    components(schemas(
        PublicIssue,
        CreateIssue,
        UpdateIssue,
        DeleteIssue,
        IssueResult,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;
