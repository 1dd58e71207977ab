use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Every way an issue request can fail. Only store failures on list and create
/// change the status code; everything else is reported with 200 and an `error` field.
#[derive(Debug, Display, Error, PartialEq)]
pub enum IssueError {
    #[display(fmt = "Error fetching issues")]
    Fetch,
    #[display(fmt = "Error saving issue")]
    Save,
    #[display(fmt = "required field(s) missing")]
    RequiredFieldsMissing,
    #[display(fmt = "missing _id")]
    MissingId,
    #[display(fmt = "no update field(s) sent")]
    NoUpdateFields { id: String },
    #[display(fmt = "could not update")]
    CouldNotUpdate { id: String },
    #[display(fmt = "could not delete")]
    CouldNotDelete { id: String },
}

impl IssueError {
    pub fn id(&self) -> Option<&str> {
        match self {
            IssueError::NoUpdateFields { id }
            | IssueError::CouldNotUpdate { id }
            | IssueError::CouldNotDelete { id } => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl From<&IssueError> for ErrorResponse {
    fn from(err: &IssueError) -> Self {
        ErrorResponse {
            error: err.to_string(),
            id: err.id().map(str::to_string),
        }
    }
}

impl ResponseError for IssueError {
    fn status_code(&self) -> StatusCode {
        match self {
            IssueError::Fetch | IssueError::Save => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::from(self))
    }
}
