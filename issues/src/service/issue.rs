use std::{collections::HashMap, fmt::Display};

use anyhow::anyhow;
use common::{
    context::Context,
    entities::issue::{issue_filter, parse_flag, Issue, IssueChange, PublicIssue},
    error,
};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::IssueError;

/// Raw request body. Fields are read one by one, so a value of the wrong type only
/// affects the field it was sent for.
pub type Fields = serde_json::Map<String, Value>;

/// A field counts as sent unless it is absent, `null`, `false`, `0` or an empty string.
fn sent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(x)) => !x.is_empty(),
        Some(Value::Number(x)) => x.as_f64().map_or(true, |x| x != 0.0),
        Some(_) => true,
    }
}

/// `_id` as the client sent it. Numbers and other scalars are echoed back as strings.
fn id(fields: &Fields) -> Option<String> {
    let value = fields.get("_id");
    if !sent(value) {
        return None;
    }
    match value? {
        Value::String(x) => Some(x.clone()),
        other => Some(other.to_string()),
    }
}

fn text(fields: &Fields, name: &str) -> anyhow::Result<Option<String>> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(x)) => Ok(Some(x.clone())),
        Some(Value::Number(x)) => Ok(Some(x.to_string())),
        Some(Value::Bool(x)) => Ok(Some(x.to_string())),
        Some(other) => Err(anyhow!("{name} must be text, got {other}")),
    }
}

fn flag(fields: &Fields, name: &str) -> anyhow::Result<Option<bool>> {
    let Some(value) = fields.get(name) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::String(x) if x.is_empty() => return Ok(None),
        Value::Bool(x) => Some(*x),
        Value::String(x) => parse_flag(x),
        Value::Number(x) => parse_flag(&x.to_string()),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| anyhow!("{name} must be one of true/false/1/0/yes/no, got {value}"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateIssue {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
}

impl CreateIssue {
    fn has_required_fields(fields: &Fields) -> bool {
        ["issue_title", "issue_text", "created_by"]
            .into_iter()
            .all(|name| sent(fields.get(name)))
    }
}

impl TryFrom<&Fields> for CreateIssue {
    type Error = anyhow::Error;

    fn try_from(fields: &Fields) -> anyhow::Result<Self> {
        Ok(Self {
            issue_title: text(fields, "issue_title")?,
            issue_text: text(fields, "issue_text")?,
            created_by: text(fields, "created_by")?,
            assigned_to: text(fields, "assigned_to")?,
            status_text: text(fields, "status_text")?,
        })
    }
}

/// `open` also accepts the strings `true`/`false`, `1`/`0` and `yes`/`no`.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct UpdateIssue {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub project: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
}

impl TryFrom<&Fields> for UpdateIssue {
    type Error = anyhow::Error;

    fn try_from(fields: &Fields) -> anyhow::Result<Self> {
        Ok(Self {
            id: id(fields),
            project: text(fields, "project")?,
            issue_title: text(fields, "issue_title")?,
            issue_text: text(fields, "issue_text")?,
            created_by: text(fields, "created_by")?,
            assigned_to: text(fields, "assigned_to")?,
            status_text: text(fields, "status_text")?,
            open: flag(fields, "open")?,
        })
    }
}

impl UpdateIssue {
    // Required fields can not be emptied. The optional ones can be cleared with "".
    fn change(self) -> IssueChange {
        IssueChange {
            project: non_empty(self.project),
            issue_title: non_empty(self.issue_title),
            issue_text: non_empty(self.issue_text),
            created_by: non_empty(self.created_by),
            assigned_to: self.assigned_to,
            status_text: self.status_text,
            open: self.open,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeleteIssue {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

impl From<&Fields> for DeleteIssue {
    fn from(fields: &Fields) -> Self {
        Self { id: id(fields) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct IssueResult {
    pub result: String,
    #[serde(rename = "_id")]
    pub id: String,
}

impl IssueResult {
    fn new(result: &str, id: String) -> Self {
        Self {
            result: result.to_string(),
            id,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|x| !x.is_empty())
}

fn store_failure(action: &str, err: impl Display, reply: IssueError) -> IssueError {
    log::error!("Failed to {}: {}", action, err);
    reply
}

pub struct IssueService {
    context: Context,
}

impl IssueService {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub async fn list(
        &self,
        project: &str,
        query: &HashMap<String, String>,
    ) -> Result<Vec<PublicIssue>, IssueError> {
        let issues = self
            .context
            .try_get_repository::<Issue>()
            .map_err(|err| store_failure("fetch issues", err, IssueError::Fetch))?;

        let filter = issue_filter(project, query)
            .map_err(|err| store_failure("fetch issues", err, IssueError::Fetch))?;

        let found = issues
            .find_many(filter)
            .await
            .map_err(|err| store_failure("fetch issues", err, IssueError::Fetch))?;

        Ok(found.into_iter().map(Issue::stringify).collect())
    }

    pub async fn create(
        &self,
        project: String,
        fields: &Fields,
    ) -> Result<PublicIssue, IssueError> {
        if !CreateIssue::has_required_fields(fields) {
            return Err(IssueError::RequiredFieldsMissing);
        }

        let data = CreateIssue::try_from(fields)
            .map_err(|err| store_failure("save issue", err, IssueError::Save))?;

        let (Some(issue_title), Some(issue_text), Some(created_by)) =
            (data.issue_title, data.issue_text, data.created_by)
        else {
            return Err(IssueError::RequiredFieldsMissing);
        };

        // Stored dates keep millisecond precision, so the reply is built from the same value.
        let now = bson::DateTime::now().to_chrono();

        let issue = Issue {
            id: ObjectId::new(),
            project,
            issue_title,
            issue_text,
            created_by,
            assigned_to: data.assigned_to.unwrap_or_default(),
            status_text: data.status_text.unwrap_or_default(),
            created_on: now,
            updated_on: now,
            open: true,
        };

        let issues = self
            .context
            .try_get_repository::<Issue>()
            .map_err(|err| store_failure("save issue", err, IssueError::Save))?;

        let inserted = issues
            .insert(&issue)
            .await
            .map_err(|err| store_failure("save issue", err, IssueError::Save))?;

        if !inserted {
            return Err(store_failure(
                "save issue",
                format!("id {} already taken", issue.id),
                IssueError::Save,
            ));
        }

        log::info!("Created issue {} in project {}", issue.id, issue.project);
        Ok(issue.stringify())
    }

    pub async fn update(&self, fields: &Fields) -> Result<IssueResult, IssueError> {
        let Some(id) = id(fields) else {
            return Err(IssueError::MissingId);
        };

        let data = match UpdateIssue::try_from(fields) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("Rejected update of issue {}: {}", id, err);
                return Err(IssueError::CouldNotUpdate { id });
            }
        };

        let change = data.change();
        if change.is_empty() {
            return Err(IssueError::NoUpdateFields { id });
        }

        let updated = self.update_by_id(&id, change).await;
        match updated {
            Ok(Some(_)) => {
                log::info!("Updated issue {}", id);
                Ok(IssueResult::new("successfully updated", id))
            }
            Ok(None) => Err(IssueError::CouldNotUpdate { id }),
            Err(err) => Err(store_failure(
                "update issue",
                err,
                IssueError::CouldNotUpdate { id },
            )),
        }
    }

    pub async fn delete(&self, fields: &Fields) -> Result<IssueResult, IssueError> {
        let Some(id) = DeleteIssue::from(fields).id else {
            return Err(IssueError::MissingId);
        };

        let deleted = self.delete_by_id(&id).await;
        match deleted {
            Ok(Some(_)) => {
                log::info!("Deleted issue {}", id);
                Ok(IssueResult::new("successfully deleted", id))
            }
            Ok(None) => Err(IssueError::CouldNotDelete { id }),
            Err(err) => Err(store_failure(
                "delete issue",
                err,
                IssueError::CouldNotDelete { id },
            )),
        }
    }

    async fn update_by_id(&self, id: &str, change: IssueChange) -> error::Result<Option<Issue>> {
        // A malformed id can not match anything.
        let Ok(id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let issues = self.context.try_get_repository::<Issue>()?;
        let now = bson::DateTime::now().to_chrono();
        issues.update_by_id(&id, change.into_update(now)).await
    }

    async fn delete_by_id(&self, id: &str) -> error::Result<Option<Issue>> {
        let Ok(id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let issues = self.context.try_get_repository::<Issue>()?;
        issues.delete("_id", &id).await
    }
}
