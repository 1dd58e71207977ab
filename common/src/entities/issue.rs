use std::collections::HashMap;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use mongodb::bson::{
    self, doc, oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime, Bson, Document,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repository::Entity;

fn default_open() -> bool {
    true
}

/// Issue as it is stored in the `issues` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub status_text: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_on: DateTime<Utc>,
    #[serde(default = "default_open")]
    pub open: bool,
}

impl Issue {
    pub fn stringify(self) -> PublicIssue {
        PublicIssue {
            id: self.id.to_hex(),
            project: self.project,
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            status_text: self.status_text,
            created_on: self.created_on,
            updated_on: self.updated_on,
            open: self.open,
        }
    }
}

impl Entity for Issue {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// Issue as it is returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PublicIssue {
    #[serde(rename = "_id")]
    pub id: String,
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub open: bool,
}

impl From<Issue> for PublicIssue {
    fn from(issue: Issue) -> Self {
        issue.stringify()
    }
}

/// Boolean spellings accepted in query strings and forms.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Builds the equality filter for listing the issues of `project`.
///
/// Query values are cast to the type of the field they filter on. Keys that are not
/// issue fields are dropped, and `project` always comes from the path.
pub fn issue_filter(project: &str, query: &HashMap<String, String>) -> anyhow::Result<Document> {
    let mut filter = Document::new();

    for (field, value) in query {
        let value = match field.as_str() {
            "_id" => Bson::ObjectId(
                ObjectId::parse_str(value).with_context(|| format!("Invalid _id {value:?}"))?,
            ),
            "issue_title" | "issue_text" | "created_by" | "assigned_to" | "status_text" => {
                Bson::String(value.clone())
            }
            "open" => Bson::Boolean(
                parse_flag(value).ok_or_else(|| anyhow!("Invalid value for open: {value:?}"))?,
            ),
            "created_on" | "updated_on" => {
                let timestamp = DateTime::parse_from_rfc3339(value)
                    .with_context(|| format!("Invalid timestamp for {field}: {value:?}"))?;
                Bson::DateTime(bson::DateTime::from_chrono(timestamp.with_timezone(&Utc)))
            }
            _ => continue,
        };
        filter.insert(field.as_str(), value);
    }

    filter.insert("project", project);
    Ok(filter)
}

/// Fields a client may change on an existing issue. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueChange {
    pub project: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
}

impl IssueChange {
    pub fn is_empty(&self) -> bool {
        self == &IssueChange::default()
    }

    /// `$set` document for this change. `updated_on` is always refreshed.
    pub fn into_update(self, now: DateTime<Utc>) -> Document {
        let mut update = doc! { "updated_on": bson::DateTime::from_chrono(now) };

        let text_fields = [
            ("project", self.project),
            ("issue_title", self.issue_title),
            ("issue_text", self.issue_text),
            ("created_by", self.created_by),
            ("assigned_to", self.assigned_to),
            ("status_text", self.status_text),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value {
                update.insert(field, value);
            }
        }

        if let Some(open) = self.open {
            update.insert("open", open);
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn filter_always_scopes_by_path_project() {
        let filter = issue_filter("apitest", &query(&[("project", "other")])).unwrap();
        assert_eq!(filter, doc! {"project": "apitest"});
    }

    #[test]
    fn filter_casts_values_to_field_types() {
        let id = ObjectId::new();
        let filter = issue_filter(
            "apitest",
            &query(&[
                ("open", "false"),
                ("created_by", "Joe"),
                ("_id", &id.to_hex()),
                ("created_on", "2024-06-19T10:00:00.000Z"),
            ]),
        )
        .unwrap();

        assert_eq!(filter.get_bool("open").unwrap(), false);
        assert_eq!(filter.get_str("created_by").unwrap(), "Joe");
        assert_eq!(filter.get_object_id("_id").unwrap(), id);
        assert_eq!(
            filter.get_datetime("created_on").unwrap().to_chrono(),
            Utc.with_ymd_and_hms(2024, 6, 19, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn filter_drops_unknown_fields() {
        let filter = issue_filter("apitest", &query(&[("color", "red")])).unwrap();
        assert!(!filter.contains_key("color"));
    }

    #[test]
    fn filter_rejects_values_of_the_wrong_type() {
        assert!(issue_filter("apitest", &query(&[("open", "maybe")])).is_err());
        assert!(issue_filter("apitest", &query(&[("_id", "invalidIssueId")])).is_err());
        assert!(issue_filter("apitest", &query(&[("updated_on", "yesterday")])).is_err());
    }

    #[test]
    fn change_always_touches_updated_on() {
        let now = Utc::now();
        let change = IssueChange {
            issue_text: Some("Updated text".to_string()),
            open: Some(false),
            ..Default::default()
        };
        assert!(!change.is_empty());

        let update = change.into_update(now);
        assert_eq!(update.len(), 3);
        assert_eq!(update.get_str("issue_text").unwrap(), "Updated text");
        assert_eq!(update.get_bool("open").unwrap(), false);
        assert_eq!(
            update.get_datetime("updated_on").unwrap(),
            &bson::DateTime::from_chrono(now)
        );
        assert!(IssueChange::default().is_empty());
    }

    #[test]
    fn stored_issue_round_trips_through_bson() {
        let now = bson::DateTime::now().to_chrono();
        let issue = Issue {
            id: ObjectId::new(),
            project: "apitest".to_string(),
            issue_title: "Fix error in posting data".to_string(),
            issue_text: "When we post data it has an error.".to_string(),
            created_by: "Joe".to_string(),
            assigned_to: String::new(),
            status_text: String::new(),
            created_on: now,
            updated_on: now,
            open: true,
        };

        let document = bson::to_document(&issue).unwrap();
        assert!(matches!(document.get("_id"), Some(Bson::ObjectId(_))));
        assert!(matches!(document.get("created_on"), Some(Bson::DateTime(_))));
        assert_eq!(bson::from_document::<Issue>(document).unwrap(), issue);

        let public = issue.clone().stringify();
        assert_eq!(public.id, issue.id.to_hex());
    }
}
