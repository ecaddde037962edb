use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::enums::{Priority, WorkStatus};
use crate::db::models::project::{Project, ProjectDto};
use crate::db::models::search::PageRequest;
use crate::validation::rules;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Project))]
#[diesel(table_name = crate::schema::tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Task {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category: String,
    pub status: WorkStatus,
    pub priority: Priority,
    pub completion_percentage: i32,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::tasks)]
pub struct NewTask {
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category: String,
    pub status: WorkStatus,
    pub priority: Priority,
    pub completion_percentage: i32,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChanges {
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category: String,
    pub status: WorkStatus,
    pub priority: Priority,
    pub completion_percentage: i32,
    pub owner: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_task_dates"))]
pub struct TaskRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(range(min = 1, message = "Project is required"))]
    pub project_id: i32,
    #[validate(
        custom(function = "rules::not_blank"),
        length(max = 200, message = "Name must be at most 200 characters")
    )]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: String,
    #[serde(default)]
    pub status: WorkStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Completion must be between 0 and 100"))]
    pub completion_percentage: i32,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub owner: String,
}

fn validate_task_dates(req: &TaskRequest) -> Result<(), validator::ValidationError> {
    rules::date_order(req.start_date, req.end_date)
}

impl TaskRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewTask {
        NewTask {
            project_id: self.project_id,
            name: self.name.trim().to_string(),
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            category: self.category,
            status: self.status,
            priority: self.priority,
            completion_percentage: self.completion_percentage,
            owner: self.owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> TaskChanges {
        TaskChanges {
            project_id: self.project_id,
            name: self.name.trim().to_string(),
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            category: self.category,
            status: self.status,
            priority: self.priority,
            completion_percentage: self.completion_percentage,
            owner: self.owner,
            updated_at: now,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskSearch {
    #[serde(flatten)]
    pub page: PageRequest,
    pub project_id: Option<i32>,
    pub category: Option<String>,
    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub completion_min: Option<i32>,
    pub completion_max: Option<i32>,
    pub owner: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category: String,
    pub status: WorkStatus,
    pub priority: Priority,
    pub completion_percentage: i32,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Box<ProjectDto>>,
}

impl From<Task> for TaskDto {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            project_id: t.project_id,
            name: t.name,
            description: t.description,
            start_date: t.start_date,
            end_date: t.end_date,
            category: t.category,
            status: t.status,
            priority: t.priority,
            completion_percentage: t.completion_percentage,
            owner: t.owner,
            created_at: t.created_at,
            updated_at: t.updated_at,
            project: None,
        }
    }
}

impl TaskDto {
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = Some(Box::new(project.into()));
        self
    }
}
