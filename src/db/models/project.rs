use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::enums::{Priority, WorkStatus};
use crate::db::models::gantt_chart::GanttChartDto;
use crate::db::models::meeting::MeetingDto;
use crate::db::models::search::PageRequest;
use crate::db::models::task::TaskDto;
use crate::validation::rules;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
    pub completion_percentage: i32,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::projects)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
    pub completion_percentage: i32,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of the editable columns; `created_at` is never touched.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::projects)]
#[diesel(treat_none_as_null = true)]
pub struct ProjectChanges {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
    pub completion_percentage: i32,
    pub owner: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_project_dates"))]
pub struct ProjectRequest {
    #[serde(default)]
    pub id: Option<i32>,
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
    pub status: WorkStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Completion must be between 0 and 100"))]
    pub completion_percentage: i32,
    pub owner: Option<String>,
}

fn validate_project_dates(req: &ProjectRequest) -> Result<(), validator::ValidationError> {
    rules::date_order(req.start_date, req.end_date)
}

impl ProjectRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewProject {
        NewProject {
            name: self.name.trim().to_string(),
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            priority: self.priority,
            completion_percentage: self.completion_percentage,
            owner: self.owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> ProjectChanges {
        ProjectChanges {
            name: self.name.trim().to_string(),
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            priority: self.priority,
            completion_percentage: self.completion_percentage,
            owner: self.owner,
            updated_at: now,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdateStatusRequest {
    pub status: WorkStatus,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompletionRequest {
    #[validate(range(min = 0, max = 100, message = "Completion must be between 0 and 100"))]
    pub completion_percentage: i32,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSearch {
    #[serde(flatten)]
    pub page: PageRequest,
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
pub struct ProjectDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: WorkStatus,
    pub priority: Priority,
    pub completion_percentage: i32,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gantt_chart: Option<GanttChartDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meetings: Option<Vec<MeetingDto>>,
}

impl From<Project> for ProjectDto {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            start_date: p.start_date,
            end_date: p.end_date,
            status: p.status,
            priority: p.priority,
            completion_percentage: p.completion_percentage,
            owner: p.owner,
            created_at: p.created_at,
            updated_at: p.updated_at,
            tasks: None,
            gantt_chart: None,
            meetings: None,
        }
    }
}
