use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::project::{Project, ProjectDto};
use crate::db::models::search::PageRequest;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Project))]
#[diesel(table_name = crate::schema::gantt_charts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GanttChart {
    pub id: i32,
    pub project_id: i32,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::gantt_charts)]
pub struct NewGanttChart {
    pub project_id: i32,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::gantt_charts)]
#[diesel(treat_none_as_null = true)]
pub struct GanttChartChanges {
    pub project_id: i32,
    pub content: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GanttChartRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(range(min = 1, message = "Project is required"))]
    pub project_id: i32,
    pub content: Option<String>,
}

impl GanttChartRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewGanttChart {
        NewGanttChart {
            project_id: self.project_id,
            content: self.content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> GanttChartChanges {
        GanttChartChanges {
            project_id: self.project_id,
            content: self.content,
            updated_at: now,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GanttChartSearch {
    #[serde(flatten)]
    pub page: PageRequest,
    pub project_id: Option<i32>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GanttChartDto {
    pub id: i32,
    pub project_id: i32,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Box<ProjectDto>>,
}

impl From<GanttChart> for GanttChartDto {
    fn from(g: GanttChart) -> Self {
        Self {
            id: g.id,
            project_id: g.project_id,
            content: g.content,
            created_at: g.created_at,
            updated_at: g.updated_at,
            project: None,
        }
    }
}

impl GanttChartDto {
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = Some(Box::new(project.into()));
        self
    }
}
