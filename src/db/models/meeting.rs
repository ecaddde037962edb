use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::chat_history::ChatHistoryDto;
use crate::db::models::project::{Project, ProjectDto};
use crate::db::models::recorded_media_file::RecordedMediaFileDto;
use crate::db::models::search::PageRequest;
use crate::validation::rules;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Project))]
#[diesel(table_name = crate::schema::meetings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Meeting {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub participants: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::meetings)]
pub struct NewMeeting {
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub participants: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::meetings)]
#[diesel(treat_none_as_null = true)]
pub struct MeetingChanges {
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub participants: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRequest {
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
    pub participants: Option<String>,
}

impl MeetingRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewMeeting {
        NewMeeting {
            project_id: self.project_id,
            name: self.name.trim().to_string(),
            description: self.description,
            participants: self.participants,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> MeetingChanges {
        MeetingChanges {
            project_id: self.project_id,
            name: self.name.trim().to_string(),
            description: self.description,
            participants: self.participants,
            updated_at: now,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MeetingSearch {
    #[serde(flatten)]
    pub page: PageRequest,
    pub project_id: Option<i32>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDto {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub participants: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Box<ProjectDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_histories: Option<Vec<ChatHistoryDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_media_files: Option<Vec<RecordedMediaFileDto>>,
}

impl From<Meeting> for MeetingDto {
    fn from(m: Meeting) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            name: m.name,
            description: m.description,
            participants: m.participants,
            created_at: m.created_at,
            updated_at: m.updated_at,
            project: None,
            chat_histories: None,
            recorded_media_files: None,
        }
    }
}

impl MeetingDto {
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = Some(Box::new(project.into()));
        self
    }
}
