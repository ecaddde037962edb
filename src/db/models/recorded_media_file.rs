use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::enums::ConvertStatus;
use crate::db::models::meeting::{Meeting, MeetingDto};
use crate::db::models::search::PageRequest;
use crate::validation::rules;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Meeting))]
#[diesel(table_name = crate::schema::recorded_media_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecordedMediaFile {
    pub id: i32,
    pub meeting_id: i32,
    pub name: String,
    pub file_name: String,
    pub save_file_name: String,
    pub status: ConvertStatus,
    pub content: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::recorded_media_files)]
pub struct NewRecordedMediaFile {
    pub meeting_id: i32,
    pub name: String,
    pub file_name: String,
    pub save_file_name: String,
    pub status: ConvertStatus,
    pub content: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::recorded_media_files)]
#[diesel(treat_none_as_null = true)]
pub struct RecordedMediaFileChanges {
    pub meeting_id: i32,
    pub name: String,
    pub file_name: String,
    pub save_file_name: String,
    pub status: ConvertStatus,
    pub content: Option<String>,
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Progress written by the transcription job; `None` leaves a column untouched.
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::recorded_media_files)]
pub struct ConvertProgress {
    pub status: Option<ConvertStatus>,
    pub content: Option<String>,
    pub message: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMediaFileRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(range(min = 1, message = "Meeting is required"))]
    pub meeting_id: i32,
    #[validate(
        custom(function = "rules::not_blank"),
        length(max = 200, message = "Name must be at most 200 characters")
    )]
    pub name: String,
    #[validate(custom(function = "rules::not_blank"))]
    pub file_name: String,
    #[serde(default)]
    pub save_file_name: String,
    #[serde(default)]
    pub status: ConvertStatus,
    pub content: Option<String>,
    pub message: Option<String>,
}

impl RecordedMediaFileRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewRecordedMediaFile {
        NewRecordedMediaFile {
            meeting_id: self.meeting_id,
            name: self.name.trim().to_string(),
            file_name: self.file_name,
            save_file_name: self.save_file_name,
            status: self.status,
            content: self.content,
            message: self.message,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> RecordedMediaFileChanges {
        RecordedMediaFileChanges {
            meeting_id: self.meeting_id,
            name: self.name.trim().to_string(),
            file_name: self.file_name,
            save_file_name: self.save_file_name,
            status: self.status,
            content: self.content,
            message: self.message,
            updated_at: now,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordedMediaFileSearch {
    #[serde(flatten)]
    pub page: PageRequest,
    pub meeting_id: Option<i32>,
    pub status: Option<ConvertStatus>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMediaFileDto {
    pub id: i32,
    pub meeting_id: i32,
    pub name: String,
    pub file_name: String,
    pub save_file_name: String,
    pub status: ConvertStatus,
    pub content: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<Box<MeetingDto>>,
}

impl From<RecordedMediaFile> for RecordedMediaFileDto {
    fn from(r: RecordedMediaFile) -> Self {
        Self {
            id: r.id,
            meeting_id: r.meeting_id,
            name: r.name,
            file_name: r.file_name,
            save_file_name: r.save_file_name,
            status: r.status,
            content: r.content,
            message: r.message,
            created_at: r.created_at,
            updated_at: r.updated_at,
            meeting: None,
        }
    }
}

impl RecordedMediaFileDto {
    pub fn with_meeting(mut self, meeting: Meeting) -> Self {
        self.meeting = Some(Box::new(meeting.into()));
        self
    }
}
