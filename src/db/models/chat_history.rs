use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::meeting::{Meeting, MeetingDto};
use crate::db::models::search::PageRequest;
use crate::validation::rules;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Meeting))]
#[diesel(table_name = crate::schema::chat_histories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatHistory {
    pub id: i32,
    pub meeting_id: i32,
    pub name: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::chat_histories)]
pub struct NewChatHistory {
    pub meeting_id: i32,
    pub name: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::chat_histories)]
#[diesel(treat_none_as_null = true)]
pub struct ChatHistoryChanges {
    pub meeting_id: i32,
    pub name: String,
    pub content: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(range(min = 1, message = "Meeting is required"))]
    pub meeting_id: i32,
    #[validate(
        custom(function = "rules::not_blank"),
        length(max = 200, message = "Name must be at most 200 characters")
    )]
    pub name: String,
    pub content: Option<String>,
}

impl ChatHistoryRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewChatHistory {
        NewChatHistory {
            meeting_id: self.meeting_id,
            name: self.name.trim().to_string(),
            content: self.content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_changes(self, now: DateTime<Utc>) -> ChatHistoryChanges {
        ChatHistoryChanges {
            meeting_id: self.meeting_id,
            name: self.name.trim().to_string(),
            content: self.content,
            updated_at: now,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatHistorySearch {
    #[serde(flatten)]
    pub page: PageRequest,
    pub meeting_id: Option<i32>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryDto {
    pub id: i32,
    pub meeting_id: i32,
    pub name: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<Box<MeetingDto>>,
}

impl From<ChatHistory> for ChatHistoryDto {
    fn from(c: ChatHistory) -> Self {
        Self {
            id: c.id,
            meeting_id: c.meeting_id,
            name: c.name,
            content: c.content,
            created_at: c.created_at,
            updated_at: c.updated_at,
            meeting: None,
        }
    }
}

impl ChatHistoryDto {
    pub fn with_meeting(mut self, meeting: Meeting) -> Self {
        self.meeting = Some(Box::new(meeting.into()));
        self
    }
}
