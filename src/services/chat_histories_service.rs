use chrono::Utc;
use diesel::prelude::*;

use crate::{
    db::models::api::{PagedResult, error_codes},
    db::models::chat_history::{ChatHistoryDto, ChatHistoryRequest, ChatHistorySearch},
    db::repositories::{chat_histories::ChatHistoriesRepo, meetings::MeetingsRepo},
    error::AppError,
    validation::request::ensure_route_id,
};

pub struct ChatHistoriesService;

impl ChatHistoriesService {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<ChatHistoryDto>, AppError> {
        Ok(ChatHistoriesRepo::get_all(conn, include_related)?)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        chat_id: i32,
        include_related: bool,
    ) -> Result<ChatHistoryDto, AppError> {
        ChatHistoriesRepo::get_by_id(conn, chat_id, include_related)?
            .ok_or_else(|| AppError::not_found("Chat history"))
    }

    pub fn search(
        conn: &mut PgConnection,
        search: &ChatHistorySearch,
    ) -> Result<PagedResult<ChatHistoryDto>, AppError> {
        Ok(ChatHistoriesRepo::get_paged(conn, search)?)
    }

    pub fn create(
        conn: &mut PgConnection,
        req: ChatHistoryRequest,
    ) -> Result<ChatHistoryDto, AppError> {
        Self::ensure_meeting(conn, req.meeting_id)?;
        Self::ensure_unique_name(conn, &req.name, None)?;
        let chat = ChatHistoriesRepo::add(conn, &req.into_new(Utc::now()))?;
        Ok(chat.into())
    }

    pub fn update(
        conn: &mut PgConnection,
        chat_id: i32,
        req: ChatHistoryRequest,
    ) -> Result<ChatHistoryDto, AppError> {
        ensure_route_id(chat_id, req.id)?;
        Self::ensure_meeting(conn, req.meeting_id)?;
        Self::ensure_unique_name(conn, &req.name, Some(chat_id))?;
        if !ChatHistoriesRepo::update(conn, chat_id, &req.into_changes(Utc::now()))? {
            return Err(AppError::not_found("Chat history"));
        }
        Self::get_by_id(conn, chat_id, false)
    }

    pub fn delete(conn: &mut PgConnection, chat_id: i32) -> Result<(), AppError> {
        let deleted = ChatHistoriesRepo::delete(conn, chat_id)
            .map_err(|e| AppError::from_delete(e, "Chat history"))?;
        if !deleted {
            return Err(AppError::not_found("Chat history"));
        }
        Ok(())
    }

    fn ensure_meeting(conn: &mut PgConnection, meeting_id: i32) -> Result<(), AppError> {
        if !MeetingsRepo::exists(conn, meeting_id)? {
            return Err(AppError::not_found("Meeting"));
        }
        Ok(())
    }

    fn ensure_unique_name(
        conn: &mut PgConnection,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), AppError> {
        if ChatHistoriesRepo::exists_by_name(conn, name.trim(), exclude_id)? {
            return Err(AppError::conflict_with_code(
                format!("Chat history name '{}' already exists", name.trim()),
                Some("name".to_string()),
                error_codes::NAME_EXISTS,
            ));
        }
        Ok(())
    }
}
