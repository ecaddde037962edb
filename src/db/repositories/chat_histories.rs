use diesel::pg::Pg;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::db::models::api::PagedResult;
use crate::db::models::chat_history::{
    ChatHistory, ChatHistoryChanges, ChatHistoryDto, ChatHistorySearch, NewChatHistory,
};
use crate::db::models::meeting::Meeting;
use crate::db::models::search::{NamedSort, PageRequest};
use crate::schema::{chat_histories, meetings};

pub struct ChatHistoriesRepo;

impl ChatHistoriesRepo {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<ChatHistoryDto>, diesel::result::Error> {
        let rows = chat_histories::table
            .order((chat_histories::updated_at.desc(), chat_histories::id.desc()))
            .select(ChatHistory::as_select())
            .load(conn)?;
        Self::to_dtos(conn, rows, include_related)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        chat_id: i32,
        include_related: bool,
    ) -> Result<Option<ChatHistoryDto>, diesel::result::Error> {
        let chat = chat_histories::table
            .find(chat_id)
            .select(ChatHistory::as_select())
            .first(conn)
            .optional()?;
        match chat {
            Some(chat) => Ok(Self::to_dtos(conn, vec![chat], include_related)?.pop()),
            None => Ok(None),
        }
    }

    pub fn get_paged(
        conn: &mut PgConnection,
        search: &ChatHistorySearch,
    ) -> Result<PagedResult<ChatHistoryDto>, diesel::result::Error> {
        let page = &search.page;
        let total_count = Self::filtered(search).count().get_result::<i64>(conn)?;
        let rows = Self::sorted(Self::filtered(search), page)
            .limit(page.page_size())
            .offset(page.offset())
            .select(ChatHistory::as_select())
            .load(conn)?;
        Ok(PagedResult::new(
            Self::to_dtos(conn, rows, page.include_related)?,
            total_count,
            page.page_index(),
            page.page_size(),
        ))
    }

    pub fn exists_by_name(
        conn: &mut PgConnection,
        chat_name: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::chat_histories::dsl::*;
        match exclude_id {
            Some(excluded) => diesel::select(diesel::dsl::exists(
                chat_histories.filter(name.eq(chat_name)).filter(id.ne(excluded)),
            ))
            .get_result(conn),
            None => diesel::select(diesel::dsl::exists(
                chat_histories.filter(name.eq(chat_name)),
            ))
            .get_result(conn),
        }
    }

    pub fn add(
        conn: &mut PgConnection,
        new_chat: &NewChatHistory,
    ) -> Result<ChatHistory, diesel::result::Error> {
        diesel::insert_into(chat_histories::table)
            .values(new_chat)
            .get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        chat_id: i32,
        changes: &ChatHistoryChanges,
    ) -> Result<bool, diesel::result::Error> {
        diesel::update(chat_histories::table.find(chat_id))
            .set(changes)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn delete(conn: &mut PgConnection, chat_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::delete(chat_histories::table.find(chat_id))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    fn filtered(search: &ChatHistorySearch) -> chat_histories::BoxedQuery<'static, Pg> {
        let mut query = chat_histories::table.into_boxed();
        if let Some(meeting_id) = search.meeting_id {
            query = query.filter(chat_histories::meeting_id.eq(meeting_id));
        }
        if let Some(pattern) = search.page.keyword_pattern() {
            query = query.filter(
                chat_histories::name
                    .ilike(pattern.clone())
                    .or(chat_histories::content.assume_not_null().ilike(pattern)),
            );
        }
        query
    }

    fn sorted(
        mut query: chat_histories::BoxedQuery<'static, Pg>,
        page: &PageRequest,
    ) -> chat_histories::BoxedQuery<'static, Pg> {
        let desc = page.sort_descending;
        if let Some(field) = page.sort_key().and_then(|k| NamedSort::parse(&k)) {
            query = match field {
                NamedSort::Name => sort_by!(query, chat_histories::name, desc),
                NamedSort::CreatedAt => sort_by!(query, chat_histories::created_at, desc),
            };
        }
        query
            .then_order_by(chat_histories::updated_at.desc())
            .then_order_by(chat_histories::id.desc())
    }

    fn to_dtos(
        conn: &mut PgConnection,
        rows: Vec<ChatHistory>,
        include_related: bool,
    ) -> Result<Vec<ChatHistoryDto>, diesel::result::Error> {
        if !include_related {
            return Ok(rows.into_iter().map(ChatHistoryDto::from).collect());
        }
        let meeting_ids: Vec<i32> = rows.iter().map(|c| c.meeting_id).collect();
        let parents: HashMap<i32, Meeting> = meetings::table
            .filter(meetings::id.eq_any(meeting_ids))
            .select(Meeting::as_select())
            .load(conn)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        Ok(rows
            .into_iter()
            .map(|chat| {
                let parent = parents.get(&chat.meeting_id).cloned();
                let dto = ChatHistoryDto::from(chat);
                match parent {
                    Some(meeting) => dto.with_meeting(meeting),
                    None => dto,
                }
            })
            .collect())
    }
}
