use diesel::pg::Pg;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::db::models::api::PagedResult;
use crate::db::models::chat_history::{ChatHistory, ChatHistoryDto};
use crate::db::models::meeting::{Meeting, MeetingChanges, MeetingDto, MeetingSearch, NewMeeting};
use crate::db::models::project::Project;
use crate::db::models::recorded_media_file::{RecordedMediaFile, RecordedMediaFileDto};
use crate::db::models::search::{NamedSort, PageRequest};
use crate::schema::{meetings, projects};

pub struct MeetingsRepo;

impl MeetingsRepo {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<MeetingDto>, diesel::result::Error> {
        let rows = meetings::table
            .order((meetings::updated_at.desc(), meetings::id.desc()))
            .select(Meeting::as_select())
            .load(conn)?;
        Self::to_dtos(conn, rows, include_related)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        meeting_id: i32,
        include_related: bool,
    ) -> Result<Option<MeetingDto>, diesel::result::Error> {
        match Self::find(conn, meeting_id)? {
            Some(meeting) => Ok(Self::to_dtos(conn, vec![meeting], include_related)?.pop()),
            None => Ok(None),
        }
    }

    pub fn get_paged(
        conn: &mut PgConnection,
        search: &MeetingSearch,
    ) -> Result<PagedResult<MeetingDto>, diesel::result::Error> {
        let page = &search.page;
        let total_count = Self::filtered(search).count().get_result::<i64>(conn)?;
        let rows = Self::sorted(Self::filtered(search), page)
            .limit(page.page_size())
            .offset(page.offset())
            .select(Meeting::as_select())
            .load(conn)?;
        Ok(PagedResult::new(
            Self::to_dtos(conn, rows, page.include_related)?,
            total_count,
            page.page_index(),
            page.page_size(),
        ))
    }

    pub fn find(
        conn: &mut PgConnection,
        meeting_id: i32,
    ) -> Result<Option<Meeting>, diesel::result::Error> {
        meetings::table
            .find(meeting_id)
            .select(Meeting::as_select())
            .first(conn)
            .optional()
    }

    pub fn exists(conn: &mut PgConnection, meeting_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::select(diesel::dsl::exists(meetings::table.find(meeting_id))).get_result(conn)
    }

    pub fn exists_by_name(
        conn: &mut PgConnection,
        meeting_name: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::meetings::dsl::*;
        match exclude_id {
            Some(excluded) => diesel::select(diesel::dsl::exists(
                meetings.filter(name.eq(meeting_name)).filter(id.ne(excluded)),
            ))
            .get_result(conn),
            None => diesel::select(diesel::dsl::exists(meetings.filter(name.eq(meeting_name))))
                .get_result(conn),
        }
    }

    pub fn add(
        conn: &mut PgConnection,
        new_meeting: &NewMeeting,
    ) -> Result<Meeting, diesel::result::Error> {
        diesel::insert_into(meetings::table)
            .values(new_meeting)
            .get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        meeting_id: i32,
        changes: &MeetingChanges,
    ) -> Result<bool, diesel::result::Error> {
        diesel::update(meetings::table.find(meeting_id))
            .set(changes)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn delete(conn: &mut PgConnection, meeting_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::delete(meetings::table.find(meeting_id))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    /// Attaches chat histories and recorded media files to each meeting.
    pub fn with_children(
        conn: &mut PgConnection,
        rows: Vec<Meeting>,
    ) -> Result<Vec<MeetingDto>, diesel::result::Error> {
        let chats = ChatHistory::belonging_to(&rows)
            .select(ChatHistory::as_select())
            .order(crate::schema::chat_histories::created_at.desc())
            .load(conn)?
            .grouped_by(&rows);
        let media = RecordedMediaFile::belonging_to(&rows)
            .select(RecordedMediaFile::as_select())
            .order(crate::schema::recorded_media_files::created_at.desc())
            .load(conn)?
            .grouped_by(&rows);

        Ok(rows
            .into_iter()
            .zip(chats)
            .zip(media)
            .map(|((meeting, chats), media)| {
                let mut dto = MeetingDto::from(meeting);
                dto.chat_histories = Some(chats.into_iter().map(ChatHistoryDto::from).collect());
                dto.recorded_media_files =
                    Some(media.into_iter().map(RecordedMediaFileDto::from).collect());
                dto
            })
            .collect())
    }

    fn filtered(search: &MeetingSearch) -> meetings::BoxedQuery<'static, Pg> {
        let mut query = meetings::table.into_boxed();
        if let Some(project_id) = search.project_id {
            query = query.filter(meetings::project_id.eq(project_id));
        }
        if let Some(pattern) = search.page.keyword_pattern() {
            query = query.filter(
                meetings::name
                    .ilike(pattern.clone())
                    .or(meetings::description.assume_not_null().ilike(pattern)),
            );
        }
        query
    }

    fn sorted(
        mut query: meetings::BoxedQuery<'static, Pg>,
        page: &PageRequest,
    ) -> meetings::BoxedQuery<'static, Pg> {
        let desc = page.sort_descending;
        if let Some(field) = page.sort_key().and_then(|k| NamedSort::parse(&k)) {
            query = match field {
                NamedSort::Name => sort_by!(query, meetings::name, desc),
                NamedSort::CreatedAt => sort_by!(query, meetings::created_at, desc),
            };
        }
        query
            .then_order_by(meetings::updated_at.desc())
            .then_order_by(meetings::id.desc())
    }

    fn to_dtos(
        conn: &mut PgConnection,
        rows: Vec<Meeting>,
        include_related: bool,
    ) -> Result<Vec<MeetingDto>, diesel::result::Error> {
        if !include_related {
            return Ok(rows.into_iter().map(MeetingDto::from).collect());
        }
        let project_ids: Vec<i32> = rows.iter().map(|m| m.project_id).collect();
        let parents: HashMap<i32, Project> = projects::table
            .filter(projects::id.eq_any(project_ids))
            .select(Project::as_select())
            .load(conn)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(rows
            .into_iter()
            .map(|meeting| {
                let parent = parents.get(&meeting.project_id).cloned();
                let dto = MeetingDto::from(meeting);
                match parent {
                    Some(project) => dto.with_project(project),
                    None => dto,
                }
            })
            .collect())
    }
}
