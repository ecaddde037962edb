use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::db::enums::ConvertStatus;
use crate::db::models::api::PagedResult;
use crate::db::models::meeting::Meeting;
use crate::db::models::recorded_media_file::{
    ConvertProgress, NewRecordedMediaFile, RecordedMediaFile, RecordedMediaFileChanges,
    RecordedMediaFileDto, RecordedMediaFileSearch,
};
use crate::db::models::search::{MediaFileSort, PageRequest};
use crate::schema::{meetings, recorded_media_files};

pub struct RecordedMediaFilesRepo;

impl RecordedMediaFilesRepo {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<RecordedMediaFileDto>, diesel::result::Error> {
        let rows = recorded_media_files::table
            .order((
                recorded_media_files::updated_at.desc(),
                recorded_media_files::id.desc(),
            ))
            .select(RecordedMediaFile::as_select())
            .load(conn)?;
        Self::to_dtos(conn, rows, include_related)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        file_id: i32,
        include_related: bool,
    ) -> Result<Option<RecordedMediaFileDto>, diesel::result::Error> {
        match Self::find(conn, file_id)? {
            Some(file) => Ok(Self::to_dtos(conn, vec![file], include_related)?.pop()),
            None => Ok(None),
        }
    }

    pub fn get_paged(
        conn: &mut PgConnection,
        search: &RecordedMediaFileSearch,
    ) -> Result<PagedResult<RecordedMediaFileDto>, diesel::result::Error> {
        let page = &search.page;
        let total_count = Self::filtered(search).count().get_result::<i64>(conn)?;
        let rows = Self::sorted(Self::filtered(search), page)
            .limit(page.page_size())
            .offset(page.offset())
            .select(RecordedMediaFile::as_select())
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
        file_id: i32,
    ) -> Result<Option<RecordedMediaFile>, diesel::result::Error> {
        recorded_media_files::table
            .find(file_id)
            .select(RecordedMediaFile::as_select())
            .first(conn)
            .optional()
    }

    pub fn exists_by_name(
        conn: &mut PgConnection,
        file_name_val: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::recorded_media_files::dsl::*;
        match exclude_id {
            Some(excluded) => diesel::select(diesel::dsl::exists(
                recorded_media_files
                    .filter(name.eq(file_name_val))
                    .filter(id.ne(excluded)),
            ))
            .get_result(conn),
            None => diesel::select(diesel::dsl::exists(
                recorded_media_files.filter(name.eq(file_name_val)),
            ))
            .get_result(conn),
        }
    }

    pub fn add(
        conn: &mut PgConnection,
        new_file: &NewRecordedMediaFile,
    ) -> Result<RecordedMediaFile, diesel::result::Error> {
        diesel::insert_into(recorded_media_files::table)
            .values(new_file)
            .get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        file_id: i32,
        changes: &RecordedMediaFileChanges,
    ) -> Result<bool, diesel::result::Error> {
        diesel::update(recorded_media_files::table.find(file_id))
            .set(changes)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    /// Moves a file to `status`, optionally replacing transcript content and message.
    pub fn set_progress(
        conn: &mut PgConnection,
        file_id: i32,
        status: ConvertStatus,
        content: Option<String>,
        message: Option<String>,
    ) -> Result<bool, diesel::result::Error> {
        let progress = ConvertProgress {
            status: Some(status),
            content,
            message,
            updated_at: Some(Utc::now()),
        };
        diesel::update(recorded_media_files::table.find(file_id))
            .set(&progress)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    /// Claims a file for transcription unless a job is already running on it.
    pub fn try_start_conversion(
        conn: &mut PgConnection,
        file_id: i32,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::recorded_media_files::dsl::*;
        diesel::update(
            recorded_media_files
                .find(file_id)
                .filter(status.ne_all(vec![ConvertStatus::Converting, ConvertStatus::Transcribing])),
        )
        .set((
            status.eq(ConvertStatus::Converting),
            message.eq(None::<String>),
            updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .map(|rows| rows > 0)
    }

    /// Fails every file still marked as running; returns how many were reset.
    pub fn fail_running(
        conn: &mut PgConnection,
        reason: &str,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::recorded_media_files::dsl::*;
        diesel::update(
            recorded_media_files
                .filter(status.eq_any(vec![ConvertStatus::Converting, ConvertStatus::Transcribing])),
        )
        .set((
            status.eq(ConvertStatus::Failed),
            message.eq(Some(reason.to_string())),
            updated_at.eq(Utc::now()),
        ))
        .execute(conn)
    }

    pub fn delete(conn: &mut PgConnection, file_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::delete(recorded_media_files::table.find(file_id))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    fn filtered(search: &RecordedMediaFileSearch) -> recorded_media_files::BoxedQuery<'static, Pg> {
        let mut query = recorded_media_files::table.into_boxed();
        if let Some(meeting_id) = search.meeting_id {
            query = query.filter(recorded_media_files::meeting_id.eq(meeting_id));
        }
        if let Some(status) = search.status {
            query = query.filter(recorded_media_files::status.eq(status));
        }
        if let Some(pattern) = search.page.keyword_pattern() {
            query = query.filter(
                recorded_media_files::name
                    .ilike(pattern.clone())
                    .or(recorded_media_files::file_name.ilike(pattern.clone()))
                    .or(recorded_media_files::content.assume_not_null().ilike(pattern)),
            );
        }
        query
    }

    fn sorted(
        mut query: recorded_media_files::BoxedQuery<'static, Pg>,
        page: &PageRequest,
    ) -> recorded_media_files::BoxedQuery<'static, Pg> {
        let desc = page.sort_descending;
        if let Some(field) = page.sort_key().and_then(|k| MediaFileSort::parse(&k)) {
            query = match field {
                MediaFileSort::Name => sort_by!(query, recorded_media_files::name, desc),
                MediaFileSort::Status => sort_by!(query, recorded_media_files::status, desc),
                MediaFileSort::CreatedAt => {
                    sort_by!(query, recorded_media_files::created_at, desc)
                }
            };
        }
        query
            .then_order_by(recorded_media_files::updated_at.desc())
            .then_order_by(recorded_media_files::id.desc())
    }

    fn to_dtos(
        conn: &mut PgConnection,
        rows: Vec<RecordedMediaFile>,
        include_related: bool,
    ) -> Result<Vec<RecordedMediaFileDto>, diesel::result::Error> {
        if !include_related {
            return Ok(rows.into_iter().map(RecordedMediaFileDto::from).collect());
        }
        let meeting_ids: Vec<i32> = rows.iter().map(|r| r.meeting_id).collect();
        let parents: HashMap<i32, Meeting> = meetings::table
            .filter(meetings::id.eq_any(meeting_ids))
            .select(Meeting::as_select())
            .load(conn)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        Ok(rows
            .into_iter()
            .map(|file| {
                let parent = parents.get(&file.meeting_id).cloned();
                let dto = RecordedMediaFileDto::from(file);
                match parent {
                    Some(meeting) => dto.with_meeting(meeting),
                    None => dto,
                }
            })
            .collect())
    }
}
