use chrono::Utc;
use diesel::prelude::*;

use crate::{
    db::models::api::{PagedResult, error_codes},
    db::models::meeting::{MeetingDto, MeetingRequest, MeetingSearch},
    db::repositories::{meetings::MeetingsRepo, projects::ProjectsRepo},
    error::AppError,
    validation::request::ensure_route_id,
};

pub struct MeetingsService;

impl MeetingsService {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<MeetingDto>, AppError> {
        Ok(MeetingsRepo::get_all(conn, include_related)?)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        meeting_id: i32,
        include_related: bool,
    ) -> Result<MeetingDto, AppError> {
        MeetingsRepo::get_by_id(conn, meeting_id, include_related)?
            .ok_or_else(|| AppError::not_found("Meeting"))
    }

    pub fn search(
        conn: &mut PgConnection,
        search: &MeetingSearch,
    ) -> Result<PagedResult<MeetingDto>, AppError> {
        Ok(MeetingsRepo::get_paged(conn, search)?)
    }

    pub fn create(conn: &mut PgConnection, req: MeetingRequest) -> Result<MeetingDto, AppError> {
        Self::ensure_project(conn, req.project_id)?;
        Self::ensure_unique_name(conn, &req.name, None)?;
        let meeting = MeetingsRepo::add(conn, &req.into_new(Utc::now()))?;
        Ok(meeting.into())
    }

    pub fn update(
        conn: &mut PgConnection,
        meeting_id: i32,
        req: MeetingRequest,
    ) -> Result<MeetingDto, AppError> {
        ensure_route_id(meeting_id, req.id)?;
        Self::ensure_project(conn, req.project_id)?;
        Self::ensure_unique_name(conn, &req.name, Some(meeting_id))?;
        if !MeetingsRepo::update(conn, meeting_id, &req.into_changes(Utc::now()))? {
            return Err(AppError::not_found("Meeting"));
        }
        Self::get_by_id(conn, meeting_id, false)
    }

    pub fn delete(conn: &mut PgConnection, meeting_id: i32) -> Result<(), AppError> {
        let deleted = MeetingsRepo::delete(conn, meeting_id)
            .map_err(|e| AppError::from_delete(e, "Meeting"))?;
        if !deleted {
            return Err(AppError::not_found("Meeting"));
        }
        Ok(())
    }

    fn ensure_project(conn: &mut PgConnection, project_id: i32) -> Result<(), AppError> {
        if !ProjectsRepo::exists(conn, project_id)? {
            return Err(AppError::not_found("Project"));
        }
        Ok(())
    }

    fn ensure_unique_name(
        conn: &mut PgConnection,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), AppError> {
        if MeetingsRepo::exists_by_name(conn, name.trim(), exclude_id)? {
            return Err(AppError::conflict_with_code(
                format!("Meeting name '{}' already exists", name.trim()),
                Some("name".to_string()),
                error_codes::NAME_EXISTS,
            ));
        }
        Ok(())
    }
}
