use chrono::Utc;
use diesel::prelude::*;
use tracing::info;

use crate::{
    db::enums::WorkStatus,
    db::models::api::{PagedResult, error_codes},
    db::models::project::{ProjectDto, ProjectRequest, ProjectSearch},
    db::repositories::projects::ProjectsRepo,
    error::AppError,
    validation::request::{ensure_route_id, validate_completion_percentage},
};

pub struct ProjectsService;

impl ProjectsService {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<ProjectDto>, AppError> {
        Ok(ProjectsRepo::get_all(conn, include_related)?)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        project_id: i32,
        include_related: bool,
    ) -> Result<ProjectDto, AppError> {
        ProjectsRepo::get_by_id(conn, project_id, include_related)?
            .ok_or_else(|| AppError::not_found("Project"))
    }

    pub fn search(
        conn: &mut PgConnection,
        search: &ProjectSearch,
    ) -> Result<PagedResult<ProjectDto>, AppError> {
        Ok(ProjectsRepo::get_paged(conn, search)?)
    }

    pub fn create(conn: &mut PgConnection, req: ProjectRequest) -> Result<ProjectDto, AppError> {
        Self::ensure_unique_name(conn, &req.name, None)?;
        let project = ProjectsRepo::add(conn, &req.into_new(Utc::now()))?;
        info!(project_id = project.id, "Project created");
        Ok(project.into())
    }

    pub fn update(
        conn: &mut PgConnection,
        project_id: i32,
        req: ProjectRequest,
    ) -> Result<ProjectDto, AppError> {
        ensure_route_id(project_id, req.id)?;
        Self::ensure_unique_name(conn, &req.name, Some(project_id))?;
        if !ProjectsRepo::update(conn, project_id, &req.into_changes(Utc::now()))? {
            return Err(AppError::not_found("Project"));
        }
        Self::get_by_id(conn, project_id, false)
    }

    pub fn update_status(
        conn: &mut PgConnection,
        project_id: i32,
        status: WorkStatus,
    ) -> Result<ProjectDto, AppError> {
        if !ProjectsRepo::update_status(conn, project_id, status, Utc::now())? {
            return Err(AppError::not_found("Project"));
        }
        Self::get_by_id(conn, project_id, false)
    }

    pub fn update_completion(
        conn: &mut PgConnection,
        project_id: i32,
        percentage: i32,
    ) -> Result<ProjectDto, AppError> {
        validate_completion_percentage(percentage)?;
        if !ProjectsRepo::update_completion_percentage(conn, project_id, percentage, Utc::now())? {
            return Err(AppError::not_found("Project"));
        }
        Self::get_by_id(conn, project_id, false)
    }

    pub fn delete(conn: &mut PgConnection, project_id: i32) -> Result<(), AppError> {
        let deleted = ProjectsRepo::delete(conn, project_id)
            .map_err(|e| AppError::from_delete(e, "Project"))?;
        if !deleted {
            return Err(AppError::not_found("Project"));
        }
        info!(project_id, "Project deleted");
        Ok(())
    }

    fn ensure_unique_name(
        conn: &mut PgConnection,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), AppError> {
        if ProjectsRepo::exists_by_name(conn, name.trim(), exclude_id)? {
            return Err(AppError::conflict_with_code(
                format!("Project name '{}' already exists", name.trim()),
                Some("name".to_string()),
                error_codes::NAME_EXISTS,
            ));
        }
        Ok(())
    }
}
