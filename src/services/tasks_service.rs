use chrono::Utc;
use diesel::prelude::*;

use crate::{
    db::models::api::{PagedResult, error_codes},
    db::models::task::{TaskDto, TaskRequest, TaskSearch},
    db::repositories::{projects::ProjectsRepo, tasks::TasksRepo},
    error::AppError,
    validation::request::ensure_route_id,
};

pub struct TasksService;

impl TasksService {
    pub fn get_all(conn: &mut PgConnection, include_related: bool) -> Result<Vec<TaskDto>, AppError> {
        Ok(TasksRepo::get_all(conn, include_related)?)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        task_id: i32,
        include_related: bool,
    ) -> Result<TaskDto, AppError> {
        TasksRepo::get_by_id(conn, task_id, include_related)?
            .ok_or_else(|| AppError::not_found("Task"))
    }

    pub fn search(
        conn: &mut PgConnection,
        search: &TaskSearch,
    ) -> Result<PagedResult<TaskDto>, AppError> {
        Ok(TasksRepo::get_paged(conn, search)?)
    }

    pub fn create(conn: &mut PgConnection, req: TaskRequest) -> Result<TaskDto, AppError> {
        Self::ensure_project(conn, req.project_id)?;
        Self::ensure_unique_name(conn, &req.name, None)?;
        let task = TasksRepo::add(conn, &req.into_new(Utc::now()))?;
        Ok(task.into())
    }

    pub fn update(
        conn: &mut PgConnection,
        task_id: i32,
        req: TaskRequest,
    ) -> Result<TaskDto, AppError> {
        ensure_route_id(task_id, req.id)?;
        Self::ensure_project(conn, req.project_id)?;
        Self::ensure_unique_name(conn, &req.name, Some(task_id))?;
        if !TasksRepo::update(conn, task_id, &req.into_changes(Utc::now()))? {
            return Err(AppError::not_found("Task"));
        }
        Self::get_by_id(conn, task_id, false)
    }

    pub fn delete(conn: &mut PgConnection, task_id: i32) -> Result<(), AppError> {
        let deleted =
            TasksRepo::delete(conn, task_id).map_err(|e| AppError::from_delete(e, "Task"))?;
        if !deleted {
            return Err(AppError::not_found("Task"));
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
        if TasksRepo::exists_by_name(conn, name.trim(), exclude_id)? {
            return Err(AppError::conflict_with_code(
                format!("Task name '{}' already exists", name.trim()),
                Some("name".to_string()),
                error_codes::NAME_EXISTS,
            ));
        }
        Ok(())
    }
}
