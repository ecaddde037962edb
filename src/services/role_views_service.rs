use diesel::prelude::*;

use crate::{
    db::models::api::{PagedResult, error_codes},
    db::models::user::{RoleViewDto, RoleViewRequest, RoleViewSearch},
    db::repositories::role_views::RoleViewsRepo,
    error::AppError,
    validation::request::ensure_route_id,
};

pub struct RoleViewsService;

impl RoleViewsService {
    pub fn get_all(conn: &mut PgConnection) -> Result<Vec<RoleViewDto>, AppError> {
        Ok(RoleViewsRepo::get_all(conn)?)
    }

    pub fn get_by_id(conn: &mut PgConnection, role_id: i32) -> Result<RoleViewDto, AppError> {
        RoleViewsRepo::get_by_id(conn, role_id)?.ok_or_else(|| AppError::not_found("Role view"))
    }

    pub fn search(
        conn: &mut PgConnection,
        search: &RoleViewSearch,
    ) -> Result<PagedResult<RoleViewDto>, AppError> {
        Ok(RoleViewsRepo::get_paged(conn, search)?)
    }

    pub fn create(conn: &mut PgConnection, req: RoleViewRequest) -> Result<RoleViewDto, AppError> {
        Self::ensure_unique_name(conn, &req.name, None)?;
        let role = RoleViewsRepo::add(conn, &req.into_form())?;
        Ok(role.into())
    }

    pub fn update(
        conn: &mut PgConnection,
        role_id: i32,
        req: RoleViewRequest,
    ) -> Result<RoleViewDto, AppError> {
        ensure_route_id(role_id, req.id)?;
        Self::ensure_unique_name(conn, &req.name, Some(role_id))?;
        if !RoleViewsRepo::update(conn, role_id, &req.into_form())? {
            return Err(AppError::not_found("Role view"));
        }
        Self::get_by_id(conn, role_id)
    }

    /// Restricted while any user still holds the role.
    pub fn delete(conn: &mut PgConnection, role_id: i32) -> Result<(), AppError> {
        let deleted = RoleViewsRepo::delete(conn, role_id)
            .map_err(|e| AppError::from_delete(e, "Role view"))?;
        if !deleted {
            return Err(AppError::not_found("Role view"));
        }
        Ok(())
    }

    fn ensure_unique_name(
        conn: &mut PgConnection,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), AppError> {
        if RoleViewsRepo::exists_by_name(conn, name.trim(), exclude_id)? {
            return Err(AppError::conflict_with_code(
                format!("Role view name '{}' already exists", name.trim()),
                Some("name".to_string()),
                error_codes::NAME_EXISTS,
            ));
        }
        Ok(())
    }
}
