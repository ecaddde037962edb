use diesel::prelude::*;
use tracing::info;

use crate::{
    db::models::api::{PagedResult, error_codes},
    db::models::user::{MyUserChanges, NewMyUser, UserDto, UserRequest, UserSearch},
    db::repositories::{role_views::RoleViewsRepo, users::UsersRepo},
    error::AppError,
    validation::request::{ensure_route_id, validate_role_ids},
};

pub struct UsersService;

impl UsersService {
    pub fn get_all(conn: &mut PgConnection, include_related: bool) -> Result<Vec<UserDto>, AppError> {
        Ok(UsersRepo::get_all(conn, include_related)?)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        user_id: i32,
        include_related: bool,
    ) -> Result<UserDto, AppError> {
        UsersRepo::get_by_id(conn, user_id, include_related)?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub fn search(
        conn: &mut PgConnection,
        search: &UserSearch,
    ) -> Result<PagedResult<UserDto>, AppError> {
        Ok(UsersRepo::get_paged(conn, search)?)
    }

    pub fn create(
        conn: &mut PgConnection,
        req: UserRequest,
        bcrypt_cost: u32,
    ) -> Result<UserDto, AppError> {
        let password = req
            .new_password()
            .ok_or_else(|| AppError::validation("Password is required"))?;
        Self::ensure_unique_account(conn, &req.account, None)?;
        Self::ensure_roles_exist(conn, &req.role_view_ids)?;

        let new_user = NewMyUser {
            account: req.account.trim().to_string(),
            password: bcrypt::hash(password, bcrypt_cost)?,
            name: req.name.trim().to_string(),
            status: req.status,
            email: req.email.clone(),
            is_admin: req.is_admin,
            role_json: req.role_json.clone(),
        };
        let user = UsersRepo::add(conn, &new_user, &req.role_view_ids)?;
        info!(user_id = user.id, account = %user.account, "User created");
        Self::get_by_id(conn, user.id, true)
    }

    pub fn update(
        conn: &mut PgConnection,
        user_id: i32,
        req: UserRequest,
        bcrypt_cost: u32,
    ) -> Result<UserDto, AppError> {
        ensure_route_id(user_id, req.id)?;
        Self::ensure_unique_account(conn, &req.account, Some(user_id))?;
        Self::ensure_roles_exist(conn, &req.role_view_ids)?;

        let password = match req.new_password() {
            Some(p) => Some(bcrypt::hash(p, bcrypt_cost)?),
            None => None,
        };
        let changes = MyUserChanges {
            account: req.account.trim().to_string(),
            password,
            name: req.name.trim().to_string(),
            status: req.status,
            email: Some(req.email.clone()),
            is_admin: req.is_admin,
            role_json: req.role_json.clone(),
        };
        if !UsersRepo::update(conn, user_id, &changes, Some(&req.role_view_ids))? {
            return Err(AppError::not_found("User"));
        }
        Self::get_by_id(conn, user_id, true)
    }

    pub fn delete(conn: &mut PgConnection, user_id: i32) -> Result<(), AppError> {
        let deleted =
            UsersRepo::delete(conn, user_id).map_err(|e| AppError::from_delete(e, "User"))?;
        if !deleted {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    fn ensure_unique_account(
        conn: &mut PgConnection,
        account: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), AppError> {
        if UsersRepo::exists_by_name(conn, account.trim(), exclude_id)? {
            return Err(AppError::conflict_with_code(
                format!("Account '{}' already exists", account.trim()),
                Some("account".to_string()),
                error_codes::ACCOUNT_EXISTS,
            ));
        }
        Ok(())
    }

    fn ensure_roles_exist(conn: &mut PgConnection, role_view_ids: &[i32]) -> Result<(), AppError> {
        validate_role_ids(role_view_ids)?;
        let mut unique = role_view_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            return Ok(());
        }
        if RoleViewsRepo::count_existing(conn, &unique)? != unique.len() as i64 {
            return Err(AppError::not_found("Role view"));
        }
        Ok(())
    }
}
