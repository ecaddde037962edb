use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::search::PageRequest;
use crate::validation::rules;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::my_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MyUser {
    pub id: i32,
    pub account: String,
    pub password: String,
    pub name: String,
    pub status: bool,
    pub email: Option<String>,
    pub is_admin: bool,
    pub role_json: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::my_users)]
pub struct NewMyUser {
    pub account: String,
    pub password: String,
    pub name: String,
    pub status: bool,
    pub email: Option<String>,
    pub is_admin: bool,
    pub role_json: String,
}

/// `password` is only written when a new one was supplied.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::my_users)]
pub struct MyUserChanges {
    pub account: String,
    pub password: Option<String>,
    pub name: String,
    pub status: bool,
    pub email: Option<Option<String>>,
    pub is_admin: bool,
    pub role_json: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::role_views)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoleView {
    pub id: i32,
    pub name: String,
    pub permission_json: String,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::role_views)]
pub struct RoleViewForm {
    pub name: String,
    pub permission_json: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(MyUser, foreign_key = my_user_id))]
#[diesel(belongs_to(RoleView, foreign_key = role_view_id))]
#[diesel(table_name = crate::schema::my_user_role_views)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MyUserRoleView {
    pub id: i32,
    pub my_user_id: i32,
    pub role_view_id: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::my_user_role_views)]
pub struct NewMyUserRoleView {
    pub my_user_id: i32,
    pub role_view_id: i32,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(
        custom(function = "rules::not_blank"),
        length(max = 100, message = "Account must be at most 100 characters")
    )]
    pub account: String,
    /// Required on create; on update an absent or blank password keeps the old hash.
    #[validate(custom(function = "rules::optional_password"))]
    pub password: Option<String>,
    #[validate(
        custom(function = "rules::not_blank"),
        length(max = 100, message = "Name must be at most 100 characters")
    )]
    pub name: String,
    #[serde(default = "default_active")]
    pub status: bool,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_role_json")]
    #[validate(custom(function = "rules::json_text"))]
    pub role_json: String,
    #[serde(default)]
    pub role_view_ids: Vec<i32>,
}

fn default_active() -> bool {
    true
}

fn default_role_json() -> String {
    "[]".to_string()
}

impl UserRequest {
    pub fn new_password(&self) -> Option<&str> {
        self.password
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoleViewRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(
        custom(function = "rules::not_blank"),
        length(max = 100, message = "Name must be at most 100 characters")
    )]
    pub name: String,
    #[serde(default = "default_permission_json")]
    #[validate(custom(function = "rules::json_text"))]
    pub permission_json: String,
}

fn default_permission_json() -> String {
    "{}".to_string()
}

impl RoleViewRequest {
    pub fn into_form(self) -> RoleViewForm {
        RoleViewForm {
            name: self.name.trim().to_string(),
            permission_json: self.permission_json,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSearch {
    #[serde(flatten)]
    pub page: PageRequest,
    pub status: Option<bool>,
    pub is_admin: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleViewSearch {
    #[serde(flatten)]
    pub page: PageRequest,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoleViewDto {
    pub id: i32,
    pub name: String,
    pub permission_json: String,
}

impl From<RoleView> for RoleViewDto {
    fn from(r: RoleView) -> Self {
        Self {
            id: r.id,
            name: r.name,
            permission_json: r.permission_json,
        }
    }
}

// 不返回密码
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub account: String,
    pub name: String,
    pub status: bool,
    pub email: Option<String>,
    pub is_admin: bool,
    pub role_json: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<RoleViewDto>>,
}

impl From<MyUser> for UserDto {
    fn from(u: MyUser) -> Self {
        Self {
            id: u.id,
            account: u.account,
            name: u.name,
            status: u.status,
            email: u.email,
            is_admin: u.is_admin,
            role_json: u.role_json,
            roles: None,
        }
    }
}

impl UserDto {
    pub fn with_roles(mut self, roles: Vec<RoleView>) -> Self {
        self.roles = Some(roles.into_iter().map(RoleViewDto::from).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_dto_never_serializes_password() {
        let user = MyUser {
            id: 1,
            account: "alice".to_string(),
            password: "$2b$04$hash".to_string(),
            name: "Alice".to_string(),
            status: true,
            email: None,
            is_admin: false,
            role_json: "[]".to_string(),
        };
        let json = serde_json::to_value(UserDto::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["account"], "alice");
        assert_eq!(json["isAdmin"], false);
    }

    #[test]
    fn blank_password_means_keep_existing() {
        let req: UserRequest =
            serde_json::from_str(r#"{"account":"bob","name":"Bob","password":"  "}"#).unwrap();
        assert_eq!(req.new_password(), None);
        assert!(req.status);
        assert_eq!(req.role_json, "[]");
    }
}
