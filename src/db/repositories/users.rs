use diesel::pg::Pg;
use diesel::prelude::*;

use crate::db::models::api::PagedResult;
use crate::db::models::search::{PageRequest, UserSort};
use crate::db::models::user::{
    MyUser, MyUserChanges, MyUserRoleView, NewMyUser, NewMyUserRoleView, RoleView, UserDto,
    UserSearch,
};
use crate::schema::{my_user_role_views, my_users, role_views};

pub struct UsersRepo;

impl UsersRepo {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<UserDto>, diesel::result::Error> {
        let rows = my_users::table
            .order(my_users::id.desc())
            .select(MyUser::as_select())
            .load(conn)?;
        Self::to_dtos(conn, rows, include_related)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        user_id: i32,
        include_related: bool,
    ) -> Result<Option<UserDto>, diesel::result::Error> {
        match Self::find(conn, user_id)? {
            Some(user) => Ok(Self::to_dtos(conn, vec![user], include_related)?.pop()),
            None => Ok(None),
        }
    }

    pub fn get_paged(
        conn: &mut PgConnection,
        search: &UserSearch,
    ) -> Result<PagedResult<UserDto>, diesel::result::Error> {
        let page = &search.page;
        let total_count = Self::filtered(search).count().get_result::<i64>(conn)?;
        let rows = Self::sorted(Self::filtered(search), page)
            .limit(page.page_size())
            .offset(page.offset())
            .select(MyUser::as_select())
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
        user_id: i32,
    ) -> Result<Option<MyUser>, diesel::result::Error> {
        my_users::table
            .find(user_id)
            .select(MyUser::as_select())
            .first(conn)
            .optional()
    }

    /// Users are unique by account rather than display name.
    pub fn exists_by_name(
        conn: &mut PgConnection,
        account_name: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::my_users::dsl::*;
        match exclude_id {
            Some(excluded) => diesel::select(diesel::dsl::exists(
                my_users.filter(account.eq(account_name)).filter(id.ne(excluded)),
            ))
            .get_result(conn),
            None => diesel::select(diesel::dsl::exists(my_users.filter(account.eq(account_name))))
                .get_result(conn),
        }
    }

    pub fn add(
        conn: &mut PgConnection,
        new_user: &NewMyUser,
        role_view_ids: &[i32],
    ) -> Result<MyUser, diesel::result::Error> {
        conn.transaction(|conn| {
            let user: MyUser = diesel::insert_into(my_users::table)
                .values(new_user)
                .get_result(conn)?;
            Self::replace_roles(conn, user.id, role_view_ids)?;
            Ok(user)
        })
    }

    /// `role_view_ids` of `None` leaves the assignments untouched.
    pub fn update(
        conn: &mut PgConnection,
        user_id: i32,
        changes: &MyUserChanges,
        role_view_ids: Option<&[i32]>,
    ) -> Result<bool, diesel::result::Error> {
        conn.transaction(|conn| {
            let rows = diesel::update(my_users::table.find(user_id))
                .set(changes)
                .execute(conn)?;
            if rows == 0 {
                return Ok(false);
            }
            if let Some(ids) = role_view_ids {
                Self::replace_roles(conn, user_id, ids)?;
            }
            Ok(true)
        })
    }

    pub fn delete(conn: &mut PgConnection, user_id: i32) -> Result<bool, diesel::result::Error> {
        conn.transaction(|conn| {
            diesel::delete(
                my_user_role_views::table.filter(my_user_role_views::my_user_id.eq(user_id)),
            )
            .execute(conn)?;
            diesel::delete(my_users::table.find(user_id))
                .execute(conn)
                .map(|rows| rows > 0)
        })
    }

    pub fn roles_for(
        conn: &mut PgConnection,
        user_id: i32,
    ) -> Result<Vec<RoleView>, diesel::result::Error> {
        my_user_role_views::table
            .inner_join(role_views::table)
            .filter(my_user_role_views::my_user_id.eq(user_id))
            .order(role_views::name.asc())
            .select(RoleView::as_select())
            .load(conn)
    }

    fn replace_roles(
        conn: &mut PgConnection,
        user_id: i32,
        role_view_ids: &[i32],
    ) -> Result<(), diesel::result::Error> {
        diesel::delete(my_user_role_views::table.filter(my_user_role_views::my_user_id.eq(user_id)))
            .execute(conn)?;
        let mut ids = role_view_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let rows: Vec<NewMyUserRoleView> = ids
            .into_iter()
            .map(|role_view_id| NewMyUserRoleView {
                my_user_id: user_id,
                role_view_id,
            })
            .collect();
        if !rows.is_empty() {
            diesel::insert_into(my_user_role_views::table)
                .values(&rows)
                .execute(conn)?;
        }
        Ok(())
    }

    fn filtered(search: &UserSearch) -> my_users::BoxedQuery<'static, Pg> {
        let mut query = my_users::table.into_boxed();
        if let Some(pattern) = search.page.keyword_pattern() {
            query = query.filter(
                my_users::name
                    .ilike(pattern.clone())
                    .or(my_users::account.ilike(pattern.clone()))
                    .or(my_users::email.assume_not_null().ilike(pattern)),
            );
        }
        if let Some(active) = search.status {
            query = query.filter(my_users::status.eq(active));
        }
        if let Some(admin) = search.is_admin {
            query = query.filter(my_users::is_admin.eq(admin));
        }
        query
    }

    fn sorted(
        mut query: my_users::BoxedQuery<'static, Pg>,
        page: &PageRequest,
    ) -> my_users::BoxedQuery<'static, Pg> {
        let desc = page.sort_descending;
        if let Some(field) = page.sort_key().and_then(|k| UserSort::parse(&k)) {
            query = match field {
                UserSort::Name => sort_by!(query, my_users::name, desc),
                UserSort::Account => sort_by!(query, my_users::account, desc),
            };
        }
        // 用户表没有时间戳列
        query.then_order_by(my_users::id.desc())
    }

    fn to_dtos(
        conn: &mut PgConnection,
        rows: Vec<MyUser>,
        include_related: bool,
    ) -> Result<Vec<UserDto>, diesel::result::Error> {
        if !include_related {
            return Ok(rows.into_iter().map(UserDto::from).collect());
        }
        let links: Vec<(MyUserRoleView, RoleView)> = MyUserRoleView::belonging_to(&rows)
            .inner_join(role_views::table)
            .select((MyUserRoleView::as_select(), RoleView::as_select()))
            .load(conn)?;
        let grouped = links.grouped_by(&rows);
        Ok(rows
            .into_iter()
            .zip(grouped)
            .map(|(user, links)| {
                let roles = links.into_iter().map(|(_, role)| role).collect();
                UserDto::from(user).with_roles(roles)
            })
            .collect())
    }
}
