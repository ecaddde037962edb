use diesel::pg::Pg;
use diesel::prelude::*;

use crate::db::models::api::PagedResult;
use crate::db::models::search::{PageRequest, RoleViewSort};
use crate::db::models::user::{RoleView, RoleViewDto, RoleViewForm, RoleViewSearch};
use crate::schema::role_views;

pub struct RoleViewsRepo;

impl RoleViewsRepo {
    pub fn get_all(conn: &mut PgConnection) -> Result<Vec<RoleViewDto>, diesel::result::Error> {
        let rows = role_views::table
            .order(role_views::id.desc())
            .select(RoleView::as_select())
            .load(conn)?;
        Ok(rows.into_iter().map(RoleViewDto::from).collect())
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        role_id: i32,
    ) -> Result<Option<RoleViewDto>, diesel::result::Error> {
        role_views::table
            .find(role_id)
            .select(RoleView::as_select())
            .first(conn)
            .optional()
            .map(|row| row.map(RoleViewDto::from))
    }

    pub fn get_paged(
        conn: &mut PgConnection,
        search: &RoleViewSearch,
    ) -> Result<PagedResult<RoleViewDto>, diesel::result::Error> {
        let page = &search.page;
        let total_count = Self::filtered(page).count().get_result::<i64>(conn)?;
        let rows = Self::sorted(Self::filtered(page), page)
            .limit(page.page_size())
            .offset(page.offset())
            .select(RoleView::as_select())
            .load(conn)?;
        Ok(PagedResult::new(
            rows.into_iter().map(RoleViewDto::from).collect(),
            total_count,
            page.page_index(),
            page.page_size(),
        ))
    }

    /// Number of ids in `ids` that exist.
    pub fn count_existing(conn: &mut PgConnection, ids: &[i32]) -> Result<i64, diesel::result::Error> {
        role_views::table
            .filter(role_views::id.eq_any(ids.to_vec()))
            .count()
            .get_result(conn)
    }

    pub fn exists_by_name(
        conn: &mut PgConnection,
        role_name: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::role_views::dsl::*;
        match exclude_id {
            Some(excluded) => diesel::select(diesel::dsl::exists(
                role_views.filter(name.eq(role_name)).filter(id.ne(excluded)),
            ))
            .get_result(conn),
            None => diesel::select(diesel::dsl::exists(role_views.filter(name.eq(role_name))))
                .get_result(conn),
        }
    }

    pub fn add(conn: &mut PgConnection, form: &RoleViewForm) -> Result<RoleView, diesel::result::Error> {
        diesel::insert_into(role_views::table)
            .values(form)
            .get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        role_id: i32,
        form: &RoleViewForm,
    ) -> Result<bool, diesel::result::Error> {
        diesel::update(role_views::table.find(role_id))
            .set(form)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn delete(conn: &mut PgConnection, role_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::delete(role_views::table.find(role_id))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    fn filtered(page: &PageRequest) -> role_views::BoxedQuery<'static, Pg> {
        let mut query = role_views::table.into_boxed();
        if let Some(pattern) = page.keyword_pattern() {
            query = query.filter(role_views::name.ilike(pattern));
        }
        query
    }

    fn sorted(
        mut query: role_views::BoxedQuery<'static, Pg>,
        page: &PageRequest,
    ) -> role_views::BoxedQuery<'static, Pg> {
        if let Some(RoleViewSort::Name) = page.sort_key().and_then(|k| RoleViewSort::parse(&k)) {
            query = sort_by!(query, role_views::name, page.sort_descending);
        }
        query.then_order_by(role_views::id.desc())
    }
}
