use diesel::pg::Pg;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::db::models::api::PagedResult;
use crate::db::models::gantt_chart::{
    GanttChart, GanttChartChanges, GanttChartDto, GanttChartSearch, NewGanttChart,
};
use crate::db::models::project::Project;
use crate::db::models::search::{GanttChartSort, PageRequest};
use crate::schema::{gantt_charts, projects};

pub struct GanttChartsRepo;

impl GanttChartsRepo {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<GanttChartDto>, diesel::result::Error> {
        let rows = gantt_charts::table
            .order((gantt_charts::updated_at.desc(), gantt_charts::id.desc()))
            .select(GanttChart::as_select())
            .load(conn)?;
        Self::to_dtos(conn, rows, include_related)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        chart_id: i32,
        include_related: bool,
    ) -> Result<Option<GanttChartDto>, diesel::result::Error> {
        let chart = gantt_charts::table
            .find(chart_id)
            .select(GanttChart::as_select())
            .first(conn)
            .optional()?;
        match chart {
            Some(chart) => Ok(Self::to_dtos(conn, vec![chart], include_related)?.pop()),
            None => Ok(None),
        }
    }

    pub fn get_paged(
        conn: &mut PgConnection,
        search: &GanttChartSearch,
    ) -> Result<PagedResult<GanttChartDto>, diesel::result::Error> {
        let page = &search.page;
        let total_count = Self::filtered(search).count().get_result::<i64>(conn)?;
        let rows = Self::sorted(Self::filtered(search), page)
            .limit(page.page_size())
            .offset(page.offset())
            .select(GanttChart::as_select())
            .load(conn)?;
        Ok(PagedResult::new(
            Self::to_dtos(conn, rows, page.include_related)?,
            total_count,
            page.page_index(),
            page.page_size(),
        ))
    }

    /// Gantt charts have no name; uniqueness is one chart per project.
    pub fn exists_for_project(
        conn: &mut PgConnection,
        parent_id: i32,
        exclude_id: Option<i32>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::gantt_charts::dsl::*;
        match exclude_id {
            Some(excluded) => diesel::select(diesel::dsl::exists(
                gantt_charts
                    .filter(project_id.eq(parent_id))
                    .filter(id.ne(excluded)),
            ))
            .get_result(conn),
            None => diesel::select(diesel::dsl::exists(
                gantt_charts.filter(project_id.eq(parent_id)),
            ))
            .get_result(conn),
        }
    }

    pub fn add(
        conn: &mut PgConnection,
        new_chart: &NewGanttChart,
    ) -> Result<GanttChart, diesel::result::Error> {
        diesel::insert_into(gantt_charts::table)
            .values(new_chart)
            .get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        chart_id: i32,
        changes: &GanttChartChanges,
    ) -> Result<bool, diesel::result::Error> {
        diesel::update(gantt_charts::table.find(chart_id))
            .set(changes)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn delete(conn: &mut PgConnection, chart_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::delete(gantt_charts::table.find(chart_id))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    fn filtered(search: &GanttChartSearch) -> gantt_charts::BoxedQuery<'static, Pg> {
        let mut query = gantt_charts::table.into_boxed();
        if let Some(project_id) = search.project_id {
            query = query.filter(gantt_charts::project_id.eq(project_id));
        }
        if let Some(pattern) = search.page.keyword_pattern() {
            query = query.filter(gantt_charts::content.assume_not_null().ilike(pattern));
        }
        query
    }

    fn sorted(
        mut query: gantt_charts::BoxedQuery<'static, Pg>,
        page: &PageRequest,
    ) -> gantt_charts::BoxedQuery<'static, Pg> {
        if let Some(GanttChartSort::CreatedAt) =
            page.sort_key().and_then(|k| GanttChartSort::parse(&k))
        {
            query = sort_by!(query, gantt_charts::created_at, page.sort_descending);
        }
        query
            .then_order_by(gantt_charts::updated_at.desc())
            .then_order_by(gantt_charts::id.desc())
    }

    fn to_dtos(
        conn: &mut PgConnection,
        rows: Vec<GanttChart>,
        include_related: bool,
    ) -> Result<Vec<GanttChartDto>, diesel::result::Error> {
        if !include_related {
            return Ok(rows.into_iter().map(GanttChartDto::from).collect());
        }
        let project_ids: Vec<i32> = rows.iter().map(|g| g.project_id).collect();
        let parents: HashMap<i32, Project> = projects::table
            .filter(projects::id.eq_any(project_ids))
            .select(Project::as_select())
            .load(conn)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(rows
            .into_iter()
            .map(|chart| {
                let parent = parents.get(&chart.project_id).cloned();
                let dto = GanttChartDto::from(chart);
                match parent {
                    Some(project) => dto.with_project(project),
                    None => dto,
                }
            })
            .collect())
    }
}
