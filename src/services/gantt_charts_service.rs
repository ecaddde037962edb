use chrono::Utc;
use diesel::prelude::*;

use crate::{
    db::models::api::{PagedResult, error_codes},
    db::models::gantt_chart::{GanttChartDto, GanttChartRequest, GanttChartSearch},
    db::repositories::{gantt_charts::GanttChartsRepo, projects::ProjectsRepo},
    error::AppError,
    validation::request::ensure_route_id,
};

pub struct GanttChartsService;

impl GanttChartsService {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<GanttChartDto>, AppError> {
        Ok(GanttChartsRepo::get_all(conn, include_related)?)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        chart_id: i32,
        include_related: bool,
    ) -> Result<GanttChartDto, AppError> {
        GanttChartsRepo::get_by_id(conn, chart_id, include_related)?
            .ok_or_else(|| AppError::not_found("Gantt chart"))
    }

    pub fn search(
        conn: &mut PgConnection,
        search: &GanttChartSearch,
    ) -> Result<PagedResult<GanttChartDto>, AppError> {
        Ok(GanttChartsRepo::get_paged(conn, search)?)
    }

    pub fn create(
        conn: &mut PgConnection,
        req: GanttChartRequest,
    ) -> Result<GanttChartDto, AppError> {
        Self::ensure_project(conn, req.project_id)?;
        Self::ensure_single_chart(conn, req.project_id, None)?;
        let chart = GanttChartsRepo::add(conn, &req.into_new(Utc::now()))?;
        Ok(chart.into())
    }

    pub fn update(
        conn: &mut PgConnection,
        chart_id: i32,
        req: GanttChartRequest,
    ) -> Result<GanttChartDto, AppError> {
        ensure_route_id(chart_id, req.id)?;
        Self::ensure_project(conn, req.project_id)?;
        Self::ensure_single_chart(conn, req.project_id, Some(chart_id))?;
        if !GanttChartsRepo::update(conn, chart_id, &req.into_changes(Utc::now()))? {
            return Err(AppError::not_found("Gantt chart"));
        }
        Self::get_by_id(conn, chart_id, false)
    }

    pub fn delete(conn: &mut PgConnection, chart_id: i32) -> Result<(), AppError> {
        let deleted = GanttChartsRepo::delete(conn, chart_id)
            .map_err(|e| AppError::from_delete(e, "Gantt chart"))?;
        if !deleted {
            return Err(AppError::not_found("Gantt chart"));
        }
        Ok(())
    }

    fn ensure_project(conn: &mut PgConnection, project_id: i32) -> Result<(), AppError> {
        if !ProjectsRepo::exists(conn, project_id)? {
            return Err(AppError::not_found("Project"));
        }
        Ok(())
    }

    // 每个项目只有一个甘特图
    fn ensure_single_chart(
        conn: &mut PgConnection,
        project_id: i32,
        exclude_id: Option<i32>,
    ) -> Result<(), AppError> {
        if GanttChartsRepo::exists_for_project(conn, project_id, exclude_id)? {
            return Err(AppError::conflict_with_code(
                "Project already has a gantt chart",
                Some("projectId".to_string()),
                error_codes::GANTT_CHART_EXISTS,
            ));
        }
        Ok(())
    }
}
