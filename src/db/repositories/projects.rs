use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;

use crate::db::enums::WorkStatus;
use crate::db::models::gantt_chart::{GanttChart, GanttChartDto};
use crate::db::models::meeting::{Meeting, MeetingDto};
use crate::db::models::project::{NewProject, Project, ProjectChanges, ProjectDto, ProjectSearch};
use crate::db::models::search::{PageRequest, ProjectSort};
use crate::db::models::task::{Task, TaskDto};
use crate::db::models::api::PagedResult;
use crate::db::repositories::meetings::MeetingsRepo;
use crate::schema::projects;

pub struct ProjectsRepo;

impl ProjectsRepo {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<ProjectDto>, diesel::result::Error> {
        let rows = projects::table
            .order((projects::updated_at.desc(), projects::id.desc()))
            .select(Project::as_select())
            .load(conn)?;
        if include_related {
            Self::with_related(conn, rows)
        } else {
            Ok(rows.into_iter().map(ProjectDto::from).collect())
        }
    }

    /// By id, `include_related` loads tasks, the gantt chart and meetings with their
    /// chat histories and recorded media files.
    pub fn get_by_id(
        conn: &mut PgConnection,
        project_id: i32,
        include_related: bool,
    ) -> Result<Option<ProjectDto>, diesel::result::Error> {
        let Some(project) = Self::find(conn, project_id)? else {
            return Ok(None);
        };
        if !include_related {
            return Ok(Some(project.into()));
        }

        let tasks = Task::belonging_to(&project)
            .select(Task::as_select())
            .order(crate::schema::tasks::start_date.asc())
            .load(conn)?;
        let gantt_chart = GanttChart::belonging_to(&project)
            .select(GanttChart::as_select())
            .first(conn)
            .optional()?;
        let meetings = Meeting::belonging_to(&project)
            .select(Meeting::as_select())
            .order(crate::schema::meetings::created_at.desc())
            .load(conn)?;
        let meetings = MeetingsRepo::with_children(conn, meetings)?;

        let mut dto = ProjectDto::from(project);
        dto.tasks = Some(tasks.into_iter().map(TaskDto::from).collect());
        dto.gantt_chart = gantt_chart.map(GanttChartDto::from);
        dto.meetings = Some(meetings);
        Ok(Some(dto))
    }

    pub fn get_paged(
        conn: &mut PgConnection,
        search: &ProjectSearch,
    ) -> Result<PagedResult<ProjectDto>, diesel::result::Error> {
        let page = &search.page;
        let total_count = Self::filtered(search).count().get_result::<i64>(conn)?;
        let rows = Self::sorted(Self::filtered(search), page)
            .limit(page.page_size())
            .offset(page.offset())
            .select(Project::as_select())
            .load(conn)?;
        let items = if page.include_related {
            Self::with_related(conn, rows)?
        } else {
            rows.into_iter().map(ProjectDto::from).collect()
        };
        Ok(PagedResult::new(
            items,
            total_count,
            page.page_index(),
            page.page_size(),
        ))
    }

    pub fn find(
        conn: &mut PgConnection,
        project_id: i32,
    ) -> Result<Option<Project>, diesel::result::Error> {
        projects::table
            .find(project_id)
            .select(Project::as_select())
            .first(conn)
            .optional()
    }

    pub fn exists(conn: &mut PgConnection, project_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::select(diesel::dsl::exists(projects::table.find(project_id))).get_result(conn)
    }

    pub fn exists_by_name(
        conn: &mut PgConnection,
        project_name: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        match exclude_id {
            Some(excluded) => diesel::select(diesel::dsl::exists(
                projects.filter(name.eq(project_name)).filter(id.ne(excluded)),
            ))
            .get_result(conn),
            None => diesel::select(diesel::dsl::exists(projects.filter(name.eq(project_name))))
                .get_result(conn),
        }
    }

    pub fn count(conn: &mut PgConnection) -> Result<i64, diesel::result::Error> {
        projects::table.count().get_result(conn)
    }

    pub fn add(
        conn: &mut PgConnection,
        new_project: &NewProject,
    ) -> Result<Project, diesel::result::Error> {
        diesel::insert_into(projects::table)
            .values(new_project)
            .get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        project_id: i32,
        changes: &ProjectChanges,
    ) -> Result<bool, diesel::result::Error> {
        diesel::update(projects::table.find(project_id))
            .set(changes)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn update_status(
        conn: &mut PgConnection,
        project_id: i32,
        new_status: WorkStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        diesel::update(projects.find(project_id))
            .set((status.eq(new_status), updated_at.eq(now)))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    /// Caller checks the 0..=100 range; the table CHECK constraint backs it up.
    pub fn update_completion_percentage(
        conn: &mut PgConnection,
        project_id: i32,
        percentage: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        diesel::update(projects.find(project_id))
            .set((completion_percentage.eq(percentage), updated_at.eq(now)))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn delete(conn: &mut PgConnection, project_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::delete(projects::table.find(project_id))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    fn filtered(search: &ProjectSearch) -> projects::BoxedQuery<'static, Pg> {
        let mut query = projects::table.into_boxed();
        if let Some(pattern) = search.page.keyword_pattern() {
            query = query.filter(
                projects::name
                    .ilike(pattern.clone())
                    .or(projects::description.assume_not_null().ilike(pattern)),
            );
        }
        if let Some(status) = search.status {
            query = query.filter(projects::status.eq(status));
        }
        if let Some(priority) = search.priority {
            query = query.filter(projects::priority.eq(priority));
        }
        if let Some(from) = search.start_date_from {
            query = query.filter(projects::start_date.ge(from));
        }
        if let Some(to) = search.start_date_to {
            query = query.filter(projects::start_date.le(to));
        }
        if let Some(min) = search.completion_min {
            query = query.filter(projects::completion_percentage.ge(min));
        }
        if let Some(max) = search.completion_max {
            query = query.filter(projects::completion_percentage.le(max));
        }
        if let Some(owner) = search.owner.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            query = query.filter(projects::owner.eq(owner.to_string()));
        }
        query
    }

    fn sorted(
        mut query: projects::BoxedQuery<'static, Pg>,
        page: &PageRequest,
    ) -> projects::BoxedQuery<'static, Pg> {
        let desc = page.sort_descending;
        if let Some(field) = page.sort_key().and_then(|k| ProjectSort::parse(&k)) {
            query = match field {
                ProjectSort::Name => sort_by!(query, projects::name, desc),
                ProjectSort::StartDate => sort_by!(query, projects::start_date, desc),
                ProjectSort::EndDate => sort_by!(query, projects::end_date, desc),
                ProjectSort::Status => sort_by!(query, projects::status, desc),
                ProjectSort::Priority => sort_by!(query, projects::priority, desc),
                ProjectSort::CompletionPercentage => {
                    sort_by!(query, projects::completion_percentage, desc)
                }
                ProjectSort::CreatedAt => sort_by!(query, projects::created_at, desc),
            };
        }
        query
            .then_order_by(projects::updated_at.desc())
            .then_order_by(projects::id.desc())
    }

    // 列表的关联数据: 任务, 甘特图, 会议 (不含会议子项)
    fn with_related(
        conn: &mut PgConnection,
        rows: Vec<Project>,
    ) -> Result<Vec<ProjectDto>, diesel::result::Error> {
        let tasks = Task::belonging_to(&rows)
            .select(Task::as_select())
            .load(conn)?
            .grouped_by(&rows);
        let charts = GanttChart::belonging_to(&rows)
            .select(GanttChart::as_select())
            .load(conn)?
            .grouped_by(&rows);
        let meetings = Meeting::belonging_to(&rows)
            .select(Meeting::as_select())
            .load(conn)?
            .grouped_by(&rows);

        Ok(rows
            .into_iter()
            .zip(tasks)
            .zip(charts)
            .zip(meetings)
            .map(|(((project, tasks), charts), meetings)| {
                let mut dto = ProjectDto::from(project);
                dto.tasks = Some(tasks.into_iter().map(TaskDto::from).collect());
                dto.gantt_chart = charts.into_iter().next().map(GanttChartDto::from);
                dto.meetings = Some(meetings.into_iter().map(MeetingDto::from).collect());
                dto
            })
            .collect())
    }
}
