use diesel::pg::Pg;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::db::models::api::PagedResult;
use crate::db::models::project::Project;
use crate::db::models::search::{PageRequest, TaskSort};
use crate::db::models::task::{NewTask, Task, TaskChanges, TaskDto, TaskSearch};
use crate::schema::{projects, tasks};

pub struct TasksRepo;

impl TasksRepo {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<TaskDto>, diesel::result::Error> {
        let rows = tasks::table
            .order((tasks::updated_at.desc(), tasks::id.desc()))
            .select(Task::as_select())
            .load(conn)?;
        Self::to_dtos(conn, rows, include_related)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        task_id: i32,
        include_related: bool,
    ) -> Result<Option<TaskDto>, diesel::result::Error> {
        let task = tasks::table
            .find(task_id)
            .select(Task::as_select())
            .first(conn)
            .optional()?;
        match task {
            Some(task) => Ok(Self::to_dtos(conn, vec![task], include_related)?.pop()),
            None => Ok(None),
        }
    }

    pub fn get_paged(
        conn: &mut PgConnection,
        search: &TaskSearch,
    ) -> Result<PagedResult<TaskDto>, diesel::result::Error> {
        let page = &search.page;
        let total_count = Self::filtered(search).count().get_result::<i64>(conn)?;
        let rows = Self::sorted(Self::filtered(search), page)
            .limit(page.page_size())
            .offset(page.offset())
            .select(Task::as_select())
            .load(conn)?;
        Ok(PagedResult::new(
            Self::to_dtos(conn, rows, page.include_related)?,
            total_count,
            page.page_index(),
            page.page_size(),
        ))
    }

    pub fn exists_by_name(
        conn: &mut PgConnection,
        task_name: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::tasks::dsl::*;
        match exclude_id {
            Some(excluded) => diesel::select(diesel::dsl::exists(
                tasks.filter(name.eq(task_name)).filter(id.ne(excluded)),
            ))
            .get_result(conn),
            None => diesel::select(diesel::dsl::exists(tasks.filter(name.eq(task_name))))
                .get_result(conn),
        }
    }

    pub fn add(conn: &mut PgConnection, new_task: &NewTask) -> Result<Task, diesel::result::Error> {
        diesel::insert_into(tasks::table)
            .values(new_task)
            .get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        task_id: i32,
        changes: &TaskChanges,
    ) -> Result<bool, diesel::result::Error> {
        diesel::update(tasks::table.find(task_id))
            .set(changes)
            .execute(conn)
            .map(|rows| rows > 0)
    }

    pub fn delete(conn: &mut PgConnection, task_id: i32) -> Result<bool, diesel::result::Error> {
        diesel::delete(tasks::table.find(task_id))
            .execute(conn)
            .map(|rows| rows > 0)
    }

    fn filtered(search: &TaskSearch) -> tasks::BoxedQuery<'static, Pg> {
        let mut query = tasks::table.into_boxed();
        if let Some(project_id) = search.project_id {
            query = query.filter(tasks::project_id.eq(project_id));
        }
        if let Some(pattern) = search.page.keyword_pattern() {
            query = query.filter(
                tasks::name
                    .ilike(pattern.clone())
                    .or(tasks::description.assume_not_null().ilike(pattern)),
            );
        }
        if let Some(category) = search.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            query = query.filter(tasks::category.eq(category.to_string()));
        }
        if let Some(status) = search.status {
            query = query.filter(tasks::status.eq(status));
        }
        if let Some(priority) = search.priority {
            query = query.filter(tasks::priority.eq(priority));
        }
        if let Some(from) = search.start_date_from {
            query = query.filter(tasks::start_date.ge(from));
        }
        if let Some(to) = search.start_date_to {
            query = query.filter(tasks::start_date.le(to));
        }
        if let Some(min) = search.completion_min {
            query = query.filter(tasks::completion_percentage.ge(min));
        }
        if let Some(max) = search.completion_max {
            query = query.filter(tasks::completion_percentage.le(max));
        }
        if let Some(owner) = search.owner.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            query = query.filter(tasks::owner.eq(owner.to_string()));
        }
        query
    }

    fn sorted(
        mut query: tasks::BoxedQuery<'static, Pg>,
        page: &PageRequest,
    ) -> tasks::BoxedQuery<'static, Pg> {
        let desc = page.sort_descending;
        if let Some(field) = page.sort_key().and_then(|k| TaskSort::parse(&k)) {
            query = match field {
                TaskSort::Name => sort_by!(query, tasks::name, desc),
                TaskSort::StartDate => sort_by!(query, tasks::start_date, desc),
                TaskSort::EndDate => sort_by!(query, tasks::end_date, desc),
                TaskSort::Status => sort_by!(query, tasks::status, desc),
                TaskSort::Priority => sort_by!(query, tasks::priority, desc),
                TaskSort::CompletionPercentage => {
                    sort_by!(query, tasks::completion_percentage, desc)
                }
                TaskSort::CreatedAt => sort_by!(query, tasks::created_at, desc),
            };
        }
        query
            .then_order_by(tasks::updated_at.desc())
            .then_order_by(tasks::id.desc())
    }

    fn to_dtos(
        conn: &mut PgConnection,
        rows: Vec<Task>,
        include_related: bool,
    ) -> Result<Vec<TaskDto>, diesel::result::Error> {
        if !include_related {
            return Ok(rows.into_iter().map(TaskDto::from).collect());
        }
        let project_ids: Vec<i32> = rows.iter().map(|t| t.project_id).collect();
        let parents: HashMap<i32, Project> = projects::table
            .filter(projects::id.eq_any(project_ids))
            .select(Project::as_select())
            .load(conn)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(rows
            .into_iter()
            .map(|task| {
                let parent = parents.get(&task.project_id).cloned();
                let dto = TaskDto::from(task);
                match parent {
                    Some(project) => dto.with_project(project),
                    None => dto,
                }
            })
            .collect())
    }
}
