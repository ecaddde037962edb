// Applies an allow-listed column ordering to a boxed query.
macro_rules! sort_by {
    ($query:expr, $column:expr, $descending:expr) => {
        if $descending {
            $query.order($column.desc())
        } else {
            $query.order($column.asc())
        }
    };
}

pub mod chat_histories;
pub mod gantt_charts;
pub mod meetings;
pub mod projects;
pub mod recorded_media_files;
pub mod role_views;
pub mod tasks;
pub mod users;

pub use chat_histories::ChatHistoriesRepo;
pub use gantt_charts::GanttChartsRepo;
pub use meetings::MeetingsRepo;
pub use projects::ProjectsRepo;
pub use recorded_media_files::RecordedMediaFilesRepo;
pub use role_views::RoleViewsRepo;
pub use tasks::TasksRepo;
pub use users::UsersRepo;
