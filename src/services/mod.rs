pub mod chat_histories_service;
pub mod gantt_charts_service;
pub mod meetings_service;
pub mod options_service;
pub mod projects_service;
pub mod recorded_media_files_service;
pub mod role_views_service;
pub mod tasks_service;
pub mod transcription_service;
pub mod users_service;

pub use chat_histories_service::ChatHistoriesService;
pub use gantt_charts_service::GanttChartsService;
pub use meetings_service::MeetingsService;
pub use options_service::OptionsService;
pub use projects_service::ProjectsService;
pub use recorded_media_files_service::RecordedMediaFilesService;
pub use role_views_service::RoleViewsService;
pub use tasks_service::TasksService;
pub use transcription_service::TranscriptionService;
pub use users_service::UsersService;
