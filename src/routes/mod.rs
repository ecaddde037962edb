pub mod chat_ai;
pub mod chat_histories;
pub mod gantt_charts;
pub mod health;
pub mod meetings;
pub mod options;
pub mod projects;
pub mod recorded_media_files;
pub mod role_views;
pub mod tasks;
pub mod users;

use crate::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};
use serde::Deserialize;
use std::sync::Arc;

/// `?includeRelatedData=true` on list and detail endpoints.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct IncludeQuery {
    #[serde(default)]
    pub include_related_data: bool,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/Project",
            get(projects::get_projects).post(projects::create_project),
        )
        .route("/api/Project/search", post(projects::search_projects))
        .route(
            "/api/Project/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/Project/:id/status", patch(projects::update_project_status))
        .route(
            "/api/Project/:id/completion",
            patch(projects::update_project_completion),
        )
        .route("/api/MyTask", get(tasks::get_tasks).post(tasks::create_task))
        .route("/api/MyTask/search", post(tasks::search_tasks))
        .route(
            "/api/MyTask/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/Meeting",
            get(meetings::get_meetings).post(meetings::create_meeting),
        )
        .route("/api/Meeting/search", post(meetings::search_meetings))
        .route(
            "/api/Meeting/:id",
            get(meetings::get_meeting)
                .put(meetings::update_meeting)
                .delete(meetings::delete_meeting),
        )
        .route(
            "/api/GanttChart",
            get(gantt_charts::get_gantt_charts).post(gantt_charts::create_gantt_chart),
        )
        .route("/api/GanttChart/search", post(gantt_charts::search_gantt_charts))
        .route(
            "/api/GanttChart/:id",
            get(gantt_charts::get_gantt_chart)
                .put(gantt_charts::update_gantt_chart)
                .delete(gantt_charts::delete_gantt_chart),
        )
        .route(
            "/api/ChatHistory",
            get(chat_histories::get_chat_histories).post(chat_histories::create_chat_history),
        )
        .route(
            "/api/ChatHistory/search",
            post(chat_histories::search_chat_histories),
        )
        .route(
            "/api/ChatHistory/:id",
            get(chat_histories::get_chat_history)
                .put(chat_histories::update_chat_history)
                .delete(chat_histories::delete_chat_history),
        )
        .route(
            "/api/RecordedMediaFile",
            get(recorded_media_files::get_recorded_media_files)
                .post(recorded_media_files::create_recorded_media_file),
        )
        .route(
            "/api/RecordedMediaFile/search",
            post(recorded_media_files::search_recorded_media_files),
        )
        .route(
            "/api/RecordedMediaFile/upload",
            post(recorded_media_files::upload_recorded_media_file),
        )
        .route(
            "/api/RecordedMediaFile/:id",
            get(recorded_media_files::get_recorded_media_file)
                .put(recorded_media_files::update_recorded_media_file)
                .delete(recorded_media_files::delete_recorded_media_file),
        )
        .route(
            "/api/RecordedMediaFile/:id/transcribe",
            post(recorded_media_files::transcribe_recorded_media_file),
        )
        .route("/api/MyUser", get(users::get_users).post(users::create_user))
        .route("/api/MyUser/search", post(users::search_users))
        .route(
            "/api/MyUser/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/RoleView",
            get(role_views::get_role_views).post(role_views::create_role_view),
        )
        .route("/api/RoleView/search", post(role_views::search_role_views))
        .route(
            "/api/RoleView/:id",
            get(role_views::get_role_view)
                .put(role_views::update_role_view)
                .delete(role_views::delete_role_view),
        )
        .route("/api/ChatAI", post(chat_ai::post_chat_message))
        .route("/api/Options/status", get(options::get_status_options))
        .route("/api/Options/priority", get(options::get_priority_options))
        .route(
            "/api/Options/convert-status",
            get(options::get_convert_status_options),
        )
        .with_state(state)
}
