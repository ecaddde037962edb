// Sub-modules organized by functional domain
pub mod api;
pub mod chat_history;
pub mod gantt_chart;
pub mod meeting;
pub mod project;
pub mod recorded_media_file;
pub mod search;
pub mod task;
pub mod user;

// API response structures
pub use api::*;

pub use chat_history::*;
pub use gantt_chart::*;
pub use meeting::*;
pub use project::*;
pub use recorded_media_file::*;
pub use search::*;
pub use task::*;
pub use user::*;
