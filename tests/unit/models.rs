// Request deserialization and validation rules; nothing here touches the database

use project_assistant::db::enums::{ConvertStatus, Priority, WorkStatus};
use project_assistant::db::models::{
    GanttChartRequest, MeetingRequest, ProjectRequest, TaskRequest, UserRequest,
};
use serde_json::json;
use validator::Validate;

#[test]
fn project_request_defaults_and_date_order() {
    let req: ProjectRequest = serde_json::from_value(json!({
        "name": "Rollout",
        "startDate": "2024-05-01",
        "endDate": "2024-05-01"
    }))
    .unwrap();
    assert!(req.validate().is_ok());
    assert_eq!(req.status, WorkStatus::NotStarted);
    assert_eq!(req.priority, Priority::default());
    assert_eq!(req.completion_percentage, 0);
    assert!(req.id.is_none());

    let req: ProjectRequest = serde_json::from_value(json!({
        "name": "Rollout",
        "startDate": "2024-05-02",
        "endDate": "2024-05-01"
    }))
    .unwrap();
    assert!(req.validate().is_err());
}

#[test]
fn project_name_and_completion_rules() {
    let blank: ProjectRequest = serde_json::from_value(json!({
        "name": "   ",
        "startDate": "2024-05-01",
        "endDate": "2024-05-03"
    }))
    .unwrap();
    assert!(blank.validate().is_err());

    let over: ProjectRequest = serde_json::from_value(json!({
        "name": "Rollout",
        "startDate": "2024-05-01",
        "endDate": "2024-05-03",
        "completionPercentage": 101
    }))
    .unwrap();
    assert!(over.validate().is_err());
}

#[test]
fn status_values_use_snake_case() {
    let req: ProjectRequest = serde_json::from_value(json!({
        "name": "Rollout",
        "startDate": "2024-05-01",
        "endDate": "2024-05-03",
        "status": "in_progress"
    }))
    .unwrap();
    assert_eq!(req.status, WorkStatus::InProgress);

    let bad = serde_json::from_value::<ProjectRequest>(json!({
        "name": "Rollout",
        "startDate": "2024-05-01",
        "endDate": "2024-05-03",
        "status": "someday"
    }));
    assert!(bad.is_err());
    assert_eq!(ConvertStatus::default(), ConvertStatus::Pending);
}

#[test]
fn task_requires_a_project() {
    let req: TaskRequest = serde_json::from_value(json!({
        "projectId": 0,
        "name": "Draft plan",
        "startDate": "2024-05-01",
        "endDate": "2024-05-02"
    }))
    .unwrap();
    assert!(req.validate().is_err());

    let req: TaskRequest = serde_json::from_value(json!({
        "projectId": 7,
        "name": "Draft plan",
        "startDate": "2024-05-01",
        "endDate": "2024-05-02"
    }))
    .unwrap();
    assert!(req.validate().is_ok());
    assert_eq!(req.owner, "");
}

#[test]
fn meeting_and_chart_requests() {
    let meeting: MeetingRequest = serde_json::from_value(json!({
        "projectId": 1,
        "name": "Kickoff",
        "participants": "Lin, Chen"
    }))
    .unwrap();
    assert!(meeting.validate().is_ok());
    assert_eq!(meeting.participants.as_deref(), Some("Lin, Chen"));

    let orphan: MeetingRequest =
        serde_json::from_value(json!({"projectId": 0, "name": "Kickoff"})).unwrap();
    assert!(orphan.validate().is_err());

    let chart: GanttChartRequest =
        serde_json::from_value(json!({"projectId": 3, "content": "{\"tasks\":[]}"})).unwrap();
    assert!(chart.validate().is_ok());
    assert!(chart.id.is_none());
}

#[test]
fn user_password_handling() {
    let req: UserRequest = serde_json::from_value(json!({
        "account": "lin",
        "name": "Lin",
        "password": "  "
    }))
    .unwrap();
    assert!(req.new_password().is_none());
    assert!(req.status);
    assert_eq!(req.role_json, "[]");
    assert!(req.role_view_ids.is_empty());

    let req: UserRequest = serde_json::from_value(json!({
        "account": "lin",
        "name": "Lin",
        "password": "s3cret-pass",
        "email": "not-an-email"
    }))
    .unwrap();
    assert_eq!(req.new_password(), Some("s3cret-pass"));
    assert!(req.validate().is_err());
}
