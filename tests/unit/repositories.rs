// Repository properties against a migrated database; each test runs inside a rolled-back transaction

use chrono::{Duration, Utc};
use diesel::{Connection, PgConnection};
use project_assistant::db::enums::ConvertStatus;
use project_assistant::db::models::search::PageRequest;
use project_assistant::db::models::{
    MeetingRequest, NewRecordedMediaFile, ProjectDto, ProjectRequest, ProjectSearch, TaskRequest,
};
use project_assistant::db::repositories::{
    MeetingsRepo, ProjectsRepo, RecordedMediaFilesRepo, TasksRepo,
};
use project_assistant::services::recorded_media_files_service::INTERRUPTED_MESSAGE;
use serde_json::json;

fn connect() -> PgConnection {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    PgConnection::establish(&url).expect("failed to connect")
}

fn ids(items: &[ProjectDto]) -> Vec<i32> {
    items.iter().map(|p| p.id).collect()
}

fn project(name: &str) -> ProjectRequest {
    serde_json::from_value(json!({
        "name": name,
        "description": "repository test",
        "startDate": "2024-05-01",
        "endDate": "2024-06-01"
    }))
    .unwrap()
}

#[test]
#[ignore = "requires database"]
fn add_and_update_timestamps() {
    connect().test_transaction::<_, diesel::result::Error, _>(|conn| {
        let now = Utc::now();
        let added = ProjectsRepo::add(conn, &project("Alpha").into_new(now))?;
        assert_eq!(added.created_at, added.updated_at);

        let later = now + Duration::seconds(5);
        let mut changed = project("Alpha renamed");
        changed.completion_percentage = 30;
        assert!(ProjectsRepo::update(conn, added.id, &changed.into_changes(later))?);

        let stored = ProjectsRepo::find(conn, added.id)?.unwrap();
        assert_eq!(stored.created_at, added.created_at);
        assert!(stored.updated_at > added.updated_at);
        assert_eq!(stored.name, "Alpha renamed");

        assert!(!ProjectsRepo::update(conn, -1, &project("x").into_changes(later))?);
        Ok(())
    });
}

#[test]
#[ignore = "requires database"]
fn exists_by_name_excludes_own_row() {
    connect().test_transaction::<_, diesel::result::Error, _>(|conn| {
        let added = ProjectsRepo::add(conn, &project("Unique Alpha").into_new(Utc::now()))?;
        assert!(ProjectsRepo::exists_by_name(conn, "Unique Alpha", None)?);
        assert!(!ProjectsRepo::exists_by_name(conn, "Unique Alpha", Some(added.id))?);
        Ok(())
    });
}

#[test]
#[ignore = "requires database"]
fn delete_is_restricted_by_children() {
    connect().test_transaction::<_, diesel::result::Error, _>(|conn| {
        let now = Utc::now();
        let parent = ProjectsRepo::add(conn, &project("Parent").into_new(now))?;
        let task: TaskRequest = serde_json::from_value(json!({
            "projectId": parent.id,
            "name": "Child task",
            "startDate": "2024-05-01",
            "endDate": "2024-05-02"
        }))
        .unwrap();
        TasksRepo::add(conn, &task.into_new(now))?;

        // 子表存在时删除失败, 事务内需要 savepoint
        let attempt = conn.transaction(|c| ProjectsRepo::delete(c, parent.id));
        assert!(attempt.is_err());
        assert!(ProjectsRepo::find(conn, parent.id)?.is_some());
        Ok(())
    });
}

#[test]
#[ignore = "requires database"]
fn paging_counts_before_slicing() {
    connect().test_transaction::<_, diesel::result::Error, _>(|conn| {
        let before = ProjectsRepo::count(conn)?;
        let now = Utc::now();
        for i in 0..3 {
            ProjectsRepo::add(conn, &project(&format!("Paging sample {}", i)).into_new(now))?;
        }
        assert_eq!(ProjectsRepo::count(conn)?, before + 3);

        let search = ProjectSearch {
            page: PageRequest {
                page_size: Some(2),
                keyword: Some("paging sample".to_string()),
                sort_by: Some("not_a_column".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let page = ProjectsRepo::get_paged(conn, &search)?;
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 2);

        // 未知排序字段等同于默认排序
        let default_order = ProjectSearch {
            page: PageRequest {
                page_size: Some(2),
                keyword: Some("paging sample".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let expected = ProjectsRepo::get_paged(conn, &default_order)?;
        assert_eq!(ids(&page.items), ids(&expected.items));
        Ok(())
    });
}

#[test]
#[ignore = "requires database"]
fn running_transcriptions_are_failed_on_restart() {
    connect().test_transaction::<_, diesel::result::Error, _>(|conn| {
        let now = Utc::now();
        let parent = ProjectsRepo::add(conn, &project("Restart project").into_new(now))?;
        let meeting: MeetingRequest = serde_json::from_value(json!({
            "projectId": parent.id,
            "name": "Restart meeting"
        }))
        .unwrap();
        let meeting = MeetingsRepo::add(conn, &meeting.into_new(now))?;

        let mut ids = Vec::new();
        for (i, status) in [
            ConvertStatus::Pending,
            ConvertStatus::Converting,
            ConvertStatus::Transcribing,
            ConvertStatus::Completed,
        ]
        .into_iter()
        .enumerate()
        {
            let file = RecordedMediaFilesRepo::add(
                conn,
                &NewRecordedMediaFile {
                    meeting_id: meeting.id,
                    name: format!("Restart recording {}", i),
                    file_name: format!("recording-{}.wav", i),
                    save_file_name: format!("saved-{}.wav", i),
                    status,
                    content: None,
                    message: None,
                    created_at: now,
                    updated_at: now,
                },
            )?;
            ids.push(file.id);
        }

        assert!(RecordedMediaFilesRepo::fail_running(conn, INTERRUPTED_MESSAGE)? >= 2);
        let statuses = ids
            .iter()
            .map(|&id| RecordedMediaFilesRepo::find(conn, id).map(Option::unwrap))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(statuses[0].status, ConvertStatus::Pending);
        assert_eq!(statuses[1].status, ConvertStatus::Failed);
        assert_eq!(statuses[1].message.as_deref(), Some(INTERRUPTED_MESSAGE));
        assert_eq!(statuses[2].status, ConvertStatus::Failed);
        assert_eq!(statuses[3].status, ConvertStatus::Completed);

        // 失败的文件可以重新开始转写
        assert!(RecordedMediaFilesRepo::try_start_conversion(conn, ids[1])?);
        assert_eq!(RecordedMediaFilesRepo::fail_running(conn, INTERRUPTED_MESSAGE)?, 1);
        Ok(())
    });
}
