use chrono::Utc;
use diesel::prelude::*;
use tracing::{info, warn};

use crate::{
    db::enums::ConvertStatus,
    db::models::api::{PagedResult, error_codes},
    db::models::recorded_media_file::{
        NewRecordedMediaFile, RecordedMediaFile, RecordedMediaFileDto, RecordedMediaFileRequest,
        RecordedMediaFileSearch,
    },
    db::repositories::{meetings::MeetingsRepo, recorded_media_files::RecordedMediaFilesRepo},
    error::AppError,
    validation::request::ensure_route_id,
};

pub const INTERRUPTED_MESSAGE: &str = "Interrupted by server restart";

pub struct RecordedMediaFilesService;

impl RecordedMediaFilesService {
    pub fn get_all(
        conn: &mut PgConnection,
        include_related: bool,
    ) -> Result<Vec<RecordedMediaFileDto>, AppError> {
        Ok(RecordedMediaFilesRepo::get_all(conn, include_related)?)
    }

    pub fn get_by_id(
        conn: &mut PgConnection,
        file_id: i32,
        include_related: bool,
    ) -> Result<RecordedMediaFileDto, AppError> {
        RecordedMediaFilesRepo::get_by_id(conn, file_id, include_related)?
            .ok_or_else(|| AppError::not_found("Recorded media file"))
    }

    pub fn search(
        conn: &mut PgConnection,
        search: &RecordedMediaFileSearch,
    ) -> Result<PagedResult<RecordedMediaFileDto>, AppError> {
        Ok(RecordedMediaFilesRepo::get_paged(conn, search)?)
    }

    pub fn create(
        conn: &mut PgConnection,
        req: RecordedMediaFileRequest,
    ) -> Result<RecordedMediaFileDto, AppError> {
        Self::ensure_can_register(conn, req.meeting_id, &req.name)?;
        let file = RecordedMediaFilesRepo::add(conn, &req.into_new(Utc::now()))?;
        Ok(file.into())
    }

    pub fn update(
        conn: &mut PgConnection,
        file_id: i32,
        req: RecordedMediaFileRequest,
    ) -> Result<RecordedMediaFileDto, AppError> {
        ensure_route_id(file_id, req.id)?;
        Self::ensure_meeting(conn, req.meeting_id)?;
        Self::ensure_unique_name(conn, &req.name, Some(file_id))?;
        if !RecordedMediaFilesRepo::update(conn, file_id, &req.into_changes(Utc::now()))? {
            return Err(AppError::not_found("Recorded media file"));
        }
        Self::get_by_id(conn, file_id, false)
    }

    pub fn delete(conn: &mut PgConnection, file_id: i32) -> Result<(), AppError> {
        let deleted = RecordedMediaFilesRepo::delete(conn, file_id)
            .map_err(|e| AppError::from_delete(e, "Recorded media file"))?;
        if !deleted {
            return Err(AppError::not_found("Recorded media file"));
        }
        Ok(())
    }

    /// Meeting must exist and the name must be free. The upload handler runs this
    /// before streaming when `meetingId` is already known, and again before the
    /// row is inserted.
    pub fn ensure_can_register(
        conn: &mut PgConnection,
        meeting_id: i32,
        name: &str,
    ) -> Result<(), AppError> {
        Self::ensure_meeting(conn, meeting_id)?;
        Self::ensure_unique_name(conn, name, None)
    }

    pub fn register_upload(
        conn: &mut PgConnection,
        meeting_id: i32,
        name: &str,
        file_name: &str,
        save_file_name: &str,
    ) -> Result<RecordedMediaFileDto, AppError> {
        let now = Utc::now();
        let file = RecordedMediaFilesRepo::add(
            conn,
            &NewRecordedMediaFile {
                meeting_id,
                name: name.trim().to_string(),
                file_name: file_name.to_string(),
                save_file_name: save_file_name.to_string(),
                status: ConvertStatus::Pending,
                content: None,
                message: None,
                created_at: now,
                updated_at: now,
            },
        )?;
        info!(file_id = file.id, meeting_id, save_file_name, "Recorded media file registered");
        Ok(file.into())
    }

    /// Marks the file `Converting`; fails with 409 while another job holds it.
    pub fn begin_transcription(
        conn: &mut PgConnection,
        file_id: i32,
    ) -> Result<RecordedMediaFile, AppError> {
        if RecordedMediaFilesRepo::find(conn, file_id)?.is_none() {
            return Err(AppError::not_found("Recorded media file"));
        }
        if !RecordedMediaFilesRepo::try_start_conversion(conn, file_id)? {
            return Err(AppError::conflict_with_code(
                "Transcription is already running for this file",
                None,
                error_codes::TRANSCRIPTION_RUNNING,
            ));
        }
        RecordedMediaFilesRepo::find(conn, file_id)?
            .ok_or_else(|| AppError::not_found("Recorded media file"))
    }

    pub fn mark_transcribing(conn: &mut PgConnection, file_id: i32) -> Result<(), AppError> {
        RecordedMediaFilesRepo::set_progress(conn, file_id, ConvertStatus::Transcribing, None, None)?;
        Ok(())
    }

    pub fn mark_completed(
        conn: &mut PgConnection,
        file_id: i32,
        transcript: String,
    ) -> Result<(), AppError> {
        RecordedMediaFilesRepo::set_progress(
            conn,
            file_id,
            ConvertStatus::Completed,
            Some(transcript),
            Some("Transcription completed".to_string()),
        )?;
        info!(file_id, "Transcription stored");
        Ok(())
    }

    /// Jobs do not survive a restart, so files left running are marked `Failed`
    /// and can be transcribed again.
    pub fn reset_interrupted(conn: &mut PgConnection) -> Result<usize, AppError> {
        let reset = RecordedMediaFilesRepo::fail_running(conn, INTERRUPTED_MESSAGE)?;
        if reset > 0 {
            warn!(count = reset, "Reset interrupted transcriptions");
        }
        Ok(reset)
    }

    pub fn mark_failed(
        conn: &mut PgConnection,
        file_id: i32,
        reason: &str,
    ) -> Result<(), AppError> {
        warn!(file_id, reason, "Transcription failed");
        RecordedMediaFilesRepo::set_progress(
            conn,
            file_id,
            ConvertStatus::Failed,
            None,
            Some(reason.to_string()),
        )?;
        Ok(())
    }

    fn ensure_meeting(conn: &mut PgConnection, meeting_id: i32) -> Result<(), AppError> {
        if !MeetingsRepo::exists(conn, meeting_id)? {
            return Err(AppError::not_found("Meeting"));
        }
        Ok(())
    }

    fn ensure_unique_name(
        conn: &mut PgConnection,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), AppError> {
        if RecordedMediaFilesRepo::exists_by_name(conn, name.trim(), exclude_id)? {
            return Err(AppError::conflict_with_code(
                format!("Recorded media file name '{}' already exists", name.trim()),
                Some("name".to_string()),
                error_codes::NAME_EXISTS,
            ));
        }
        Ok(())
    }
}
