use crate::{
    AppState,
    db::models::api::ApiResponse,
    db::models::recorded_media_file::{
        RecordedMediaFileDto, RecordedMediaFileRequest, RecordedMediaFileSearch,
    },
    error::AppError,
    routes::IncludeQuery,
    services::{RecordedMediaFilesService, TranscriptionService},
    validation::{JsonBody, ValidatedJson, media::validate_upload_file_name},
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
    response::IntoResponse,
};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub async fn get_recorded_media_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let items = RecordedMediaFilesService::get_all(&mut conn, query.include_related_data)?;
    let response = ApiResponse::success(items, "Recorded media files retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_recorded_media_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i32>,
    Query(query): Query<IncludeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = RecordedMediaFilesService::get_by_id(&mut conn, file_id, query.include_related_data)?;
    let response = ApiResponse::success(item, "Recorded media file retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn search_recorded_media_files(
    State(state): State<Arc<AppState>>,
    JsonBody(search): JsonBody<RecordedMediaFileSearch>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let page = RecordedMediaFilesService::search(&mut conn, &search)?;
    let response = ApiResponse::success(page, "Recorded media files retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_recorded_media_file(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RecordedMediaFileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = RecordedMediaFilesService::create(&mut conn, payload)?;
    let response = ApiResponse::created(item, "Recorded media file created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_recorded_media_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<RecordedMediaFileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let item = RecordedMediaFilesService::update(&mut conn, file_id, payload)?;
    let response = ApiResponse::success(item, "Recorded media file updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_recorded_media_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    RecordedMediaFilesService::delete(&mut conn, file_id)?;
    let response = ApiResponse::<()>::ok("Recorded media file deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}

/// multipart/form-data with `meetingId`, an optional `name` and the `file` itself.
/// The file is streamed to the upload directory under a generated name. When
/// `meetingId` comes before `file`, the meeting and name are checked before
/// anything is written.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_recorded_media_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut meeting_id: Option<i32> = None;
    let mut name: Option<String> = None;
    let mut upload: Option<StoredUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "meetingId" => {
                let text = field.text().await.map_err(multipart_error)?;
                let id = text
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| AppError::validation("meetingId must be an integer"))?;
                meeting_id = Some(id);
            }
            "name" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    name = Some(text.trim().to_string());
                }
            }
            "file" => {
                if let Some(id) = meeting_id {
                    let default_name = field.file_name().map(file_stem).unwrap_or_default();
                    let name = name.clone().unwrap_or(default_name);
                    let mut conn = state.db.get()?;
                    RecordedMediaFilesService::ensure_can_register(&mut conn, id, &name)?;
                }
                if let Some(previous) = upload.take() {
                    previous.discard().await;
                }
                upload = Some(StoredUpload::save(field, &state.config.upload_dir).await?);
            }
            other => debug!(field = other, "Ignoring multipart field"),
        }
    }

    let upload = upload.ok_or_else(|| AppError::validation("No file uploaded"))?;
    let registered = register(&state, meeting_id, name, &upload);
    if registered.is_err() {
        upload.discard().await;
    }
    let file = registered?;

    let response = ApiResponse::created(file, "Recorded media file uploaded successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

fn register(
    state: &AppState,
    meeting_id: Option<i32>,
    name: Option<String>,
    upload: &StoredUpload,
) -> Result<RecordedMediaFileDto, AppError> {
    let meeting_id = meeting_id.ok_or_else(|| AppError::validation("meetingId is required"))?;
    let name = name.unwrap_or_else(|| upload.stem());
    let mut conn = state.db.get()?;
    RecordedMediaFilesService::ensure_can_register(&mut conn, meeting_id, &name)?;
    RecordedMediaFilesService::register_upload(
        &mut conn,
        meeting_id,
        &name,
        &upload.file_name,
        &upload.save_file_name,
    )
}

/// Starts transcription in the background and answers 202 with the file in `Converting`.
pub async fn transcribe_recorded_media_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let file = TranscriptionService::start(&state, file_id)?;
    let response = ApiResponse::accepted(file, "Transcription started");
    Ok((StatusCode::ACCEPTED, Json(response)))
}

struct StoredUpload {
    file_name: String,
    save_file_name: String,
    path: PathBuf,
}

impl StoredUpload {
    async fn save(mut field: Field<'_>, dir: &FsPath) -> Result<Self, AppError> {
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::validation("File name is required"))?;
        let extension = validate_upload_file_name(&file_name)?;
        let file_name = FsPath::new(file_name.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_name.as_str())
            .to_string();

        let save_file_name = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        let path = dir.join(&save_file_name);
        let stored = Self {
            file_name,
            save_file_name,
            path,
        };

        let written = stored.write(&mut field).await;
        match written {
            Ok(bytes) => {
                debug!(file = %stored.file_name, bytes, "Upload stored");
                Ok(stored)
            }
            Err(e) => {
                stored.discard().await;
                Err(e)
            }
        }
    }

    async fn write(&self, field: &mut Field<'_>) -> Result<u64, AppError> {
        let mut out = tokio::fs::File::create(&self.path).await?;
        let mut total = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            out.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        out.flush().await?;
        if total == 0 {
            return Err(AppError::validation("Uploaded file is empty"));
        }
        Ok(total)
    }

    fn stem(&self) -> String {
        file_stem(&self.file_name)
    }

    async fn discard(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!(path = %self.path.display(), error = %e, "Failed to remove upload");
        }
    }
}

fn file_stem(file_name: &str) -> String {
    FsPath::new(file_name.trim())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recording")
        .to_string()
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::validation(format!("Invalid multipart body: {}", err))
}
