pub mod media;
pub mod request;

use axum::{
    async_trait,
    extract::FromRequest,
    http::Request,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::{db::models::api::ErrorDetail, error::AppError};

/// 验证的 JSON 提取器
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S, axum::body::Body> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(format!("Invalid JSON body: {}", rejection)))?;

        value.validate().map_err(into_app_error)?;

        Ok(ValidatedJson(value))
    }
}

/// JSON body without field rules; rejections still use the response envelope.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S, axum::body::Body> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(format!("Invalid JSON body: {}", rejection)))?;
        Ok(JsonBody(value))
    }
}

/// Flattens validator output into the envelope's `errors` list.
pub fn error_details(errors: &ValidationErrors) -> Vec<ErrorDetail> {
    let mut details: Vec<ErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| ErrorDetail {
                field: Some(field.to_string()),
                code: error.code.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation failed for field: {}", field)),
            })
        })
        .collect();
    // HashMap 顺序不稳定
    details.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
    details
}

pub fn into_app_error(errors: ValidationErrors) -> AppError {
    let details = error_details(&errors);
    AppError::Validation {
        message: format!("Validation failed with {} errors", details.len()),
        errors: details,
    }
}

/// 常用验证规则
pub mod rules {
    use chrono::NaiveDate;
    use std::borrow::Cow;
    use validator::ValidationError;

    fn error(code: &'static str, message: &'static str) -> ValidationError {
        let mut error = ValidationError::new(code);
        error.message = Some(Cow::Borrowed(message));
        error
    }

    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(error("required", "Value is required"));
        }
        Ok(())
    }

    /// 结束日期不能早于开始日期
    pub fn date_order(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
        if end < start {
            return Err(error("date_order", "End date must not be before start date"));
        }
        Ok(())
    }

    pub fn json_text(value: &str) -> Result<(), ValidationError> {
        serde_json::from_str::<serde_json::Value>(value)
            .map(|_| ())
            .map_err(|_| error("invalid_json", "Value must be valid JSON"))
    }

    pub fn optional_password(value: &str) -> Result<(), ValidationError> {
        let len = value.trim().chars().count();
        if len == 0 {
            return Ok(());
        }
        if !(6..=128).contains(&len) {
            return Err(error("password_length", "Password must be 6 to 128 characters"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;
    use chrono::NaiveDate;

    #[test]
    fn not_blank_rejects_whitespace() {
        assert!(not_blank("Alpha").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn date_order_allows_same_day() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let later = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert!(date_order(d, d).is_ok());
        assert!(date_order(d, later).is_ok());
        assert!(date_order(later, d).is_err());
    }

    #[test]
    fn json_text_checks_syntax() {
        assert!(json_text(r#"{"menus":["project"]}"#).is_ok());
        assert!(json_text("[]").is_ok());
        assert!(json_text("{menus:").is_err());
    }

    #[test]
    fn optional_password_rules() {
        assert!(optional_password("").is_ok());
        assert!(optional_password("secret1").is_ok());
        assert!(optional_password("abc").is_err());
    }
}
