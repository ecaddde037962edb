use serde::Serialize;

// 统一API响应结构
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
    pub timestamp: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: String,
    pub message: String,
}

// 便捷构造函数
impl<T> ApiResponse<T> {
    fn build(success: bool, status_code: u16, message: &str, data: Option<T>) -> Self {
        Self {
            success,
            status_code,
            message: message.to_string(),
            data,
            error_message: None,
            error_detail: None,
            errors: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn success(data: T, message: &str) -> Self {
        Self::build(true, 200, message, Some(data))
    }

    pub fn created(data: T, message: &str) -> Self {
        Self::build(true, 201, message, Some(data))
    }

    pub fn accepted(data: T, message: &str) -> Self {
        Self::build(true, 202, message, Some(data))
    }

    pub fn ok(message: &str) -> Self {
        Self::build(true, 200, message, None)
    }

    pub fn error(status_code: u16, message: &str, error_code: &str) -> Self {
        let mut response = Self::build(false, status_code, message, None);
        response.error_message = Some(message.to_string());
        response.errors = Some(vec![ErrorDetail {
            field: None,
            code: error_code.to_string(),
            message: message.to_string(),
        }]);
        response
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.error_detail = Some(detail.into());
        self
    }

    pub fn validation_error(message: &str, errors: Vec<ErrorDetail>) -> Self {
        let mut response = Self::build(false, 400, "Validation failed", None);
        response.error_message = Some(message.to_string());
        response.errors = Some(errors);
        response
    }

    pub fn bad_request(message: &str) -> Self {
        Self::error(400, message, error_codes::BAD_REQUEST)
    }

    pub fn not_found(message: &str) -> Self {
        Self::error(404, message, error_codes::NOT_FOUND)
    }

    pub fn conflict(message: &str, field: Option<String>, error_code: &str) -> Self {
        let mut response = Self::error(409, message, error_code);
        response.errors = Some(vec![ErrorDetail {
            field,
            code: error_code.to_string(),
            message: message.to_string(),
        }]);
        response
    }

    pub fn bad_gateway(message: &str) -> Self {
        Self::error(502, message, error_codes::UPSTREAM_ERROR)
    }

    pub fn service_unavailable(message: &str) -> Self {
        Self::error(503, message, error_codes::SERVICE_UNAVAILABLE)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::error(500, message, error_codes::INTERNAL_ERROR)
    }
}

/// One page of a filtered query.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page_index: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: i64, page_index: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total_count + page_size - 1) / page_size
        } else {
            0
        };
        Self {
            items,
            total_count,
            page_index,
            page_size,
            total_pages,
            has_previous_page: page_index > 1,
            has_next_page: page_index < total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_index: self.page_index,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}

/// Key/value pair for dropdown lookups.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub value: i32,
    pub key: String,
    pub text: String,
}

// 业务错误码常量
pub mod error_codes {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

    pub const NAME_EXISTS: &str = "NAME_EXISTS";
    pub const ACCOUNT_EXISTS: &str = "ACCOUNT_EXISTS";
    pub const GANTT_CHART_EXISTS: &str = "GANTT_CHART_EXISTS";
    pub const DEPENDENT_RECORDS: &str = "DEPENDENT_RECORDS";
    pub const ID_MISMATCH: &str = "ID_MISMATCH";
    pub const TRANSCRIPTION_RUNNING: &str = "TRANSCRIPTION_RUNNING";

    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paged_result_math() {
        let page = PagedResult::new(vec![1, 2, 3], 23, 2, 10);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous_page);
        assert!(page.has_next_page);

        let last = PagedResult::new(vec![1], 21, 3, 10);
        assert!(!last.has_next_page);

        let empty = PagedResult::<i32>::new(vec![], 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_previous_page);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn envelope_serializes_camel_case_and_skips_empty() {
        let response = ApiResponse::success(5, "ok");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["data"], 5);
        assert!(json.get("errorMessage").is_none());

        let error = ApiResponse::<()>::not_found("Project not found").with_detail("id=3");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errorMessage"], "Project not found");
        assert_eq!(json["errorDetail"], "id=3");
        assert_eq!(json["errors"][0]["code"], "NOT_FOUND");
    }
}
