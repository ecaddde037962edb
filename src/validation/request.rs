use crate::db::models::api::error_codes;
use crate::error::AppError;

/// PUT bodies may omit `id`; when present it must match the route.
pub fn ensure_route_id(route_id: i32, body_id: Option<i32>) -> Result<(), AppError> {
    match body_id {
        Some(id) if id != route_id => Err(AppError::bad_request_with_code(
            format!("Route id {} does not match body id {}", route_id, id),
            error_codes::ID_MISMATCH,
        )),
        _ => Ok(()),
    }
}

pub fn validate_completion_percentage(value: i32) -> Result<(), AppError> {
    if !(0..=100).contains(&value) {
        return Err(AppError::validation(
            "Completion percentage must be between 0 and 100",
        ));
    }
    Ok(())
}

pub fn validate_role_ids(role_view_ids: &[i32]) -> Result<(), AppError> {
    if role_view_ids.iter().any(|id| *id <= 0) {
        return Err(AppError::validation("Role ids must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_id_mismatch_is_rejected() {
        assert!(ensure_route_id(3, None).is_ok());
        assert!(ensure_route_id(3, Some(3)).is_ok());
        assert!(ensure_route_id(3, Some(4)).is_err());
    }

    #[test]
    fn completion_bounds() {
        assert!(validate_completion_percentage(0).is_ok());
        assert!(validate_completion_percentage(100).is_ok());
        assert!(validate_completion_percentage(101).is_err());
        assert!(validate_completion_percentage(-1).is_err());
    }
}
