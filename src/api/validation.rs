use super::ApiError;
use crate::models::Pagination;

pub fn validate_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_pagination(page: Pagination) -> Result<Pagination, ApiError> {
    page.validate()
        .map_err(|field| ApiError::invalid_fields(vec![field]))?;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1).is_ok());
        assert!(validate_id(12345).is_ok());
        assert!(validate_id(0).is_err());
        assert!(validate_id(-1).is_err());
    }

    #[test]
    fn test_validate_pagination() {
        assert!(validate_pagination(Pagination::default()).is_ok());
        assert!(validate_pagination(Pagination::new(10, 1000)).is_ok());
        assert!(validate_pagination(Pagination::new(0, 0)).is_err());
        assert!(validate_pagination(Pagination::new(0, 1001)).is_err());
    }
}
