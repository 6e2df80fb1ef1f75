//! Extractor wrappers whose rejections go through [`ApiError`], so malformed
//! bodies, query strings and path segments get the usual JSON envelope.

use axum::extract::{FromRequest, FromRequestParts};
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};

use super::ApiError;
use crate::models::FieldError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        rejected("body", &rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        rejected("form", &rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        rejected("query", &rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        rejected("id", &rejection.body_text())
    }
}

fn rejected(location: &str, text: &str) -> ApiError {
    let field = field_from_message(text).unwrap_or_else(|| location.to_string());
    tracing::debug!(field = %field, "Rejected request input: {}", text);
    ApiError::invalid_fields(vec![FieldError::new(field, text.to_string())])
}

/// Pulls the offending field out of a deserializer message, either from
/// "missing field `name`" or from a leading "name: reason" path.
fn field_from_message(text: &str) -> Option<String> {
    if let Some(rest) = text.split("missing field `").nth(1) {
        return rest.split('`').next().map(ToString::to_string);
    }

    // "<prefix>: <path>: <reason>"
    let mut parts = text.splitn(3, ": ");
    let _prefix = parts.next()?;
    let path = parts.next()?;
    parts.next()?;

    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_missing_field() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    missing field `cores` at line 1 column 20";
        assert_eq!(field_from_message(text).as_deref(), Some("cores"));
    }

    #[test]
    fn test_field_from_path_prefix() {
        let text = "Failed to deserialize query string: skip: invalid digit found in string";
        assert_eq!(field_from_message(text).as_deref(), Some("skip"));

        let text = "Failed to deserialize the JSON body into the target type: \
                    ram: invalid type: string \"x\", expected u32 at line 1 column 9";
        assert_eq!(field_from_message(text).as_deref(), Some("ram"));
    }

    #[test]
    fn test_field_falls_back_to_location() {
        assert_eq!(field_from_message("Invalid URL: Cannot parse `abc` to a `i32`"), None);

        let ApiError::ValidationError { fields, .. } =
            rejected("id", "Invalid URL: Cannot parse `abc` to a `i32`")
        else {
            panic!("expected a validation error");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "id");
    }
}
