pub mod user;
pub mod virtual_machine;

use serde::{Deserialize, Serialize};

pub use user::{NewUser, Role, User, UserPatch};
pub use virtual_machine::{NewVirtualMachine, VirtualMachine, VirtualMachinePatch, VmStatus};

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Offset/limit window over an id-ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pagination {
    #[serde(alias = "offset")]
    pub skip: u64,
    pub limit: u64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 1000;

    #[must_use]
    pub const fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if !(1..=Self::MAX_LIMIT).contains(&self.limit) {
            return Err(FieldError::new(
                "limit",
                format!("must be between 1 and {}", Self::MAX_LIMIT),
            ));
        }
        Ok(())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// Strictly increasing replacement for an `updated_at` value, even when the
/// wall clock hasn't moved since `previous`.
#[must_use]
pub fn next_timestamp(previous: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    let now = chrono::Utc::now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        assert!(Pagination::default().validate().is_ok());
        assert!(Pagination::new(0, 1).validate().is_ok());
        assert!(Pagination::new(50, 1000).validate().is_ok());
        assert!(Pagination::new(0, 0).validate().is_err());
        assert!(Pagination::new(0, 1001).validate().is_err());
    }

    #[test]
    fn test_next_timestamp_is_strictly_greater() {
        let future = chrono::Utc::now() + chrono::Duration::seconds(60);
        assert!(next_timestamp(future) > future);

        let past = chrono::Utc::now() - chrono::Duration::seconds(60);
        assert!(next_timestamp(past) > past);
    }
}
