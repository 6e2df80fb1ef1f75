//! Domain service for virtual machine records.
//!
//! Every operation takes the calling identity and enforces the rules in
//! [`crate::services::policy`].

use thiserror::Error;

use super::policy::Caller;
use crate::models::{
    FieldError, NewVirtualMachine, Pagination, VirtualMachine, VirtualMachinePatch,
};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Virtual machine {0} not found")]
    NotFound(i32),

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecordError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecordError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait VirtualMachineService: Send + Sync {
    /// Creates a record owned by `vm.owner_id`, or by the caller when absent.
    /// Status defaults to `stopped`.
    ///
    /// # Errors
    ///
    /// [`RecordError::Forbidden`] if the caller may not create for that owner,
    /// [`RecordError::Validation`] for non-positive sizes, an empty name or an
    /// unknown owner.
    async fn create(
        &self,
        caller: &Caller,
        vm: NewVirtualMachine,
    ) -> Result<VirtualMachine, RecordError>;

    async fn get(&self, id: i32, caller: &Caller) -> Result<VirtualMachine, RecordError>;

    /// Superusers see every record, others only their own; id ordered.
    async fn list(
        &self,
        caller: &Caller,
        page: Pagination,
    ) -> Result<Vec<VirtualMachine>, RecordError>;

    /// Writes only the fields present in `patch` and refreshes `updated_at`.
    async fn update(
        &self,
        id: i32,
        caller: &Caller,
        patch: VirtualMachinePatch,
    ) -> Result<VirtualMachine, RecordError>;

    /// Permanently removes the record and returns its last state.
    async fn delete(&self, id: i32, caller: &Caller) -> Result<VirtualMachine, RecordError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_internal_error_keeps_context_chain() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("database is locked"));
        let err: RecordError = result
            .context("Failed to insert virtual machine")
            .unwrap_err()
            .into();

        let RecordError::Internal(msg) = err else {
            panic!("expected an internal error");
        };
        assert!(msg.contains("Failed to insert virtual machine"));
        assert!(msg.contains("database is locked"));
    }
}
