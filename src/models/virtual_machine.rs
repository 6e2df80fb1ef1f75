use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::FieldError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum VmStatus {
    #[sea_orm(string_value = "running")]
    Running,
    #[default]
    #[sea_orm(string_value = "stopped")]
    Stopped,
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualMachine {
    pub id: i32,
    pub name: String,
    pub cores: i32,
    /// GB
    pub ram: i32,
    /// GB
    pub disk: i32,
    pub os: String,
    pub status: VmStatus,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVirtualMachine {
    pub name: String,
    pub cores: i32,
    pub ram: i32,
    pub disk: i32,
    pub os: String,
    /// Defaults to `stopped`.
    #[serde(default)]
    pub status: Option<VmStatus>,
    /// Defaults to the caller.
    #[serde(default)]
    pub owner_id: Option<i32>,
}

impl NewVirtualMachine {
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        check_positive(&mut errors, "cores", Some(self.cores));
        check_positive(&mut errors, "ram", Some(self.ram));
        check_positive(&mut errors, "disk", Some(self.disk));

        errors
    }
}

/// Partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VirtualMachinePatch {
    pub name: Option<String>,
    pub cores: Option<i32>,
    pub ram: Option<i32>,
    pub disk: Option<i32>,
    pub os: Option<String>,
    pub status: Option<VmStatus>,
}

impl VirtualMachinePatch {
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        check_positive(&mut errors, "cores", self.cores);
        check_positive(&mut errors, "ram", self.ram);
        check_positive(&mut errors, "disk", self.disk);

        errors
    }
}

fn check_positive(errors: &mut Vec<FieldError>, field: &str, value: Option<i32>) {
    if let Some(v) = value
        && v <= 0
    {
        errors.push(FieldError::new(field, "must be greater than 0"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewVirtualMachine {
        NewVirtualMachine {
            name: "web-01".to_string(),
            cores: 4,
            ram: 8,
            disk: 100,
            os: "linux".to_string(),
            status: None,
            owner_id: None,
        }
    }

    #[test]
    fn test_new_vm_validation() {
        assert!(sample().validate().is_empty());

        let mut vm = sample();
        vm.cores = 0;
        vm.disk = -5;
        let errors = vm.validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["cores", "disk"]);
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        assert!(VirtualMachinePatch::default().validate().is_empty());

        let patch = VirtualMachinePatch {
            ram: Some(16),
            ..Default::default()
        };
        assert!(patch.validate().is_empty());

        let patch = VirtualMachinePatch {
            ram: Some(0),
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(patch.validate().len(), 2);
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let status: VmStatus = serde_json::from_str("\"suspended\"").unwrap();
        assert_eq!(status, VmStatus::Suspended);
        assert_eq!(serde_json::to_string(&VmStatus::Running).unwrap(), "\"running\"");
        assert!(serde_json::from_str::<VmStatus>("\"paused\"").is_err());
    }
}
