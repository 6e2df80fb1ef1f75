//! `SeaORM` implementation of the `VirtualMachineService` trait.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::policy::{self, Action, Caller};
use super::vm_service::{RecordError, VirtualMachineService};
use crate::db::{Store, UserRepository, VirtualMachineRepository};
use crate::models::{
    FieldError, NewVirtualMachine, Pagination, VirtualMachine, VirtualMachinePatch,
};

pub struct SeaOrmVirtualMachineService {
    store: Store,
}

impl SeaOrmVirtualMachineService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn ensure_allowed(
    caller: &Caller,
    action: Action,
    vm: &VirtualMachine,
) -> Result<(), RecordError> {
    if policy::allow(caller, action, Some(vm.owner_id)) {
        Ok(())
    } else {
        warn!(
            caller_id = caller.id,
            vm_id = vm.id,
            ?action,
            "Denied access to virtual machine"
        );
        Err(RecordError::Forbidden)
    }
}

#[async_trait]
impl VirtualMachineService for SeaOrmVirtualMachineService {
    async fn create(
        &self,
        caller: &Caller,
        vm: NewVirtualMachine,
    ) -> Result<VirtualMachine, RecordError> {
        let owner_id = vm.owner_id.unwrap_or(caller.id);

        if !policy::allow(caller, Action::Create, Some(owner_id)) {
            warn!(caller_id = caller.id, owner_id, "Denied virtual machine creation");
            return Err(RecordError::Forbidden);
        }

        let errors = vm.validate();
        if !errors.is_empty() {
            return Err(RecordError::Validation(errors));
        }

        let txn = self.store.begin().await?;

        if UserRepository::new(&txn).get_by_id(owner_id).await?.is_none() {
            return Err(RecordError::Validation(vec![FieldError::new(
                "owner_id",
                format!("user {owner_id} does not exist"),
            )]));
        }

        let created = VirtualMachineRepository::new(&txn)
            .insert(owner_id, &vm)
            .await?;

        txn.commit().await?;

        info!(vm_id = created.id, owner_id, "Virtual machine created");
        Ok(created)
    }

    async fn get(&self, id: i32, caller: &Caller) -> Result<VirtualMachine, RecordError> {
        let vm = self
            .store
            .virtual_machines()
            .get(id)
            .await?
            .ok_or(RecordError::NotFound(id))?;

        ensure_allowed(caller, Action::Read, &vm)?;
        Ok(vm)
    }

    async fn list(
        &self,
        caller: &Caller,
        page: Pagination,
    ) -> Result<Vec<VirtualMachine>, RecordError> {
        if let Err(e) = page.validate() {
            return Err(RecordError::Validation(vec![e]));
        }

        let scope = policy::list_scope(caller);
        let vms = self.store.virtual_machines().list(scope, page).await?;

        debug!(
            caller_id = caller.id,
            count = vms.len(),
            skip = page.skip,
            limit = page.limit,
            "Listed virtual machines"
        );
        Ok(vms)
    }

    async fn update(
        &self,
        id: i32,
        caller: &Caller,
        patch: VirtualMachinePatch,
    ) -> Result<VirtualMachine, RecordError> {
        let txn = self.store.begin().await?;
        let repo = VirtualMachineRepository::new(&txn);

        let existing = repo.get(id).await?.ok_or(RecordError::NotFound(id))?;
        ensure_allowed(caller, Action::Update, &existing)?;

        let errors = patch.validate();
        if !errors.is_empty() {
            return Err(RecordError::Validation(errors));
        }

        let updated = repo
            .update(id, &patch)
            .await?
            .ok_or(RecordError::NotFound(id))?;

        txn.commit().await?;

        info!(vm_id = id, caller_id = caller.id, "Virtual machine updated");
        Ok(updated)
    }

    async fn delete(&self, id: i32, caller: &Caller) -> Result<VirtualMachine, RecordError> {
        let txn = self.store.begin().await?;
        let repo = VirtualMachineRepository::new(&txn);

        let existing = repo.get(id).await?.ok_or(RecordError::NotFound(id))?;
        ensure_allowed(caller, Action::Delete, &existing)?;

        let deleted = repo.delete(id).await?.ok_or(RecordError::NotFound(id))?;

        txn.commit().await?;

        info!(vm_id = id, caller_id = caller.id, "Virtual machine deleted");
        Ok(deleted)
    }
}
