use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::{prelude::*, virtual_machines};
use crate::models::{
    NewVirtualMachine, Pagination, VirtualMachine, VirtualMachinePatch, next_timestamp,
};

impl From<virtual_machines::Model> for VirtualMachine {
    fn from(model: virtual_machines::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            cores: model.cores,
            ram: model.ram,
            disk: model.disk,
            os: model.os,
            status: model.status,
            owner_id: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct VirtualMachineRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> VirtualMachineRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<VirtualMachine>> {
        let vm = VirtualMachines::find_by_id(id)
            .one(self.conn)
            .await
            .context("Failed to query virtual machine")?;

        Ok(vm.map(VirtualMachine::from))
    }

    /// Id-ordered window over all records, or only `owner_id`'s when given.
    pub async fn list(
        &self,
        owner_id: Option<i32>,
        page: Pagination,
    ) -> Result<Vec<VirtualMachine>> {
        let mut query = VirtualMachines::find();
        if let Some(owner_id) = owner_id {
            query = query.filter(virtual_machines::Column::OwnerId.eq(owner_id));
        }

        let vms = query
            .order_by_asc(virtual_machines::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(self.conn)
            .await
            .context("Failed to list virtual machines")?;

        Ok(vms.into_iter().map(VirtualMachine::from).collect())
    }

    pub async fn insert(&self, owner_id: i32, vm: &NewVirtualMachine) -> Result<VirtualMachine> {
        let now = chrono::Utc::now();

        let model = virtual_machines::ActiveModel {
            name: Set(vm.name.clone()),
            cores: Set(vm.cores),
            ram: Set(vm.ram),
            disk: Set(vm.disk),
            os: Set(vm.os.clone()),
            status: Set(vm.status.unwrap_or_default()),
            owner_id: Set(owner_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await
        .context("Failed to insert virtual machine")?;

        Ok(VirtualMachine::from(model))
    }

    /// Writes only the fields present in `patch`. Returns `None` if the
    /// record does not exist.
    pub async fn update(
        &self,
        id: i32,
        patch: &VirtualMachinePatch,
    ) -> Result<Option<VirtualMachine>> {
        let Some(vm) = VirtualMachines::find_by_id(id)
            .one(self.conn)
            .await
            .context("Failed to query virtual machine for update")?
        else {
            return Ok(None);
        };

        let updated_at = next_timestamp(vm.updated_at);

        let mut active: virtual_machines::ActiveModel = vm.into();
        if let Some(name) = &patch.name {
            active.name = Set(name.clone());
        }
        if let Some(cores) = patch.cores {
            active.cores = Set(cores);
        }
        if let Some(ram) = patch.ram {
            active.ram = Set(ram);
        }
        if let Some(disk) = patch.disk {
            active.disk = Set(disk);
        }
        if let Some(os) = &patch.os {
            active.os = Set(os.clone());
        }
        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        active.updated_at = Set(updated_at);

        let model = active
            .update(self.conn)
            .await
            .context("Failed to update virtual machine")?;

        Ok(Some(VirtualMachine::from(model)))
    }

    /// Removes the record and returns its last state.
    pub async fn delete(&self, id: i32) -> Result<Option<VirtualMachine>> {
        let Some(vm) = VirtualMachines::find_by_id(id)
            .one(self.conn)
            .await
            .context("Failed to query virtual machine for delete")?
        else {
            return Ok(None);
        };

        let snapshot = VirtualMachine::from(vm.clone());
        vm.delete(self.conn)
            .await
            .context("Failed to delete virtual machine")?;

        Ok(Some(snapshot))
    }
}
