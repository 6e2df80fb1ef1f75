use sea_orm::entity::prelude::*;

use crate::models::Role;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id PHC string (salt embedded)
    pub password_hash: String,

    pub is_active: bool,

    pub is_superuser: bool,

    pub role: Role,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::virtual_machines::Entity")]
    VirtualMachines,
}

impl Related<super::virtual_machines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VirtualMachines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
