use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "virtual_machine_event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub event_id: i64,
    pub vm_id: i64,
    /// Assigned by the database at insert time (UTC)
    pub log_datetime: DateTimeUtc,
    #[sea_orm(column_type = "Text")]
    pub unit: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::virtual_machine::Entity",
        from = "Column::VmId",
        to = "super::virtual_machine::Column::VmId"
    )]
    VirtualMachine,
}

impl Related<super::virtual_machine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VirtualMachine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
