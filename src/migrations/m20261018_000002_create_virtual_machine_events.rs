//! Migration: Create virtual_machine_event table

use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_virtual_machines::VirtualMachine;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VirtualMachineEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VirtualMachineEvent::EventId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VirtualMachineEvent::VmId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VirtualMachineEvent::LogDatetime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VirtualMachineEvent::Unit).text().not_null())
                    .col(ColumnDef::new(VirtualMachineEvent::Message).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_virtual_machine_event_vm_id")
                            .from(VirtualMachineEvent::Table, VirtualMachineEvent::VmId)
                            .to(VirtualMachine::Table, VirtualMachine::VmId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_virtual_machine_event_vm_id")
                    .table(VirtualMachineEvent::Table)
                    .col(VirtualMachineEvent::VmId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(VirtualMachineEvent::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "virtual_machine_event"]
enum VirtualMachineEvent {
    Table,
    #[iden = "event_id"]
    EventId,
    #[iden = "vm_id"]
    VmId,
    #[iden = "log_datetime"]
    LogDatetime,
    Unit,
    Message,
}
