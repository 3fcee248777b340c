//! Persistence gateway for virtual machines and their boot events.
//!
//! Every operation issues a single statement with bound parameters.

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};
use thiserror::Error;

use crate::models::prelude::*;
use crate::models::{virtual_machine, virtual_machine_event, VmSize};
use crate::state::DbConn;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("virtual machine '{0}' already exists")]
    Duplicate(String),

    #[error("failed to build statement: {0}")]
    Statement(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Record a freshly provisioned VM. The size is stored by name, not SKU.
pub async fn insert_virtual_machine(
    db: &DbConn,
    name: &str,
    size: VmSize,
) -> Result<virtual_machine::Model, StorageError> {
    let vm = virtual_machine::ActiveModel {
        name: Set(name.to_string()),
        size: Set(size),
        ..Default::default()
    };

    vm.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StorageError::Duplicate(name.to_string()),
        _ => StorageError::Database(e),
    })
}

/// All recorded VMs, in no particular order
pub async fn list_virtual_machines(
    db: &DbConn,
) -> Result<Vec<virtual_machine::Model>, StorageError> {
    Ok(VirtualMachine::find().all(db).await?)
}

/// Exact-match lookup by name; `None` when no VM has that name
pub async fn get_virtual_machine(
    db: &DbConn,
    name: &str,
) -> Result<Option<virtual_machine::Model>, StorageError> {
    Ok(VirtualMachine::find()
        .filter(virtual_machine::Column::Name.eq(name))
        .one(db)
        .await?)
}

/// Record a boot event against the VM called `name`.
///
/// The VM id is resolved and the timestamp taken inside the statement
/// itself. Returns `false` when no VM matched and nothing was written.
pub async fn insert_boot_event(
    db: &DbConn,
    name: &str,
    unit: &str,
    message: &str,
) -> Result<bool, StorageError> {
    let source = Query::select()
        .column(virtual_machine::Column::VmId)
        .expr(Expr::current_timestamp())
        .expr(Expr::val(unit))
        .expr(Expr::val(message))
        .from(VirtualMachine)
        .and_where(virtual_machine::Column::Name.eq(name))
        .to_owned();

    let insert = Query::insert()
        .into_table(VirtualMachineEvent)
        .columns([
            virtual_machine_event::Column::VmId,
            virtual_machine_event::Column::LogDatetime,
            virtual_machine_event::Column::Unit,
            virtual_machine_event::Column::Message,
        ])
        .select_from(source)
        .map_err(|e| StorageError::Statement(e.to_string()))?
        .to_owned();

    let backend = db.get_database_backend();
    let result = db.execute(backend.build(&insert)).await?;

    Ok(result.rows_affected() > 0)
}

/// Boot events for the VM called `name`, optionally narrowed to one unit
pub async fn list_boot_events(
    db: &DbConn,
    name: &str,
    unit: Option<&str>,
) -> Result<Vec<virtual_machine_event::Model>, StorageError> {
    let mut query = VirtualMachineEvent::find()
        .join(
            JoinType::InnerJoin,
            virtual_machine_event::Relation::VirtualMachine.def(),
        )
        .filter(virtual_machine::Column::Name.eq(name));

    if let Some(unit) = unit {
        query = query.filter(virtual_machine_event::Column::Unit.eq(unit));
    }

    Ok(query
        .order_by_asc(virtual_machine_event::Column::LogDatetime)
        .order_by_asc(virtual_machine_event::Column::EventId)
        .all(db)
        .await?)
}
