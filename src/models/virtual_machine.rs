use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "virtual_machine")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub vm_id: i64,
    #[sea_orm(unique)]
    pub name: String,
    /// Stored as the size name (SMALL/MEDIUM/LARGE), never the provider SKU
    pub size: VmSize,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::virtual_machine_event::Entity")]
    Events,
}

impl Related<super::virtual_machine_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Hardware profile a caller may request
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum VmSize {
    #[sea_orm(string_value = "SMALL")]
    Small,
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    #[sea_orm(string_value = "LARGE")]
    Large,
}

impl VmSize {
    pub const ALL: [VmSize; 3] = [VmSize::Small, VmSize::Medium, VmSize::Large];

    /// Enumeration name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            VmSize::Small => "SMALL",
            VmSize::Medium => "MEDIUM",
            VmSize::Large => "LARGE",
        }
    }

    /// Comma-separated lowercase list, used in validation messages
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|size| size.as_str().to_lowercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for VmSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VmSize {
    type Err = String;

    /// Case-insensitive parse of `small`, `medium` or `large`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Invalid size '{}'. Valid sizes: {}",
                    s,
                    Self::valid_values()
                )
            })
    }
}
