use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{virtual_machine, virtual_machine_event, VmSize};

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationInfo {
    pub application: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VirtualMachineResponse {
    pub vm_id: i64,
    pub name: String,
    pub size: VmSize,
}

impl From<virtual_machine::Model> for VirtualMachineResponse {
    fn from(vm: virtual_machine::Model) -> Self {
        Self {
            vm_id: vm.vm_id,
            name: vm.name,
            size: vm.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BootEventResponse {
    pub log_datetime: DateTime<Utc>,
    pub unit: String,
    pub message: String,
}

impl From<virtual_machine_event::Model> for BootEventResponse {
    fn from(event: virtual_machine_event::Model) -> Self {
        Self {
            log_datetime: event.log_datetime,
            unit: event.unit,
            message: event.message,
        }
    }
}

/// A journal line as posted by the on-VM agent (`journalctl -o json`).
///
/// Only string `UNIT` and `MESSAGE` fields are accepted; journald emits
/// byte arrays for non-UTF-8 messages and those are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BootReport {
    #[serde(rename = "UNIT")]
    pub unit: String,
    #[serde(rename = "MESSAGE")]
    pub message: String,
}

impl BootReport {
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        let unit = value.get("UNIT")?.as_str()?;
        let message = value.get("MESSAGE")?.as_str()?;

        Some(Self {
            unit: unit.to_string(),
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_report_from_journal_line() {
        let body = br#"{"__CURSOR":"s=1","UNIT":"sshd.service","MESSAGE":"Server listening on 0.0.0.0 port 22."}"#;
        let report = BootReport::from_body(body).unwrap();
        assert_eq!(report.unit, "sshd.service");
        assert_eq!(report.message, "Server listening on 0.0.0.0 port 22.");
    }

    #[test]
    fn test_boot_report_requires_both_fields() {
        assert!(BootReport::from_body(br#"{"UNIT":"sshd"}"#).is_none());
        assert!(BootReport::from_body(br#"{"MESSAGE":"started"}"#).is_none());
        assert!(BootReport::from_body(br#"{}"#).is_none());
    }

    #[test]
    fn test_boot_report_rejects_non_string_fields() {
        assert!(BootReport::from_body(br#"{"UNIT":"sshd","MESSAGE":[104,105]}"#).is_none());
        assert!(BootReport::from_body(br#"{"UNIT":null,"MESSAGE":"x"}"#).is_none());
    }

    #[test]
    fn test_boot_report_rejects_garbage() {
        assert!(BootReport::from_body(b"").is_none());
        assert!(BootReport::from_body(b"UNIT=sshd&MESSAGE=started").is_none());
        assert!(BootReport::from_body(b"[1,2]").is_none());
    }

    #[test]
    fn test_vm_response_serialization() {
        let response = VirtualMachineResponse {
            vm_id: 7,
            name: "alpha".to_string(),
            size: VmSize::Small,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"vm_id": 7, "name": "alpha", "size": "SMALL"})
        );
    }
}
