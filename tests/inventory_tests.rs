//! Persistence gateway tests
//!
//! Covers:
//! - VM insert / lookup / listing
//! - Duplicate names
//! - Boot event insert (including unknown VMs) and filtered listing

use std::collections::HashSet;

mod common;
use common::create_test_db;

use vm_manage::models::VmSize;
use vm_manage::services::inventory::{self, StorageError};

// ============================================================================
// Virtual machines
// ============================================================================

#[tokio::test]
async fn test_insert_then_get_returns_same_name_and_size() {
    let db = create_test_db().await;

    inventory::insert_virtual_machine(&db, "alpha", VmSize::Medium)
        .await
        .unwrap();

    let vm = inventory::get_virtual_machine(&db, "alpha")
        .await
        .unwrap()
        .expect("alpha should exist");
    assert_eq!(vm.name, "alpha");
    assert_eq!(vm.size, VmSize::Medium);
}

#[tokio::test]
async fn test_get_unknown_vm_is_none() {
    let db = create_test_db().await;

    let vm = inventory::get_virtual_machine(&db, "ghost").await.unwrap();
    assert!(vm.is_none());
}

#[tokio::test]
async fn test_get_is_exact_match() {
    let db = create_test_db().await;
    inventory::insert_virtual_machine(&db, "alpha", VmSize::Small)
        .await
        .unwrap();

    assert!(inventory::get_virtual_machine(&db, "alph").await.unwrap().is_none());
    assert!(inventory::get_virtual_machine(&db, "alpha%").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_empty_store() {
    let db = create_test_db().await;

    let vms = inventory::list_virtual_machines(&db).await.unwrap();
    assert!(vms.is_empty());
}

#[tokio::test]
async fn test_list_returns_every_inserted_vm() {
    let db = create_test_db().await;
    let inserted = [
        ("alpha", VmSize::Small),
        ("beta", VmSize::Medium),
        ("gamma", VmSize::Large),
    ];

    for (name, size) in inserted {
        inventory::insert_virtual_machine(&db, name, size)
            .await
            .unwrap();
    }

    let vms = inventory::list_virtual_machines(&db).await.unwrap();
    assert_eq!(vms.len(), inserted.len());

    let listed: HashSet<(String, VmSize)> = vms.into_iter().map(|vm| (vm.name, vm.size)).collect();
    let expected: HashSet<(String, VmSize)> = inserted
        .iter()
        .map(|(name, size)| (name.to_string(), *size))
        .collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_duplicate_name_is_rejected() {
    let db = create_test_db().await;
    inventory::insert_virtual_machine(&db, "alpha", VmSize::Small)
        .await
        .unwrap();

    let result = inventory::insert_virtual_machine(&db, "alpha", VmSize::Large).await;
    assert!(matches!(result, Err(StorageError::Duplicate(name)) if name == "alpha"));

    let vms = inventory::list_virtual_machines(&db).await.unwrap();
    assert_eq!(vms.len(), 1);
    assert_eq!(vms[0].size, VmSize::Small);
}

#[tokio::test]
async fn test_names_are_stored_verbatim() {
    let db = create_test_db().await;
    let name = "o'brien\"; DROP TABLE virtual_machine; --";

    inventory::insert_virtual_machine(&db, name, VmSize::Small)
        .await
        .unwrap();

    let vm = inventory::get_virtual_machine(&db, name).await.unwrap();
    assert_eq!(vm.unwrap().name, name);
    assert_eq!(inventory::list_virtual_machines(&db).await.unwrap().len(), 1);
}

// ============================================================================
// Boot events
// ============================================================================

#[tokio::test]
async fn test_boot_event_for_unknown_vm_is_noop() {
    let db = create_test_db().await;

    let recorded = inventory::insert_boot_event(&db, "ghost", "sshd", "started")
        .await
        .unwrap();
    assert!(!recorded);

    let events = inventory::list_boot_events(&db, "ghost", None).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_boot_event_is_linked_and_timestamped() {
    let db = create_test_db().await;
    let vm = inventory::insert_virtual_machine(&db, "alpha", VmSize::Small)
        .await
        .unwrap();

    let before = chrono::Utc::now() - chrono::Duration::seconds(5);
    let recorded = inventory::insert_boot_event(&db, "alpha", "sshd.service", "started")
        .await
        .unwrap();
    assert!(recorded);

    let events = inventory::list_boot_events(&db, "alpha", None).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].vm_id, vm.vm_id);
    assert_eq!(events[0].unit, "sshd.service");
    assert_eq!(events[0].message, "started");
    assert!(events[0].log_datetime >= before);
    assert!(events[0].log_datetime <= chrono::Utc::now() + chrono::Duration::seconds(5));
}

#[tokio::test]
async fn test_list_boot_events_filters_by_unit() {
    let db = create_test_db().await;
    inventory::insert_virtual_machine(&db, "alpha", VmSize::Small)
        .await
        .unwrap();

    for (unit, message) in [
        ("sshd", "starting"),
        ("cron", "started"),
        ("sshd", "listening"),
    ] {
        inventory::insert_boot_event(&db, "alpha", unit, message)
            .await
            .unwrap();
    }

    let sshd = inventory::list_boot_events(&db, "alpha", Some("sshd"))
        .await
        .unwrap();
    assert_eq!(sshd.len(), 2);
    assert!(sshd.iter().all(|event| event.unit == "sshd"));

    let all = inventory::list_boot_events(&db, "alpha", None).await.unwrap();
    assert_eq!(all.len(), 3);

    let none = inventory::list_boot_events(&db, "alpha", Some("nginx"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_boot_events_are_scoped_to_their_vm() {
    let db = create_test_db().await;
    inventory::insert_virtual_machine(&db, "alpha", VmSize::Small)
        .await
        .unwrap();
    inventory::insert_virtual_machine(&db, "beta", VmSize::Small)
        .await
        .unwrap();

    inventory::insert_boot_event(&db, "alpha", "sshd", "alpha up")
        .await
        .unwrap();
    inventory::insert_boot_event(&db, "beta", "sshd", "beta up")
        .await
        .unwrap();

    let alpha = inventory::list_boot_events(&db, "alpha", Some("sshd"))
        .await
        .unwrap();
    assert_eq!(alpha.len(), 1);
    assert_eq!(alpha[0].message, "alpha up");
}
