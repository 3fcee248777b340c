//! Test helpers shared by the unit tests.

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::provisioning::ProvisioningConfig;
use crate::migrations::Migrator;
use crate::services::cloud::ImageReference;
use crate::services::provisioning::SkuTable;

/// Create an in-memory SQLite database with the real schema applied
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Provisioning settings with fixed, recognisable values
pub fn test_provisioning_config() -> ProvisioningConfig {
    ProvisioningConfig {
        password_seed: "Seed#2024".to_string(),
        location: "eastus".to_string(),
        image: ImageReference::from_urn("Canonical:UbuntuServer:18.04-LTS:latest")
            .expect("valid image urn"),
        public_url: "https://vm-manage.test".to_string(),
        skus: SkuTable::azure(),
    }
}
