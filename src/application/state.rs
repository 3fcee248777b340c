use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::provisioning::Provisioner;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state shared by all request handlers.
///
/// Holds no per-request mutable state: the connection handle and the
/// provisioner are both safe to use from concurrent requests.
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub provisioner: Arc<Provisioner>,
}

impl AppState {
    pub fn new(db: DbConn, provisioner: Provisioner) -> Self {
        Self {
            db,
            provisioner: Arc::new(provisioner),
        }
    }
}
