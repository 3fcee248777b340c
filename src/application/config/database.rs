use std::fmt;

use super::{parse, required, ConfigError, Lookup};

/// PostgreSQL connection settings. Every field is required.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl DatabaseConfig {
    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: required(lookup, "POSTGRES_HOST_NAME")?,
            port: parse("POSTGRES_PORT", required(lookup, "POSTGRES_PORT")?)?,
            name: required(lookup, "POSTGRES_DB_NAME")?,
            user: required(lookup, "POSTGRES_USER_NAME")?,
            password: required(lookup, "POSTGRES_PASSWORD")?,
        })
    }

    /// Connection URL for the sqlx Postgres driver
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            urlencoding::encode(&self.name),
        )
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"****")
            .finish()
    }
}
