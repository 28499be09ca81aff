use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Auth {
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Http {
    pub listen: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub auth: Auth,
    pub http: Http,
}

impl Settings {
    /// Defaults, then the optional TOML file at `path`, then `EXPENSES__*`
    /// environment variables.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("database.url", "sqlite://expenses.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.algorithm", "HS256")?
            .set_default("auth.access_token_expire_minutes", 60 * 8)?
            .set_default("http.listen", "0.0.0.0:8000")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("EXPENSES").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
