use super::db::OnDuplicate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Configs {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(skip)]
    config_path: PathBuf,
}

impl Configs {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let config_content = fs::read_to_string(&path)?;
        let mut configs = Self::parse(&config_content)?;
        configs.config_path = path.as_ref().to_path_buf();
        Ok(configs)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut configs: Configs = toml::from_str(content)?;
        if let Ok(uri) = std::env::var("MONGODB_URI") {
            configs.store.mongodb_uri = uri;
        }
        Ok(configs)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: [u8; 4],
    pub port: u16,
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: [0, 0, 0, 0],
            port: 3030,
            cors_origin: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Mongo,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub on_duplicate: OnDuplicate,
    pub mongodb_uri: String,
    pub database: String,
    pub load_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            kind: StoreKind::Memory,
            on_duplicate: OnDuplicate::Replace,
            mongodb_uri: String::from("mongodb://localhost:27017"),
            database: String::from("sensors"),
            load_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let configs: Configs = toml::from_str("").unwrap();
        assert_eq!(configs.server.port, 3030);
        assert_eq!(configs.store.kind, StoreKind::Memory);
        assert_eq!(configs.store.on_duplicate, OnDuplicate::Replace);
        assert!(configs.store.load_path.is_none());
    }

    #[test]
    fn reads_store_section() {
        let configs: Configs = toml::from_str(
            r#"
            [server]
            host = [127, 0, 0, 1]
            port = 8080
            cors_origin = "http://localhost:5173"

            [store]
            kind = "mongo"
            on_duplicate = "reject"
            database = "sensors-test"
            load_path = "data/sensors.json"
            "#,
        )
        .unwrap();
        assert_eq!(configs.server.host, [127, 0, 0, 1]);
        assert_eq!(configs.server.port, 8080);
        assert_eq!(configs.store.kind, StoreKind::Mongo);
        assert_eq!(configs.store.on_duplicate, OnDuplicate::Reject);
        assert_eq!(configs.store.database, "sensors-test");
        assert_eq!(configs.store.mongodb_uri, "mongodb://localhost:27017");
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(toml::from_str::<Configs>("[store]\non_duplicate = \"merge\"").is_err());
    }
}
