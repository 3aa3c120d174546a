pub mod memory;
pub mod models;
pub mod mongo;

use crate::sensors_info::entities::{
    Sensor, SensorReading, SensorReadingSearch, SensorSearch, SensorType, SensorTypeSearch,
};
use crate::shared::config::{StoreConfig, StoreKind};
use crate::shared::errors::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What an add does when the key is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDuplicate {
    #[default]
    Replace,
    Reject,
}

/// Persistence collaborator of `SensorsInfo`.
///
/// Finds return the full match set sorted (types and sensors by `id`,
/// readings by `timestamp`) and cut to the search's paging window; no match
/// is an empty vector. Duplicate keys fail with `EXISTS` under
/// [`OnDuplicate::Reject`], I/O failures with `DB`.
#[async_trait]
pub trait SensorsDao: Send + Sync {
    async fn add_sensor_type(&self, sensor_type: SensorType) -> Result<SensorType, AppError>;

    async fn add_sensor(&self, sensor: Sensor) -> Result<Sensor, AppError>;

    async fn add_sensor_reading(&self, reading: SensorReading) -> Result<SensorReading, AppError>;

    async fn find_sensor_types(
        &self,
        search: &SensorTypeSearch,
    ) -> Result<Vec<SensorType>, AppError>;

    async fn find_sensors(&self, search: &SensorSearch) -> Result<Vec<Sensor>, AppError>;

    async fn find_sensor_readings(
        &self,
        search: &SensorReadingSearch,
    ) -> Result<Vec<SensorReading>, AppError>;

    async fn clear(&self) -> Result<(), AppError>;

    async fn close(&self) -> Result<(), AppError>;
}

pub async fn open_dao(config: &StoreConfig) -> Result<Box<dyn SensorsDao>, AppError> {
    match config.kind {
        StoreKind::Memory => {
            log::info!("Using in-memory store ({:?} on duplicate)", config.on_duplicate);
            Ok(Box::new(memory::MemoryDao::new(config.on_duplicate)))
        }
        StoreKind::Mongo => {
            let dao = mongo::MongoDao::connect(
                &config.mongodb_uri,
                &config.database,
                config.on_duplicate,
            )
            .await?;
            log::info!(
                "Using MongoDB database \"{}\" ({:?} on duplicate)",
                config.database,
                config.on_duplicate
            );
            Ok(Box::new(dao))
        }
    }
}
