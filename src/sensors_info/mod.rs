//! Request validation and cross-entity consistency for sensor types,
//! sensors and sensor readings.
//!
//! [`SensorsInfo`] validates raw requests into entities, checks them against
//! what is already stored, and hands them to its [`SensorsDao`].

pub mod entities;
pub mod loader;
pub mod range;
pub mod validators;

use crate::shared::db::SensorsDao;
use crate::shared::errors::{AppError, AppErrors, ErrorType};
use entities::{
    Sensor, SensorReading, SensorReadingSearch, SensorSearch, SensorType, SensorTypeSearch,
};
use validators::RawReq;

pub struct SensorsInfo {
    dao: Box<dyn SensorsDao>,
}

fn rejected<T>(op: &str, res: Result<T, AppErrors>) -> Result<T, AppErrors> {
    if let Err(errs) = &res {
        log::warn!("{} rejected: {}", op, errs);
    }
    res
}

impl SensorsInfo {
    pub fn new(dao: Box<dyn SensorsDao>) -> SensorsInfo {
        SensorsInfo { dao }
    }

    pub async fn add_sensor_type(&self, req: &RawReq) -> Result<SensorType, AppErrors> {
        log::debug!("add_sensor_type {:?}", req);
        let res = async {
            let sensor_type = SensorType::make(req)?;
            Ok::<_, AppErrors>(self.dao.add_sensor_type(sensor_type).await?)
        }
        .await;
        rejected("add_sensor_type", res)
    }

    /// The sensor must reference a stored sensor type (`BAD_ID`) and its
    /// expected range must lie within that type's limits (`BAD_RANGE`).
    /// Existing sensors are not revisited when a type changes later.
    pub async fn add_sensor(&self, req: &RawReq) -> Result<Sensor, AppErrors> {
        log::debug!("add_sensor {:?}", req);
        let res = async {
            let sensor = Sensor::make(req)?;
            let sensor_type = self
                .dao
                .find_sensor_types(&SensorTypeSearch::by_id(&sensor.sensor_type_id))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| AppError {
                    err_type: ErrorType::BadId,
                    message: format!("unknown sensor type id \"{}\"", sensor.sensor_type_id),
                })?;
            if !sensor.expected.is_subrange(&sensor_type.limits) {
                return Err(AppErrors::from(AppError {
                    err_type: ErrorType::BadRange,
                    message: format!(
                        "expected range [{}, {}] of sensor \"{}\" is not within limits [{}, {}] of sensor type \"{}\"",
                        sensor.expected.min,
                        sensor.expected.max,
                        sensor.id,
                        sensor_type.limits.min,
                        sensor_type.limits.max,
                        sensor_type.id
                    ),
                }));
            }
            Ok::<_, AppErrors>(self.dao.add_sensor(sensor).await?)
        }
        .await;
        rejected("add_sensor", res)
    }

    pub async fn add_sensor_reading(&self, req: &RawReq) -> Result<SensorReading, AppErrors> {
        log::debug!("add_sensor_reading {:?}", req);
        let res = async {
            let reading = SensorReading::make(req)?;
            let known = self
                .dao
                .find_sensors(&SensorSearch::by_id(&reading.sensor_id))
                .await?;
            if known.is_empty() {
                return Err(AppErrors::from(AppError {
                    err_type: ErrorType::BadId,
                    message: format!("unknown sensor id \"{}\"", reading.sensor_id),
                }));
            }
            Ok::<_, AppErrors>(self.dao.add_sensor_reading(reading).await?)
        }
        .await;
        rejected("add_sensor_reading", res)
    }

    /// Matches sorted by `id`, windowed by `index`/`count`.
    pub async fn find_sensor_types(&self, req: &RawReq) -> Result<Vec<SensorType>, AppErrors> {
        log::debug!("find_sensor_types {:?}", req);
        let res = async {
            let search = SensorTypeSearch::make(req)?;
            Ok::<_, AppErrors>(self.dao.find_sensor_types(&search).await?)
        }
        .await;
        rejected("find_sensor_types", res)
    }

    /// Matches sorted by `id`, windowed by `index`/`count`.
    pub async fn find_sensors(&self, req: &RawReq) -> Result<Vec<Sensor>, AppErrors> {
        log::debug!("find_sensors {:?}", req);
        let res = async {
            let search = SensorSearch::make(req)?;
            Ok::<_, AppErrors>(self.dao.find_sensors(&search).await?)
        }
        .await;
        rejected("find_sensors", res)
    }

    /// Readings of `sensorId` inside both bound pairs, sorted by timestamp.
    pub async fn find_sensor_readings(
        &self,
        req: &RawReq,
    ) -> Result<Vec<SensorReading>, AppErrors> {
        log::debug!("find_sensor_readings {:?}", req);
        let res = async {
            let search = SensorReadingSearch::make(req)?;
            Ok::<_, AppErrors>(self.dao.find_sensor_readings(&search).await?)
        }
        .await;
        rejected("find_sensor_readings", res)
    }

    pub async fn clear(&self) -> Result<(), AppErrors> {
        log::info!("Clearing all collections");
        Ok(self.dao.clear().await?)
    }

    pub async fn close(&self) -> Result<(), AppErrors> {
        Ok(self.dao.close().await?)
    }
}
