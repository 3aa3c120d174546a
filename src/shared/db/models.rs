use crate::sensors_info::{
    entities::{Sensor, SensorReading, SensorType},
    range::Range,
};
use crate::shared::errors::{AppError, ErrorType};
use serde::{Deserialize, Serialize};

/// Stored form of a sensor type; the id doubles as `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorTypeDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub manufacturer: String,
    pub model_number: String,
    pub quantity: String,
    pub unit: String,
    pub limits: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub sensor_type_id: String,
    pub period: i64,
    pub expected: Range,
}

/// Readings keep the driver-generated `_id`; `(sensorId, timestamp)` is a
/// unique index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReadingDoc {
    pub sensor_id: String,
    pub timestamp: i64,
    pub value: f64,
}

fn to_i64(v: u64, field: &str) -> Result<i64, AppError> {
    i64::try_from(v).map_err(|_| AppError {
        err_type: ErrorType::BadVal,
        message: format!("{} value {} is too large to store", field, v),
    })
}

impl From<SensorType> for SensorTypeDoc {
    fn from(st: SensorType) -> Self {
        SensorTypeDoc {
            id: st.id,
            manufacturer: st.manufacturer,
            model_number: st.model_number,
            quantity: st.quantity,
            unit: st.unit,
            limits: st.limits,
        }
    }
}

impl From<SensorTypeDoc> for SensorType {
    fn from(doc: SensorTypeDoc) -> Self {
        SensorType {
            id: doc.id,
            manufacturer: doc.manufacturer,
            model_number: doc.model_number,
            quantity: doc.quantity,
            unit: doc.unit,
            limits: doc.limits,
        }
    }
}

impl TryFrom<Sensor> for SensorDoc {
    type Error = AppError;

    fn try_from(sensor: Sensor) -> Result<Self, Self::Error> {
        Ok(SensorDoc {
            period: to_i64(sensor.period, "period")?,
            id: sensor.id,
            sensor_type_id: sensor.sensor_type_id,
            expected: sensor.expected,
        })
    }
}

impl From<SensorDoc> for Sensor {
    fn from(doc: SensorDoc) -> Self {
        Sensor {
            id: doc.id,
            sensor_type_id: doc.sensor_type_id,
            period: doc.period.max(0) as u64,
            expected: doc.expected,
        }
    }
}

impl TryFrom<SensorReading> for SensorReadingDoc {
    type Error = AppError;

    fn try_from(reading: SensorReading) -> Result<Self, Self::Error> {
        Ok(SensorReadingDoc {
            timestamp: to_i64(reading.timestamp, "timestamp")?,
            sensor_id: reading.sensor_id,
            value: reading.value,
        })
    }
}

impl From<SensorReadingDoc> for SensorReading {
    fn from(doc: SensorReadingDoc) -> Self {
        SensorReading {
            sensor_id: doc.sensor_id,
            timestamp: doc.timestamp.max(0) as u64,
            value: doc.value,
        }
    }
}
