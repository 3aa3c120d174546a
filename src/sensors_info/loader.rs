use super::validators::raw_req_from_json;
use super::SensorsInfo;
use crate::shared::errors::{AppError, AppErrors, ErrorType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Bulk data file: flat records per kind, added in dependency order.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadData {
    #[serde(default)]
    sensor_types: Vec<Value>,
    #[serde(default)]
    sensors: Vec<Value>,
    #[serde(default)]
    sensor_readings: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub sensor_types: usize,
    pub sensors: usize,
    pub sensor_readings: usize,
}

impl SensorsInfo {
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<LoadSummary, AppErrors> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::new(
                &format!("Error reading {}: {}", path.display(), e),
                ErrorType::BadReq,
            )
        })?;
        let summary = self.load_str(&content).await?;
        log::info!(
            "Loaded {} sensor types, {} sensors, {} readings from {}",
            summary.sensor_types,
            summary.sensors,
            summary.sensor_readings,
            path.display()
        );
        Ok(summary)
    }

    /// Stops at the first record that fails, keeping what was added before it.
    pub async fn load_str(&self, content: &str) -> Result<LoadSummary, AppErrors> {
        let data: LoadData = serde_json::from_str(content).map_err(|e| {
            AppError::new(&format!("Invalid load data: {}", e), ErrorType::BadReq)
        })?;
        let mut summary = LoadSummary::default();

        for record in &data.sensor_types {
            self.add_sensor_type(&raw_req_from_json(record)?).await?;
            summary.sensor_types += 1;
        }
        for record in &data.sensors {
            self.add_sensor(&raw_req_from_json(record)?).await?;
            summary.sensors += 1;
        }
        for record in &data.sensor_readings {
            self.add_sensor_reading(&raw_req_from_json(record)?).await?;
            summary.sensor_readings += 1;
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use crate::sensors_info::tests::{req, sensors_info};
    use crate::shared::db::OnDuplicate;
    use crate::shared::errors::ErrorType;

    const DATA: &str = r#"{
        "sensorTypes": [
            { "id": "hw123", "manufacturer": "honeywell", "modelNumber": "123",
              "quantity": "pressure", "unit": "PSI", "min": 10, "max": "100" }
        ],
        "sensors": [
            { "id": "ln1120", "sensorTypeId": "hw123", "period": 1000, "min": 15, "max": 85 }
        ],
        "sensorReadings": [
            { "sensorId": "ln1120", "timestamp": 1694129048, "value": 12.4 },
            { "sensorId": "ln1120", "timestamp": 1694129049, "value": "12.6" }
        ]
    }"#;

    #[tokio::test]
    async fn loads_all_kinds_in_order() {
        let info = sensors_info(OnDuplicate::Replace);
        let summary = info.load_str(DATA).await.unwrap();
        assert_eq!(summary.sensor_types, 1);
        assert_eq!(summary.sensors, 1);
        assert_eq!(summary.sensor_readings, 2);
        let readings = info
            .find_sensor_readings(&req(&[("sensorId", "ln1120")]))
            .await
            .unwrap();
        assert_eq!(readings[0].value, 12.4);
    }

    #[tokio::test]
    async fn bad_record_aborts_load() {
        let info = sensors_info(OnDuplicate::Replace);
        let data = r#"{ "sensors": [ { "id": "s", "sensorTypeId": "nope", "period": 1, "min": 0, "max": 1 } ] }"#;
        let errs = info.load_str(data).await.unwrap_err();
        assert_eq!(errs.types(), vec![ErrorType::BadId]);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let info = sensors_info(OnDuplicate::Replace);
        let errs = info.load_str("{ nope").await.unwrap_err();
        assert_eq!(errs.types(), vec![ErrorType::BadReq]);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let info = sensors_info(OnDuplicate::Replace);
        assert!(info.load_file("/nonexistent/sensors.json").await.is_err());
    }
}
