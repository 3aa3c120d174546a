use super::{OnDuplicate, SensorsDao};
use crate::sensors_info::entities::{
    Sensor, SensorReading, SensorReadingSearch, SensorSearch, SensorType, SensorTypeSearch,
};
use crate::shared::errors::{AppError, ErrorType};
use async_trait::async_trait;
use std::collections::{btree_map::Entry, BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Collections {
    sensor_types: BTreeMap<String, SensorType>,
    sensors: BTreeMap<String, Sensor>,
    // sensor id -> timestamp -> reading
    readings: HashMap<String, BTreeMap<u64, SensorReading>>,
}

/// Owned in-memory collections. Ordered maps keep finds sorted for free.
#[derive(Debug, Default)]
pub struct MemoryDao {
    on_duplicate: OnDuplicate,
    collections: RwLock<Collections>,
}

impl MemoryDao {
    pub fn new(on_duplicate: OnDuplicate) -> MemoryDao {
        MemoryDao {
            on_duplicate,
            collections: RwLock::new(Collections::default()),
        }
    }
}

fn put<K: Ord, V: Clone>(
    map: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    on_duplicate: OnDuplicate,
    describe: impl FnOnce() -> String,
) -> Result<V, AppError> {
    match map.entry(key) {
        Entry::Occupied(mut slot) => match on_duplicate {
            OnDuplicate::Replace => {
                slot.insert(value.clone());
                Ok(value)
            }
            OnDuplicate::Reject => Err(AppError {
                err_type: ErrorType::Exists,
                message: format!("{} already exists", describe()),
            }),
        },
        Entry::Vacant(slot) => Ok(slot.insert(value).clone()),
    }
}

#[async_trait]
impl SensorsDao for MemoryDao {
    async fn add_sensor_type(&self, sensor_type: SensorType) -> Result<SensorType, AppError> {
        let mut collections = self.collections.write().await;
        let id = sensor_type.id.clone();
        put(
            &mut collections.sensor_types,
            id.clone(),
            sensor_type,
            self.on_duplicate,
            || format!("sensor type \"{}\"", id),
        )
    }

    async fn add_sensor(&self, sensor: Sensor) -> Result<Sensor, AppError> {
        let mut collections = self.collections.write().await;
        let id = sensor.id.clone();
        put(
            &mut collections.sensors,
            id.clone(),
            sensor,
            self.on_duplicate,
            || format!("sensor \"{}\"", id),
        )
    }

    async fn add_sensor_reading(&self, reading: SensorReading) -> Result<SensorReading, AppError> {
        let mut collections = self.collections.write().await;
        let sensor_id = reading.sensor_id.clone();
        let timestamp = reading.timestamp;
        let per_sensor = collections.readings.entry(sensor_id.clone()).or_default();
        put(per_sensor, timestamp, reading, self.on_duplicate, || {
            format!("reading of sensor \"{}\" at {}", sensor_id, timestamp)
        })
    }

    async fn find_sensor_types(
        &self,
        search: &SensorTypeSearch,
    ) -> Result<Vec<SensorType>, AppError> {
        let collections = self.collections.read().await;
        let matches = collections
            .sensor_types
            .values()
            .filter(|st| search.matches(st))
            .cloned()
            .collect();
        Ok(search.paging.window(matches))
    }

    async fn find_sensors(&self, search: &SensorSearch) -> Result<Vec<Sensor>, AppError> {
        let collections = self.collections.read().await;
        let matches = collections
            .sensors
            .values()
            .filter(|s| search.matches(s))
            .cloned()
            .collect();
        Ok(search.paging.window(matches))
    }

    async fn find_sensor_readings(
        &self,
        search: &SensorReadingSearch,
    ) -> Result<Vec<SensorReading>, AppError> {
        let collections = self.collections.read().await;
        // BTreeMap::range panics on an inverted range
        let inverted = search.min_timestamp > search.max_timestamp;
        let matches = match collections.readings.get(&search.sensor_id) {
            Some(per_sensor) if !inverted => per_sensor
                .range(search.min_timestamp..=search.max_timestamp)
                .map(|(_, r)| r)
                .filter(|r| search.matches(r))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        Ok(search.paging.window(matches))
    }

    async fn clear(&self) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        *collections = Collections::default();
        Ok(())
    }

    async fn close(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors_info::entities::Paging;
    use crate::sensors_info::range::Range;

    fn sensor_type(id: &str, manufacturer: &str) -> SensorType {
        SensorType {
            id: id.to_string(),
            manufacturer: manufacturer.to_string(),
            model_number: "m".to_string(),
            quantity: "q".to_string(),
            unit: "u".to_string(),
            limits: Range::new(0.0, 10.0),
        }
    }

    fn reading(sensor_id: &str, timestamp: u64, value: f64) -> SensorReading {
        SensorReading {
            sensor_id: sensor_id.to_string(),
            timestamp,
            value,
        }
    }

    #[tokio::test]
    async fn replace_policy_overwrites() {
        let dao = MemoryDao::new(OnDuplicate::Replace);
        dao.add_sensor_type(sensor_type("a", "x")).await.unwrap();
        dao.add_sensor_type(sensor_type("a", "y")).await.unwrap();
        let all = dao
            .find_sensor_types(&SensorTypeSearch::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].manufacturer, "y");
    }

    #[tokio::test]
    async fn reject_policy_fails_exists() {
        let dao = MemoryDao::new(OnDuplicate::Reject);
        dao.add_sensor_reading(reading("s", 1, 1.0)).await.unwrap();
        let err = dao.add_sensor_reading(reading("s", 1, 2.0)).await.unwrap_err();
        assert_eq!(err.err_type, ErrorType::Exists);
        dao.add_sensor_reading(reading("s", 2, 2.0)).await.unwrap();
        dao.add_sensor_reading(reading("t", 1, 2.0)).await.unwrap();
    }

    #[tokio::test]
    async fn finds_are_sorted_and_windowed() {
        let dao = MemoryDao::new(OnDuplicate::Replace);
        for id in ["c", "a", "b", "aa"] {
            dao.add_sensor_type(sensor_type(id, "x")).await.unwrap();
        }
        let ids: Vec<String> = dao
            .find_sensor_types(&SensorTypeSearch::default())
            .await
            .unwrap()
            .into_iter()
            .map(|st| st.id)
            .collect();
        assert_eq!(ids, vec!["a", "aa", "b", "c"]);

        let search = SensorTypeSearch {
            paging: Paging {
                index: 1,
                count: Some(2),
            },
            ..Default::default()
        };
        let page = dao.find_sensor_types(&search).await.unwrap();
        assert_eq!(page[0].id, "aa");
        assert_eq!(page[1].id, "b");

        for ts in [30, 10, 20] {
            dao.add_sensor_reading(reading("s", ts, 0.0)).await.unwrap();
        }
        let search = SensorReadingSearch {
            sensor_id: "s".to_string(),
            min_timestamp: 0,
            max_timestamp: u64::MAX,
            values: Range::unbounded(),
            paging: Paging::default(),
        };
        let ts: Vec<u64> = dao
            .find_sensor_readings(&search)
            .await
            .unwrap()
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(ts, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dao = MemoryDao::new(OnDuplicate::Replace);
        dao.add_sensor_type(sensor_type("a", "x")).await.unwrap();
        dao.clear().await.unwrap();
        dao.clear().await.unwrap();
        assert!(dao
            .find_sensor_types(&SensorTypeSearch::default())
            .await
            .unwrap()
            .is_empty());
    }
}
