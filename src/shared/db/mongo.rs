use super::models::{SensorDoc, SensorReadingDoc, SensorTypeDoc};
use super::{OnDuplicate, SensorsDao};
use crate::sensors_info::entities::{
    Paging, Sensor, SensorReading, SensorReadingSearch, SensorSearch, SensorType,
    SensorTypeSearch,
};
use crate::sensors_info::range::Range;
use crate::shared::errors::AppError;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, FindOptions, IndexOptions, ReplaceOptions},
    Client, Collection, IndexModel,
};

const SENSOR_TYPES: &str = "sensorTypes";
const SENSORS: &str = "sensors";
const SENSOR_READINGS: &str = "sensorReadings";

pub struct MongoDao {
    client: Client,
    sensor_types: Collection<SensorTypeDoc>,
    sensors: Collection<SensorDoc>,
    readings: Collection<SensorReadingDoc>,
    on_duplicate: OnDuplicate,
}

impl MongoDao {
    pub async fn connect(
        uri: &str,
        database: &str,
        on_duplicate: OnDuplicate,
    ) -> Result<MongoDao, AppError> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While parsing MongoDB uri:"))?;
        let client = Client::with_options(options)
            .map_err(|err| AppError::from_mongo_err(err, "While creating MongoDB client:"))?;
        let db = client.database(database);

        let readings: Collection<SensorReadingDoc> = db.collection(SENSOR_READINGS);
        let index = IndexModel::builder()
            .keys(doc! { "sensorId": 1, "timestamp": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        readings
            .create_index(index, None)
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While creating readings index:"))?;

        Ok(MongoDao {
            sensor_types: db.collection(SENSOR_TYPES),
            sensors: db.collection(SENSORS),
            readings,
            client,
            on_duplicate,
        })
    }
}

fn replace_options() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

fn find_options(sort: Document, paging: &Paging) -> FindOptions {
    FindOptions::builder()
        .sort(sort)
        .skip(u64::try_from(paging.index).unwrap_or(u64::MAX))
        // a negative limit means "single batch" to the server, so clamp
        .limit(paging.count.map(|c| i64::try_from(c).unwrap_or(i64::MAX)))
        .build()
}

fn insert_opt(filter: &mut Document, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        filter.insert(key, v.clone());
    }
}

/// `$gte`/`$lte` on the finite sides of `range`, if any.
fn bounds(range: &Range) -> Option<Document> {
    let mut cond = Document::new();
    if range.min.is_finite() {
        cond.insert("$gte", range.min);
    }
    if range.max.is_finite() {
        cond.insert("$lte", range.max);
    }
    if cond.is_empty() {
        None
    } else {
        Some(cond)
    }
}

pub(crate) fn sensor_type_filter(search: &SensorTypeSearch) -> Document {
    let mut filter = Document::new();
    insert_opt(&mut filter, "_id", &search.id);
    insert_opt(&mut filter, "manufacturer", &search.manufacturer);
    insert_opt(&mut filter, "modelNumber", &search.model_number);
    insert_opt(&mut filter, "quantity", &search.quantity);
    insert_opt(&mut filter, "unit", &search.unit);
    filter
}

pub(crate) fn sensor_filter(search: &SensorSearch) -> Document {
    let mut filter = Document::new();
    insert_opt(&mut filter, "_id", &search.id);
    insert_opt(&mut filter, "sensorTypeId", &search.sensor_type_id);
    if let Some(period) = search.period {
        // periods beyond i64 cannot have been stored, so match nothing
        match i64::try_from(period) {
            Ok(p) => filter.insert("period", p),
            Err(_) => filter.insert("period", doc! { "$lt": 0 }),
        };
    }
    filter
}

/// Stored timestamps are `i64`, so bounds past `i64::MAX` either match
/// nothing (`min`) or impose no constraint (`max`).
fn timestamp_bounds(min: u64, max: u64) -> Option<Document> {
    let mut cond = Document::new();
    if min > 0 {
        match i64::try_from(min) {
            Ok(min) => cond.insert("$gte", min),
            Err(_) => cond.insert("$gt", i64::MAX),
        };
    }
    if let Ok(max) = i64::try_from(max) {
        cond.insert("$lte", max);
    }
    if cond.is_empty() {
        None
    } else {
        Some(cond)
    }
}

pub(crate) fn reading_filter(search: &SensorReadingSearch) -> Document {
    let mut filter = doc! { "sensorId": search.sensor_id.clone() };
    if let Some(cond) = timestamp_bounds(search.min_timestamp, search.max_timestamp) {
        filter.insert("timestamp", cond);
    }
    if let Some(cond) = bounds(&search.values) {
        filter.insert("value", cond);
    }
    filter
}

#[async_trait]
impl SensorsDao for MongoDao {
    async fn add_sensor_type(&self, sensor_type: SensorType) -> Result<SensorType, AppError> {
        let context = format!("While adding sensor type \"{}\":", sensor_type.id);
        let doc = SensorTypeDoc::from(sensor_type.clone());
        let res = match self.on_duplicate {
            OnDuplicate::Reject => self.sensor_types.insert_one(&doc, None).await.map(|_| ()),
            OnDuplicate::Replace => self
                .sensor_types
                .replace_one(doc! { "_id": doc.id.clone() }, &doc, replace_options())
                .await
                .map(|_| ()),
        };
        res.map_err(|err| AppError::from_mongo_err(err, &context))?;
        Ok(sensor_type)
    }

    async fn add_sensor(&self, sensor: Sensor) -> Result<Sensor, AppError> {
        let context = format!("While adding sensor \"{}\":", sensor.id);
        let doc = SensorDoc::try_from(sensor.clone())?;
        let res = match self.on_duplicate {
            OnDuplicate::Reject => self.sensors.insert_one(&doc, None).await.map(|_| ()),
            OnDuplicate::Replace => self
                .sensors
                .replace_one(doc! { "_id": doc.id.clone() }, &doc, replace_options())
                .await
                .map(|_| ()),
        };
        res.map_err(|err| AppError::from_mongo_err(err, &context))?;
        Ok(sensor)
    }

    async fn add_sensor_reading(&self, reading: SensorReading) -> Result<SensorReading, AppError> {
        let context = format!(
            "While adding reading of sensor \"{}\" at {}:",
            reading.sensor_id, reading.timestamp
        );
        let doc = SensorReadingDoc::try_from(reading.clone())?;
        let res = match self.on_duplicate {
            OnDuplicate::Reject => self.readings.insert_one(&doc, None).await.map(|_| ()),
            OnDuplicate::Replace => self
                .readings
                .replace_one(
                    doc! { "sensorId": doc.sensor_id.clone(), "timestamp": doc.timestamp },
                    &doc,
                    replace_options(),
                )
                .await
                .map(|_| ()),
        };
        res.map_err(|err| AppError::from_mongo_err(err, &context))?;
        Ok(reading)
    }

    async fn find_sensor_types(
        &self,
        search: &SensorTypeSearch,
    ) -> Result<Vec<SensorType>, AppError> {
        if search.paging.count == Some(0) {
            return Ok(Vec::new());
        }
        let docs = self
            .sensor_types
            .find(
                sensor_type_filter(search),
                find_options(doc! { "_id": 1 }, &search.paging),
            )
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While finding sensor types:"))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While finding sensor types:"))?;
        Ok(docs.into_iter().map(SensorType::from).collect())
    }

    async fn find_sensors(&self, search: &SensorSearch) -> Result<Vec<Sensor>, AppError> {
        if search.paging.count == Some(0) {
            return Ok(Vec::new());
        }
        let docs = self
            .sensors
            .find(
                sensor_filter(search),
                find_options(doc! { "_id": 1 }, &search.paging),
            )
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While finding sensors:"))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While finding sensors:"))?;
        Ok(docs.into_iter().map(Sensor::from).collect())
    }

    async fn find_sensor_readings(
        &self,
        search: &SensorReadingSearch,
    ) -> Result<Vec<SensorReading>, AppError> {
        if search.paging.count == Some(0) {
            return Ok(Vec::new());
        }
        let docs = self
            .readings
            .find(
                reading_filter(search),
                find_options(doc! { "timestamp": 1 }, &search.paging),
            )
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While finding sensor readings:"))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While finding sensor readings:"))?;
        Ok(docs.into_iter().map(SensorReading::from).collect())
    }

    async fn clear(&self) -> Result<(), AppError> {
        self.sensor_types
            .delete_many(doc! {}, None)
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While clearing sensor types:"))?;
        self.sensors
            .delete_many(doc! {}, None)
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While clearing sensors:"))?;
        self.readings
            .delete_many(doc! {}, None)
            .await
            .map_err(|err| AppError::from_mongo_err(err, "While clearing sensor readings:"))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), AppError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_is_empty_filter() {
        assert!(sensor_type_filter(&SensorTypeSearch::default()).is_empty());
        assert!(sensor_filter(&SensorSearch::default()).is_empty());
    }

    #[test]
    fn specified_fields_become_equality_terms() {
        let search = SensorTypeSearch {
            id: Some("hw123".to_string()),
            manufacturer: Some("honeywell".to_string()),
            ..Default::default()
        };
        assert_eq!(
            sensor_type_filter(&search),
            doc! { "_id": "hw123", "manufacturer": "honeywell" }
        );

        let search = SensorSearch {
            sensor_type_id: Some("hw123".to_string()),
            period: Some(1000),
            ..Default::default()
        };
        assert_eq!(
            sensor_filter(&search),
            doc! { "sensorTypeId": "hw123", "period": 1000_i64 }
        );
    }

    fn reading_search(min_timestamp: u64, max_timestamp: u64) -> SensorReadingSearch {
        SensorReadingSearch {
            sensor_id: "s1".to_string(),
            min_timestamp,
            max_timestamp,
            values: Range::unbounded(),
            paging: Paging::default(),
        }
    }

    #[test]
    fn reading_filter_drops_open_bounds() {
        assert_eq!(
            reading_filter(&reading_search(0, 50)),
            doc! { "sensorId": "s1", "timestamp": { "$lte": 50_i64 } }
        );
        assert_eq!(
            reading_filter(&reading_search(0, u64::MAX)),
            doc! { "sensorId": "s1" }
        );
        let mut search = reading_search(0, u64::MAX);
        search.values = Range::new(1.5, f64::INFINITY);
        assert_eq!(
            reading_filter(&search),
            doc! { "sensorId": "s1", "value": { "$gte": 1.5 } }
        );
    }

    #[test]
    fn timestamp_bounds_stay_integers() {
        assert_eq!(
            reading_filter(&reading_search(9007199254740993, 9007199254740993)),
            doc! {
                "sensorId": "s1",
                "timestamp": { "$gte": 9007199254740993_i64, "$lte": 9007199254740993_i64 }
            }
        );
        assert_eq!(
            reading_filter(&reading_search(u64::MAX, u64::MAX)),
            doc! { "sensorId": "s1", "timestamp": { "$gt": i64::MAX } }
        );
    }

    #[test]
    fn paging_maps_to_skip_and_limit() {
        let options = find_options(
            doc! { "_id": 1 },
            &Paging {
                index: 4,
                count: Some(3),
            },
        );
        assert_eq!(options.skip, Some(4));
        assert_eq!(options.limit, Some(3));
        let options = find_options(doc! { "_id": 1 }, &Paging::default());
        assert_eq!(options.limit, None);

        let options = find_options(
            doc! { "_id": 1 },
            &Paging {
                index: 0,
                count: Some(usize::MAX),
            },
        );
        assert_eq!(options.limit, Some(i64::MAX));
    }
}
