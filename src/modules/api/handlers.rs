use crate::{
    modules::api::responder::{single, PageRequest},
    sensors_info::{
        entities::{Sensor, SensorReading, SensorType},
        validators::{raw_req_from_json, RawReq},
        SensorsInfo,
    },
    shared::errors::{AppError, ErrorType, ErrorsResponse},
};
use std::sync::Arc;
use utoipa::IntoParams;
use warp::http::StatusCode;

#[allow(unused)]
#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SensorTypeQueries {
    id: Option<String>,
    manufacturer: Option<String>,
    #[param(rename = "modelNumber")]
    model_number: Option<String>,
    quantity: Option<String>,
    unit: Option<String>,
    index: Option<u64>,
    count: Option<u64>,
}

#[allow(unused)]
#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SensorQueries {
    id: Option<String>,
    #[param(rename = "sensorTypeId")]
    sensor_type_id: Option<String>,
    period: Option<u64>,
    index: Option<u64>,
    count: Option<u64>,
}

#[allow(unused)]
#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SensorReadingQueries {
    #[param(rename = "sensorId")]
    sensor_id: String,
    #[param(rename = "minTimestamp")]
    min_timestamp: Option<u64>,
    #[param(rename = "maxTimestamp")]
    max_timestamp: Option<u64>,
    #[param(rename = "minValue")]
    min_value: Option<f64>,
    #[param(rename = "maxValue")]
    max_value: Option<f64>,
    index: Option<u64>,
    count: Option<u64>,
}

fn sensor_type_href(st: &SensorType) -> String {
    format!("/sensor-types/{}", st.id)
}

fn sensor_href(sensor: &Sensor) -> String {
    format!("/sensors/{}", sensor.id)
}

fn reading_href(reading: &SensorReading) -> String {
    format!("/sensor-readings/{}/{}", reading.sensor_id, reading.timestamp)
}

fn not_found(what: String) -> warp::Rejection {
    warp::reject::custom(AppError {
        err_type: ErrorType::NotFound,
        message: format!("{} not found", what),
    })
}

fn created<T: serde::Serialize>(href: String, entity: T) -> impl warp::Reply {
    warp::reply::with_status(warp::reply::json(&single(href, entity)), StatusCode::CREATED)
}

#[utoipa::path(
        put,
        path = "/sensor-types",
        request_body = Object,
        responses(
            (status = 201, description = "Sensor type stored", body = SensorType),
            (status = 400, description = "Validation error", body = ErrorsResponse),
            (status = 409, description = "Sensor type already exists", body = ErrorsResponse),
            (status = 500, description = "Internal Server Error", body = ErrorsResponse),
        )
    )
]
pub async fn add_sensor_type_handler(
    body: serde_json::Value,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let req = raw_req_from_json(&body).map_err(warp::reject::custom)?;
    let sensor_type = info
        .add_sensor_type(&req)
        .await
        .map_err(warp::reject::custom)?;
    Ok(created(sensor_type_href(&sensor_type), sensor_type))
}

#[utoipa::path(
        put,
        path = "/sensors",
        request_body = Object,
        responses(
            (status = 201, description = "Sensor stored", body = Sensor),
            (status = 400, description = "Validation error, unknown sensor type or range outside its limits", body = ErrorsResponse),
            (status = 409, description = "Sensor already exists", body = ErrorsResponse),
            (status = 500, description = "Internal Server Error", body = ErrorsResponse),
        )
    )
]
pub async fn add_sensor_handler(
    body: serde_json::Value,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let req = raw_req_from_json(&body).map_err(warp::reject::custom)?;
    let sensor = info.add_sensor(&req).await.map_err(warp::reject::custom)?;
    Ok(created(sensor_href(&sensor), sensor))
}

#[utoipa::path(
        put,
        path = "/sensor-readings",
        request_body = Object,
        responses(
            (status = 201, description = "Reading stored", body = SensorReading),
            (status = 400, description = "Validation error or unknown sensor", body = ErrorsResponse),
            (status = 409, description = "Reading already exists", body = ErrorsResponse),
            (status = 500, description = "Internal Server Error", body = ErrorsResponse),
        )
    )
]
pub async fn add_sensor_reading_handler(
    body: serde_json::Value,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let req = raw_req_from_json(&body).map_err(warp::reject::custom)?;
    let reading = info
        .add_sensor_reading(&req)
        .await
        .map_err(warp::reject::custom)?;
    Ok(created(reading_href(&reading), reading))
}

#[utoipa::path(
        get,
        path = "/sensor-types/{id}",
        params(("id" = String, Path, description = "Sensor type id")),
        responses(
            (status = 200, description = "Sensor type found", body = SensorType),
            (status = 404, description = "No such sensor type", body = ErrorsResponse),
        )
    )
]
pub async fn get_sensor_type_handler(
    id: String,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let req = RawReq::from([("id".to_string(), id.clone())]);
    let sensor_type = info
        .find_sensor_types(&req)
        .await
        .map_err(warp::reject::custom)?
        .into_iter()
        .next()
        .ok_or_else(|| not_found(format!("sensor type \"{}\"", id)))?;
    Ok(warp::reply::json(&single(
        sensor_type_href(&sensor_type),
        sensor_type,
    )))
}

#[utoipa::path(
        get,
        path = "/sensors/{id}",
        params(("id" = String, Path, description = "Sensor id")),
        responses(
            (status = 200, description = "Sensor found", body = Sensor),
            (status = 404, description = "No such sensor", body = ErrorsResponse),
        )
    )
]
pub async fn get_sensor_handler(
    id: String,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let req = RawReq::from([("id".to_string(), id.clone())]);
    let sensor = info
        .find_sensors(&req)
        .await
        .map_err(warp::reject::custom)?
        .into_iter()
        .next()
        .ok_or_else(|| not_found(format!("sensor \"{}\"", id)))?;
    Ok(warp::reply::json(&single(sensor_href(&sensor), sensor)))
}

#[utoipa::path(
        get,
        path = "/sensor-readings/{sensorId}/{timestamp}",
        params(
            ("sensorId" = String, Path, description = "Sensor id"),
            ("timestamp" = u64, Path, description = "Reading timestamp"),
        ),
        responses(
            (status = 200, description = "Reading found", body = SensorReading),
                        (status = 404, description = "No such reading", body = ErrorsResponse),
        )
    )
]
pub async fn get_sensor_reading_handler(
    sensor_id: String,
    timestamp: u64,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let req = RawReq::from([
        ("sensorId".to_string(), sensor_id.clone()),
        ("minTimestamp".to_string(), timestamp.to_string()),
        ("maxTimestamp".to_string(), timestamp.to_string()),
    ]);
    let reading = info
        .find_sensor_readings(&req)
        .await
        .map_err(warp::reject::custom)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            not_found(format!(
                "reading of sensor \"{}\" at {}",
                sensor_id, timestamp
            ))
        })?;
    Ok(warp::reply::json(&single(reading_href(&reading), reading)))
}

#[utoipa::path(
        get,
        path = "/sensor-types",
        params(SensorTypeQueries),
        responses(
            (status = 200, description = "Matching sensor types sorted by id", body = [SensorType]),
            (status = 400, description = "Bad search field", body = ErrorsResponse),
        )
    )
]
pub async fn find_sensor_types_handler(
    query: RawReq,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page = PageRequest::new(query);
    let sensor_types = info
        .find_sensor_types(&page.probe())
        .await
        .map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&page.envelope(
        "/sensor-types",
        sensor_types,
        sensor_type_href,
    )))
}

#[utoipa::path(
        get,
        path = "/sensors",
        params(SensorQueries),
        responses(
            (status = 200, description = "Matching sensors sorted by id", body = [Sensor]),
            (status = 400, description = "Bad search field", body = ErrorsResponse),
        )
    )
]
pub async fn find_sensors_handler(
    query: RawReq,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page = PageRequest::new(query);
    let sensors = info
        .find_sensors(&page.probe())
        .await
        .map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&page.envelope("/sensors", sensors, sensor_href)))
}

#[utoipa::path(
        get,
        path = "/sensor-readings",
        params(SensorReadingQueries),
        responses(
            (status = 200, description = "Matching readings sorted by timestamp", body = [SensorReading]),
            (status = 400, description = "Missing sensorId or bad bounds", body = ErrorsResponse),
        )
    )
]
pub async fn find_sensor_readings_handler(
    query: RawReq,
    info: Arc<SensorsInfo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page = PageRequest::new(query);
    let readings = info
        .find_sensor_readings(&page.probe())
        .await
        .map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&page.envelope(
        "/sensor-readings",
        readings,
        reading_href,
    )))
}
