use crate::{
    modules::api::{
        filters::{with_json_body, with_raw_query, with_sensors_info},
        handlers::{
            add_sensor_handler, add_sensor_reading_handler, add_sensor_type_handler,
            find_sensor_readings_handler, find_sensor_types_handler, find_sensors_handler,
            get_sensor_handler, get_sensor_reading_handler, get_sensor_type_handler,
        },
    },
    sensors_info::SensorsInfo,
};
use std::sync::Arc;
use warp::Filter;

/// PUT and POST both add, replacing or rejecting per the store's policy.
fn add_method() -> impl Filter<Extract = (), Error = warp::Rejection> + Clone {
    warp::put().or(warp::post()).unify()
}

pub fn sensor_types_route(
    info: Arc<SensorsInfo>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let add = warp::path!("sensor-types")
        .and(add_method())
        .and(with_json_body())
        .and(with_sensors_info(info.clone()))
        .and_then(add_sensor_type_handler);

    let get = warp::path!("sensor-types" / String)
        .and(warp::get())
        .and(with_sensors_info(info.clone()))
        .and_then(get_sensor_type_handler);

    let find = warp::path!("sensor-types")
        .and(warp::get())
        .and(with_raw_query())
        .and(with_sensors_info(info))
        .and_then(find_sensor_types_handler);

    add.or(get).or(find)
}

pub fn sensors_route(
    info: Arc<SensorsInfo>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let add = warp::path!("sensors")
        .and(add_method())
        .and(with_json_body())
        .and(with_sensors_info(info.clone()))
        .and_then(add_sensor_handler);

    let get = warp::path!("sensors" / String)
        .and(warp::get())
        .and(with_sensors_info(info.clone()))
        .and_then(get_sensor_handler);

    let find = warp::path!("sensors")
        .and(warp::get())
        .and(with_raw_query())
        .and(with_sensors_info(info))
        .and_then(find_sensors_handler);

    add.or(get).or(find)
}

pub fn sensor_readings_route(
    info: Arc<SensorsInfo>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let add = warp::path!("sensor-readings")
        .and(add_method())
        .and(with_json_body())
        .and(with_sensors_info(info.clone()))
        .and_then(add_sensor_reading_handler);

    let get = warp::path!("sensor-readings" / String / u64)
        .and(warp::get())
        .and(with_sensors_info(info.clone()))
        .and_then(get_sensor_reading_handler);

    let find = warp::path!("sensor-readings")
        .and(warp::get())
        .and(with_raw_query())
        .and(with_sensors_info(info))
        .and_then(find_sensor_readings_handler);

    add.or(get).or(find)
}
