use crate::sensors_info::{validators::RawReq, SensorsInfo};
use std::{convert::Infallible, sync::Arc};
use warp::{self, http::Method, Filter};

pub fn with_json_body() -> impl Filter<Extract = (serde_json::Value,), Error = warp::Rejection> + Clone
{
    warp::body::content_length_limit(1024 * 16).and(warp::body::json())
}

/// Query string as an untyped map; a missing query is an empty map.
pub fn with_raw_query() -> impl Filter<Extract = (RawReq,), Error = warp::Rejection> + Clone {
    warp::query::<RawReq>()
}

pub fn with_cors(origin: Option<&str>) -> warp::filters::cors::Cors {
    let cors = warp::cors();
    let cors = match origin {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_any_origin(),
    };
    cors.allow_headers(vec!["Content-Type", "Authorization"])
        .allow_methods(&[Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .build()
}

pub fn with_sensors_info(
    info: Arc<SensorsInfo>,
) -> impl Filter<Extract = (Arc<SensorsInfo>,), Error = Infallible> + Clone {
    warp::any().map(move || info.clone())
}
