mod filters;
mod handlers;
mod responder;
mod routes;
mod swagger;

use crate::sensors_info::SensorsInfo;
use crate::shared::config::ServerConfig;
use crate::shared::errors::handle_rejection;
use std::{convert::Infallible, sync::Arc};
use tokio::task::JoinHandle;
use utoipa::OpenApi;
use warp::Filter;

/// Every route plus the OpenAPI document, with rejections turned into
/// `{ errors: [...] }` replies.
pub fn api_routes(
    info: Arc<SensorsInfo>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let api_doc = warp::path("api-doc.json")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&swagger::SensorsDoc::openapi()));

    api_doc
        .or(routes::sensor_types_route(info.clone()))
        .or(routes::sensors_route(info.clone()))
        .or(routes::sensor_readings_route(info))
        .recover(handle_rejection)
}

pub fn start_api(info: Arc<SensorsInfo>, server: ServerConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let routes = api_routes(info)
            .with(filters::with_cors(server.cors_origin.as_deref()))
            .with(warp::log("sensors_ws::api"));

        log::info!(
            "Starting API on {}:{}...",
            server
                .host
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join("."),
            server.port
        );
        warp::serve(routes).run((server.host, server.port)).await;
    })
}
