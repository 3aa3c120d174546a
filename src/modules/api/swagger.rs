use super::{handlers, responder::Link};
use crate::sensors_info::{
    entities::{Sensor, SensorReading, SensorType},
    range::Range,
};
use crate::shared::errors::{ErrorMessage, ErrorType, ErrorsResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::add_sensor_type_handler,
        handlers::get_sensor_type_handler,
        handlers::find_sensor_types_handler,
        handlers::add_sensor_handler,
        handlers::get_sensor_handler,
        handlers::find_sensors_handler,
        handlers::add_sensor_reading_handler,
        handlers::get_sensor_reading_handler,
        handlers::find_sensor_readings_handler,
    ),
    components(schemas(
        SensorType,
        Sensor,
        SensorReading,
        Range,
        Link,
        ErrorType,
        ErrorMessage,
        ErrorsResponse
    )),
    tags( (name = "Sensors API", description = "Sensor types, sensors and their readings") )
)]
pub struct SensorsDoc;
