use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::ToSchema;
use warp::{http::StatusCode, reject::Reject, Rejection, Reply};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    Required,
    BadVal,
    BadRange,
    BadId,
    Exists,
    NotFound,
    BadReq,
    Db,
    Internal,
}

impl ErrorType {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorType::Required => "REQUIRED",
            ErrorType::BadVal => "BAD_VAL",
            ErrorType::BadRange => "BAD_RANGE",
            ErrorType::BadId => "BAD_ID",
            ErrorType::Exists => "EXISTS",
            ErrorType::NotFound => "NOT_FOUND",
            ErrorType::BadReq => "BAD_REQ",
            ErrorType::Db => "DB",
            ErrorType::Internal => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorType::Exists => StatusCode::CONFLICT,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::Db | ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{err_type}: {message}")]
pub struct AppError {
    pub err_type: ErrorType,
    pub message: String,
}

impl AppError {
    pub fn new(message: &str, err_type: ErrorType) -> AppError {
        AppError {
            err_type,
            message: message.to_string(),
        }
    }

    /// Duplicate-key write failures become `EXISTS`, anything else is opaque `DB`.
    pub fn from_mongo_err(err: MongoError, context: &str) -> AppError {
        let err_type = match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref e)) if e.code == DUPLICATE_KEY => {
                ErrorType::Exists
            }
            _ => ErrorType::Db,
        };
        AppError {
            err_type,
            message: format!("{} {}", context, err),
        }
    }
}

impl Reject for AppError {}

/// Failing result of every core operation: all errors detected in one pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", join_messages(.0))]
pub struct AppErrors(pub Vec<AppError>);

fn join_messages(errs: &[AppError]) -> String {
    errs.iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppErrors {
    pub fn first_type(&self) -> ErrorType {
        self.0
            .first()
            .map(|e| e.err_type)
            .unwrap_or(ErrorType::Internal)
    }

    pub fn types(&self) -> Vec<ErrorType> {
        self.0.iter().map(|e| e.err_type).collect()
    }
}

impl From<AppError> for AppErrors {
    fn from(err: AppError) -> Self {
        AppErrors(vec![err])
    }
}

impl Reject for AppErrors {}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorMessage {
    pub code: ErrorType,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorsResponse {
    pub errors: Vec<ErrorMessage>,
}

impl From<&AppErrors> for ErrorsResponse {
    fn from(errs: &AppErrors) -> Self {
        ErrorsResponse {
            errors: errs
                .0
                .iter()
                .map(|e| ErrorMessage {
                    code: e.err_type,
                    message: e.message.clone(),
                })
                .collect(),
        }
    }
}

/// Request-shape rejections that keep their own HTTP status. Body problems
/// win over a method mismatch picked up from a sibling route.
fn body_status(err: &Rejection) -> Option<StatusCode> {
    if err.find::<warp::reject::LengthRequired>().is_some() {
        Some(StatusCode::LENGTH_REQUIRED)
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        Some(StatusCode::PAYLOAD_TOO_LARGE)
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        Some(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        Some(StatusCode::METHOD_NOT_ALLOWED)
    } else {
        None
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let errs = if let Some(errs) = err.find::<AppErrors>() {
        errs.clone()
    } else if let Some(e) = err.find::<AppError>() {
        AppErrors::from(e.clone())
    } else if err.is_not_found() {
        AppErrors::from(AppError::new("resource not found", ErrorType::NotFound))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        AppErrors::from(AppError::new(&e.to_string(), ErrorType::BadReq))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        AppErrors::from(AppError::new(&e.to_string(), ErrorType::BadReq))
    } else if let Some(status) = body_status(&err) {
        let res = ErrorsResponse::from(&AppErrors::from(AppError::new(
            status.canonical_reason().unwrap_or("bad request"),
            ErrorType::BadReq,
        )));
        return Ok(warp::reply::with_status(warp::reply::json(&res), status));
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        AppErrors::from(AppError::new("internal server error", ErrorType::Internal))
    };

    let status = errs.first_type().status();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("{}", errs);
    }
    let res = ErrorsResponse::from(&errs);
    Ok(warp::reply::with_status(warp::reply::json(&res), status))
}
