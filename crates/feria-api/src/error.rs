//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::{FromRequest, rejection::JsonRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use feria_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Booking(#[from] feria_core::Error),

  #[error(transparent)]
  Body(#[from] JsonRejection),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("unauthorized")]
  Unauthorized,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message, remaining) = match &self {
      ApiError::Booking(e) => match e.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, e.to_string(), None),
        ErrorKind::BadRequest => (StatusCode::BAD_REQUEST, e.to_string(), e.remaining_seats()),
        ErrorKind::Conflict => (StatusCode::CONFLICT, e.to_string(), None),
        ErrorKind::Transient => (
          StatusCode::SERVICE_UNAVAILABLE,
          "the booking could not be completed because of concurrent demand; please resubmit"
            .to_owned(),
          None,
        ),
        ErrorKind::Internal => {
          tracing::error!(error = %e, "internal error");
          (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned(), None)
        }
      },
      ApiError::Body(e) => (StatusCode::BAD_REQUEST, e.body_text(), None),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone(), None),
      ApiError::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })))
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"feria\""),
        );
        return res;
      }
    };

    let body = match remaining {
      Some(seats) => json!({ "error": message, "remainingSeats": seats }),
      None => json!({ "error": message }),
    };
    (status, Json(body)).into_response()
  }
}

/// [`Json`] whose rejections render as [`ApiError`], so malformed bodies get
/// the same `400 {"error": ...}` shape as field validation failures.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
