//! `{ "data": ... }` envelope shared by every successful response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    /// Serialize now. Lets handlers wrap borrowed payloads such as
    /// `&Frame` without cloning them into an owned response type.
    pub fn ok(data: T) -> Response {
        Json(Self { data }).into_response()
    }

    /// `201 Created` with the envelope.
    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, Json(Self { data })).into_response()
    }
}
