//! HTTP side of the error pipeline.
//!
//! Handlers return `AppError`; axum turns it into a JSON response before any
//! middleware sees the result, so the status observed by instrumentation is the
//! final one. The response also carries an [`ErrorReport`] extension that the
//! reporting middleware picks up.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use goyagi_core::{ClientCode, GoyagiError};

use crate::obs::report::ErrorReport;

#[derive(Debug)]
pub struct AppError(pub GoyagiError);

impl From<GoyagiError> for AppError {
    fn from(e: GoyagiError) -> Self {
        Self(e)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0.client_code() {
            ClientCode::BadRequest => StatusCode::BAD_REQUEST,
            ClientCode::NotFound => StatusCode::NOT_FOUND,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.client_code().as_str();
        let message = self.0.to_string();
        let server_fault = self.0.is_server_fault();

        let body = Json(json!({
            "error": code,
            "message": message,
        }));
        let mut res = (status, body).into_response();
        res.extensions_mut().insert(ErrorReport {
            code,
            message,
            server_fault,
        });
        res
    }
}
