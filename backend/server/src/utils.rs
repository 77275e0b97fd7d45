use std::collections::HashMap;

use axum::{
    body::Bytes,
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde_json::{Map, Value};

use crate::error::AppError;

pub const JSON_MIME: &str = "application/json";

/// Loose check, so `application/json; charset=utf-8` passes too.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(JSON_MIME))
}

pub fn get_json_from_body(headers: &HeaderMap, body: &Bytes) -> Result<Value, AppError> {
    if !is_json(headers) {
        return Err(AppError::ExpectedJson);
    }

    serde_json::from_slice(body).map_err(|_| AppError::InvalidJson)
}

/// Form fields as an untyped object of strings, ready for coercing validation.
pub fn get_json_from_form(fields: HashMap<String, String>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect::<Map<_, _>>(),
    )
}
