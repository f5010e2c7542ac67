//! JSON encode/decode entry points.
//!
//! Decoding goes through `serde_json::Value` so the payload can be unwrapped
//! and structurally checked before the typed decode:
//!
//! - a JSON string holding the payload is parsed first (OpenRTB 2.x carries
//!   the request in `imp.native.request` and the response in `bid.adm` as
//!   strings),
//! - the Native 1.0 envelope `{"native": {...}}` is unwrapped,
//! - every asset must populate exactly one of title/img/video/data.
//!
//! Unknown fields are dropped; `ext` is the place for extensions.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::NativeError;
use crate::request::{NativeRequest, ASSET_VARIANT_KEYS};
use crate::response::NativeResponse;

pub fn decode_request(input: &str) -> Result<NativeRequest, NativeError> {
    decode_request_value(parse(input.as_bytes())?)
}

pub fn decode_request_slice(input: &[u8]) -> Result<NativeRequest, NativeError> {
    decode_request_value(parse(input)?)
}

pub fn decode_request_value(value: Value) -> Result<NativeRequest, NativeError> {
    let value = unwrap_payload(value)?;
    check_asset_variants(&value)?;
    let request: NativeRequest = from_value(value)?;
    log::debug!(
        "decoded native request ver={} assets={}",
        request.ver,
        request.assets.len()
    );
    Ok(request)
}

pub fn decode_response(input: &str) -> Result<NativeResponse, NativeError> {
    decode_response_value(parse(input.as_bytes())?)
}

pub fn decode_response_slice(input: &[u8]) -> Result<NativeResponse, NativeError> {
    decode_response_value(parse(input)?)
}

/// Besides the typed decode, rejects a response that has neither `assets`
/// nor `assetsurl`/`dcourl`: such a payload cannot be rendered.
pub fn decode_response_value(value: Value) -> Result<NativeResponse, NativeError> {
    let value = unwrap_payload(value)?;
    check_asset_variants(&value)?;
    let response: NativeResponse = from_value(value)?;
    if response.assets.is_none() && response.assetsurl.is_none() && response.dcourl.is_none() {
        return Err(NativeError::MissingRequiredField {
            path: "assets".to_string(),
        });
    }
    log::debug!(
        "decoded native response ver={} representation={:?}",
        response.ver,
        response.representation()
    );
    Ok(response)
}

pub fn encode_request(request: &NativeRequest) -> Result<String, NativeError> {
    to_string(request)
}

pub fn encode_request_value(request: &NativeRequest) -> Result<Value, NativeError> {
    to_value(request)
}

pub fn encode_response(response: &NativeResponse) -> Result<String, NativeError> {
    to_string(response)
}

pub fn encode_response_value(response: &NativeResponse) -> Result<Value, NativeError> {
    to_value(response)
}

fn parse(input: &[u8]) -> Result<Value, NativeError> {
    serde_json::from_slice(input).map_err(|e| NativeError::MalformedInput(e.to_string()))
}

fn unwrap_payload(value: Value) -> Result<Value, NativeError> {
    let value = match value {
        Value::String(inner) => parse(inner.as_bytes())?,
        other => other,
    };
    match value {
        Value::Object(mut map) => {
            if map.len() == 1 && map.get("native").is_some_and(Value::is_object) {
                if let Some(inner) = map.remove("native") {
                    return Ok(inner);
                }
            }
            Ok(Value::Object(map))
        }
        other => Err(NativeError::MalformedInput(format!(
            "expected a JSON object, found {}",
            json_type(&other)
        ))),
    }
}

fn check_asset_variants(value: &Value) -> Result<(), NativeError> {
    let Some(Value::Array(assets)) = value.get("assets") else {
        return Ok(());
    };
    for (index, asset) in assets.iter().enumerate() {
        let Value::Object(fields) = asset else {
            continue;
        };
        let found = ASSET_VARIANT_KEYS
            .iter()
            .filter(|key| fields.get(**key).is_some_and(|v| !v.is_null()))
            .count();
        if found != 1 {
            return Err(NativeError::InvalidVariant {
                path: format!("assets[{}]", index),
                found,
            });
        }
    }
    Ok(())
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, NativeError> {
    serde_json::from_value(value).map_err(classify)
}

/// serde reports absent fields as "missing field `name`"; everything else is
/// a shape or type problem.
fn classify(err: serde_json::Error) -> NativeError {
    let message = err.to_string();
    if let Some(rest) = message.strip_prefix("missing field `") {
        if let Some((field, _)) = rest.split_once('`') {
            return NativeError::MissingRequiredField {
                path: field.to_string(),
            };
        }
    }
    NativeError::MalformedInput(message)
}

fn to_string<T: Serialize>(value: &T) -> Result<String, NativeError> {
    serde_json::to_string(value).map_err(|e| NativeError::Serialization(e.to_string()))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, NativeError> {
    serde_json::to_value(value).map_err(|e| NativeError::Serialization(e.to_string()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
