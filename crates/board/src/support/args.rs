#![forbid(unsafe_code)]

use super::ai::ai_error;
use kb_core::ItemId;
use serde_json::{Map, Value};
use std::fmt::Display;
use std::str::FromStr;

pub(crate) type Args = Map<String, Value>;

pub(crate) fn require_string(args: &Args, key: &str) -> Result<String, Value> {
    let Some(v) = args.get(key).and_then(|v| v.as_str()) else {
        return Err(ai_error("INVALID_INPUT", &format!("{key} is required")));
    };
    Ok(v.to_string())
}

pub(crate) fn optional_string(args: &Args, key: &str) -> Result<Option<String>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::String(v) => Ok(Some(v.to_string())),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a string"),
        )),
    }
}

/// Quantities arrive from form fields, so numeric strings are accepted too.
pub(crate) fn require_f64(args: &Args, key: &str) -> Result<f64, Value> {
    let parsed = match args.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => return Err(ai_error("INVALID_INPUT", &format!("{key} is required"))),
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| ai_error("INVALID_INPUT", &format!("{key} must be a number")))
}

pub(crate) fn optional_i64(args: &Args, key: &str) -> Result<Option<i64>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ai_error("INVALID_INPUT", &format!("{key} must be an integer"))),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be an integer"),
        )),
    }
}

pub(crate) fn optional_usize(args: &Args, key: &str) -> Result<Option<usize>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(|v| v as usize).map(Some).ok_or_else(|| {
            ai_error(
                "INVALID_INPUT",
                &format!("{key} must be a positive integer"),
            )
        }),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a positive integer"),
        )),
    }
}

pub(crate) fn require_id(args: &Args, key: &str) -> Result<ItemId, Value> {
    let raw = require_string(args, key)?;
    ItemId::try_new(raw).map_err(|err| ai_error("INVALID_INPUT", &format!("{key}: {err}")))
}

pub(crate) fn require_ids(args: &Args, key: &str) -> Result<Vec<ItemId>, Value> {
    let Some(arr) = args.get(key).and_then(|v| v.as_array()) else {
        return Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be an array of ids"),
        ));
    };
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        let Some(raw) = item.as_str() else {
            return Err(ai_error(
                "INVALID_INPUT",
                &format!("{key} must be an array of ids"),
            ));
        };
        let id = ItemId::try_new(raw)
            .map_err(|err| ai_error("INVALID_INPUT", &format!("{key}: {err}")))?;
        if !out.contains(&id) {
            out.push(id);
        }
    }
    Ok(out)
}

/// Parses an optional closed-set value such as a status or urgency.
pub(crate) fn optional_enum<T>(args: &Args, key: &str) -> Result<Option<T>, Value>
where
    T: FromStr,
    T::Err: Display,
{
    optional_string(args, key)?
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|err| ai_error("INVALID_INPUT", &format!("{key}: {err}")))
        })
        .transpose()
}

pub(crate) fn require_enum<T>(args: &Args, key: &str) -> Result<T, Value>
where
    T: FromStr,
    T::Err: Display,
{
    optional_enum(args, key)?
        .ok_or_else(|| ai_error("INVALID_INPUT", &format!("{key} is required")))
}
