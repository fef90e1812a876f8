use rusqlite::Connection;
use serde_json::json;

use crate::db;
use crate::grading::{GradeScale, GradeScaleConfig, GradingError};
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};

/// Internal error carrier for multi-step handlers and per-row batch
/// diagnostics; turned into a response (or a row entry) at the edge.
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: &'static str,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    pub fn row_json(&self) -> serde_json::Value {
        let mut v = json!({ "code": self.code, "message": self.message });
        if let Some(d) = &self.details {
            v["details"] = d.clone();
        }
        v
    }
}

impl From<GradingError> for HandlerErr {
    fn from(e: GradingError) -> Self {
        Self {
            code: "bad_params",
            message: e.message,
            details: e.details,
        }
    }
}

pub fn db_err(e: rusqlite::Error) -> HandlerErr {
    HandlerErr::new("db_query_failed", e.to_string())
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(err(&req.id, "bad_params", format!("missing {}", key), None)),
    }
}

pub fn optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Absent and explicit-null both mean "no value"; a present non-number is a
/// caller bug and rejected.
pub fn optional_f64(params: &serde_json::Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            HandlerErr::with_details(
                "bad_params",
                format!("{} must be a number or null", key),
                json!({ key: v.clone() }),
            )
        }),
    }
}

pub fn optional_i64(params: &serde_json::Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            HandlerErr::with_details(
                "bad_params",
                format!("{} must be an integer or null", key),
                json!({ key: v.clone() }),
            )
        }),
    }
}

pub fn optional_bool(params: &serde_json::Value, key: &str) -> Result<Option<bool>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_bool().map(Some).ok_or_else(|| {
            HandlerErr::with_details(
                "bad_params",
                format!("{} must be a boolean or null", key),
                json!({ key: v.clone() }),
            )
        }),
    }
}

pub const GRADE_SCALE_SETTING: &str = "grading.scale";

/// The active threshold table: the stored configuration when one has been
/// set, otherwise the built-in default.
pub fn load_grade_scale(conn: &Connection) -> Result<GradeScale, HandlerErr> {
    let stored = db::settings_get_json(conn, GRADE_SCALE_SETTING)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    let Some(raw) = stored else {
        return Ok(GradeScale::default());
    };
    let config: GradeScaleConfig = serde_json::from_value(raw)
        .map_err(|e| HandlerErr::new("bad_scale", format!("stored grade scale is invalid: {}", e)))?;
    config.build().map_err(|e| HandlerErr {
        code: "bad_scale",
        message: e.message,
        details: e.details,
    })
}
