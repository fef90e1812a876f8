use crate::db;
use crate::grading::{GradeScale, GradeScaleConfig};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{self, db_conn};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

/// Standard exam-type labels offered to entry UIs. Free strings are still
/// accepted on write; this is the suggestion list, not an enum.
pub const EXAM_TYPES: [&str; 6] = [
    "Mid Term",
    "Final Term",
    "Unit Test",
    "Pre-Board",
    "Board Exam",
    "Other",
];

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "options.examTypes" => Some(handle_exam_types(req)),
        "gradeScale.get" => Some(handle_grade_scale_get(state, req)),
        "gradeScale.set" => Some(handle_grade_scale_set(state, req)),
        _ => None,
    }
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match db::open_db(&path) {
        Ok(conn) => {
            state.workspace = Some(path.clone());
            state.db = Some(conn);
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_exam_types(req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "examTypes": EXAM_TYPES }))
}

fn handle_grade_scale_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scale = match helpers::load_grade_scale(conn) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let stored = match db::settings_get_json(conn, helpers::GRADE_SCALE_SETTING) {
        Ok(v) => v.is_some(),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let config = GradeScaleConfig::from(&scale);
    ok(
        &req.id,
        json!({
            "scale": config,
            "source": if stored { "configured" } else { "default" }
        }),
    )
}

fn handle_grade_scale_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(raw) = req.params.get("scale") else {
        return err(&req.id, "bad_params", "missing scale", None);
    };
    let config: GradeScaleConfig = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("invalid scale: {}", e), None),
    };
    // Validate before storing so a broken table can never become active.
    let scale: GradeScale = match config.build() {
        Ok(v) => v,
        Err(e) => return err(&req.id, &e.code, e.message, e.details),
    };
    let config = GradeScaleConfig::from(&scale);
    let value = match serde_json::to_value(&config) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if let Err(e) = db::settings_set_json(conn, helpers::GRADE_SCALE_SETTING, &value) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "scale": config }))
}
