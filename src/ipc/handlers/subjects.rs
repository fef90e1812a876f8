use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    db_conn, db_err, optional_bool, optional_f64, optional_str, required_str, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.update" => Some(handle_subjects_update(state, req)),
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.get" => Some(handle_subjects_get(state, req)),
        _ => None,
    }
}

fn subject_base_code(name: &str) -> String {
    let base: String = name
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect();
    if base.is_empty() {
        "SUB".to_string()
    } else {
        base
    }
}

/// First three letters of the name, then numeric suffixes until free.
fn generate_subject_code(conn: &Connection, name: &str) -> Result<String, HandlerErr> {
    let base = subject_base_code(name);
    let mut counter = 0u32;
    loop {
        let candidate = if counter == 0 {
            base.clone()
        } else {
            format!("{}{}", base, counter)
        };
        let taken: Option<i64> = conn
            .query_row("SELECT 1 FROM subjects WHERE code = ?", [&candidate], |r| {
                r.get(0)
            })
            .optional()
            .map_err(db_err)?;
        if taken.is_none() {
            return Ok(candidate);
        }
        counter += 1;
    }
}

struct SubjectRow {
    id: String,
    name: String,
    code: Option<String>,
    credit_hour: f64,
    description: Option<String>,
    active: bool,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl SubjectRow {
    fn to_json(&self) -> serde_json::Value {
        json!({
            "subjectId": self.id,
            "name": self.name,
            "code": self.code,
            "creditHour": self.credit_hour,
            "description": self.description,
            "active": self.active,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at
        })
    }
}

const SUBJECT_COLS: &str =
    "id, name, code, credit_hour, description, active, created_at, updated_at";

fn map_subject_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<SubjectRow> {
    Ok(SubjectRow {
        id: r.get(0)?,
        name: r.get(1)?,
        code: r.get(2)?,
        credit_hour: r.get(3)?,
        description: r.get(4)?,
        active: r.get::<_, i64>(5)? != 0,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

fn fetch_subject(conn: &Connection, subject_id: &str) -> Result<Option<SubjectRow>, HandlerErr> {
    conn.query_row(
        &format!("SELECT {} FROM subjects WHERE id = ?", SUBJECT_COLS),
        [subject_id],
        map_subject_row,
    )
    .optional()
    .map_err(db_err)
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let credit_hour = match optional_f64(&req.params, "creditHour") {
        Ok(v) => v.unwrap_or(1.0),
        Err(e) => return e.response(&req.id),
    };
    if credit_hour < 0.0 {
        return err(
            &req.id,
            "bad_params",
            "creditHour must be >= 0",
            Some(json!({ "creditHour": credit_hour })),
        );
    }
    let active = match optional_bool(&req.params, "active") {
        Ok(v) => v.unwrap_or(true),
        Err(e) => return e.response(&req.id),
    };
    let description = optional_str(&req.params, "description");
    let code = match optional_str(&req.params, "code") {
        Some(c) => c,
        None => match generate_subject_code(conn, &name) {
            Ok(c) => c,
            Err(e) => return e.response(&req.id),
        },
    };

    let subject_id = Uuid::new_v4().to_string();
    let now = db::now_utc();
    let inserted = conn.execute(
        "INSERT INTO subjects(id, name, code, credit_hour, description, active, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &subject_id,
            &name,
            &code,
            credit_hour,
            &description,
            active as i64,
            &now,
            &now,
        ),
    );
    if let Err(e) = inserted {
        if db::is_unique_violation(&e) {
            return err(
                &req.id,
                "conflict",
                "subject name or code already exists",
                Some(json!({ "name": name, "code": code })),
            );
        }
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }

    match fetch_subject(conn, &subject_id) {
        Ok(Some(row)) => ok(&req.id, row.to_json()),
        Ok(None) => err(&req.id, "not_found", "subject vanished after insert", None),
        Err(e) => e.response(&req.id),
    }
}

fn handle_subjects_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let existing = match fetch_subject(conn, &subject_id) {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "not_found", "subject not found", None),
        Err(e) => return e.response(&req.id),
    };

    let name = optional_str(&req.params, "name").unwrap_or(existing.name);
    let code = optional_str(&req.params, "code").or(existing.code);
    let credit_hour = match optional_f64(&req.params, "creditHour") {
        Ok(v) => v.unwrap_or(existing.credit_hour),
        Err(e) => return e.response(&req.id),
    };
    if credit_hour < 0.0 {
        return err(
            &req.id,
            "bad_params",
            "creditHour must be >= 0",
            Some(json!({ "creditHour": credit_hour })),
        );
    }
    let description = optional_str(&req.params, "description").or(existing.description);
    let active = match optional_bool(&req.params, "active") {
        Ok(v) => v.unwrap_or(existing.active),
        Err(e) => return e.response(&req.id),
    };

    let updated = conn.execute(
        "UPDATE subjects
         SET name = ?, code = ?, credit_hour = ?, description = ?, active = ?, updated_at = ?
         WHERE id = ?",
        (
            &name,
            &code,
            credit_hour,
            &description,
            active as i64,
            db::now_utc(),
            &subject_id,
        ),
    );
    if let Err(e) = updated {
        if db::is_unique_violation(&e) {
            return err(
                &req.id,
                "conflict",
                "subject name or code already exists",
                Some(json!({ "name": name, "code": code })),
            );
        }
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }

    match fetch_subject(conn, &subject_id) {
        Ok(Some(row)) => ok(&req.id, row.to_json()),
        Ok(None) => err(&req.id, "not_found", "subject not found", None),
        Err(e) => e.response(&req.id),
    }
}

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let active_only = match optional_bool(&req.params, "activeOnly") {
        Ok(v) => v.unwrap_or(false),
        Err(e) => return e.response(&req.id),
    };
    let search = optional_str(&req.params, "search").map(|s| s.to_lowercase());

    let mut sql = format!("SELECT {} FROM subjects", SUBJECT_COLS);
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();
    if active_only {
        clauses.push("active = 1");
    }
    if let Some(s) = &search {
        clauses.push("(lower(name) LIKE '%'||?||'%' OR lower(COALESCE(code,'')) LIKE '%'||?||'%')");
        binds.push(Value::Text(s.clone()));
        binds.push(Value::Text(s.clone()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY name");

    let mut stmt = match conn.prepare(&sql) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = match stmt
        .query_map(params_from_iter(binds), map_subject_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let subjects = rows.iter().map(|r| r.to_json()).collect::<Vec<_>>();
    ok(&req.id, json!({ "subjects": subjects }))
}

fn handle_subjects_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match fetch_subject(conn, &subject_id) {
        Ok(Some(row)) => ok(&req.id, row.to_json()),
        Ok(None) => err(&req.id, "not_found", "subject not found", None),
        Err(e) => e.response(&req.id),
    }
}
