use chrono::{NaiveDate, Utc};

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, db_err, optional_str, required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

const ATTENDANCE_STATUSES: [&str; 5] = ["present", "absent", "late", "excused", "leave"];

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.mark" => Some(handle_attendance_mark(state, req)),
        "attendance.list" => Some(handle_attendance_list(state, req)),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        HandlerErr::with_details(
            "bad_params",
            "date must be YYYY-MM-DD",
            json!({ "date": raw }),
        )
    })
}

fn student_exists(conn: &Connection, student_id: &str) -> Result<bool, HandlerErr> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
            r.get(0)
        })
        .optional()
        .map_err(db_err)?;
    Ok(found.is_some())
}

fn handle_attendance_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let date_raw = match required_str(req, "date") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let date = match parse_date(&date_raw) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(entries) = req.params.get("entries").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing entries", None);
    };
    let class_section_id = optional_str(&req.params, "classSectionId");
    let marked_by = optional_str(&req.params, "markedBy");

    let mut saved = 0usize;
    let mut errors: Vec<serde_json::Value> = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let row_result = (|| -> Result<(), HandlerErr> {
            let student_id = optional_str(entry, "studentId")
                .ok_or_else(|| HandlerErr::new("bad_params", "missing studentId"))?;
            let status = optional_str(entry, "status")
                .ok_or_else(|| HandlerErr::new("bad_params", "missing status"))?
                .to_lowercase();
            if !ATTENDANCE_STATUSES.contains(&status.as_str()) {
                return Err(HandlerErr::with_details(
                    "bad_params",
                    "status must be one of: present, absent, late, excused, leave",
                    json!({ "status": status }),
                ));
            }
            if !student_exists(conn, &student_id)? {
                return Err(HandlerErr::with_details(
                    "not_found",
                    "student not found",
                    json!({ "studentId": student_id }),
                ));
            }

            let locked: Option<i64> = conn
                .query_row(
                    "SELECT locked FROM attendance WHERE student_id = ? AND date = ?",
                    (&student_id, &date_raw),
                    |r| r.get(0),
                )
                .optional()
                .map_err(db_err)?;
            if locked == Some(1) {
                return Err(HandlerErr::with_details(
                    "conflict",
                    "attendance for this day is locked",
                    json!({ "studentId": student_id, "date": date_raw }),
                ));
            }

            let attendance_id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO attendance(id, student_id, class_section_id, date, status,
                                        marked_by, remarks, locked, created_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?, 0, ?)
                 ON CONFLICT(student_id, date) DO UPDATE SET
                   class_section_id = excluded.class_section_id,
                   status = excluded.status,
                   marked_by = excluded.marked_by,
                   remarks = excluded.remarks",
                rusqlite::params![
                    &attendance_id,
                    &student_id,
                    &class_section_id,
                    &date_raw,
                    &status,
                    &marked_by,
                    optional_str(entry, "remarks"),
                    db::now_utc(),
                ],
            )
            .map_err(|e| {
                HandlerErr::with_details(
                    "db_insert_failed",
                    e.to_string(),
                    json!({ "table": "attendance" }),
                )
            })?;
            Ok(())
        })();
        match row_result {
            Ok(()) => saved += 1,
            Err(e) => {
                let mut row = e.row_json();
                row["index"] = json!(index);
                errors.push(row);
            }
        }
    }

    // Back-dated sheets lock once written; today's stays editable.
    let today = Utc::now().date_naive();
    let locked = date < today;
    if locked {
        if let Err(e) = conn.execute("UPDATE attendance SET locked = 1 WHERE date = ?", [&date_raw])
        {
            return err(&req.id, "db_insert_failed", e.to_string(), None);
        }
    }

    ok(
        &req.id,
        json!({
            "saved": saved,
            "rejected": errors.len(),
            "errors": errors,
            "locked": locked
        }),
    )
}

fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();
    if let Some(v) = optional_str(&req.params, "studentId") {
        clauses.push("a.student_id = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "classSectionId") {
        clauses.push("a.class_section_id = ?");
        binds.push(Value::Text(v));
    }
    for (key, clause) in [("dateFrom", "a.date >= ?"), ("dateTo", "a.date <= ?")] {
        if let Some(v) = optional_str(&req.params, key) {
            if let Err(e) = parse_date(&v) {
                return e.response(&req.id);
            }
            clauses.push(clause);
            binds.push(Value::Text(v));
        }
    }

    let mut sql = "SELECT a.id, a.student_id, s.full_name, a.class_section_id, a.date, a.status,
                a.marked_by, a.remarks, a.locked, a.created_at
         FROM attendance a
         JOIN students s ON s.id = a.student_id"
        .to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY a.date DESC, s.full_name");

    let mut stmt = match conn.prepare(&sql) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = match stmt
        .query_map(params_from_iter(binds), |r| {
            Ok(json!({
                "attendanceId": r.get::<_, String>(0)?,
                "studentId": r.get::<_, String>(1)?,
                "studentName": r.get::<_, String>(2)?,
                "classSectionId": r.get::<_, Option<String>>(3)?,
                "date": r.get::<_, String>(4)?,
                "status": r.get::<_, String>(5)?,
                "markedBy": r.get::<_, Option<String>>(6)?,
                "remarks": r.get::<_, Option<String>>(7)?,
                "locked": r.get::<_, i64>(8)? != 0,
                "createdAt": r.get::<_, Option<String>>(9)?
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(&req.id, json!({ "attendance": rows }))
}
