use crate::db;
use crate::grading::{self, MarkInput};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    db_conn, db_err, load_grade_scale, optional_f64, optional_str, required_str, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

const BULK_SAVE_MAX_ENTRIES: usize = 5000;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.create" => Some(handle_marks_write(state, req, WriteMode::Create)),
        "marks.save" => Some(handle_marks_write(state, req, WriteMode::Upsert)),
        "marks.bulkSave" => Some(handle_marks_bulk_save(state, req)),
        "marks.list" => Some(handle_marks_list(state, req)),
        "marks.get" => Some(handle_marks_get(state, req)),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum WriteMode {
    /// Strict create: an existing (student, subject, exam, year) row is a
    /// conflict the caller must resolve.
    Create,
    /// Get-or-create-then-update semantics.
    Upsert,
}

fn parse_mark_input(params: &serde_json::Value) -> Result<MarkInput, HandlerErr> {
    Ok(MarkInput {
        theory_marks: optional_f64(params, "theoryMarks")?,
        theory_total: optional_f64(params, "theoryTotal")?.unwrap_or(100.0),
        practical_marks: optional_f64(params, "practicalMarks")?,
        practical_total: optional_f64(params, "practicalTotal")?.unwrap_or(0.0),
    })
}

fn resolve_student_id(
    conn: &Connection,
    student_id: Option<&str>,
    symbol_number: Option<&str>,
) -> Result<String, HandlerErr> {
    if let Some(id) = student_id {
        let found: Option<String> = conn
            .query_row("SELECT id FROM students WHERE id = ?", [id], |r| r.get(0))
            .optional()
            .map_err(db_err)?;
        return found.ok_or_else(|| {
            HandlerErr::with_details("not_found", "student not found", json!({ "studentId": id }))
        });
    }
    if let Some(symbol) = symbol_number {
        let found: Option<String> = conn
            .query_row(
                "SELECT id FROM students WHERE symbol_number = ?",
                [symbol],
                |r| r.get(0),
            )
            .optional()
            .map_err(db_err)?;
        return found.ok_or_else(|| {
            HandlerErr::with_details(
                "not_found",
                "student not found",
                json!({ "symbolNumber": symbol }),
            )
        });
    }
    Err(HandlerErr::new(
        "bad_params",
        "studentId or symbolNumber is required",
    ))
}

fn subject_exists(conn: &Connection, subject_id: &str) -> Result<bool, HandlerErr> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM subjects WHERE id = ?", [subject_id], |r| {
            r.get(0)
        })
        .optional()
        .map_err(db_err)?;
    Ok(found.is_some())
}

fn existing_mark_id(
    conn: &Connection,
    student_id: &str,
    subject_id: &str,
    exam_type: &str,
    academic_year: &str,
) -> Result<Option<String>, HandlerErr> {
    conn.query_row(
        "SELECT id FROM marks
         WHERE student_id = ? AND subject_id = ? AND exam_type = ? AND academic_year = ?",
        (student_id, subject_id, exam_type, academic_year),
        |r| r.get(0),
    )
    .optional()
    .map_err(db_err)
}

/// Persist one mark row: inputs and derived fields land in the same
/// statement, so readers never observe a half-updated row.
fn write_mark(
    conn: &Connection,
    scale: &grading::GradeScale,
    student_id: &str,
    subject_id: &str,
    exam_type: &str,
    academic_year: &str,
    input: &MarkInput,
    mode: WriteMode,
) -> Result<String, HandlerErr> {
    let outcome = grading::compute_mark(scale, input)?;
    let now = db::now_utc();

    if mode == WriteMode::Create {
        if let Some(existing) = existing_mark_id(conn, student_id, subject_id, exam_type, academic_year)? {
            return Err(HandlerErr::with_details(
                "conflict",
                "marks already exist for this student, subject, exam and year",
                json!({ "existingMarkId": existing }),
            ));
        }
    }

    // A strict create must keep the bare INSERT: with an ON CONFLICT clause
    // a lost race would silently overwrite instead of surfacing.
    let sql = match mode {
        WriteMode::Create => {
            "INSERT INTO marks(id, student_id, subject_id, exam_type, academic_year,
                           theory_marks, theory_total, practical_marks, practical_total,
                           total_obtained, percentage, grade, grade_point, passed,
                           created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        }
        WriteMode::Upsert => {
            "INSERT INTO marks(id, student_id, subject_id, exam_type, academic_year,
                           theory_marks, theory_total, practical_marks, practical_total,
                           total_obtained, percentage, grade, grade_point, passed,
                           created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(student_id, subject_id, exam_type, academic_year) DO UPDATE SET
           theory_marks = excluded.theory_marks,
           theory_total = excluded.theory_total,
           practical_marks = excluded.practical_marks,
           practical_total = excluded.practical_total,
           total_obtained = excluded.total_obtained,
           percentage = excluded.percentage,
           grade = excluded.grade,
           grade_point = excluded.grade_point,
           passed = excluded.passed,
           updated_at = excluded.updated_at"
        }
    };
    let mark_id = Uuid::new_v4().to_string();
    let inserted = conn.execute(
        sql,
        rusqlite::params![
            &mark_id,
            student_id,
            subject_id,
            exam_type,
            academic_year,
            input.theory_marks,
            input.theory_total,
            input.practical_marks,
            input.practical_total,
            outcome.total_obtained,
            outcome.percentage,
            &outcome.grade,
            outcome.grade_point,
            outcome.passed as i64,
            &now,
            &now,
        ],
    );
    match inserted {
        Ok(_) => {}
        // A strict create can still lose a race between the probe and the
        // insert; surface it as the same conflict rather than upserting.
        Err(e) if mode == WriteMode::Create && db::is_unique_violation(&e) => {
            return Err(HandlerErr::new(
                "conflict",
                "marks already exist for this student, subject, exam and year",
            ));
        }
        Err(e) => {
            return Err(HandlerErr::with_details(
                "db_insert_failed",
                e.to_string(),
                json!({ "table": "marks" }),
            ));
        }
    }

    existing_mark_id(conn, student_id, subject_id, exam_type, academic_year)?
        .ok_or_else(|| HandlerErr::new("db_query_failed", "mark vanished after write"))
}

const MARK_SELECT: &str = "SELECT m.id, m.student_id, s.full_name, s.symbol_number, s.student_class,
            m.subject_id, sub.name, m.exam_type, m.academic_year,
            m.theory_marks, m.theory_total, m.practical_marks, m.practical_total,
            m.total_obtained, m.percentage, m.grade, m.grade_point, m.passed,
            m.created_at, m.updated_at
     FROM marks m
     JOIN students s ON s.id = m.student_id
     JOIN subjects sub ON sub.id = m.subject_id";

fn map_mark_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<serde_json::Value> {
    Ok(json!({
        "markId": r.get::<_, String>(0)?,
        "studentId": r.get::<_, String>(1)?,
        "studentName": r.get::<_, String>(2)?,
        "symbolNumber": r.get::<_, String>(3)?,
        "studentClass": r.get::<_, String>(4)?,
        "subjectId": r.get::<_, String>(5)?,
        "subjectName": r.get::<_, String>(6)?,
        "examType": r.get::<_, String>(7)?,
        "academicYear": r.get::<_, String>(8)?,
        "theoryMarks": r.get::<_, Option<f64>>(9)?,
        "theoryTotal": r.get::<_, f64>(10)?,
        "practicalMarks": r.get::<_, Option<f64>>(11)?,
        "practicalTotal": r.get::<_, f64>(12)?,
        "totalObtained": r.get::<_, f64>(13)?,
        "percentage": r.get::<_, f64>(14)?,
        "grade": r.get::<_, String>(15)?,
        "gradePoint": r.get::<_, f64>(16)?,
        "passed": r.get::<_, i64>(17)? != 0,
        "createdAt": r.get::<_, Option<String>>(18)?,
        "updatedAt": r.get::<_, Option<String>>(19)?
    }))
}

fn fetch_mark(conn: &Connection, mark_id: &str) -> Result<Option<serde_json::Value>, HandlerErr> {
    conn.query_row(
        &format!("{} WHERE m.id = ?", MARK_SELECT),
        [mark_id],
        map_mark_row,
    )
    .optional()
    .map_err(db_err)
}

fn handle_marks_write(state: &mut AppState, req: &Request, mode: WriteMode) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exam_type = match required_str(req, "examType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let academic_year = match required_str(req, "academicYear") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let student_id = match resolve_student_id(
        conn,
        optional_str(&req.params, "studentId").as_deref(),
        optional_str(&req.params, "symbolNumber").as_deref(),
    ) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match subject_exists(conn, &subject_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "subject not found", None),
        Err(e) => return e.response(&req.id),
    }
    let input = match parse_mark_input(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let scale = match load_grade_scale(conn) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let mark_id = match write_mark(
        conn,
        &scale,
        &student_id,
        &subject_id,
        &exam_type,
        &academic_year,
        &input,
        mode,
    ) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match fetch_mark(conn, &mark_id) {
        Ok(Some(row)) => ok(&req.id, row),
        Ok(None) => err(&req.id, "not_found", "mark not found after write", None),
        Err(e) => e.response(&req.id),
    }
}

fn handle_marks_bulk_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exam_type = match required_str(req, "examType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let academic_year = match required_str(req, "academicYear") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(entries) = req.params.get("entries").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing entries", None);
    };
    if entries.len() > BULK_SAVE_MAX_ENTRIES {
        return err(
            &req.id,
            "bad_params",
            "too many entries",
            Some(json!({ "entries": entries.len(), "max": BULK_SAVE_MAX_ENTRIES })),
        );
    }
    match subject_exists(conn, &subject_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "subject not found", None),
        Err(e) => return e.response(&req.id),
    }
    let scale = match load_grade_scale(conn) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    // Each entry stands alone: a bad row is reported and skipped, never a
    // reason to abort the batch.
    let mut saved = 0usize;
    let mut errors: Vec<serde_json::Value> = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let row_result = (|| -> Result<(), HandlerErr> {
            let student_id = resolve_student_id(
                conn,
                optional_str(entry, "studentId").as_deref(),
                optional_str(entry, "symbolNumber").as_deref(),
            )?;
            let input = parse_mark_input(entry)?;
            write_mark(
                conn,
                &scale,
                &student_id,
                &subject_id,
                &exam_type,
                &academic_year,
                &input,
                WriteMode::Upsert,
            )?;
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

    ok(
        &req.id,
        json!({
            "saved": saved,
            "rejected": errors.len(),
            "errors": errors
        }),
    )
}

fn handle_marks_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();
    if let Some(v) = optional_str(&req.params, "studentId") {
        clauses.push("m.student_id = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "subjectId") {
        clauses.push("m.subject_id = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "examType") {
        clauses.push("m.exam_type = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "academicYear") {
        clauses.push("m.academic_year = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "studentClass") {
        clauses.push("s.student_class = ?");
        binds.push(Value::Text(v));
    }

    let mut sql = MARK_SELECT.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY s.full_name, sub.name");

    let mut stmt = match conn.prepare(&sql) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = match stmt
        .query_map(params_from_iter(binds), map_mark_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(&req.id, json!({ "marks": rows }))
}

fn handle_marks_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mark_id = match required_str(req, "markId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match fetch_mark(conn, &mark_id) {
        Ok(Some(row)) => ok(&req.id, row),
        Ok(None) => err(&req.id, "not_found", "mark not found", None),
        Err(e) => e.response(&req.id),
    }
}
