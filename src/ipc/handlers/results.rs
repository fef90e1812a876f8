use crate::db;
use crate::grading::{self, SubjectResultInput};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    db_conn, db_err, load_grade_scale, optional_bool, optional_f64, optional_i64, optional_str,
    required_str, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.create" => Some(handle_results_write(state, req, WriteMode::Create)),
        "results.save" => Some(handle_results_write(state, req, WriteMode::Upsert)),
        "results.bulkSave" => Some(handle_results_bulk_save(state, req)),
        "results.setSubject" => Some(handle_results_set_subject(state, req)),
        "results.get" => Some(handle_results_get(state, req)),
        "results.list" => Some(handle_results_list(state, req)),
        "results.publish" => Some(handle_results_publish(state, req, true)),
        "results.unpublish" => Some(handle_results_publish(state, req, false)),
        "results.publicLookup" => Some(handle_results_public_lookup(state, req)),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum WriteMode {
    Create,
    Upsert,
}

struct ResultFields {
    student_name: String,
    roll_number: String,
    student_class: String,
    exam_type: String,
    academic_year: String,
    exam_date: Option<String>,
    total_marks: f64,
    gpa: Option<f64>,
    total_subjects: Option<i64>,
    passed_subjects: Option<i64>,
    failed_subjects: Option<i64>,
    remarks: Option<String>,
    class_position: Option<i64>,
    cohort_size: Option<i64>,
}

fn parse_result_fields(params: &serde_json::Value) -> Result<ResultFields, HandlerErr> {
    let required = |key: &str| -> Result<String, HandlerErr> {
        match params.get(key).and_then(|v| v.as_str()) {
            Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(HandlerErr::new("bad_params", format!("missing {}", key))),
        }
    };
    let total_marks = optional_f64(params, "totalMarks")?.unwrap_or(0.0);
    if total_marks < 0.0 {
        return Err(HandlerErr::with_details(
            "bad_params",
            "totalMarks must be >= 0",
            json!({ "totalMarks": total_marks }),
        ));
    }
    let gpa = optional_f64(params, "gpa")?;
    if let Some(g) = gpa {
        if !(0.0..=4.0).contains(&g) {
            return Err(HandlerErr::with_details(
                "bad_params",
                "gpa must be within 0.0..=4.0",
                json!({ "gpa": g }),
            ));
        }
    }
    Ok(ResultFields {
        student_name: required("studentName")?,
        roll_number: required("rollNumber")?,
        student_class: required("studentClass")?,
        exam_type: optional_str(params, "examType").unwrap_or_else(|| "Final Term".to_string()),
        academic_year: optional_str(params, "academicYear")
            .unwrap_or_else(|| "2024-25".to_string()),
        exam_date: optional_str(params, "examDate"),
        total_marks,
        gpa,
        total_subjects: optional_i64(params, "totalSubjects")?,
        passed_subjects: optional_i64(params, "passedSubjects")?,
        failed_subjects: optional_i64(params, "failedSubjects")?,
        remarks: optional_str(params, "remarks"),
        class_position: optional_i64(params, "classPosition")?,
        cohort_size: optional_i64(params, "cohortSize")?,
    })
}

fn existing_result_id(conn: &Connection, f: &ResultFields) -> Result<Option<String>, HandlerErr> {
    conn.query_row(
        "SELECT id FROM results
         WHERE roll_number = ? AND student_class = ? AND exam_type = ? AND academic_year = ?",
        (
            &f.roll_number,
            &f.student_class,
            &f.exam_type,
            &f.academic_year,
        ),
        |r| r.get(0),
    )
    .optional()
    .map_err(db_err)
}

/// Insert or update one aggregate result. The GPA-path percentage is
/// re-derived on every write; publication fields are never touched here.
fn write_result(conn: &Connection, f: &ResultFields, mode: WriteMode) -> Result<String, HandlerErr> {
    let percentage = grading::aggregate_percentage(f.total_marks, f.gpa);
    let now = db::now_utc();

    if mode == WriteMode::Create {
        if let Some(existing) = existing_result_id(conn, f)? {
            return Err(HandlerErr::with_details(
                "conflict",
                "a result already exists for this roll number, class, exam and year",
                json!({ "existingResultId": existing }),
            ));
        }
    }

    // Same rule as the marks path: a strict create keeps the bare INSERT so
    // a lost race surfaces as a conflict instead of an overwrite.
    let sql = match mode {
        WriteMode::Create => {
            "INSERT INTO results(id, student_name, roll_number, student_class, exam_type,
                             academic_year, exam_date, total_marks, gpa, percentage,
                             total_subjects, passed_subjects, failed_subjects, remarks,
                             class_position, cohort_size, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        }
        WriteMode::Upsert => {
            "INSERT INTO results(id, student_name, roll_number, student_class, exam_type,
                             academic_year, exam_date, total_marks, gpa, percentage,
                             total_subjects, passed_subjects, failed_subjects, remarks,
                             class_position, cohort_size, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(roll_number, student_class, exam_type, academic_year) DO UPDATE SET
           student_name = excluded.student_name,
           exam_date = excluded.exam_date,
           total_marks = excluded.total_marks,
           gpa = excluded.gpa,
           percentage = excluded.percentage,
           total_subjects = excluded.total_subjects,
           passed_subjects = excluded.passed_subjects,
           failed_subjects = excluded.failed_subjects,
           remarks = excluded.remarks,
           class_position = excluded.class_position,
           cohort_size = excluded.cohort_size,
           updated_at = excluded.updated_at"
        }
    };
    let result_id = Uuid::new_v4().to_string();
    let inserted = conn.execute(
        sql,
        rusqlite::params![
            &result_id,
            &f.student_name,
            &f.roll_number,
            &f.student_class,
            &f.exam_type,
            &f.academic_year,
            &f.exam_date,
            f.total_marks,
            f.gpa,
            percentage,
            f.total_subjects.unwrap_or(0),
            f.passed_subjects.unwrap_or(0),
            f.failed_subjects.unwrap_or(0),
            &f.remarks,
            f.class_position,
            f.cohort_size,
            &now,
            &now,
        ],
    );
    match inserted {
        Ok(_) => {}
        Err(e) if mode == WriteMode::Create && db::is_unique_violation(&e) => {
            return Err(HandlerErr::new(
                "conflict",
                "a result already exists for this roll number, class, exam and year",
            ));
        }
        Err(e) => {
            return Err(HandlerErr::with_details(
                "db_insert_failed",
                e.to_string(),
                json!({ "table": "results" }),
            ));
        }
    }

    existing_result_id(conn, f)?
        .ok_or_else(|| HandlerErr::new("db_query_failed", "result vanished after write"))
}

const RESULT_SELECT: &str = "SELECT id, student_name, roll_number, student_class, exam_type, academic_year,
            exam_date, total_marks, gpa, percentage, total_subjects, passed_subjects,
            failed_subjects, remarks, published, published_at, published_by,
            class_position, cohort_size, created_at, updated_at
     FROM results";

fn map_result_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<serde_json::Value> {
    let gpa: Option<f64> = r.get(8)?;
    Ok(json!({
        "resultId": r.get::<_, String>(0)?,
        "studentName": r.get::<_, String>(1)?,
        "rollNumber": r.get::<_, String>(2)?,
        "studentClass": r.get::<_, String>(3)?,
        "examType": r.get::<_, String>(4)?,
        "academicYear": r.get::<_, String>(5)?,
        "examDate": r.get::<_, Option<String>>(6)?,
        "totalMarks": r.get::<_, f64>(7)?,
        "gpa": gpa,
        "percentage": r.get::<_, Option<f64>>(9)?,
        "totalSubjects": r.get::<_, i64>(10)?,
        "passedSubjects": r.get::<_, i64>(11)?,
        "failedSubjects": r.get::<_, i64>(12)?,
        "remarks": r.get::<_, Option<String>>(13)?,
        "published": r.get::<_, i64>(14)? != 0,
        "publishedAt": r.get::<_, Option<String>>(15)?,
        "publishedBy": r.get::<_, Option<String>>(16)?,
        "classPosition": r.get::<_, Option<i64>>(17)?,
        "cohortSize": r.get::<_, Option<i64>>(18)?,
        "createdAt": r.get::<_, Option<String>>(19)?,
        "updatedAt": r.get::<_, Option<String>>(20)?,
        "performanceStatus": grading::performance_status(gpa)
    }))
}

fn fetch_result(conn: &Connection, result_id: &str) -> Result<Option<serde_json::Value>, HandlerErr> {
    conn.query_row(
        &format!("{} WHERE id = ?", RESULT_SELECT),
        [result_id],
        map_result_row,
    )
    .optional()
    .map_err(db_err)
}

fn fetch_subject_rows(conn: &Connection, result_id: &str) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT id, subject_name, credit_hour, theory_marks, theory_total, theory_grade,
                    theory_grade_point, practical_marks, practical_total, practical_grade,
                    practical_grade_point, grade_point, final_grade, passed, remarks, optional
             FROM subject_results
             WHERE result_id = ?
             ORDER BY subject_name",
        )
        .map_err(db_err)?;
    stmt.query_map([result_id], |r| {
        Ok(json!({
            "subjectResultId": r.get::<_, String>(0)?,
            "subjectName": r.get::<_, String>(1)?,
            "creditHour": r.get::<_, f64>(2)?,
            "theoryMarks": r.get::<_, Option<f64>>(3)?,
            "theoryTotal": r.get::<_, Option<f64>>(4)?,
            "theoryGrade": r.get::<_, Option<String>>(5)?,
            "theoryGradePoint": r.get::<_, Option<f64>>(6)?,
            "practicalMarks": r.get::<_, Option<f64>>(7)?,
            "practicalTotal": r.get::<_, Option<f64>>(8)?,
            "practicalGrade": r.get::<_, Option<String>>(9)?,
            "practicalGradePoint": r.get::<_, Option<f64>>(10)?,
            "gradePoint": r.get::<_, Option<f64>>(11)?,
            "finalGrade": r.get::<_, Option<String>>(12)?,
            "passed": r.get::<_, Option<i64>>(13)?.map(|v| v != 0),
            "remarks": r.get::<_, Option<String>>(14)?,
            "optional": r.get::<_, i64>(15)? != 0
        }))
    })
    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    .map_err(db_err)
}

fn handle_results_write(state: &mut AppState, req: &Request, mode: WriteMode) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let fields = match parse_result_fields(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let result_id = match write_result(conn, &fields, mode) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match fetch_result(conn, &result_id) {
        Ok(Some(row)) => ok(&req.id, row),
        Ok(None) => err(&req.id, "not_found", "result not found after write", None),
        Err(e) => e.response(&req.id),
    }
}

fn handle_results_bulk_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(entries) = req.params.get("results").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing results", None);
    };

    let mut saved = 0usize;
    let mut errors: Vec<serde_json::Value> = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let row_result = parse_result_fields(entry)
            .and_then(|fields| write_result(conn, &fields, WriteMode::Upsert));
        match row_result {
            Ok(_) => saved += 1,
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

fn handle_results_set_subject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result_id = match required_str(req, "resultId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_name = match required_str(req, "subjectName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let found: Option<String> = match conn
        .query_row("SELECT id FROM results WHERE id = ?", [&result_id], |r| {
            r.get(0)
        })
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if found.is_none() {
        return err(&req.id, "not_found", "result not found", None);
    }

    let credit_hour = match optional_f64(&req.params, "creditHour") {
        Ok(v) => v.unwrap_or(1.0),
        Err(e) => return e.response(&req.id),
    };
    let optional_subject = match optional_bool(&req.params, "optional") {
        Ok(v) => v.unwrap_or(false),
        Err(e) => return e.response(&req.id),
    };
    let input = match parse_subject_result_input(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let scale = match load_grade_scale(conn) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let outcome = match grading::compute_subject_result(&scale, &input) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.message, e.details),
    };

    // Subject row and the parent's tallies move together or not at all.
    let tx = match conn.unchecked_transaction() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let subject_result_id = Uuid::new_v4().to_string();
    let written = tx.execute(
        "INSERT INTO subject_results(id, result_id, subject_name, credit_hour,
                                     theory_marks, theory_total, theory_grade, theory_grade_point,
                                     practical_marks, practical_total, practical_grade,
                                     practical_grade_point, grade_point, final_grade, passed,
                                     remarks, optional)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(result_id, subject_name) DO UPDATE SET
           credit_hour = excluded.credit_hour,
           theory_marks = excluded.theory_marks,
           theory_total = excluded.theory_total,
           theory_grade = excluded.theory_grade,
           theory_grade_point = excluded.theory_grade_point,
           practical_marks = excluded.practical_marks,
           practical_total = excluded.practical_total,
           practical_grade = excluded.practical_grade,
           practical_grade_point = excluded.practical_grade_point,
           grade_point = excluded.grade_point,
           final_grade = excluded.final_grade,
           passed = excluded.passed,
           remarks = excluded.remarks,
           optional = excluded.optional",
        rusqlite::params![
            &subject_result_id,
            &result_id,
            &subject_name,
            credit_hour,
            input.theory_marks,
            input.theory_total,
            &outcome.theory_grade,
            outcome.theory_grade_point,
            input.practical_marks,
            input.practical_total,
            &outcome.practical_grade,
            outcome.practical_grade_point,
            outcome.grade_point,
            &outcome.final_grade,
            outcome.passed.map(|v| v as i64),
            &outcome.remarks,
            optional_subject as i64,
        ],
    );
    if let Err(e) = written {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }

    let refreshed = tx.execute(
        "UPDATE results SET
           total_subjects = (SELECT COUNT(*) FROM subject_results WHERE result_id = ?1),
           passed_subjects = (SELECT COUNT(*) FROM subject_results WHERE result_id = ?1 AND passed = 1),
           failed_subjects = (SELECT COUNT(*) FROM subject_results WHERE result_id = ?1 AND passed = 0),
           updated_at = ?2
         WHERE id = ?1",
        (&result_id, db::now_utc()),
    );
    if let Err(e) = refreshed {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }

    let result_row = match fetch_result(conn, &result_id) {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "not_found", "result not found", None),
        Err(e) => return e.response(&req.id),
    };
    let subjects = match fetch_subject_rows(conn, &result_id) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let subject_row = subjects
        .iter()
        .find(|s| {
            s.get("subjectName")
                .and_then(|v| v.as_str())
                .map(|n| n == subject_name)
                .unwrap_or(false)
        })
        .cloned()
        .unwrap_or(json!(null));

    ok(
        &req.id,
        json!({
            "result": result_row,
            "subject": subject_row
        }),
    )
}

fn parse_subject_result_input(params: &serde_json::Value) -> Result<SubjectResultInput, HandlerErr> {
    Ok(SubjectResultInput {
        theory_marks: optional_f64(params, "theoryMarks")?,
        theory_total: optional_f64(params, "theoryTotal")?,
        practical_marks: optional_f64(params, "practicalMarks")?,
        practical_total: optional_f64(params, "practicalTotal")?,
    })
}

fn handle_results_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result_id = match required_str(req, "resultId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut row = match fetch_result(conn, &result_id) {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "not_found", "result not found", None),
        Err(e) => return e.response(&req.id),
    };
    let subjects = match fetch_subject_rows(conn, &result_id) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    row["subjects"] = json!(subjects);
    ok(&req.id, row)
}

fn handle_results_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let published_only = match optional_bool(&req.params, "publishedOnly") {
        Ok(v) => v.unwrap_or(false),
        Err(e) => return e.response(&req.id),
    };

    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();
    if let Some(v) = optional_str(&req.params, "studentClass") {
        clauses.push("student_class = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "examType") {
        clauses.push("exam_type = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "academicYear") {
        clauses.push("academic_year = ?");
        binds.push(Value::Text(v));
    }
    if published_only {
        clauses.push("published = 1");
    }

    let mut sql = RESULT_SELECT.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY student_class, roll_number");

    let mut stmt = match conn.prepare(&sql) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = match stmt
        .query_map(params_from_iter(binds), map_result_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(&req.id, json!({ "results": rows }))
}

/// Publish and unpublish share one shape: a batch of result ids, per-id
/// outcomes, and no short-circuit on failure.
fn handle_results_publish(state: &mut AppState, req: &Request, publish: bool) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(raw_ids) = req.params.get("resultIds").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing resultIds", None);
    };
    let mut result_ids: Vec<String> = Vec::new();
    for v in raw_ids {
        match v.as_str() {
            Some(s) if !s.trim().is_empty() => result_ids.push(s.trim().to_string()),
            _ => {
                return err(
                    &req.id,
                    "bad_params",
                    "resultIds must contain only non-empty strings",
                    None,
                )
            }
        }
    }
    if result_ids.is_empty() {
        return err(&req.id, "bad_params", "resultIds must not be empty", None);
    }

    let published_by = if publish {
        match required_str(req, "publishedBy") {
            Ok(v) => Some(v),
            Err(e) => return e,
        }
    } else {
        None
    };

    let now = db::now_utc();
    let mut updated = 0usize;
    let mut errors: Vec<serde_json::Value> = Vec::new();
    for result_id in &result_ids {
        let outcome = if publish {
            conn.execute(
                "UPDATE results SET published = 1, published_at = ?, published_by = ? WHERE id = ?",
                (&now, &published_by, result_id),
            )
        } else {
            conn.execute(
                "UPDATE results SET published = 0, published_at = NULL, published_by = NULL WHERE id = ?",
                [result_id],
            )
        };
        match outcome {
            Ok(1) => updated += 1,
            Ok(_) => errors.push(json!({
                "resultId": result_id,
                "code": "not_found",
                "message": "result not found"
            })),
            Err(e) => errors.push(json!({
                "resultId": result_id,
                "code": "db_insert_failed",
                "message": e.to_string()
            })),
        }
    }

    ok(
        &req.id,
        json!({
            "updated": updated,
            "failed": errors.len(),
            "errors": errors
        }),
    )
}

/// Student-facing lookup. Only published rows are visible here, ever.
fn handle_results_public_lookup(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let roll_number = match required_str(req, "rollNumber") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut clauses: Vec<&str> = vec!["published = 1", "roll_number = ?"];
    let mut binds: Vec<Value> = vec![Value::Text(roll_number.clone())];
    if let Some(v) = optional_str(&req.params, "studentClass") {
        clauses.push("student_class = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "examType") {
        clauses.push("exam_type = ?");
        binds.push(Value::Text(v));
    }
    if let Some(v) = optional_str(&req.params, "academicYear") {
        clauses.push("academic_year = ?");
        binds.push(Value::Text(v));
    }

    let sql = format!(
        "{} WHERE {} ORDER BY academic_year DESC, exam_type",
        RESULT_SELECT,
        clauses.join(" AND ")
    );
    let mut stmt = match conn.prepare(&sql) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let mut rows = match stmt
        .query_map(params_from_iter(binds), map_result_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    if rows.is_empty() {
        return err(
            &req.id,
            "not_found",
            "no published results for this roll number",
            Some(json!({ "rollNumber": roll_number })),
        );
    }

    for row in &mut rows {
        let result_id = row
            .get("resultId")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        match fetch_subject_rows(conn, &result_id) {
            Ok(subjects) => row["subjects"] = json!(subjects),
            Err(e) => return e.response(&req.id),
        }
    }

    ok(&req.id, json!({ "results": rows }))
}
