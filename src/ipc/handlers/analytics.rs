use std::collections::BTreeMap;

use crate::db;
use crate::grading::{self, CohortStats};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, db_err, required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.recompute" => Some(handle_analytics_recompute(state, req)),
        "analytics.class.get" => Some(handle_analytics_class_get(state, req)),
        "analytics.subject.get" => Some(handle_analytics_subject_get(state, req)),
        _ => None,
    }
}

struct AnalyticsKey {
    class_name: String,
    exam_type: String,
    academic_year: String,
}

fn parse_key(req: &Request) -> Result<AnalyticsKey, serde_json::Value> {
    Ok(AnalyticsKey {
        class_name: required_str(req, "className")?,
        exam_type: required_str(req, "examType")?,
        academic_year: required_str(req, "academicYear")?,
    })
}

fn class_stats_json(key: &AnalyticsKey, stats: &CohortStats, computed_at: &str) -> serde_json::Value {
    json!({
        "className": key.class_name,
        "examType": key.exam_type,
        "academicYear": key.academic_year,
        "totalStudents": stats.total,
        "passedStudents": stats.passed,
        "failedStudents": stats.failed,
        "averageGpa": stats.average,
        "highestGpa": stats.highest,
        "lowestGpa": stats.lowest,
        "passPercentage": grading::round_off_2_decimals(stats.pass_percentage),
        "computedAt": computed_at
    })
}

fn subject_stats_json(
    key: &AnalyticsKey,
    subject_name: &str,
    stats: &CohortStats,
    computed_at: &str,
) -> serde_json::Value {
    json!({
        "subjectName": subject_name,
        "className": key.class_name,
        "examType": key.exam_type,
        "academicYear": key.academic_year,
        "totalStudents": stats.total,
        "passedStudents": stats.passed,
        "failedStudents": stats.failed,
        "averageMarks": stats.average,
        "highestMarks": stats.highest,
        "lowestMarks": stats.lowest,
        "passPercentage": grading::round_off_2_decimals(stats.pass_percentage),
        "computedAt": computed_at
    })
}

fn load_result_gpas(conn: &Connection, key: &AnalyticsKey) -> Result<Vec<Option<f64>>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT gpa FROM results
             WHERE student_class = ? AND exam_type = ? AND academic_year = ?",
        )
        .map_err(db_err)?;
    stmt.query_map(
        (&key.class_name, &key.exam_type, &key.academic_year),
        |r| r.get::<_, Option<f64>>(0),
    )
    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    .map_err(db_err)
}

/// Mark rows for the key, grouped by subject name. BTreeMap keeps the
/// per-subject output in a stable order.
fn load_subject_marks(
    conn: &Connection,
    key: &AnalyticsKey,
) -> Result<BTreeMap<String, Vec<(f64, bool)>>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT sub.name, m.total_obtained, m.passed
             FROM marks m
             JOIN students s ON s.id = m.student_id
             JOIN subjects sub ON sub.id = m.subject_id
             WHERE s.student_class = ? AND m.exam_type = ? AND m.academic_year = ?",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map(
            (&key.class_name, &key.exam_type, &key.academic_year),
            |r| {
                let name: String = r.get(0)?;
                let obtained: f64 = r.get(1)?;
                let passed: i64 = r.get(2)?;
                Ok((name, obtained, passed != 0))
            },
        )
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(db_err)?;

    let mut grouped: BTreeMap<String, Vec<(f64, bool)>> = BTreeMap::new();
    for (name, obtained, passed) in rows {
        grouped.entry(name).or_default().push((obtained, passed));
    }
    Ok(grouped)
}

fn handle_analytics_recompute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let key = match parse_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let gpas = match load_result_gpas(conn, &key) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let subject_marks = match load_subject_marks(conn, &key) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    if gpas.is_empty() && subject_marks.is_empty() {
        return err(
            &req.id,
            "not_found",
            "no results or marks for this class, exam and year",
            Some(json!({
                "className": key.class_name,
                "examType": key.exam_type,
                "academicYear": key.academic_year
            })),
        );
    }

    let computed_at = db::now_utc();

    // One transaction per key: a concurrent trigger sees either the previous
    // snapshot or the full new one, never a partial write.
    let tx = match conn.unchecked_transaction() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let class_snapshot = if gpas.is_empty() {
        // No result rows left: drop the stale snapshot instead of fabricating
        // a zeroed one.
        if let Err(e) = tx.execute(
            "DELETE FROM class_analytics
             WHERE class_name = ? AND exam_type = ? AND academic_year = ?",
            (&key.class_name, &key.exam_type, &key.academic_year),
        ) {
            return err(&req.id, "db_insert_failed", e.to_string(), None);
        }
        None
    } else {
        let stats = grading::summarize_gpas(gpas);
        let written = tx.execute(
            "INSERT INTO class_analytics(id, class_name, exam_type, academic_year,
                                         total_students, passed_students, failed_students,
                                         average_gpa, highest_gpa, lowest_gpa, pass_percentage,
                                         computed_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(class_name, exam_type, academic_year) DO UPDATE SET
               total_students = excluded.total_students,
               passed_students = excluded.passed_students,
               failed_students = excluded.failed_students,
               average_gpa = excluded.average_gpa,
               highest_gpa = excluded.highest_gpa,
               lowest_gpa = excluded.lowest_gpa,
               pass_percentage = excluded.pass_percentage,
               computed_at = excluded.computed_at",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                &key.class_name,
                &key.exam_type,
                &key.academic_year,
                stats.total as i64,
                stats.passed as i64,
                stats.failed as i64,
                stats.average,
                stats.highest,
                stats.lowest,
                stats.pass_percentage,
                &computed_at,
            ],
        );
        if let Err(e) = written {
            return err(&req.id, "db_insert_failed", e.to_string(), None);
        }
        Some(stats)
    };

    // Subjects that dropped out of the population lose their rows too.
    let delete_stale = if subject_marks.is_empty() {
        tx.execute(
            "DELETE FROM subject_analytics
             WHERE class_name = ? AND exam_type = ? AND academic_year = ?",
            (&key.class_name, &key.exam_type, &key.academic_year),
        )
    } else {
        let names: Vec<String> = subject_marks.keys().cloned().collect();
        let placeholders = std::iter::repeat("?")
            .take(names.len())
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "DELETE FROM subject_analytics
             WHERE class_name = ? AND exam_type = ? AND academic_year = ?
               AND subject_name NOT IN ({})",
            placeholders
        );
        let mut binds: Vec<rusqlite::types::Value> = vec![
            rusqlite::types::Value::Text(key.class_name.clone()),
            rusqlite::types::Value::Text(key.exam_type.clone()),
            rusqlite::types::Value::Text(key.academic_year.clone()),
        ];
        for n in &names {
            binds.push(rusqlite::types::Value::Text(n.clone()));
        }
        tx.execute(&sql, rusqlite::params_from_iter(binds))
    };
    if let Err(e) = delete_stale {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }

    let mut subject_snapshots: Vec<serde_json::Value> = Vec::new();
    for (subject_name, rows) in &subject_marks {
        let stats = grading::summarize_marks(rows.iter().copied());
        let written = tx.execute(
            "INSERT INTO subject_analytics(id, subject_name, class_name, exam_type, academic_year,
                                           total_students, passed_students, failed_students,
                                           average_marks, highest_marks, lowest_marks,
                                           pass_percentage, computed_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(subject_name, class_name, exam_type, academic_year) DO UPDATE SET
               total_students = excluded.total_students,
               passed_students = excluded.passed_students,
               failed_students = excluded.failed_students,
               average_marks = excluded.average_marks,
               highest_marks = excluded.highest_marks,
               lowest_marks = excluded.lowest_marks,
               pass_percentage = excluded.pass_percentage,
               computed_at = excluded.computed_at",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                subject_name,
                &key.class_name,
                &key.exam_type,
                &key.academic_year,
                stats.total as i64,
                stats.passed as i64,
                stats.failed as i64,
                stats.average,
                stats.highest,
                stats.lowest,
                stats.pass_percentage,
                &computed_at,
            ],
        );
        if let Err(e) = written {
            return err(&req.id, "db_insert_failed", e.to_string(), None);
        }
        subject_snapshots.push(subject_stats_json(&key, subject_name, &stats, &computed_at));
    }

    if let Err(e) = tx.commit() {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }

    ok(
        &req.id,
        json!({
            "classAnalytics": class_snapshot
                .map(|stats| class_stats_json(&key, &stats, &computed_at)),
            "subjectAnalytics": subject_snapshots
        }),
    )
}

fn handle_analytics_class_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let key = match parse_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let row = conn
        .query_row(
            "SELECT total_students, passed_students, failed_students, average_gpa,
                    highest_gpa, lowest_gpa, pass_percentage, computed_at
             FROM class_analytics
             WHERE class_name = ? AND exam_type = ? AND academic_year = ?",
            (&key.class_name, &key.exam_type, &key.academic_year),
            |r| {
                Ok(json!({
                    "className": key.class_name,
                    "examType": key.exam_type,
                    "academicYear": key.academic_year,
                    "totalStudents": r.get::<_, i64>(0)?,
                    "passedStudents": r.get::<_, i64>(1)?,
                    "failedStudents": r.get::<_, i64>(2)?,
                    "averageGpa": r.get::<_, f64>(3)?,
                    "highestGpa": r.get::<_, f64>(4)?,
                    "lowestGpa": r.get::<_, f64>(5)?,
                    "passPercentage": grading::round_off_2_decimals(r.get::<_, f64>(6)?),
                    "computedAt": r.get::<_, Option<String>>(7)?
                }))
            },
        )
        .optional();
    match row {
        Ok(Some(v)) => ok(&req.id, v),
        Ok(None) => err(
            &req.id,
            "not_found",
            "no analytics for this class, exam and year",
            None,
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_analytics_subject_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_name = match required_str(req, "subjectName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let key = match parse_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let row = conn
        .query_row(
            "SELECT total_students, passed_students, failed_students, average_marks,
                    highest_marks, lowest_marks, pass_percentage, computed_at
             FROM subject_analytics
             WHERE subject_name = ? AND class_name = ? AND exam_type = ? AND academic_year = ?",
            (
                &subject_name,
                &key.class_name,
                &key.exam_type,
                &key.academic_year,
            ),
            |r| {
                Ok(json!({
                    "subjectName": subject_name,
                    "className": key.class_name,
                    "examType": key.exam_type,
                    "academicYear": key.academic_year,
                    "totalStudents": r.get::<_, i64>(0)?,
                    "passedStudents": r.get::<_, i64>(1)?,
                    "failedStudents": r.get::<_, i64>(2)?,
                    "averageMarks": r.get::<_, f64>(3)?,
                    "highestMarks": r.get::<_, f64>(4)?,
                    "lowestMarks": r.get::<_, f64>(5)?,
                    "passPercentage": grading::round_off_2_decimals(r.get::<_, f64>(6)?),
                    "computedAt": r.get::<_, Option<String>>(7)?
                }))
            },
        )
        .optional();
    match row {
        Ok(Some(v)) => ok(&req.id, v),
        Ok(None) => err(
            &req.id,
            "not_found",
            "no analytics for this subject, class, exam and year",
            None,
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}
