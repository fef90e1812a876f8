use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, db_err, optional_bool, optional_str, required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "classSections.create" => Some(handle_class_sections_create(state, req)),
        "classSections.list" => Some(handle_class_sections_list(state, req)),
        _ => None,
    }
}

/// Unique 8-digit symbol number. Candidates are derived from fresh UUIDs and
/// probed against the store until one is free.
fn generate_symbol_number(conn: &Connection) -> Result<String, HandlerErr> {
    loop {
        let n = (Uuid::new_v4().as_u128() % 90_000_000) + 10_000_000;
        let candidate = n.to_string();
        let taken: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM students WHERE symbol_number = ?",
                [&candidate],
                |r| r.get(0),
            )
            .optional()
            .map_err(db_err)?;
        if taken.is_none() {
            return Ok(candidate);
        }
    }
}

struct StudentRow {
    id: String,
    full_name: String,
    symbol_number: String,
    student_class: String,
    class_section_id: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    parent_name: Option<String>,
    parent_contact: Option<String>,
    active: bool,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl StudentRow {
    fn to_json(&self) -> serde_json::Value {
        json!({
            "studentId": self.id,
            "fullName": self.full_name,
            "symbolNumber": self.symbol_number,
            "studentClass": self.student_class,
            "classSectionId": self.class_section_id,
            "dateOfBirth": self.date_of_birth,
            "gender": self.gender,
            "parentName": self.parent_name,
            "parentContact": self.parent_contact,
            "active": self.active,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at
        })
    }
}

const STUDENT_COLS: &str = "id, full_name, symbol_number, student_class, class_section_id, \
     date_of_birth, gender, parent_name, parent_contact, active, created_at, updated_at";

fn map_student_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        id: r.get(0)?,
        full_name: r.get(1)?,
        symbol_number: r.get(2)?,
        student_class: r.get(3)?,
        class_section_id: r.get(4)?,
        date_of_birth: r.get(5)?,
        gender: r.get(6)?,
        parent_name: r.get(7)?,
        parent_contact: r.get(8)?,
        active: r.get::<_, i64>(9)? != 0,
        created_at: r.get(10)?,
        updated_at: r.get(11)?,
    })
}

fn fetch_student(conn: &Connection, student_id: &str) -> Result<Option<StudentRow>, HandlerErr> {
    conn.query_row(
        &format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLS),
        [student_id],
        map_student_row,
    )
    .optional()
    .map_err(db_err)
}

fn class_section_exists(conn: &Connection, section_id: &str) -> Result<bool, HandlerErr> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM class_sections WHERE id = ?",
            [section_id],
            |r| r.get(0),
        )
        .optional()
        .map_err(db_err)?;
    Ok(found.is_some())
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let full_name = match required_str(req, "fullName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_class = match required_str(req, "studentClass") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_section_id = optional_str(&req.params, "classSectionId");
    if let Some(section_id) = &class_section_id {
        match class_section_exists(conn, section_id) {
            Ok(true) => {}
            Ok(false) => return err(&req.id, "not_found", "class section not found", None),
            Err(e) => return e.response(&req.id),
        }
    }
    let symbol_number = match optional_str(&req.params, "symbolNumber") {
        Some(s) => s,
        None => match generate_symbol_number(conn) {
            Ok(s) => s,
            Err(e) => return e.response(&req.id),
        },
    };
    let active = match optional_bool(&req.params, "active") {
        Ok(v) => v.unwrap_or(true),
        Err(e) => return e.response(&req.id),
    };

    let student_id = Uuid::new_v4().to_string();
    let now = db::now_utc();
    let inserted = conn.execute(
        "INSERT INTO students(id, full_name, symbol_number, student_class, class_section_id,
                              date_of_birth, gender, parent_name, parent_contact, active,
                              created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            &student_id,
            &full_name,
            &symbol_number,
            &student_class,
            &class_section_id,
            optional_str(&req.params, "dateOfBirth"),
            optional_str(&req.params, "gender"),
            optional_str(&req.params, "parentName"),
            optional_str(&req.params, "parentContact"),
            active as i64,
            &now,
            &now,
        ],
    );
    if let Err(e) = inserted {
        if db::is_unique_violation(&e) {
            return err(
                &req.id,
                "conflict",
                "symbol number already exists",
                Some(json!({ "symbolNumber": symbol_number })),
            );
        }
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }

    match fetch_student(conn, &student_id) {
        Ok(Some(row)) => ok(&req.id, row.to_json()),
        Ok(None) => err(&req.id, "not_found", "student vanished after insert", None),
        Err(e) => e.response(&req.id),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let existing = match fetch_student(conn, &student_id) {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "not_found", "student not found", None),
        Err(e) => return e.response(&req.id),
    };

    let class_section_id =
        optional_str(&req.params, "classSectionId").or(existing.class_section_id);
    if let Some(section_id) = &class_section_id {
        match class_section_exists(conn, section_id) {
            Ok(true) => {}
            Ok(false) => return err(&req.id, "not_found", "class section not found", None),
            Err(e) => return e.response(&req.id),
        }
    }
    let full_name = optional_str(&req.params, "fullName").unwrap_or(existing.full_name);
    let symbol_number = optional_str(&req.params, "symbolNumber").unwrap_or(existing.symbol_number);
    let student_class = optional_str(&req.params, "studentClass").unwrap_or(existing.student_class);
    let active = match optional_bool(&req.params, "active") {
        Ok(v) => v.unwrap_or(existing.active),
        Err(e) => return e.response(&req.id),
    };

    let updated = conn.execute(
        "UPDATE students
         SET full_name = ?, symbol_number = ?, student_class = ?, class_section_id = ?,
             date_of_birth = ?, gender = ?, parent_name = ?, parent_contact = ?, active = ?,
             updated_at = ?
         WHERE id = ?",
        rusqlite::params![
            &full_name,
            &symbol_number,
            &student_class,
            &class_section_id,
            optional_str(&req.params, "dateOfBirth").or(existing.date_of_birth),
            optional_str(&req.params, "gender").or(existing.gender),
            optional_str(&req.params, "parentName").or(existing.parent_name),
            optional_str(&req.params, "parentContact").or(existing.parent_contact),
            active as i64,
            db::now_utc(),
            &student_id,
        ],
    );
    if let Err(e) = updated {
        if db::is_unique_violation(&e) {
            return err(
                &req.id,
                "conflict",
                "symbol number already exists",
                Some(json!({ "symbolNumber": symbol_number })),
            );
        }
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }

    match fetch_student(conn, &student_id) {
        Ok(Some(row)) => ok(&req.id, row.to_json()),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => e.response(&req.id),
    }
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_class = optional_str(&req.params, "studentClass");
    let search = optional_str(&req.params, "search").map(|s| s.to_lowercase());

    let mut sql = format!("SELECT {} FROM students", STUDENT_COLS);
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();
    if let Some(c) = &student_class {
        clauses.push("student_class = ?");
        binds.push(Value::Text(c.clone()));
    }
    if let Some(s) = &search {
        clauses.push("(lower(full_name) LIKE '%'||?||'%' OR symbol_number LIKE '%'||?||'%')");
        binds.push(Value::Text(s.clone()));
        binds.push(Value::Text(s.clone()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY full_name");

    let mut stmt = match conn.prepare(&sql) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = match stmt
        .query_map(params_from_iter(binds), map_student_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let students = rows.iter().map(|r| r.to_json()).collect::<Vec<_>>();
    ok(&req.id, json!({ "students": students }))
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match fetch_student(conn, &student_id) {
        Ok(Some(row)) => ok(&req.id, row.to_json()),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => e.response(&req.id),
    }
}

fn handle_class_sections_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let description = optional_str(&req.params, "description");
    let section_id = Uuid::new_v4().to_string();
    let inserted = conn.execute(
        "INSERT INTO class_sections(id, name, description) VALUES(?, ?, ?)",
        (&section_id, &name, &description),
    );
    if let Err(e) = inserted {
        if db::is_unique_violation(&e) {
            return err(
                &req.id,
                "conflict",
                "class section already exists",
                Some(json!({ "name": name })),
            );
        }
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(
        &req.id,
        json!({ "classSectionId": section_id, "name": name, "description": description }),
    )
}

fn handle_class_sections_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut stmt = match conn.prepare("SELECT id, name, description FROM class_sections ORDER BY name")
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = match stmt
        .query_map([], |r| {
            let id: String = r.get(0)?;
            let name: String = r.get(1)?;
            let description: Option<String> = r.get(2)?;
            Ok(json!({ "classSectionId": id, "name": name, "description": description }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    ok(&req.id, json!({ "classSections": rows }))
}
