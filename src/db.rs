use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;

pub fn now_utc() -> String {
    Utc::now().to_rfc3339()
}

pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("school.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            code TEXT UNIQUE,
            credit_hour REAL NOT NULL DEFAULT 1.0,
            description TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_name ON subjects(name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS class_sections(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            symbol_number TEXT NOT NULL UNIQUE,
            student_class TEXT NOT NULL,
            class_section_id TEXT,
            date_of_birth TEXT,
            gender TEXT,
            parent_name TEXT,
            parent_contact TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT,
            updated_at TEXT,
            FOREIGN KEY(class_section_id) REFERENCES class_sections(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(student_class)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_section ON students(class_section_id)",
        [],
    )?;
    ensure_students_contact_columns(&conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS marks(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            exam_type TEXT NOT NULL,
            academic_year TEXT NOT NULL,
            theory_marks REAL,
            theory_total REAL NOT NULL DEFAULT 100,
            practical_marks REAL,
            practical_total REAL NOT NULL DEFAULT 0,
            total_obtained REAL NOT NULL,
            percentage REAL NOT NULL,
            grade TEXT NOT NULL,
            grade_point REAL NOT NULL,
            passed INTEGER NOT NULL,
            created_at TEXT,
            updated_at TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            UNIQUE(student_id, subject_id, exam_type, academic_year)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_student ON marks(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_subject ON marks(subject_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_exam ON marks(exam_type, academic_year)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS results(
            id TEXT PRIMARY KEY,
            student_name TEXT NOT NULL,
            roll_number TEXT NOT NULL,
            student_class TEXT NOT NULL,
            exam_type TEXT NOT NULL,
            academic_year TEXT NOT NULL,
            exam_date TEXT,
            total_marks REAL NOT NULL DEFAULT 0,
            gpa REAL,
            percentage REAL,
            total_subjects INTEGER NOT NULL DEFAULT 0,
            passed_subjects INTEGER NOT NULL DEFAULT 0,
            failed_subjects INTEGER NOT NULL DEFAULT 0,
            remarks TEXT,
            published INTEGER NOT NULL DEFAULT 0,
            published_at TEXT,
            published_by TEXT,
            class_position INTEGER,
            cohort_size INTEGER,
            created_at TEXT,
            updated_at TEXT,
            UNIQUE(roll_number, student_class, exam_type, academic_year)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_results_class_exam ON results(student_class, exam_type, academic_year)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_results_roll ON results(roll_number)",
        [],
    )?;
    ensure_results_rank_columns(&conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subject_results(
            id TEXT PRIMARY KEY,
            result_id TEXT NOT NULL,
            subject_name TEXT NOT NULL,
            credit_hour REAL NOT NULL DEFAULT 1.0,
            theory_marks REAL,
            theory_total REAL,
            theory_grade TEXT,
            theory_grade_point REAL,
            practical_marks REAL,
            practical_total REAL,
            practical_grade TEXT,
            practical_grade_point REAL,
            grade_point REAL,
            final_grade TEXT,
            passed INTEGER,
            remarks TEXT,
            optional INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(result_id) REFERENCES results(id),
            UNIQUE(result_id, subject_name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subject_results_result ON subject_results(result_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS class_analytics(
            id TEXT PRIMARY KEY,
            class_name TEXT NOT NULL,
            exam_type TEXT NOT NULL,
            academic_year TEXT NOT NULL,
            total_students INTEGER NOT NULL DEFAULT 0,
            passed_students INTEGER NOT NULL DEFAULT 0,
            failed_students INTEGER NOT NULL DEFAULT 0,
            average_gpa REAL NOT NULL DEFAULT 0,
            highest_gpa REAL NOT NULL DEFAULT 0,
            lowest_gpa REAL NOT NULL DEFAULT 0,
            pass_percentage REAL NOT NULL DEFAULT 0,
            computed_at TEXT,
            UNIQUE(class_name, exam_type, academic_year)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subject_analytics(
            id TEXT PRIMARY KEY,
            subject_name TEXT NOT NULL,
            class_name TEXT NOT NULL,
            exam_type TEXT NOT NULL,
            academic_year TEXT NOT NULL,
            total_students INTEGER NOT NULL DEFAULT 0,
            passed_students INTEGER NOT NULL DEFAULT 0,
            failed_students INTEGER NOT NULL DEFAULT 0,
            average_marks REAL NOT NULL DEFAULT 0,
            highest_marks REAL NOT NULL DEFAULT 0,
            lowest_marks REAL NOT NULL DEFAULT 0,
            pass_percentage REAL NOT NULL DEFAULT 0,
            computed_at TEXT,
            UNIQUE(subject_name, class_name, exam_type, academic_year)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            class_section_id TEXT,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            marked_by TEXT,
            remarks TEXT,
            locked INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(class_section_id) REFERENCES class_sections(id),
            UNIQUE(student_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_section_date ON attendance(class_section_id, date)",
        [],
    )?;

    Ok(conn)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    use rusqlite::OptionalExtension;
    let raw: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key = ?", [key], |r| {
            r.get(0)
        })
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

fn ensure_students_contact_columns(conn: &Connection) -> anyhow::Result<()> {
    if !table_has_column(conn, "students", "parent_contact")? {
        conn.execute("ALTER TABLE students ADD COLUMN parent_contact TEXT", [])?;
    }
    Ok(())
}

fn ensure_results_rank_columns(conn: &Connection) -> anyhow::Result<()> {
    if !table_has_column(conn, "results", "class_position")? {
        conn.execute("ALTER TABLE results ADD COLUMN class_position INTEGER", [])?;
    }
    if !table_has_column(conn, "results", "cohort_size")? {
        conn.execute("ALTER TABLE results ADD COLUMN cohort_size INTEGER", [])?;
    }
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
