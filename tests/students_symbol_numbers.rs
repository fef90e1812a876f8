mod test_support;

use serde_json::json;
use test_support::{
    create_student, request_err, request_ok, select_workspace, spawn_sidecar, temp_dir,
};

#[test]
fn generated_symbol_numbers_are_eight_digits_and_unique() {
    let workspace = temp_dir("resultd-symbols");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let (_, first) = create_student(&mut stdin, &mut reader, "1", "Anita Sharma", "10");
    let (_, second) = create_student(&mut stdin, &mut reader, "2", "Bikash Thapa", "10");

    for symbol in [&first, &second] {
        assert_eq!(symbol.len(), 8, "symbol {} is not 8 digits", symbol);
        assert!(symbol.chars().all(|c| c.is_ascii_digit()));
    }
    assert_ne!(first, second);
}

#[test]
fn explicit_duplicate_symbol_number_is_a_conflict() {
    let workspace = temp_dir("resultd-symbol-dup");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "fullName": "Anita Sharma", "studentClass": "10", "symbolNumber": "12345678" }),
    );
    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "fullName": "Bikash Thapa", "studentClass": "10", "symbolNumber": "12345678" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("conflict"));
}

#[test]
fn list_filters_by_class_and_search() {
    let workspace = temp_dir("resultd-student-list");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = create_student(&mut stdin, &mut reader, "1", "Anita Sharma", "10");
    let _ = create_student(&mut stdin, &mut reader, "2", "Bikash Thapa", "9");

    let class_ten = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.list",
        json!({ "studentClass": "10" }),
    );
    let rows = class_ten
        .get("students")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("fullName").and_then(|v| v.as_str()),
        Some("Anita Sharma")
    );

    let searched = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "search": "thapa" }),
    );
    let rows = searched
        .get("students")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("fullName").and_then(|v| v.as_str()),
        Some("Bikash Thapa")
    );
}
