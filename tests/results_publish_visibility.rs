mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, select_workspace, spawn_sidecar, temp_dir};

fn create_result(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
    id: &str,
    roll: &str,
) -> String {
    let result = request_ok(
        stdin,
        reader,
        id,
        "results.create",
        json!({
            "studentName": "Anita Sharma",
            "rollNumber": roll,
            "studentClass": "10",
            "examType": "Final Term",
            "academicYear": "2024-25",
            "totalMarks": 480.0,
            "gpa": 3.2
        }),
    );
    result
        .get("resultId")
        .and_then(|v| v.as_str())
        .expect("resultId")
        .to_string()
}

#[test]
fn drafts_never_appear_in_public_lookup() {
    let workspace = temp_dir("resultd-publish");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let result_id = create_result(&mut stdin, &mut reader, "1", "0401");

    // Draft: invisible to the public query.
    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "results.publicLookup",
        json!({ "rollNumber": "0401" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("not_found"));

    let published = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "results.publish",
        json!({ "resultIds": [result_id], "publishedBy": "principal" }),
    );
    assert_eq!(published.get("updated").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(published.get("failed").and_then(|v| v.as_u64()), Some(0));

    let found = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "results.publicLookup",
        json!({ "rollNumber": "0401" }),
    );
    let rows = found
        .get("results")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert!(rows[0]
        .get("publishedAt")
        .and_then(|v| v.as_str())
        .is_some());
    assert_eq!(
        rows[0].get("publishedBy").and_then(|v| v.as_str()),
        Some("principal")
    );
    // GPA-path percentage: 3.2 / 4.0 x 100.
    assert_eq!(rows[0].get("percentage").and_then(|v| v.as_f64()), Some(80.0));

    // Unpublish returns the row to draft and clears the publication fields.
    let unpublished = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "results.unpublish",
        json!({ "resultIds": [result_id] }),
    );
    assert_eq!(unpublished.get("updated").and_then(|v| v.as_u64()), Some(1));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "results.publicLookup",
        json!({ "rollNumber": "0401" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("not_found"));

    let row = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "results.get",
        json!({ "resultId": result_id }),
    );
    assert_eq!(row.get("published").and_then(|v| v.as_bool()), Some(false));
    assert!(row.get("publishedAt").map(|v| v.is_null()).unwrap_or(false));
    assert!(row.get("publishedBy").map(|v| v.is_null()).unwrap_or(false));
}

#[test]
fn publish_batch_reports_per_id_failures() {
    let workspace = temp_dir("resultd-publish-batch");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let result_id = create_result(&mut stdin, &mut reader, "1", "0402");

    let outcome = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "results.publish",
        json!({ "resultIds": [result_id, "missing-id"], "publishedBy": "principal" }),
    );
    assert_eq!(outcome.get("updated").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(outcome.get("failed").and_then(|v| v.as_u64()), Some(1));
    let errors = outcome
        .get("errors")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].get("code").and_then(|v| v.as_str()),
        Some("not_found")
    );
}

#[test]
fn duplicate_sitting_key_is_a_conflict_on_strict_create() {
    let workspace = temp_dir("resultd-result-conflict");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = create_result(&mut stdin, &mut reader, "1", "0403");
    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "results.create",
        json!({
            "studentName": "Someone Else",
            "rollNumber": "0403",
            "studentClass": "10",
            "examType": "Final Term",
            "academicYear": "2024-25",
            "totalMarks": 300.0,
            "gpa": 2.4
        }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("conflict"));
}
