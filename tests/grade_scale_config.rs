mod test_support;

use serde_json::json;
use test_support::{
    create_student, create_subject, request_err, request_ok, select_workspace, spawn_sidecar,
    temp_dir,
};

#[test]
fn default_scale_is_served_until_one_is_configured() {
    let workspace = temp_dir("resultd-scale-default");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let result = request_ok(&mut stdin, &mut reader, "1", "gradeScale.get", json!({}));
    assert_eq!(result.get("source").and_then(|v| v.as_str()), Some("default"));
    let scale = result.get("scale").cloned().unwrap_or_default();
    let bands = scale
        .get("bands")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(bands.len(), 7);
    assert_eq!(bands[0].get("grade").and_then(|v| v.as_str()), Some("A+"));
    assert_eq!(scale.get("floorGrade").and_then(|v| v.as_str()), Some("NG"));
}

#[test]
fn configured_scale_drives_mark_computation() {
    let workspace = temp_dir("resultd-scale-custom");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let stored = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "gradeScale.set",
        json!({
            "scale": {
                "bands": [
                    { "minScore": 75.0, "grade": "H", "gradePoint": 4.0 },
                    { "minScore": 40.0, "grade": "P", "gradePoint": 2.0 }
                ],
                "floorGrade": "F",
                "floorPoint": 0.0
            }
        }),
    );
    assert!(stored.get("scale").is_some());

    let fetched = request_ok(&mut stdin, &mut reader, "2", "gradeScale.get", json!({}));
    assert_eq!(
        fetched.get("source").and_then(|v| v.as_str()),
        Some("configured")
    );

    let subject_id = create_subject(&mut stdin, &mut reader, "3", "Mathematics");
    let (student_id, _) = create_student(&mut stdin, &mut reader, "4", "Anita Sharma", "10");

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "marks.save",
        json!({
            "studentId": student_id,
            "subjectId": subject_id,
            "examType": "Final Term",
            "academicYear": "2024-25",
            "theoryMarks": 60.0
        }),
    );
    assert_eq!(saved.get("grade").and_then(|v| v.as_str()), Some("P"));
    assert_eq!(saved.get("gradePoint").and_then(|v| v.as_f64()), Some(2.0));
    assert_eq!(saved.get("passed").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn broken_scales_are_rejected_before_storage() {
    let workspace = temp_dir("resultd-scale-invalid");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    // Minimums must strictly descend.
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "gradeScale.set",
        json!({
            "scale": {
                "bands": [
                    { "minScore": 40.0, "grade": "P", "gradePoint": 2.0 },
                    { "minScore": 75.0, "grade": "H", "gradePoint": 4.0 }
                ],
                "floorGrade": "F",
                "floorPoint": 0.0
            }
        }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_scale"));

    // The default stays active.
    let fetched = request_ok(&mut stdin, &mut reader, "2", "gradeScale.get", json!({}));
    assert_eq!(fetched.get("source").and_then(|v| v.as_str()), Some("default"));
}
