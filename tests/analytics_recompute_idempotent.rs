mod test_support;

use serde_json::json;
use test_support::{
    create_student, create_subject, request_err, request_ok, select_workspace, spawn_sidecar,
    temp_dir,
};

#[test]
fn class_analytics_recompute_is_idempotent() {
    let workspace = temp_dir("resultd-analytics");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let seeded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "results.bulkSave",
        json!({
            "results": [
                { "studentName": "Anita Sharma", "rollNumber": "01", "studentClass": "10",
                  "examType": "Final Term", "academicYear": "2024-25", "totalMarks": 480.0, "gpa": 3.6 },
                { "studentName": "Bikash Thapa", "rollNumber": "02", "studentClass": "10",
                  "examType": "Final Term", "academicYear": "2024-25", "totalMarks": 450.0, "gpa": 2.0 },
                { "studentName": "Chandra Rai", "rollNumber": "03", "studentClass": "10",
                  "examType": "Final Term", "academicYear": "2024-25", "totalMarks": 300.0, "gpa": 1.0 },
                { "studentName": "Devi Gurung", "rollNumber": "04", "studentClass": "10",
                  "examType": "Final Term", "academicYear": "2024-25", "totalMarks": 0.0 }
            ]
        }),
    );
    assert_eq!(seeded.get("saved").and_then(|v| v.as_u64()), Some(4));

    let key = json!({ "className": "10", "examType": "Final Term", "academicYear": "2024-25" });
    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "analytics.recompute",
        key.clone(),
    );
    let snapshot = first.get("classAnalytics").cloned().unwrap_or_default();
    assert_eq!(snapshot.get("totalStudents").and_then(|v| v.as_i64()), Some(4));
    assert_eq!(snapshot.get("passedStudents").and_then(|v| v.as_i64()), Some(2));
    assert_eq!(snapshot.get("failedStudents").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(snapshot.get("highestGpa").and_then(|v| v.as_f64()), Some(3.6));
    assert_eq!(snapshot.get("lowestGpa").and_then(|v| v.as_f64()), Some(1.0));
    assert_eq!(
        snapshot.get("passPercentage").and_then(|v| v.as_f64()),
        Some(50.0)
    );
    let average = snapshot.get("averageGpa").and_then(|v| v.as_f64()).unwrap();
    assert!((average - 2.2).abs() < 1e-9);

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "analytics.recompute",
        key.clone(),
    );
    let again = second.get("classAnalytics").cloned().unwrap_or_default();
    for field in [
        "totalStudents",
        "passedStudents",
        "failedStudents",
        "averageGpa",
        "highestGpa",
        "lowestGpa",
        "passPercentage",
    ] {
        assert_eq!(snapshot.get(field), again.get(field), "{} drifted", field);
    }

    // The stored row serves the same numbers.
    let stored = request_ok(&mut stdin, &mut reader, "4", "analytics.class.get", key);
    assert_eq!(stored.get("passedStudents").and_then(|v| v.as_i64()), Some(2));
    assert_eq!(
        stored.get("passPercentage").and_then(|v| v.as_f64()),
        Some(50.0)
    );
}

#[test]
fn subject_analytics_fold_over_mark_rows() {
    let workspace = temp_dir("resultd-subject-analytics");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let subject_id = create_subject(&mut stdin, &mut reader, "1", "Science");
    let (_, a) = create_student(&mut stdin, &mut reader, "2", "Anita Sharma", "10");
    let (_, b) = create_student(&mut stdin, &mut reader, "3", "Bikash Thapa", "10");

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "marks.bulkSave",
        json!({
            "subjectId": subject_id,
            "examType": "Final Term",
            "academicYear": "2024-25",
            "entries": [
                { "symbolNumber": a, "theoryMarks": 92.0 },
                { "symbolNumber": b, "theoryMarks": 35.0 }
            ]
        }),
    );
    assert_eq!(saved.get("saved").and_then(|v| v.as_u64()), Some(2));

    let key = json!({ "className": "10", "examType": "Final Term", "academicYear": "2024-25" });
    let recomputed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "analytics.recompute",
        key.clone(),
    );
    // No aggregate results seeded: the class slice stays absent instead of a
    // fabricated zero row.
    assert!(recomputed
        .get("classAnalytics")
        .map(|v| v.is_null())
        .unwrap_or(true));

    let subjects = recomputed
        .get("subjectAnalytics")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(subjects.len(), 1);
    let science = &subjects[0];
    assert_eq!(
        science.get("subjectName").and_then(|v| v.as_str()),
        Some("Science")
    );
    assert_eq!(science.get("totalStudents").and_then(|v| v.as_i64()), Some(2));
    assert_eq!(science.get("passedStudents").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(science.get("failedStudents").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(science.get("highestMarks").and_then(|v| v.as_f64()), Some(92.0));
    assert_eq!(science.get("lowestMarks").and_then(|v| v.as_f64()), Some(35.0));
    assert_eq!(
        science.get("passPercentage").and_then(|v| v.as_f64()),
        Some(50.0)
    );

    let stored = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "analytics.subject.get",
        json!({
            "subjectName": "Science",
            "className": "10",
            "examType": "Final Term",
            "academicYear": "2024-25"
        }),
    );
    assert_eq!(stored.get("totalStudents").and_then(|v| v.as_i64()), Some(2));
}

#[test]
fn recompute_with_no_rows_is_not_found_and_fabricates_nothing() {
    let workspace = temp_dir("resultd-analytics-empty");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let key = json!({ "className": "12", "examType": "Final Term", "academicYear": "2024-25" });
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "analytics.recompute",
        key.clone(),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("not_found"));

    let error = request_err(&mut stdin, &mut reader, "2", "analytics.class.get", key);
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("not_found"));
}
