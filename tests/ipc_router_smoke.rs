mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{error_code, request, request_ok, spawn_sidecar, str_at, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("schoold-router-smoke");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("workspacePath").is_some_and(|v| v.is_null()));

    let early = request(&mut stdin, &mut reader, "2", "classes.create", json!({ "name": "Early" }));
    assert_eq!(error_code(&early), Some("no_workspace"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert!(workspace.join("school.sqlite3").exists());

    let year = request_ok(&mut stdin, &mut reader, "4", "years.create", json!({ "name": "2024" }));
    let year_id = str_at(&year, "/year/id").to_string();
    let class = request_ok(&mut stdin, &mut reader, "5", "classes.create", json!({ "name": "Class 9" }));
    let class_id = str_at(&class, "/class/id").to_string();
    let subject = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "subjects.create",
        json!({ "name": "Mathematics", "code": "MATH" }),
    );
    let subject_id = str_at(&subject, "/subject/id").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "classSubjects.assign",
        json!({ "classId": class_id, "subjectId": subject_id }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.create",
        json!({
            "name": "Tanvir Hasan",
            "phone": "01700000000",
            "academicYearId": year_id,
            "classId": class_id,
            "section": "A",
            "roll": 1
        }),
    );
    let student_id = str_at(&created, "/student/id").to_string();
    let enrollment_id = str_at(&created, "/enrollment/id").to_string();

    let reads = [
        ("years.list", json!({})),
        ("years.getActive", json!({})),
        ("classes.list", json!({})),
        ("classes.get", json!({ "classId": class_id })),
        ("classes.roster", json!({ "classId": class_id })),
        ("subjects.list", json!({})),
        ("students.list", json!({})),
        ("students.get", json!({ "studentId": student_id })),
        ("students.subjects", json!({ "studentId": student_id })),
        ("students.results", json!({ "studentId": student_id })),
        ("payments.list", json!({ "enrollmentId": enrollment_id })),
        ("exams.list", json!({})),
        ("dashboard.summary", json!({})),
    ];
    for (i, (method, params)) in reads.into_iter().enumerate() {
        let id = format!("r{}", i);
        let _ = request_ok(&mut stdin, &mut reader, &id, method, params);
    }

    let summary = request_ok(&mut stdin, &mut reader, "9", "dashboard.summary", json!({}));
    assert_eq!(summary.pointer("/summary/activeStudents"), Some(&json!(1)));
    assert_eq!(summary.pointer("/summary/academicYearId"), Some(&json!(year_id)));

    let unknown = request(&mut stdin, &mut reader, "10", "grades.explode", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json reply");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("reply is json");
    assert_eq!(error_code(&value), Some("bad_json"));

    // The process keeps serving after a bad line.
    let _ = request_ok(&mut stdin, &mut reader, "11", "health", json!({}));
}
