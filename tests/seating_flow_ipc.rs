use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_seatingd");
    let mut child = Command::new(exe)
        .env_remove("SEATINGD_CONFIG")
        .env_remove("SEATINGD_ROWS")
        .env_remove("SEATINGD_COLS")
        .env("SEATINGD_SEED", "3")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn seatingd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn occupant(result: &serde_json::Value, index: usize) -> Option<String> {
    result
        .get("state")
        .and_then(|s| s.get("seats"))
        .and_then(|v| v.as_array())
        .and_then(|seats| seats.get(index))
        .and_then(|seat| seat.get("occupant"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn status(result: &serde_json::Value, name: &str) -> Option<String> {
    result
        .get("state")
        .and_then(|s| s.get("students"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.get("name").and_then(|v| v.as_str()) == Some(name))
        .and_then(|s| s.get("status").and_then(|v| v.as_str()).map(|v| v.to_string()))
}

fn changed(result: &serde_json::Value) -> bool {
    result
        .get("changed")
        .and_then(|v| v.as_bool())
        .expect("changed flag")
}

fn error_code(value: &serde_json::Value) -> Option<String> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[test]
fn randomize_two_students_into_two_seats() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grid.resize",
        json!({ "rows": 1, "cols": 2 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.setText",
        json!({ "text": "A\nB\n" }),
    );
    let res = request_ok(&mut stdin, &mut reader, "3", "seating.randomize", json!({}));

    let mut seated = vec![occupant(&res, 0).expect("seat 0"), occupant(&res, 1).expect("seat 1")];
    seated.sort();
    assert_eq!(seated, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(status(&res, "A").as_deref(), Some("assigned"));
    assert_eq!(status(&res, "B").as_deref(), Some("assigned"));

    let seat = res
        .get("state")
        .and_then(|s| s.get("seats"))
        .and_then(|v| v.get(1))
        .cloned()
        .expect("seat 1");
    assert_eq!(seat.get("row").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(seat.get("col").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(seat.get("label").and_then(|v| v.as_str()), Some("1 - 2"));
}

#[test]
fn drop_on_locked_seat_displaces_and_locks() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grid.resize",
        json!({ "rows": 1, "cols": 2 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.setText",
        json!({ "text": "A\nB" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "seating.drop",
        json!({ "payload": { "type": "name", "value": "A", "index": null }, "targetIndex": 0 }),
    );
    let locked = request_ok(&mut stdin, &mut reader, "4", "seat.toggleLock", json!({ "index": 0 }));
    assert_eq!(status(&locked, "A").as_deref(), Some("lock"));

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "seating.drop",
        json!({ "payload": { "type": "name", "value": "B", "index": null }, "targetIndex": 0 }),
    );
    assert!(changed(&res));
    assert_eq!(occupant(&res, 0).as_deref(), Some("B"));
    assert_eq!(status(&res, "B").as_deref(), Some("lock"));
    assert_eq!(status(&res, "A").as_deref(), Some("unassigned"));
}

#[test]
fn locks_survive_randomize_and_clear() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grid.resize",
        json!({ "rows": 2, "cols": 2 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.setText",
        json!({ "text": "A\nB\nC\nD\nE" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "seating.drop",
        json!({ "payload": { "type": "name", "value": "C" }, "targetIndex": 3 }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "4", "seat.toggleLock", json!({ "index": 3 }));

    for i in 0..5 {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("r{i}"),
            "seating.randomize",
            json!({}),
        );
        assert_eq!(occupant(&res, 3).as_deref(), Some("C"));
        assert_eq!(status(&res, "C").as_deref(), Some("lock"));
    }

    let cleared = request_ok(&mut stdin, &mut reader, "5", "seating.clear", json!({}));
    assert_eq!(occupant(&cleared, 3).as_deref(), Some("C"));
    for i in 0..3 {
        assert_eq!(occupant(&cleared, i), None);
    }
    for name in ["A", "B", "D", "E"] {
        assert_eq!(status(&cleared, name).as_deref(), Some("unassigned"));
    }

    // Toggling a locked student forces skip and frees the seat.
    let skipped = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "roster.toggleStatus",
        json!({ "name": "C" }),
    );
    assert_eq!(status(&skipped, "C").as_deref(), Some("skip"));
    assert_eq!(occupant(&skipped, 3), None);

    let check = request_ok(&mut stdin, &mut reader, "7", "seating.check", json!({}));
    assert_eq!(check.get("valid").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn ignored_drops_leave_state_unchanged() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grid.resize",
        json!({ "rows": 1, "cols": 3 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.setText",
        json!({ "text": "A\nS" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "roster.toggleStatus",
        json!({ "name": "S" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "4", "seat.toggleEmpty", json!({ "index": 1 }));
    let before = request_ok(&mut stdin, &mut reader, "5", "state.get", json!({}));

    let drops = [
        json!({ "payload": { "type": "name", "value": "A" }, "targetIndex": 1 }),
        json!({ "payload": { "type": "name", "value": "S" }, "targetIndex": 0 }),
        json!({ "payload": { "type": "name", "value": "Ghost" }, "targetIndex": 0 }),
        json!({ "payload": { "type": "seat", "value": "", "index": 2 }, "targetIndex": 2 }),
        json!({ "payload": { "type": "", "value": "A" }, "targetIndex": 0 }),
        json!({ "payload": { "type": "name", "value": "A" }, "targetIndex": 99 }),
    ];
    for (i, params) in drops.into_iter().enumerate() {
        let res = request_ok(&mut stdin, &mut reader, &format!("d{i}"), "seating.drop", params);
        assert!(!changed(&res), "drop {i} should be ignored");
        assert_eq!(res.get("state"), before.get("state"));
    }
}

#[test]
fn seat_swap_moves_students_between_seats() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grid.resize",
        json!({ "rows": 1, "cols": 2 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.setText",
        json!({ "text": "A\nB" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "seating.drop",
        json!({ "payload": { "type": "name", "value": "A" }, "targetIndex": 0 }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "4", "seat.toggleLock", json!({ "index": 1 }));
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "seating.drop",
        json!({ "payload": { "type": "seat", "value": "A", "index": 0 }, "targetIndex": 1 }),
    );
    assert_eq!(occupant(&res, 0), None);
    assert_eq!(occupant(&res, 1).as_deref(), Some("A"));
    assert_eq!(status(&res, "A").as_deref(), Some("lock"));
}

#[test]
fn resize_validates_bounds_and_resets_seating() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.setText",
        json!({ "text": "A\nB" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "seating.randomize", json!({}));

    let zero = request(
        &mut stdin,
        &mut reader,
        "3",
        "grid.resize",
        json!({ "rows": 0, "cols": 2 }),
    );
    assert_eq!(error_code(&zero).as_deref(), Some("bad_params"));
    let negative = request(
        &mut stdin,
        &mut reader,
        "4",
        "grid.resize",
        json!({ "rows": 2, "cols": -1 }),
    );
    assert_eq!(error_code(&negative).as_deref(), Some("bad_params"));
    let huge = request(
        &mut stdin,
        &mut reader,
        "5",
        "grid.resize",
        json!({ "rows": 2, "cols": 500 }),
    );
    assert_eq!(error_code(&huge).as_deref(), Some("bad_params"));

    let same = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "grid.resize",
        json!({ "rows": 4, "cols": 6 }),
    );
    assert!(!changed(&same));

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "grid.resize",
        json!({ "rows": 2, "cols": 2 }),
    );
    assert!(changed(&res));
    let seats = res
        .get("state")
        .and_then(|s| s.get("seats"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(seats.len(), 4);
    assert!(seats.iter().all(|s| s.get("occupant").map(|v| v.is_null()) == Some(true)));
    assert_eq!(status(&res, "A").as_deref(), Some("unassigned"));
}

#[test]
fn missing_params_are_rejected() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let cases = [
        ("roster.setText", json!({})),
        ("roster.toggleStatus", json!({})),
        ("seat.toggleLock", json!({})),
        ("seat.toggleEmpty", json!({ "index": "zero" })),
        ("seating.drop", json!({ "targetIndex": 0 })),
        ("seating.drop", json!({ "payload": { "type": "name", "value": "A" } })),
        ("roster.importCsv", json!({})),
        ("roster.importCsv", json!({ "text": "A", "delimiter": ";;" })),
    ];
    for (i, (method, params)) in cases.into_iter().enumerate() {
        let res = request(&mut stdin, &mut reader, &format!("m{i}"), method, params);
        assert_eq!(error_code(&res).as_deref(), Some("bad_params"), "{method}");
    }
}
