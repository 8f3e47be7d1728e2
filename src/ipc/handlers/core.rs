use crate::ipc::error::ok;
use crate::ipc::helpers::snapshot_result;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "rows": state.engine.grid.rows(),
            "cols": state.engine.grid.cols(),
            "studentCount": state.engine.roster.len(),
        }),
    )
}

fn handle_state_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, snapshot_result(state, false))
}

fn handle_seating_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    let violations: Vec<String> = match state.engine.check_invariants() {
        Ok(()) => Vec::new(),
        Err(v) => v.iter().map(|x| x.to_string()).collect(),
    };
    ok(
        &req.id,
        json!({
            "valid": violations.is_empty(),
            "violations": violations,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "state.get" => Some(handle_state_get(state, req)),
        "seating.check" => Some(handle_seating_check(state, req)),
        _ => None,
    }
}
