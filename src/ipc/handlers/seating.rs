use crate::engine::{Command, DropPayload};
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{require_index, run_command, snapshot_result};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn read_dimension(req: &Request, key: &str, max: usize) -> Result<usize, HandlerErr> {
    let v = require_index(req, key)?;
    if v < 1 || v > max {
        return Err(
            HandlerErr::bad_params(format!("{key} must be between 1 and {max}"))
                .with_details(json!({ key: v })),
        );
    }
    Ok(v)
}

fn handle_grid_resize(state: &mut AppState, req: &Request) -> serde_json::Value {
    let rows = match read_dimension(req, "rows", state.max_rows) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let cols = match read_dimension(req, "cols", state.max_cols) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    // Only a real dimension change rebuilds the grid.
    if rows == state.engine.grid.rows() && cols == state.engine.grid.cols() {
        return ok(&req.id, snapshot_result(state, false));
    }
    run_command(state, req, Command::Resize { rows, cols })
}

fn handle_seating_randomize(state: &mut AppState, req: &Request) -> serde_json::Value {
    run_command(state, req, Command::Randomize)
}

fn handle_seating_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    run_command(state, req, Command::Clear)
}

fn handle_seating_drop(state: &mut AppState, req: &Request) -> serde_json::Value {
    let target = match require_index(req, "targetIndex") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(raw) = req.params.get("payload") else {
        return HandlerErr::bad_params("missing payload").response(&req.id);
    };
    // Spurious drags are expected; an unreadable payload is ignored, not an error.
    let payload: DropPayload = match serde_json::from_value(raw.clone()) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable drop payload");
            return ok(&req.id, snapshot_result(state, false));
        }
    };
    run_command(state, req, Command::Drop { payload, target })
}

fn handle_seat_toggle_lock(state: &mut AppState, req: &Request) -> serde_json::Value {
    match require_index(req, "index") {
        Ok(index) => run_command(state, req, Command::ToggleLock { index }),
        Err(e) => e.response(&req.id),
    }
}

fn handle_seat_toggle_empty(state: &mut AppState, req: &Request) -> serde_json::Value {
    match require_index(req, "index") {
        Ok(index) => run_command(state, req, Command::ToggleEmpty { index }),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grid.resize" => Some(handle_grid_resize(state, req)),
        "seating.randomize" => Some(handle_seating_randomize(state, req)),
        "seating.drop" => Some(handle_seating_drop(state, req)),
        "seating.clear" => Some(handle_seating_clear(state, req)),
        "seat.toggleLock" => Some(handle_seat_toggle_lock(state, req)),
        "seat.toggleEmpty" => Some(handle_seat_toggle_empty(state, req)),
        _ => None,
    }
}
