use crate::engine::{self, Command};
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

pub fn require_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn optional_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn require_index(req: &Request, key: &str) -> Result<usize, HandlerErr> {
    let Some(raw) = req.params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {key}")));
    };
    raw.as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| {
            HandlerErr::bad_params(format!("{key} must be a non-negative integer"))
                .with_details(json!({ key: raw }))
        })
}

pub fn snapshot_result(state: &AppState, changed: bool) -> serde_json::Value {
    json!({
        "changed": changed,
        "state": state.engine.snapshot(),
    })
}

/// Applies one command and swaps in the new snapshot. A result that fails the
/// consistency check is discarded and the previous snapshot kept.
pub fn run_command(state: &mut AppState, req: &Request, command: Command) -> serde_json::Value {
    let label = command.label();
    let outcome = engine::apply(&state.engine, command, &mut state.rng);
    if let Err(violations) = outcome.state.check_invariants() {
        let messages: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        tracing::error!(command = label, ?messages, "rejected inconsistent state");
        return err(
            &req.id,
            "invariant_violation",
            format!("{label} produced an inconsistent seating state"),
            Some(json!({ "violations": messages })),
        );
    }
    tracing::debug!(command = label, changed = outcome.changed, "command applied");
    state.engine = outcome.state;
    ok(&req.id, snapshot_result(state, outcome.changed))
}
