use crate::engine::Command;
use crate::ipc::error::{err, HandlerErr};
use crate::ipc::helpers::{optional_str, require_str, run_command};
use crate::ipc::types::{AppState, Request};
use crate::names;
use serde_json::json;
use std::path::Path;

fn handle_roster_set_text(state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = match require_str(req, "text") {
        Ok(t) => t,
        Err(e) => return e.response(&req.id),
    };
    let names = names::parse_text_names(text);
    tracing::debug!(count = names.len(), "roster text merged");
    run_command(state, req, Command::MergeRoster { names })
}

fn parse_delimiter(req: &Request) -> Result<Option<char>, HandlerErr> {
    let Some(raw) = optional_str(req, "delimiter") else {
        return Ok(None);
    };
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => Err(HandlerErr::bad_params("delimiter must be a single character")
            .with_details(json!({ "delimiter": raw }))),
    }
}

fn handle_roster_import_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let delimiter = match parse_delimiter(req) {
        Ok(d) => d,
        Err(e) => return e.response(&req.id),
    };

    let parsed = if let Some(path) = optional_str(req, "path").map(str::trim).filter(|p| !p.is_empty()) {
        names::read_delimited_names(Path::new(path), delimiter)
    } else if let Some(text) = optional_str(req, "text") {
        names::parse_delimited_names(text, delimiter)
    } else {
        return err(&req.id, "bad_params", "missing path or text", None);
    };

    // A failed parse leaves the roster untouched.
    let names = match parsed {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, "roster import failed");
            let details = optional_str(req, "path").map(|p| json!({ "path": p }));
            return err(&req.id, e.code(), e.to_string(), details);
        }
    };
    tracing::debug!(count = names.len(), "roster file merged");
    run_command(state, req, Command::MergeRoster { names })
}

fn handle_roster_toggle_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match require_str(req, "name") {
        Ok(n) => n.to_string(),
        Err(e) => return e.response(&req.id),
    };
    run_command(state, req, Command::ToggleStatus { name })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.setText" => Some(handle_roster_set_text(state, req)),
        "roster.importCsv" => Some(handle_roster_import_csv(state, req)),
        "roster.toggleStatus" => Some(handle_roster_toggle_status(state, req)),
        _ => None,
    }
}
