mod config;
mod engine;
mod grid;
mod ipc;
mod names;
mod roster;

use anyhow::Context;
use std::io::{self, BufRead, Write};

fn init_tracing(default_filter: &str) {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = config::Config::load().context("failed to load seatingd configuration")?;
    init_tracing(&config.log_filter);
    tracing::info!(
        rows = config.rows,
        cols = config.cols,
        seeded = config.seed.is_some(),
        "seatingd ready"
    );

    let mut state = ipc::AppState::from_config(&config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin closed with error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
