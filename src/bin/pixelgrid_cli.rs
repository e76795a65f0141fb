//! CLI tool for pixelgrid - syncs a ledger dump and outputs the decoded cells
//!
//! Usage:
//!   pixelgrid_cli <records.json>                       # Output JSON to stdout
//!   pixelgrid_cli <records.json> -o cells.json         # Output JSON to file
//!   pixelgrid_cli <records.json> --config grid.json    # Custom grid config
//!
//! `records.json` is an array of raw ledger records
//! (`{ "packedColor": .., "packedPosition": .., "message": .., "owner": .. }`).
//! Set `RUST_LOG=debug` to see per-batch progress.

#![allow(clippy::exit)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;

use futures::executor::block_on;
use pixelgrid::sync::{LoadPhase, MemoryLedger, RawRecord, SyncHandle};
use pixelgrid::types::{CellRecord, GridConfig};

struct Args {
    input: String,
    output: Option<String>,
    config: Option<String>,
}

fn parse_args() -> Option<Args> {
    let mut args = env::args().skip(1);
    let input = args.next()?;
    let mut output = None;
    let mut config = None;
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-o" | "--output" => output = Some(args.next()?),
            "-c" | "--config" => config = Some(args.next()?),
            _ => return None,
        }
    }
    Some(Args {
        input,
        output,
        config,
    })
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = parse_args() else {
        fail("Usage: pixelgrid_cli <records.json> [-o output.json] [--config grid.json]");
    };

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .unwrap_or_else(|e| fail(&format!("Error reading {path}: {e}")));
            GridConfig::from_json(&text).unwrap_or_else(|e| fail(&format!("{path}: {e}")))
        }
        None => GridConfig::default(),
    };

    let text = fs::read_to_string(&args.input)
        .unwrap_or_else(|e| fail(&format!("Error reading {}: {e}", args.input)));
    let records: Vec<RawRecord> = serde_json::from_str(&text)
        .unwrap_or_else(|e| fail(&format!("Error parsing {}: {e}", args.input)));

    let sync = SyncHandle::new(Rc::new(MemoryLedger::new(records)), config);
    let phase = block_on(sync.load());
    if phase != LoadPhase::Complete {
        let reason = sync
            .state()
            .last_error()
            .map_or_else(|| format!("{phase:?}"), ToString::to_string);
        fail(&format!("Sync did not complete: {reason}"));
    }

    let state = sync.state();
    let cells: Vec<&CellRecord> = state.cache().iter().collect();
    eprintln!(
        "{} cells loaded, {} records skipped",
        cells.len(),
        state.skipped()
    );

    let json = serde_json::to_string_pretty(&cells)
        .unwrap_or_else(|e| fail(&format!("Error serializing JSON: {e}")));

    match &args.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                fail(&format!("Error writing {path}: {e}"));
            }
            eprintln!("Written: {path}");
        }
        None => {
            let mut stdout = io::stdout().lock();
            if writeln!(stdout, "{json}").is_err() {
                fail("Error writing to stdout");
            }
        }
    }
}
