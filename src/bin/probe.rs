//! `relay-probe` — probe backend availability for a dispatch mode.
//!
//! Usage:
//!
//! ```text
//! relay-probe [--cloud | --local] [--prefer <backend>]
//! ```
//!
//! Constructs a dispatcher for the requested mode and prints which backends
//! are usable, in selection-priority order. Exits non-zero when no backend
//! is configured, which makes it usable as a preflight check in scripts.

use llm_relay::api::Mode;
use llm_relay::dispatcher::Dispatcher;
use std::process;

fn print_usage() {
    eprintln!("Usage: relay-probe [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --local             Probe the local Ollama backend (default)");
    eprintln!("  --cloud             Probe the cloud backends");
    eprintln!("  --prefer <backend>  Report which backend a call would select,");
    eprintln!("                      preferring <backend> (ollama|openai|claude|gemini)");
    eprintln!("  --help              Show this message");
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let mut mode = Mode::Local;
    let mut prefer: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--local" => mode = Mode::Local,
            "--cloud" => mode = Mode::Cloud,
            "--prefer" => {
                prefer = Some(
                    args.next()
                        .ok_or_else(|| anyhow::anyhow!("--prefer requires a backend name"))?,
                );
            }
            other => {
                anyhow::bail!("Unknown option: {other}");
            }
        }
    }

    let dispatcher = Dispatcher::connect(mode, prefer.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let available = dispatcher.list_available().await;
    println!("mode      : {mode}");
    println!("available : {} backend(s)", available.len());
    for kind in &available {
        let desc = kind.descriptor();
        println!("  {:8}  default model: {}", kind.id(), desc.default_model);
    }
    let preferred = prefer
        .as_deref()
        .and_then(|name| name.parse::<llm_relay::api::BackendKind>().ok())
        .filter(|kind| available.contains(kind));
    match (preferred, available.first()) {
        (Some(kind), _) => println!("selected  : {kind}  (preferred)"),
        (None, Some(first)) => println!("selected  : {first}  (priority order)"),
        (None, None) => {}
    }

    Ok(())
}
