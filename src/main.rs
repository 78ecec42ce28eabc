use std::fs;
use std::io::{self, Read};

use anchor::ast::Program;
use anchor::interpreter::Interpreter;
use anchor::runtime::output::WriterSink;
use anyhow::{Context, Result, bail};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn init_tracing(debug: bool) {
    if !debug && std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let filter = if debug {
        EnvFilter::new("anchor=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut debug = false;
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" | "-d" => debug = true,
            _ => {
                input_path = Some(arg);
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    init_tracing(debug);

    let source = if let Some(path) = &input_path {
        fs::read_to_string(path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let program: Program = serde_json::from_str(&source).with_context(|| {
        format!(
            "Decoding program from {}",
            input_path.as_deref().unwrap_or("stdin")
        )
    })?;

    let mut sink = WriterSink::new(io::stdout().lock());
    Interpreter::new().run_with_output(&program, &mut sink)?;
    Ok(())
}
