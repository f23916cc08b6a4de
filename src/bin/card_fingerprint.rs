//! Print the content fingerprint of a JSON document.
//!
//! The fingerprint is the SHA-256 of the canonical (key-sorted, compact)
//! encoding, so reordering object keys never changes the output.

use agent_registry::cli_support::{InputSource, read_document, utf8_args};
use agent_registry::fingerprint_value;
use agent_registry::logging::init_tracing;
use anyhow::{Result, bail};
use std::env;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut input: Option<String> = None;
    for arg in utf8_args(env::args_os().skip(1))? {
        match arg.as_str() {
            "--help" | "-h" => {
                eprintln!("Usage: card-fingerprint [FILE|-]");
                return Ok(());
            }
            flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
            _ if input.is_some() => bail!("only one input may be given"),
            _ => input = Some(arg),
        }
    }

    let document = read_document(&InputSource::from_arg(input.as_deref()))?;
    println!("{}", fingerprint_value(&document)?);
    Ok(())
}
