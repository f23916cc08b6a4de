//! Validate an agent card without publishing it.
//!
//! Runs the contract check and then the transport policy, printing a JSON
//! verdict on stdout. Exit status is 0 for an acceptable card, 2 for a
//! rejected one and 1 when the input could not be read at all.

use agent_registry::cli_support::{InputSource, print_json, read_document, utf8_args};
use agent_registry::logging::init_tracing;
use agent_registry::{SchemaValidator, check_transport_consistency, fingerprint_card};
use anyhow::{Result, bail};
use serde_json::json;
use std::env;

const EXIT_REJECTED: i32 = 2;

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let source = parse_args()?;
    let candidate = read_document(&source)?;
    let validator = SchemaValidator::new()?;
    let schema_version = validator.schema_version();

    let card = match validator.validate_card(&candidate) {
        Ok(card) => card,
        Err(errors) => {
            print_json(&json!({
                "ok": false,
                "schemaVersion": schema_version,
                "stage": "schema",
                "errors": errors,
            }))?;
            return Ok(EXIT_REJECTED);
        }
    };

    let policy_errors = check_transport_consistency(&card);
    if !policy_errors.is_empty() {
        print_json(&json!({
            "ok": false,
            "schemaVersion": schema_version,
            "stage": "policy",
            "errors": policy_errors,
        }))?;
        return Ok(EXIT_REJECTED);
    }

    let fingerprint = fingerprint_card(&card)?;
    print_json(&json!({
        "ok": true,
        "schemaVersion": schema_version,
        "name": card.name,
        "version": card.version,
        "fingerprint": fingerprint,
    }))?;
    Ok(0)
}

fn parse_args() -> Result<InputSource> {
    let mut input: Option<String> = None;
    for arg in utf8_args(env::args_os().skip(1))? {
        match arg.as_str() {
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
            _ => {
                if input.is_some() {
                    bail!("only one input may be given");
                }
                input = Some(arg);
            }
        }
    }
    Ok(InputSource::from_arg(input.as_deref()))
}

fn usage() {
    eprintln!(
        "Usage: card-validate [FILE|-]\n\n\
         Validates an agent card (stdin when FILE is absent or '-').\n\
         Exit status: 0 valid, 2 rejected, 1 unreadable input."
    );
}
