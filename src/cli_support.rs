//! Argument and I/O helpers shared by the binaries.

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// Where a JSON document comes from: a file path, or stdin for `-`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None | Some("-") => InputSource::Stdin,
            Some(path) => InputSource::File(PathBuf::from(path)),
        }
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            InputSource::File(path) => {
                if !path.is_file() {
                    bail!("input file not found: {}", path.display());
                }
                fs::read(path).with_context(|| format!("reading {}", path.display()))
            }
            InputSource::Stdin => {
                let mut buf = Vec::new();
                io::stdin()
                    .read_to_end(&mut buf)
                    .context("reading stdin")?;
                Ok(buf)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            InputSource::File(path) => path.display().to_string(),
            InputSource::Stdin => "stdin".to_string(),
        }
    }
}

/// Read and parse one JSON document. Any JSON value is accepted here;
/// shape checks belong to the validator.
pub fn read_document(source: &InputSource) -> Result<Value> {
    let bytes = source.read()?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing JSON from {}", source.describe()))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Convert raw argv into UTF-8 strings, rejecting anything else.
pub fn utf8_args(args: impl IntoIterator<Item = OsString>) -> Result<Vec<String>> {
    args.into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))
        })
        .collect()
}

/// Pull the value that must follow `flag`.
pub fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_and_absent_mean_stdin() {
        assert_eq!(InputSource::from_arg(None), InputSource::Stdin);
        assert_eq!(InputSource::from_arg(Some("-")), InputSource::Stdin);
        assert_eq!(
            InputSource::from_arg(Some("card.json")),
            InputSource::File(PathBuf::from("card.json"))
        );
    }

    #[test]
    fn missing_files_are_reported_by_path() {
        let err = InputSource::File(PathBuf::from("/definitely/not/here.json"))
            .read()
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn next_value_names_the_flag() {
        let mut args = Vec::<String>::new().into_iter();
        let err = next_value(&mut args, "--owner").unwrap_err();
        assert_eq!(err.to_string(), "missing value for --owner");
    }
}
