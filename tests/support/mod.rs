#![allow(dead_code)]

use agent_registry::{AgentCard, MemoryStore, Registry, SqliteStore};
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_fixture(name: &str) -> Value {
    let path = fixture_path(name);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("reading {}: {err}", path.display()));
    serde_json::from_str(&data).unwrap_or_else(|err| panic!("parsing {}: {err}", path.display()))
}

/// Full card exercising every optional block.
pub fn sales_bot() -> Value {
    load_fixture("sales_bot.json")
}

pub fn skill(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Skill {id}"),
        "version": "1.0.0",
        "description": format!("Handles {id}"),
        "inputs": {"type": "object"},
        "outputs": {"type": "object"},
        "runtime": {"type": "function", "entryPoint": id},
        "examples": [{"name": "basic", "input": {"q": 1}, "output": {"a": 1}}]
    })
}

/// Smallest valid card, declaring the given skill ids.
pub fn card_json(name: &str, version: &str, skills: &[&str]) -> Value {
    json!({
        "protocolVersion": "1.0",
        "name": name,
        "version": version,
        "description": format!("{name} test agent"),
        "skills": skills.iter().map(|id| skill(id)).collect::<Vec<_>>()
    })
}

pub fn card(name: &str, version: &str, skills: &[&str]) -> AgentCard {
    serde_json::from_value(card_json(name, version, skills)).expect("test card decodes")
}

pub fn memory_registry() -> Registry<MemoryStore> {
    Registry::with_embedded_schema(MemoryStore::new()).expect("embedded schema compiles")
}

/// File-backed registry; keep the `TempDir` alive for the test's duration.
pub fn sqlite_registry() -> Result<(TempDir, Registry<SqliteStore>)> {
    let dir = TempDir::new().context("creating temp dir")?;
    let store = SqliteStore::open(dir.path().join("registry.db"))?;
    Ok((dir, Registry::with_embedded_schema(store)?))
}

pub fn bin(name: &str) -> Command {
    let path = match name {
        "agent-registry" => env!("CARGO_BIN_EXE_agent-registry"),
        "card-validate" => env!("CARGO_BIN_EXE_card-validate"),
        "card-fingerprint" => env!("CARGO_BIN_EXE_card-fingerprint"),
        other => panic!("unknown binary {other}"),
    };
    let mut cmd = Command::new(path);
    cmd.env_remove("AGENT_REGISTRY_DB")
        .env_remove("AGENT_REGISTRY_OWNER")
        .env_remove("RUST_LOG");
    cmd
}

pub fn run(mut cmd: Command) -> Result<Output> {
    cmd.output()
        .with_context(|| format!("failed to run command: {cmd:?}"))
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).with_context(|| {
        format!(
            "stdout is not JSON\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
