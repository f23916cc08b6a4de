//! Structural validation of candidate agent cards.
//!
//! Two passes run over every candidate: a preflight that pins the most common
//! omissions (`protocolVersion`, `name`, `version`, non-empty `skills`) to
//! their own paths, and the compiled JSON Schema contract. Their findings are
//! merged in that order and deduplicated by `(path, message)`.
//!
//! Engine errors are normalized so every message starts with the pointer it
//! refers to: required-property errors point at the missing child rather than
//! the parent object, and predicates read as `"<path> <predicate>."`.

use crate::card::AgentCard;
use crate::schema_loader::{SchemaLoadResult, load_embedded_card_schema};
use anyhow::Result;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

const REQUIRED_TOP_LEVEL_FIELDS: &[&str] = &["protocolVersion", "name", "version"];
const SKILLS_PATH: &str = "/skills";
const ROOT_PATH: &str = "/";

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
/// One contract violation: a JSON pointer into the candidate plus a message
/// that repeats the pointer.
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    fn required(path: &str) -> Self {
        Self::new(path, format!("{path} is required."))
    }

    fn missing_skills() -> Self {
        Self::new(
            SKILLS_PATH,
            format!("{SKILLS_PATH} must contain at least one skill."),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Compiled card contract, built once and shared read-only.
pub struct SchemaValidator {
    schema: SchemaLoadResult,
}

impl SchemaValidator {
    /// Compile the embedded contract.
    pub fn new() -> Result<Self> {
        Ok(Self {
            schema: load_embedded_card_schema()?,
        })
    }

    pub fn schema_version(&self) -> &str {
        &self.schema.schema_version
    }

    /// Check a candidate document against the contract.
    ///
    /// Every violation is reported; a non-empty error list means the whole
    /// candidate is rejected.
    pub fn validate(&self, candidate: &Value) -> Result<(), Vec<ValidationError>> {
        let Some(object) = candidate.as_object() else {
            return Err(vec![ValidationError::new(
                ROOT_PATH,
                "/ must be a JSON object.",
            )]);
        };

        let preflight = preflight_required_fields(object);

        let engine_errors: Vec<ValidationError> = match self.schema.compiled.validate(candidate) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|error| normalize_error(&error)).collect(),
        };

        if preflight.is_empty() && engine_errors.is_empty() {
            return Ok(());
        }

        let merged = merge_errors(preflight, engine_errors);
        tracing::debug!(
            errors = merged.len(),
            first = %merged[0].message,
            "agent card failed contract validation"
        );
        Err(merged)
    }

    /// Validate and decode a candidate into the typed card.
    pub fn validate_card(&self, candidate: &Value) -> Result<AgentCard, Vec<ValidationError>> {
        self.validate(candidate)?;
        serde_json::from_value::<AgentCard>(candidate.clone()).map_err(|err| {
            vec![ValidationError::new(
                ROOT_PATH,
                tidy_message(&format!("{ROOT_PATH} could not be decoded: {err}")),
            )]
        })
    }
}

fn preflight_required_fields(card: &Map<String, Value>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for field in REQUIRED_TOP_LEVEL_FIELDS {
        if !card.contains_key(*field) {
            errors.push(ValidationError::required(&format!("/{field}")));
        }
    }

    match card.get("skills") {
        Some(Value::Array(skills)) if !skills.is_empty() => {}
        _ => errors.push(ValidationError::missing_skills()),
    }

    errors
}

fn merge_errors(
    preflight: Vec<ValidationError>,
    engine: Vec<ValidationError>,
) -> Vec<ValidationError> {
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut merged = Vec::with_capacity(preflight.len() + engine.len());
    for error in preflight.into_iter().chain(engine) {
        if seen.insert((error.path.clone(), error.message.clone())) {
            merged.push(error);
        }
    }
    merged
}

fn normalize_error(error: &jsonschema::ValidationError<'_>) -> ValidationError {
    let path = normalize_path(error);
    let message = normalize_message(error, &path);
    ValidationError { path, message }
}

fn normalize_path(error: &jsonschema::ValidationError<'_>) -> String {
    let base = error.instance_path.to_string();

    if let ValidationErrorKind::Required { property } = &error.kind {
        let missing = match property {
            Value::String(name) => escape_pointer_token(name),
            other => escape_pointer_token(&other.to_string()),
        };
        return collapse_slashes(&format!("{base}/{missing}"));
    }

    if base.is_empty() {
        ROOT_PATH.to_string()
    } else {
        base
    }
}

fn normalize_message(error: &jsonschema::ValidationError<'_>, path: &str) -> String {
    match &error.kind {
        ValidationErrorKind::Required { .. } => format!("{path} is required."),
        ValidationErrorKind::MinItems { .. } if path == SKILLS_PATH => {
            format!("{path} must contain at least one skill.")
        }
        _ => {
            let predicate = describe_violation(error);
            tidy_message(&format!("{path} {}", strip_modal_prefix(&predicate)))
        }
    }
}

/// Predicate for a violation, without the instance value the engine's own
/// message would embed.
fn describe_violation(error: &jsonschema::ValidationError<'_>) -> String {
    match &error.kind {
        ValidationErrorKind::Type {
            kind: TypeKind::Single(expected),
        } => format!("is not of type \"{expected}\""),
        ValidationErrorKind::Pattern { pattern } => {
            format!("does not match pattern \"{pattern}\"")
        }
        ValidationErrorKind::Enum { options } => format!("is not one of {options}"),
        ValidationErrorKind::Format { format } => format!("is not a valid \"{format}\""),
        ValidationErrorKind::MinItems { limit } => {
            format!("has fewer than {limit} {}", plural(*limit, "item", "items"))
        }
        ValidationErrorKind::MaxItems { limit } => {
            format!("has more than {limit} {}", plural(*limit, "item", "items"))
        }
        ValidationErrorKind::MinLength { limit } => format!(
            "is shorter than {limit} {}",
            plural(*limit, "character", "characters")
        ),
        ValidationErrorKind::MaxLength { limit } => format!(
            "is longer than {limit} {}",
            plural(*limit, "character", "characters")
        ),
        ValidationErrorKind::Minimum { limit } => format!("is less than the minimum of {limit}"),
        ValidationErrorKind::Maximum { limit } => {
            format!("is greater than the maximum of {limit}")
        }
        ValidationErrorKind::UniqueItems => "has non-unique elements".to_string(),
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            let names = unexpected
                .iter()
                .map(|name| format!("\"{name}\""))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "has unexpected {} {names}",
                plural(unexpected.len() as u64, "property", "properties")
            )
        }
        _ => error.to_string(),
    }
}

fn plural(count: u64, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// Drop a leading `must`/`should` from an engine predicate.
fn strip_modal_prefix(predicate: &str) -> &str {
    let trimmed = predicate.trim_start();
    for modal in ["must", "should"] {
        let Some(head) = trimmed.get(..modal.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(modal) {
            continue;
        }
        let rest = &trimmed[modal.len()..];
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return rest.trim_start();
        }
    }
    trimmed
}

/// Collapse whitespace, drop spaces before periods, squash repeated periods,
/// and end with exactly one period.
fn tidy_message(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len() + 1);
    for ch in collapsed.chars() {
        if ch == '.' {
            while out.ends_with(' ') {
                out.pop();
            }
            if out.ends_with('.') {
                continue;
            }
        }
        out.push(ch);
    }
    if !out.ends_with('.') {
        out.push('.');
    }
    out
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    if out.starts_with('/') {
        out
    } else {
        format!("/{out}")
    }
}
