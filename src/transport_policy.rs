//! Cross-field check between declared transports and their URLs.
//!
//! Runs after the structural contract passes. Each transport with a known
//! scheme policy must be paired with a URL whose scheme is one of the
//! accepted ones; transports outside the policy table are not checked.

use crate::card::{AgentCard, Transport};
use crate::card_validation::ValidationError;
use url::Url;

/// Report every transport/URL pair whose scheme contradicts its transport.
///
/// An empty result means the card is compliant.
pub fn check_transport_consistency(card: &AgentCard) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let (Some(transport), Some(url)) = (&card.preferred_transport, &card.transport_url) {
        if let Some(error) = check_transport_url(transport, url, "/transportUrl") {
            errors.push(error);
        }
    }

    if let Some(interfaces) = &card.additional_interfaces {
        for (index, interface) in interfaces.iter().enumerate() {
            let path = format!("/additionalInterfaces/{index}/url");
            if let Some(error) = check_transport_url(&interface.transport, &interface.url, &path) {
                errors.push(error);
            }
        }
    }

    if !errors.is_empty() {
        tracing::debug!(
            name = %card.name,
            version = %card.version,
            violations = errors.len(),
            "agent card failed transport policy"
        );
    }
    errors
}

fn check_transport_url(transport: &Transport, url: &str, path: &str) -> Option<ValidationError> {
    if transport.as_str().is_empty() || url.is_empty() {
        return None;
    }
    let accepted = transport.accepted_schemes()?;

    let Some(scheme) = parse_scheme(url) else {
        return Some(ValidationError::new(
            path,
            format!("{path} must be a valid URI for transport \"{transport}\"."),
        ));
    };

    if accepted.contains(&scheme.as_str()) {
        return None;
    }

    Some(ValidationError::new(
        path,
        format!(
            "{path} must use {} for transport \"{transport}\".",
            format_scheme_hints(accepted)
        ),
    ))
}

fn parse_scheme(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .map(|parsed| parsed.scheme().to_ascii_lowercase())
}

fn format_scheme_hints(schemes: &[&str]) -> String {
    schemes
        .iter()
        .map(|scheme| format!("{scheme}://"))
        .collect::<Vec<_>>()
        .join(" or ")
}
