//! Signature Engine.
//!
//! Pure SHA-256 functions shared by payment preparation, confirmation and
//! webhook ingestion:
//!
//! - integrity signature: `sha256(reference ‖ amount ‖ currency ‖ secret)`,
//!   handed to the checkout widget and re-derived on confirmation
//! - webhook checksum: `sha256(values[properties] ‖ timestamp ‖ secret)`,
//!   where the gateway declares the properties per event
//!
//! Digests are lower-case hex. Comparisons against externally supplied
//! digests are case-insensitive and constant-time.

use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::payload_path::{resolve_scalar, PathError};
use super::{Currency, MinorUnits};

/// Why a webhook checksum did not verify.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    #[error("event declares no signed properties")]
    NoProperties,

    #[error(transparent)]
    Field(#[from] PathError),

    #[error("checksum mismatch")]
    Mismatch { expected: String, received: String },
}

/// Computes the integrity signature for a charge.
pub fn integrity_signature(
    reference: &str,
    amount: MinorUnits,
    currency: &Currency,
    secret: &str,
) -> String {
    let amount = amount.to_string();
    sha256_hex([reference, amount.as_str(), currency.as_str(), secret])
}

/// Re-derives the integrity signature and compares it with `candidate`.
pub fn verify_integrity_signature(
    reference: &str,
    amount: MinorUnits,
    currency: &Currency,
    secret: &str,
    candidate: &str,
) -> bool {
    let expected = integrity_signature(reference, amount, currency, secret);
    digests_match(&expected, candidate)
}

/// Computes a webhook checksum from already-resolved property values.
pub fn webhook_checksum<S: AsRef<str>>(ordered_values: &[S], timestamp: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    for value in ordered_values {
        hasher.update(value.as_ref().as_bytes());
    }
    hasher.update(timestamp.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Resolves each declared property against the event `data` and computes
/// the checksum. A property that does not resolve fails the whole checksum.
pub fn payload_checksum(
    data: &Value,
    properties: &[String],
    timestamp: &str,
    secret: &str,
) -> Result<String, ChecksumError> {
    if properties.is_empty() {
        return Err(ChecksumError::NoProperties);
    }
    let values = properties
        .iter()
        .map(|path| resolve_scalar(data, path))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(webhook_checksum(&values, timestamp, secret))
}

/// Verifies a gateway-supplied checksum over the event `data`.
pub fn verify_webhook_checksum(
    data: &Value,
    properties: &[String],
    timestamp: &str,
    secret: &str,
    candidate: &str,
) -> Result<(), ChecksumError> {
    let expected = payload_checksum(data, properties, timestamp, secret)?;
    if digests_match(&expected, candidate) {
        Ok(())
    } else {
        Err(ChecksumError::Mismatch {
            expected,
            received: candidate.to_string(),
        })
    }
}

/// Case-insensitive, constant-time comparison of two hex digests.
///
/// Length is not secret (SHA-256 hex is always 64 chars), so a length
/// mismatch returns early.
pub fn digests_match(expected: &str, candidate: &str) -> bool {
    let expected = expected.trim().to_ascii_lowercase();
    let candidate = candidate.trim().to_ascii_lowercase();
    if expected.len() != candidate.len() {
        return false;
    }
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}

fn sha256_hex<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}
