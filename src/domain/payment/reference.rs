//! Payment references.
//!
//! A reference correlates a prepared intent, the gateway transaction and the
//! order row (`order_number`). Format: `PREFIX-TIME36-RANDOMHEX`, upper-case.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::{Timestamp, ValidationError};

const MAX_REFERENCE_LEN: usize = 64;
const MAX_PREFIX_LEN: usize = 8;
const RANDOM_HEX_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentReference(String);

impl PaymentReference {
    /// Mints a fresh reference for `prefix` at `now`.
    ///
    /// The random part comes from a v4 UUID, which draws from the OS CSPRNG.
    pub fn generate(prefix: &str, now: Timestamp) -> Result<Self, ValidationError> {
        validate_prefix(prefix)?;
        let time_part = to_base36(now.as_unix_millis().max(0) as u64);
        let random = Uuid::new_v4().simple().to_string();
        let reference = format!("{}-{}-{}", prefix, time_part, &random[..RANDOM_HEX_LEN]);
        Ok(Self(reference.to_ascii_uppercase()))
    }

    /// Accepts an externally supplied reference (client request, gateway payload).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("reference"));
        }
        if raw.len() > MAX_REFERENCE_LEN {
            return Err(ValidationError::out_of_range(
                "reference",
                1,
                MAX_REFERENCE_LEN as i64,
                raw.len() as i64,
            ));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "reference",
                "only letters, digits, '-' and '_' are allowed",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The short alphanumeric tenant prefix before the first `-`.
    ///
    /// Returns `None` for references that do not follow the prefixed format,
    /// e.g. ones minted by a storefront that predates tenant routing.
    pub fn tenant_prefix(&self) -> Option<&str> {
        let (prefix, rest) = self.0.split_once('-')?;
        if rest.is_empty() || validate_prefix(prefix).is_err() {
            return None;
        }
        Some(prefix)
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.is_empty() {
        return Err(ValidationError::empty_field("reference_prefix"));
    }
    if prefix.len() > MAX_PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::invalid_format(
            "reference_prefix",
            "expected 1-8 alphanumeric characters",
        ));
    }
    Ok(())
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

impl TryFrom<String> for PaymentReference {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PaymentReference> for String {
    fn from(r: PaymentReference) -> Self {
        r.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    #[test]
    fn generated_reference_is_upper_case_and_prefixed() {
        let r = PaymentReference::generate("sp", at(1_700_000_000)).unwrap();
        assert!(r.as_str().starts_with("SP-"));
        assert_eq!(r.as_str(), r.as_str().to_ascii_uppercase());
        assert_eq!(r.tenant_prefix(), Some("SP"));
    }

    #[test]
    fn generated_reference_has_three_parts() {
        let r = PaymentReference::generate("SP", at(1_700_000_000)).unwrap();
        let parts: Vec<&str> = r.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), RANDOM_HEX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn references_minted_in_same_millisecond_differ() {
        let now = at(1_700_000_000);
        let minted: HashSet<_> = (0..500)
            .map(|_| PaymentReference::generate("SP", now).unwrap())
            .collect();
        assert_eq!(minted.len(), 500);
    }

    #[test]
    fn generated_reference_roundtrips_through_parse() {
        let r = PaymentReference::generate("SP", Timestamp::now()).unwrap();
        assert_eq!(PaymentReference::parse(r.as_str()).unwrap(), r);
    }

    #[test]
    fn rejects_bad_prefix() {
        assert!(PaymentReference::generate("", at(0)).is_err());
        assert!(PaymentReference::generate("TOO-LONG", at(0)).is_err());
        assert!(PaymentReference::generate("ABCDEFGHI", at(0)).is_err());
    }

    #[test]
    fn parse_rejects_empty_and_unsafe_input() {
        assert!(PaymentReference::parse("  ").is_err());
        assert!(PaymentReference::parse("SP-1 OR 1=1").is_err());
        assert!(PaymentReference::parse(&"A".repeat(65)).is_err());
    }

    #[test]
    fn tenant_prefix_absent_for_unprefixed_reference() {
        assert_eq!(PaymentReference::parse("ORDER123").unwrap().tenant_prefix(), None);
        assert_eq!(PaymentReference::parse("SP-").unwrap().tenant_prefix(), None);
        assert_eq!(PaymentReference::parse("S_P-1").unwrap().tenant_prefix(), None);
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
