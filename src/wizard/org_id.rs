//! Client-generated organization identifiers (`ORG_XXXXXXXX`).

use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WizardError;

/// Prefix every organization id carries.
pub const ORG_ID_PREFIX: &str = "ORG_";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 8;

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

static CANONICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ORG_[A-Z0-9]{8}$").expect("static regex"));

/// An organization id. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganizationId(String);

impl OrganizationId {
    /// Generate a fresh `ORG_` + 8 uppercase alphanumeric id.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!("{ORG_ID_PREFIX}{suffix}"))
    }

    /// Parse an id coming from storage or the backend.
    ///
    /// Only the `ORG_` prefix is enforced: the backend issues ids that do not
    /// follow the 8-character client format.
    pub fn parse(raw: &str) -> Result<Self, WizardError> {
        let trimmed = raw.trim();
        if is_well_formed(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(WizardError::InvalidOrganizationId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id matches the exact client-generated format.
    pub fn is_canonical(&self) -> bool {
        CANONICAL.is_match(&self.0)
    }
}

/// `ORG_` followed by at least one character.
pub fn is_well_formed(raw: &str) -> bool {
    raw.len() > ORG_ID_PREFIX.len() && raw.starts_with(ORG_ID_PREFIX)
}

impl FromStr for OrganizationId {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrganizationId {
    type Error = WizardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrganizationId> for String {
    fn from(id: OrganizationId) -> Self {
        id.0
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_canonical() {
        for _ in 0..100 {
            let id = OrganizationId::generate();
            assert!(id.is_canonical(), "bad id {id}");
            assert_eq!(id.as_str().len(), 12);
        }
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(OrganizationId::generate(), OrganizationId::generate());
    }

    #[test]
    fn parse_requires_prefix() {
        assert!(OrganizationId::parse("ORG_1").is_ok());
        assert!(OrganizationId::parse(" ORG_ABCD1234 ").is_ok());
        assert!(OrganizationId::parse("ORG_").is_err());
        assert!(OrganizationId::parse("org_abc").is_err());
        assert!(OrganizationId::parse("").is_err());
    }

    #[test]
    fn backend_ids_are_not_canonical() {
        let id = OrganizationId::parse("ORG_1").unwrap();
        assert!(!id.is_canonical());
    }

    #[test]
    fn serde_rejects_malformed() {
        let ok: OrganizationId = serde_json::from_str("\"ORG_ABCDEFGH\"").unwrap();
        assert_eq!(ok.as_str(), "ORG_ABCDEFGH");
        assert!(serde_json::from_str::<OrganizationId>("\"nope\"").is_err());
    }
}
