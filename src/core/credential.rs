//! The bearer secret used to authorize calls to the completion
//! endpoint. The full value only ever leaves this type through
//! `expose()`, which is used to set the `Authorization` header.

use std::fmt;

use crate::openai::CompletionError;

const REQUIRED_PREFIX: &str = "sk-or-v1-";
// Keys must be strictly longer than this
const MIN_LENGTH_EXCLUSIVE: usize = 20;
const REDACTED_PREFIX_LEN: usize = 8;

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validate and wrap a raw secret. Fails with
    /// `CompletionError::CredentialInvalid` when the value is blank,
    /// lacks the provider prefix, or is too short.
    pub fn parse(raw: &str) -> Result<Self, CompletionError> {
        let raw = raw.trim();
        if is_plausible(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(CompletionError::CredentialInvalid)
        }
    }

    /// Wraps a value without validating it. The completion client
    /// re-checks plausibility before every call so an unchecked
    /// credential can never reach the network.
    pub fn unchecked(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn is_valid(&self) -> bool {
        is_plausible(&self.0)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short non-identifying prefix safe for diagnostics
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(REDACTED_PREFIX_LEN).collect();
        format!("{}...", prefix)
    }
}

fn is_plausible(raw: &str) -> bool {
    !raw.is_empty() && raw.starts_with(REQUIRED_PREFIX) && raw.len() > MIN_LENGTH_EXCLUSIVE
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "sk-or-v1-0123456789abcdef";

    #[test]
    fn test_parse_valid() {
        let cred = Credential::parse(VALID).unwrap();
        assert_eq!(cred.expose(), VALID);
        assert!(cred.is_valid());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let cred = Credential::parse(&format!("  {}\n", VALID)).unwrap();
        assert_eq!(cred.expose(), VALID);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            Credential::parse(""),
            Err(CompletionError::CredentialInvalid)
        ));
        assert!(matches!(
            Credential::parse("   "),
            Err(CompletionError::CredentialInvalid)
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        assert!(Credential::parse("sk-proj-0123456789abcdefghij").is_err());
    }

    #[test]
    fn test_parse_rejects_short_key() {
        // Exactly 20 characters is not enough
        let key = "sk-or-v1-0123456789a";
        assert_eq!(key.len(), 20);
        assert!(Credential::parse(key).is_err());
        assert!(Credential::parse("sk-or-v1-0123456789ab").is_ok());
    }

    #[test]
    fn test_unchecked_is_not_valid() {
        let cred = Credential::unchecked("thiswontwork");
        assert!(!cred.is_valid());
    }

    #[test]
    fn test_debug_and_display_are_redacted() {
        let cred = Credential::parse(VALID).unwrap();
        assert_eq!(cred.redacted(), "sk-or-v1...");
        assert_eq!(format!("{}", cred), "sk-or-v1...");
        let debug = format!("{:?}", cred);
        assert!(!debug.contains(VALID));
        assert!(debug.contains("sk-or-v1..."));
    }
}
