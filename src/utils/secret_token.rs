use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// API key secret returned once by the create call.
///
/// Zeroized on drop, redacted in `Debug`/`Display`, compared in constant time.
/// Serializes as the plain string so the tracked state can hold it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretToken {
    value: String,
}

impl SecretToken {
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Borrow the secret (use sparingly and never log it)
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }
}

impl PartialEq for SecretToken {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;

        if self.value.len() != other.value.len() {
            return false;
        }

        self.value.as_bytes().ct_eq(other.value.as_bytes()).into()
    }
}

impl Eq for SecretToken {}

impl Clone for SecretToken {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl From<String> for SecretToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretToken {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretToken")
            .field("value", &"[REDACTED]")
            .field("len", &self.value.len())
            .finish()
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED token of {} bytes]", self.value.len())
    }
}

impl Serialize for SecretToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for SecretToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_token_eq() {
        let a = SecretToken::from("tck_abc");
        let b = SecretToken::from("tck_abc");
        let c = SecretToken::from("tck_xyz");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, SecretToken::from("tck_ab"));
    }

    #[test]
    fn test_secret_token_debug_and_display_redact() {
        let token = SecretToken::from("tck_secret");
        let debug = format!("{token:?}");
        let display = format!("{token}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("tck_secret"));
        assert!(display.contains("[REDACTED"));
        assert!(!display.contains("tck_secret"));
    }

    #[test]
    fn test_secret_token_serializes_plain() {
        let token = SecretToken::from("tck_secret");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"tck_secret\"");

        let back: SecretToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "tck_secret");
        assert_eq!(back.len(), 10);
        assert!(!back.is_empty());
    }
}
