//! API key rotation for the Gemini client.
//!
//! Free-tier Gemini keys have tight per-key rate limits, so the service is
//! configured with several and spreads calls across them.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single API key. `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Last four characters, for log lines.
    pub fn suffix(&self) -> &str {
        let start = self
            .api_key
            .char_indices()
            .rev()
            .nth(3)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.api_key[start..]
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(...{})", self.suffix())
    }
}

/// Hands out the credential to use for the next model call.
pub trait CredentialProvider: Send + Sync {
    /// Returns `None` only when no credentials are configured.
    fn next(&self) -> Option<Credential>;
}

/// Strict round-robin over a fixed key list. Every call advances the cursor.
pub struct RoundRobinKeys {
    keys: Vec<Credential>,
    cursor: AtomicUsize,
}

impl RoundRobinKeys {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys: keys.into_iter().map(Credential::new).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl CredentialProvider for RoundRobinKeys {
    fn next(&self) -> Option<Credential> {
        if self.keys.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        Some(self.keys[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_wraps_around() {
        let keys = RoundRobinKeys::new(vec![
            "key-aaaa".to_string(),
            "key-bbbb".to_string(),
            "key-cccc".to_string(),
        ]);
        let seen: Vec<String> = (0..5)
            .map(|_| keys.next().unwrap().api_key().to_string())
            .collect();
        assert_eq!(
            seen,
            vec!["key-aaaa", "key-bbbb", "key-cccc", "key-aaaa", "key-bbbb"]
        );
    }

    #[test]
    fn test_empty_key_list_yields_none() {
        let keys = RoundRobinKeys::new(vec![]);
        assert!(keys.is_empty());
        assert!(keys.next().is_none());
    }

    #[test]
    fn test_suffix_is_last_four_chars() {
        assert_eq!(Credential::new("AIzaSyExample1234").suffix(), "1234");
        assert_eq!(Credential::new("abc").suffix(), "abc");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let rendered = format!("{:?}", Credential::new("AIzaSySecretWXYZ"));
        assert_eq!(rendered, "Credential(...WXYZ)");
        assert!(!rendered.contains("Secret"));
    }
}
