//! Account identities
//!
//! Account names follow the chain's name grammar: at most 12 characters from
//! `a-z`, `1-5` and `.`, not ending in `.`. Names are validated once, at
//! construction, so everything downstream can treat an [`AccountName`] as
//! well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest name the chain accepts for a regular account
pub const MAX_ACCOUNT_NAME_LEN: usize = 12;

/// Reasons an account name is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountNameError {
    #[error("account name is empty")]
    Empty,

    #[error("account name '{name}' is longer than {MAX_ACCOUNT_NAME_LEN} characters")]
    TooLong { name: String },

    #[error("account name '{name}' contains invalid character '{ch}' (allowed: a-z, 1-5, '.')")]
    InvalidCharacter { name: String, ch: char },

    #[error("account name '{name}' must not end with '.'")]
    TrailingDot { name: String },
}

/// A validated on-chain account name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    /// Validate and wrap a name
    pub fn new(name: impl Into<String>) -> Result<Self, AccountNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(AccountNameError::Empty);
        }
        if name.len() > MAX_ACCOUNT_NAME_LEN {
            return Err(AccountNameError::TooLong { name });
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !matches!(c, 'a'..='z' | '1'..='5' | '.'))
        {
            return Err(AccountNameError::InvalidCharacter { name, ch });
        }
        if name.ends_with('.') {
            return Err(AccountNameError::TrailingDot { name });
        }
        Ok(Self(name))
    }

    /// Wrap a literal already known to satisfy the grammar
    pub(crate) fn new_unchecked(name: &str) -> Self {
        debug_assert!(Self::new(name).is_ok(), "invalid built-in account name {name}");
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountName {
    type Err = AccountNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountName {
    type Error = AccountNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

/// A public/private key pair in the chain's textual key format
///
/// The private half never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public: String,
    pub private: String,
}

impl KeyPair {
    pub fn new(public: impl Into<String>, private: impl Into<String>) -> Self {
        Self {
            public: public.into(),
            private: private.into(),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &"<redacted>")
            .finish()
    }
}

/// One generated identity: a named account and the key pair that owns it
///
/// Serialized as `{"name", "pvt", "pub"}` to stay compatible with existing
/// registry files.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: AccountName,
    #[serde(rename = "pvt")]
    pub private_key: String,
    #[serde(rename = "pub")]
    pub public_key: String,
}

impl AccountRecord {
    pub fn new(name: AccountName, keys: KeyPair) -> Self {
        Self {
            name,
            private_key: keys.private,
            public_key: keys.public,
        }
    }

    pub fn key_pair(&self) -> KeyPair {
        KeyPair::new(&self.public_key, &self.private_key)
    }
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("name", &self.name)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_chain_names() {
        for name in ["eosio", "eosio.token", "producer1", "verartacore", "a", "zzzzzzzzzzzz"] {
            assert!(AccountName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(AccountName::new(""), Err(AccountNameError::Empty));
        assert!(matches!(
            AccountName::new("producer6"),
            Err(AccountNameError::InvalidCharacter { ch: '6', .. })
        ));
        assert!(matches!(
            AccountName::new("Producer1"),
            Err(AccountNameError::InvalidCharacter { ch: 'P', .. })
        ));
        assert!(matches!(
            AccountName::new("waytoolongname"),
            Err(AccountNameError::TooLong { .. })
        ));
        assert!(matches!(
            AccountName::new("eosio."),
            Err(AccountNameError::TrailingDot { .. })
        ));
    }

    #[test]
    fn private_keys_are_redacted_in_debug_output() {
        let record = AccountRecord::new(
            AccountName::new("producer1").unwrap(),
            KeyPair::new("PUB1", "PVT1"),
        );
        let rendered = format!("{record:?} {:?}", record.key_pair());
        assert!(rendered.contains("PUB1"));
        assert!(!rendered.contains("PVT1"));
    }

    #[test]
    fn record_uses_registry_field_names() {
        let record = AccountRecord::new(
            AccountName::new("testuser1").unwrap(),
            KeyPair::new("PUB", "PVT"),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "testuser1");
        assert_eq!(json["pub"], "PUB");
        assert_eq!(json["pvt"], "PVT");
    }

    #[test]
    fn invalid_name_fails_deserialization() {
        let err = serde_json::from_str::<AccountRecord>(
            r#"{"name": "Bad Name", "pvt": "x", "pub": "y"}"#,
        );
        assert!(err.is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn grammar_conforming_names_are_accepted(name in "[a-z1-5.]{0,11}[a-z1-5]") {
                let parsed = AccountName::new(name.clone()).unwrap();
                prop_assert_eq!(parsed.as_str(), name.as_str());
            }

            #[test]
            fn names_over_twelve_characters_are_rejected(name in "[a-z1-5]{13,20}") {
                let result = AccountName::new(name);
                prop_assert!(
                    matches!(result, Err(AccountNameError::TooLong { .. })),
                    "expected TooLong error, got {:?}",
                    result
                );
            }
        }
    }
}
