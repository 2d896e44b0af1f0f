use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PostId);
id_newtype!(ChainId);

const ADDRESS_HEX_LEN: usize = 40;

/// An account address as reported by the wallet provider (`0x` + 40 hex digits).
///
/// The casing as entered is kept for display; comparisons are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used in logs and the profile header, e.g. `0x1234…abcd`.
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must have {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("address contains non-hex characters: {0}")]
    InvalidHex(String),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let Some(digits) = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
        else {
            return Err(AddressParseError::MissingPrefix(raw.to_string()));
        };
        if digits.len() != ADDRESS_HEX_LEN {
            return Err(AddressParseError::InvalidLength {
                expected: ADDRESS_HEX_LEN,
                actual: digits.len(),
            });
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError::InvalidHex(raw.to_string()));
        }
        Ok(Self(format!("0x{digits}")))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub posts_count: u64,
}

/// Post detail as returned by the contract. Comments are not readable through
/// the contract surface, so they are not part of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub content: String,
    pub like_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_compares_addresses_case_insensitively() {
        let lower: Address = "0xabcdef0123456789abcdef0123456789abcdef01"
            .parse()
            .expect("lower");
        let upper: Address = "0xABCDEF0123456789ABCDEF0123456789ABCDEF01"
            .parse()
            .expect("upper");
        assert_eq!(lower, upper);
        assert_eq!(lower.short(), "0xabcd…ef01");
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!(
            "abcdef".parse::<Address>(),
            Err(AddressParseError::MissingPrefix("abcdef".into()))
        );
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(AddressParseError::InvalidLength {
                expected: 40,
                actual: 4
            })
        );
        assert!(matches!(
            "0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz".parse::<Address>(),
            Err(AddressParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn address_serde_validates_input() {
        let parsed: Address =
            serde_json::from_str("\"0x00000000000000000000000000000000000000aa\"")
                .expect("valid");
        assert_eq!(parsed.as_str(), "0x00000000000000000000000000000000000000aa");
        assert!(serde_json::from_str::<Address>("\"0x1\"").is_err());
    }
}
