//! Normalized MAC address identity
//!
//! The MAC address is the only durable key distinguishing one physical
//! device from another across scans; IP addresses are transient. Every
//! comparison therefore goes through the normalized form: lowercase,
//! colon-delimited, zero-padded octets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MacParseError {
    #[error("expected 6 octets, got {0}")]
    WrongOctetCount(usize),
    #[error("invalid octet {0:?}")]
    InvalidOctet(String),
}

/// A hardware (MAC) address in normalized form.
///
/// Accepts `:` or `-` separated input with upper/lower case and
/// unpadded octets; always renders as `aa:bb:cc:dd:ee:ff`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(MacParseError::WrongOctetCount(parts.len()));
        }
        let mut octets = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 2 {
                return Err(MacParseError::InvalidOctet(part.to_string()));
            }
            octets[i] = u8::from_str_radix(part, 16)
                .map_err(|_| MacParseError::InvalidOctet(part.to_string()))?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl TryFrom<String> for MacAddr {
    type Error = MacParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_normalize() {
        let mac: MacAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_dash_separated() {
        let mac: MacAddr = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_unpadded_octets() {
        let mac: MacAddr = "0:1:2:a:b:c".parse().unwrap();
        assert_eq!(mac.to_string(), "00:01:02:0a:0b:0c");
    }

    #[test]
    fn test_case_insensitive_equality() {
        let a: MacAddr = "AA:BB:CC:00:11:22".parse().unwrap();
        let b: MacAddr = "aa:bb:cc:00:11:22".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_octet_count() {
        assert_eq!(
            "aa:bb:cc".parse::<MacAddr>(),
            Err(MacParseError::WrongOctetCount(3))
        );
    }

    #[test]
    fn test_invalid_octet() {
        assert!("aa:bb:cc:dd:ee:zz".parse::<MacAddr>().is_err());
        assert!("aa:bb:cc:dd:ee:fff".parse::<MacAddr>().is_err());
    }
}
