//! Validated hardware (MAC) addresses

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a textual MAC address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMacError {
    #[error("expected 6 colon-separated groups, found {0}")]
    WrongGroupCount(usize),

    #[error("group {index} ('{group}') is not a hex octet")]
    InvalidOctet { index: usize, group: String },
}

/// A 48-bit hardware address in colon-hex form
///
/// Parsing is strict: exactly 6 groups separated by `:`, each a one- or
/// two-digit hex value. A group that would encode more than one byte
/// (e.g. `1FF`) is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddr {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.split(':').collect();
        if groups.len() != 6 {
            return Err(ParseMacError::WrongGroupCount(groups.len()));
        }

        let mut octets = [0u8; 6];
        for (index, group) in groups.iter().enumerate() {
            // u8::from_str_radix rejects empty groups, non-hex digits and
            // anything wider than one byte.
            octets[index] =
                u8::from_str_radix(group, 16).map_err(|_| ParseMacError::InvalidOctet {
                    index,
                    group: (*group).to_string(),
                })?;
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl TryFrom<String> for MacAddr {
    type Error = ParseMacError;

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
    fn parse_lowercase() {
        let mac: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn parse_uppercase_and_single_digit() {
        let mac: MacAddr = "AA:BB:CC:DD:EE:F".parse().unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x0F]);
    }

    #[test]
    fn reject_too_few_groups() {
        let err = "AA:BB".parse::<MacAddr>().unwrap_err();
        assert_eq!(err, ParseMacError::WrongGroupCount(2));
    }

    #[test]
    fn reject_too_many_groups() {
        let err = "AA:BB:CC:DD:EE:FF:00".parse::<MacAddr>().unwrap_err();
        assert_eq!(err, ParseMacError::WrongGroupCount(7));
    }

    #[test]
    fn reject_non_hex_group() {
        let err = "GG:BB:CC:DD:EE:FF".parse::<MacAddr>().unwrap_err();
        assert!(matches!(err, ParseMacError::InvalidOctet { index: 0, .. }));
    }

    #[test]
    fn reject_group_wider_than_one_byte() {
        let err = "1FF:BB:CC:DD:EE:FF".parse::<MacAddr>().unwrap_err();
        assert!(matches!(err, ParseMacError::InvalidOctet { index: 0, .. }));
    }

    #[test]
    fn reject_empty_group() {
        assert!("AA::CC:DD:EE:FF".parse::<MacAddr>().is_err());
    }

    #[test]
    fn display_is_lowercase_colon_hex() {
        let mac = MacAddr::new([0xAA, 0xBB, 0xCC, 0x0D, 0xEE, 0xFF]);
        assert_eq!(mac.to_string(), "aa:bb:cc:0d:ee:ff");
    }

    #[test]
    fn display_round_trips() {
        let mac: MacAddr = "01:23:45:67:89:ab".parse().unwrap();
        assert_eq!(mac.to_string().parse::<MacAddr>().unwrap(), mac);
    }
}
