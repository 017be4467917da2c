//! Conflux address encoding/decoding utilities
//!
//! The ledger accepts two syntactic address forms: the hex form
//! (`0x` + 40 hex digits) and the CIP-37 base32 form
//! (`cfx:...`, `cfxtest:...` or `net<N>:...` with a BCH checksum).
//! Both decode to the same 20-byte account body used in contract calls.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Base32 alphabet used by CIP-37 (excludes i, l, o, q)
const CHARSET: &[u8; 32] = b"abcdefghjkmnprstuvwxyz0123456789";

fn hex_form_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"))
}

/// A validated ledger address
///
/// Holds the canonical text form the address was parsed from together with
/// its decoded 20-byte account body. Construction goes through [`Address::parse`],
/// so an `Address` value is always syntactically valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    text: String,
    bytes: [u8; 20],
}

impl Address {
    /// Parse an address in either accepted form
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_address("empty address"));
        }

        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            return Self::parse_hex(trimmed);
        }

        if trimmed.contains(':') {
            return Self::parse_base32(trimmed);
        }

        Err(Error::invalid_address(format!(
            "'{}' is neither a 0x hex address nor a base32 address",
            trimmed
        )))
    }

    fn parse_hex(raw: &str) -> Result<Self> {
        let input = raw.to_lowercase();
        let input = input.as_str();
        if !hex_form_regex().is_match(input) {
            return Err(Error::invalid_address(format!(
                "hex address must be 0x followed by 40 hex digits, got '{}'",
                input
            )));
        }
        let decoded = hex::decode(&input[2..])
            .map_err(|e| Error::invalid_address(format!("invalid hex: {}", e)))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Ok(Self {
            text: input.to_string(),
            bytes,
        })
    }

    fn parse_base32(input: &str) -> Result<Self> {
        let lowered = input.to_lowercase();
        let parts: Vec<&str> = lowered.split(':').collect();
        let (prefix, payload) = match parts.as_slice() {
            [prefix, payload] => (*prefix, *payload),
            // CIP-37 allows an optional type annotation, e.g. cfx:type.user:...
            [prefix, annotation, payload] if annotation.starts_with("type.") => {
                (*prefix, *payload)
            }
            _ => {
                return Err(Error::invalid_address(format!(
                    "malformed base32 address '{}'",
                    input
                )))
            }
        };

        if !is_valid_prefix(prefix) {
            return Err(Error::invalid_address(format!(
                "unknown network prefix '{}'",
                prefix
            )));
        }

        // 34 payload chars (version byte + 20-byte body) plus 8 checksum chars
        if payload.len() != 42 {
            return Err(Error::invalid_address(format!(
                "base32 payload must be 42 characters, got {}",
                payload.len()
            )));
        }

        let mut groups = Vec::with_capacity(payload.len());
        for c in payload.bytes() {
            let idx = CHARSET
                .iter()
                .position(|&ch| ch == c)
                .ok_or_else(|| {
                    Error::invalid_address(format!("invalid base32 character '{}'", c as char))
                })?;
            groups.push(idx as u8);
        }

        let mut checksum_input = expand_prefix(prefix);
        checksum_input.extend_from_slice(&groups);
        if polymod(&checksum_input) != 0 {
            return Err(Error::invalid_address("checksum mismatch"));
        }

        let body = convert_bits_5_to_8(&groups[..34])?;
        if body.len() != 21 || body[0] != 0x00 {
            return Err(Error::invalid_address("unsupported address version"));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&body[1..]);

        Ok(Self {
            text: format!("{}:{}", prefix, payload),
            bytes,
        })
    }

    /// Encode a 20-byte account body as a CIP-37 base32 address
    pub fn from_bytes(prefix: &str, bytes: [u8; 20]) -> Result<Self> {
        if !is_valid_prefix(prefix) {
            return Err(Error::invalid_address(format!(
                "unknown network prefix '{}'",
                prefix
            )));
        }

        let mut payload = vec![0x00u8];
        payload.extend_from_slice(&bytes);
        let mut groups = convert_bits_8_to_5(&payload);

        let mut checksum_input = expand_prefix(prefix);
        checksum_input.extend_from_slice(&groups);
        checksum_input.extend_from_slice(&[0u8; 8]);
        let checksum = polymod(&checksum_input);
        for i in 0..8 {
            groups.push(((checksum >> (5 * (7 - i))) & 0x1f) as u8);
        }

        let encoded: String = groups.iter().map(|&g| CHARSET[g as usize] as char).collect();
        Ok(Self {
            text: format!("{}:{}", prefix, encoded),
            bytes,
        })
    }

    /// The 20-byte account body
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.bytes
    }

    /// The address rendered in hex form (0x prefixed)
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// The canonical text the address was parsed from
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl std::str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.text
    }
}

/// Check if an address string is syntactically valid
pub fn is_valid_address(address: &str) -> bool {
    Address::parse(address).is_ok()
}

fn is_valid_prefix(prefix: &str) -> bool {
    match prefix {
        "cfx" | "cfxtest" => true,
        _ => prefix
            .strip_prefix("net")
            .map(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false),
    }
}

/// Lower 5 bits of each prefix character, followed by a zero separator
fn expand_prefix(prefix: &str) -> Vec<u8> {
    let mut out: Vec<u8> = prefix.bytes().map(|b| b & 0x1f).collect();
    out.push(0);
    out
}

/// BCH checksum over 5-bit groups (CIP-37, same generator as cashaddr)
fn polymod(values: &[u8]) -> u64 {
    let mut c: u64 = 1;
    for &d in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x0007_ffff_ffff) << 5) ^ (d as u64);
        if c0 & 0x01 != 0 {
            c ^= 0x98_f2bc_8e61;
        }
        if c0 & 0x02 != 0 {
            c ^= 0x79_b76d_99e2;
        }
        if c0 & 0x04 != 0 {
            c ^= 0xf3_3e5f_b3c4;
        }
        if c0 & 0x08 != 0 {
            c ^= 0xae_2eab_e2a8;
        }
        if c0 & 0x10 != 0 {
            c ^= 0x1e_4f43_e470;
        }
    }
    c ^ 1
}

fn convert_bits_8_to_5(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity((data.len() * 8 + 4) / 5);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &b in data {
        acc = (acc << 8) | b as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(((acc >> bits) & 0x1f) as u8);
        }
    }
    if bits > 0 {
        out.push(((acc << (5 - bits)) & 0x1f) as u8);
    }
    out
}

fn convert_bits_5_to_8(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &g in data {
        acc = (acc << 5) | g as u32;
        bits += 5;
        while bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }
    // Trailing padding bits must be zero
    if bits >= 5 || (acc & ((1 << bits) - 1)) != 0 {
        return Err(Error::invalid_address("invalid base32 padding"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_form() {
        let addr = Address::parse("0x1234567890AbCdEf1234567890aBcDeF12345678").unwrap();
        assert_eq!(addr.as_str(), "0x1234567890abcdef1234567890abcdef12345678");
        assert_eq!(addr.to_hex(), addr.as_str());
        assert_eq!(addr.as_bytes().len(), 20);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Address::parse("").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xZZ34567890abcdef1234567890abcdef12345678").is_err());
        assert!(Address::parse("not-an-address").is_err());
        assert!(Address::parse("eth:acb5mv1vxyxx").is_err());
    }

    #[test]
    fn test_base32_form() {
        let bytes = [0x11u8; 20];
        let addr = Address::from_bytes("cfxtest", bytes).unwrap();
        assert!(addr.as_str().starts_with("cfxtest:"));

        let parsed = Address::parse(addr.as_str()).unwrap();
        assert_eq!(parsed.as_bytes(), &bytes);

        // Uppercase input is accepted and normalized
        let upper = Address::parse(&addr.as_str().to_uppercase()).unwrap();
        assert_eq!(upper.as_bytes(), &bytes);
    }

    #[test]
    fn test_base32_checksum_rejects_corruption() {
        let addr = Address::from_bytes("cfx", [0x42u8; 20]).unwrap();
        let mut corrupted: Vec<char> = addr.as_str().chars().collect();
        let last = *corrupted.last().unwrap();
        *corrupted.last_mut().unwrap() = if last == 'a' { 'c' } else { 'a' };
        let corrupted: String = corrupted.into_iter().collect();
        assert!(Address::parse(&corrupted).is_err());
    }

    #[test]
    fn test_net_prefix() {
        let addr = Address::from_bytes("net2999", [0x05u8; 20]).unwrap();
        assert!(Address::parse(addr.as_str()).is_ok());
        assert!(Address::from_bytes("netx", [0u8; 20]).is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_base32_roundtrip(bytes in proptest::array::uniform20(proptest::prelude::any::<u8>())) {
            for prefix in ["cfx", "cfxtest", "net1029"] {
                let addr = Address::from_bytes(prefix, bytes).unwrap();
                let parsed = Address::parse(addr.as_str()).unwrap();
                proptest::prop_assert_eq!(parsed.as_bytes(), &bytes);
            }
        }

        #[test]
        fn prop_hex_roundtrip(bytes in proptest::array::uniform20(proptest::prelude::any::<u8>())) {
            let hex_form = format!("0x{}", hex::encode(bytes));
            let parsed = Address::parse(&hex_form).unwrap();
            proptest::prop_assert_eq!(parsed.as_bytes(), &bytes);
            proptest::prop_assert_eq!(parsed.to_hex(), hex_form);
        }
    }
}
