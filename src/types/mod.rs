//! Core data types for the governance engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// One governance item as recorded on the ledger
///
/// A `Proposal` is a value snapshot: records are never mutated in place, the
/// whole collection is rebuilt on every synchronization pass. `has_voted` is
/// not intrinsic to the proposal; it is relative to the account that was
/// bound when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Dense zero-based index assigned by the ledger at creation time
    pub id: u64,
    pub title: String,
    pub description: String,
    pub yes_votes: u64,
    pub no_votes: u64,
    /// Voting is permitted only while true
    pub is_active: bool,
    /// Whether the currently bound account has voted on this proposal;
    /// false for every proposal when no account is bound
    pub has_voted: bool,
}

/// Opaque transaction identifier returned on broadcast
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TxHash {
    fn from(s: &str) -> Self {
        TxHash(s.to_string())
    }
}

/// Ledger-issued confirmation that a transaction was included and finalized
///
/// Hex-quantity fields on the wire (`0x1`-style strings) are decoded through
/// the `hex_quantity` helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default, with = "opt_hex_quantity")]
    pub epoch_number: Option<u64>,
    /// 0 = succeeded; any other value is a ledger-side execution failure
    #[serde(with = "hex_quantity")]
    pub outcome_status: u64,
}

impl Receipt {
    /// Whether the confirmed transaction executed successfully
    pub fn succeeded(&self) -> bool {
        self.outcome_status == 0
    }
}

/// Serde helpers for `0x`-prefixed hex quantities
pub mod hex_quantity {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(s: &str) -> Result<u64, String> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex quantity '{}': {}", s, e))
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }
}

mod opt_hex_quantity {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&format!("{:#x}", v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            Some(s) => super::hex_quantity::parse(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
