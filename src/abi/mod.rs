//! Contract-call codec
//!
//! Minimal encoder/decoder for the contract call convention used by the
//! governance contract: a 4-byte selector (Keccak-256 of the function
//! signature) followed by head/tail encoded arguments in 32-byte slots.
//! Only the parameter kinds the governance interface needs are supported:
//! uint256, bool, address, and string.

use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};

const SLOT: usize = 32;

/// Parameter kinds understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Uint256,
    Bool,
    Address,
    Utf8String,
}

impl ParamKind {
    /// Canonical type name used in function signatures
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamKind::Uint256 => "uint256",
            ParamKind::Bool => "bool",
            ParamKind::Address => "address",
            ParamKind::Utf8String => "string",
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, ParamKind::Utf8String)
    }
}

/// A typed call argument or decoded output value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(u128),
    Bool(bool),
    Address([u8; 20]),
    String(String),
}

impl Token {
    pub fn kind(&self) -> ParamKind {
        match self {
            Token::Uint(_) => ParamKind::Uint256,
            Token::Bool(_) => ParamKind::Bool,
            Token::Address(_) => ParamKind::Address,
            Token::String(_) => ParamKind::Utf8String,
        }
    }

    pub fn as_u64(&self) -> Result<u64> {
        match self {
            Token::Uint(v) if *v <= u64::MAX as u128 => Ok(*v as u64),
            Token::Uint(v) => Err(Error::decode(format!("uint value {} exceeds u64 range", v))),
            other => Err(Error::decode(format!(
                "expected uint, got {}",
                other.kind().type_name()
            ))),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Token::Bool(v) => Ok(*v),
            other => Err(Error::decode(format!(
                "expected bool, got {}",
                other.kind().type_name()
            ))),
        }
    }

    pub fn as_string(&self) -> Result<&str> {
        match self {
            Token::String(v) => Ok(v),
            other => Err(Error::decode(format!(
                "expected string, got {}",
                other.kind().type_name()
            ))),
        }
    }
}

/// Canonical function signature, e.g. `vote(uint256,bool)`
pub fn signature(name: &str, inputs: &[ParamKind]) -> String {
    let args: Vec<&str> = inputs.iter().map(|k| k.type_name()).collect();
    format!("{}({})", name, args.join(","))
}

/// 4-byte call selector for a function signature
pub fn selector(name: &str, inputs: &[ParamKind]) -> [u8; 4] {
    let digest = Keccak256::digest(signature(name, inputs).as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// Encode a full call: selector followed by the argument block
pub fn encode_call(name: &str, inputs: &[ParamKind], args: &[Token]) -> Result<Vec<u8>> {
    if inputs.len() != args.len() {
        return Err(Error::decode(format!(
            "operation '{}' expects {} argument(s), got {}",
            name,
            inputs.len(),
            args.len()
        )));
    }
    for (kind, token) in inputs.iter().zip(args) {
        if token.kind() != *kind {
            return Err(Error::decode(format!(
                "operation '{}': expected {}, got {}",
                name,
                kind.type_name(),
                token.kind().type_name()
            )));
        }
    }

    let mut out = selector(name, inputs).to_vec();
    out.extend_from_slice(&encode_tokens(args));
    Ok(out)
}

/// Head/tail encode a token sequence (no selector)
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * SLOT;
    let mut head = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(v) => head.extend_from_slice(&uint_slot(*v)),
            Token::Bool(v) => head.extend_from_slice(&uint_slot(*v as u128)),
            Token::Address(bytes) => {
                let mut slot = [0u8; SLOT];
                slot[12..].copy_from_slice(bytes);
                head.extend_from_slice(&slot);
            }
            Token::String(s) => {
                head.extend_from_slice(&uint_slot((head_len + tail.len()) as u128));
                tail.extend_from_slice(&uint_slot(s.len() as u128));
                tail.extend_from_slice(s.as_bytes());
                let padding = (SLOT - s.len() % SLOT) % SLOT;
                tail.extend(std::iter::repeat(0u8).take(padding));
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Decode an output block into typed tokens
pub fn decode_tokens(kinds: &[ParamKind], data: &[u8]) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(kinds.len());
    for (i, kind) in kinds.iter().enumerate() {
        let slot = read_slot(data, i * SLOT)?;
        let token = match kind {
            ParamKind::Uint256 => Token::Uint(decode_uint(slot)?),
            ParamKind::Bool => {
                let value = decode_uint(slot)?;
                match value {
                    0 => Token::Bool(false),
                    1 => Token::Bool(true),
                    v => return Err(Error::decode(format!("invalid bool value {}", v))),
                }
            }
            ParamKind::Address => {
                if slot[..12].iter().any(|&b| b != 0) {
                    return Err(Error::decode("address slot has non-zero padding"));
                }
                let mut bytes = [0u8; 20];
                bytes.copy_from_slice(&slot[12..]);
                Token::Address(bytes)
            }
            ParamKind::Utf8String => {
                let offset = decode_uint(slot)? as usize;
                let len_slot = read_slot(data, offset)?;
                let len = decode_uint(len_slot)? as usize;
                let start = offset + SLOT;
                let end = start
                    .checked_add(len)
                    .ok_or_else(|| Error::decode("string length overflow"))?;
                if end > data.len() {
                    return Err(Error::decode(format!(
                        "string data truncated: need {} bytes, have {}",
                        end,
                        data.len()
                    )));
                }
                let text = std::str::from_utf8(&data[start..end])
                    .map_err(|e| Error::decode(format!("invalid utf-8 in string: {}", e)))?;
                Token::String(text.to_string())
            }
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn uint_slot(value: u128) -> [u8; SLOT] {
    let mut slot = [0u8; SLOT];
    slot[16..].copy_from_slice(&value.to_be_bytes());
    slot
}

fn read_slot(data: &[u8], offset: usize) -> Result<&[u8]> {
    let end = offset
        .checked_add(SLOT)
        .ok_or_else(|| Error::decode("slot offset overflow"))?;
    if end > data.len() {
        return Err(Error::decode(format!(
            "output truncated: need {} bytes, have {}",
            end,
            data.len()
        )));
    }
    Ok(&data[offset..end])
}

fn decode_uint(slot: &[u8]) -> Result<u128> {
    if slot[..16].iter().any(|&b| b != 0) {
        return Err(Error::decode("uint value exceeds u128 range"));
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&slot[16..]);
    Ok(u128::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature() {
        assert_eq!(
            signature("vote", &[ParamKind::Uint256, ParamKind::Bool]),
            "vote(uint256,bool)"
        );
        assert_eq!(signature("getProposalCount", &[]), "getProposalCount()");
    }

    #[test]
    fn test_selector_is_deterministic_and_distinct() {
        let a = selector("vote", &[ParamKind::Uint256, ParamKind::Bool]);
        let b = selector("vote", &[ParamKind::Uint256, ParamKind::Bool]);
        let c = selector("createProposal", &[ParamKind::Utf8String, ParamKind::Utf8String]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_encode_static_args() {
        let data = encode_tokens(&[Token::Uint(7), Token::Bool(true)]);
        assert_eq!(data.len(), 64);
        assert_eq!(data[31], 7);
        assert_eq!(data[63], 1);
        assert!(data[..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_string_head_tail() {
        let data = encode_tokens(&[Token::String("hi".to_string()), Token::Uint(3)]);
        // head: offset slot + uint slot, tail: length slot + padded bytes
        assert_eq!(data.len(), 128);
        assert_eq!(data[31], 64); // offset of the tail
        assert_eq!(data[63], 3);
        assert_eq!(data[95], 2); // string length
        assert_eq!(&data[96..98], b"hi");
        assert!(data[98..128].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_static_outputs() {
        let mut data = vec![0u8; 64];
        data[31] = 42;
        data[63] = 1;
        let tokens = decode_tokens(&[ParamKind::Uint256, ParamKind::Bool], &data).unwrap();
        assert_eq!(tokens[0].as_u64().unwrap(), 42);
        assert!(tokens[1].as_bool().unwrap());
    }

    #[test]
    fn test_decode_string_output() {
        let mut data = vec![0u8; 96];
        data[31] = 32; // offset
        data[63] = 5; // length
        data[64..69].copy_from_slice(b"hello");
        let tokens = decode_tokens(&[ParamKind::Utf8String], &data).unwrap();
        assert_eq!(tokens[0].as_string().unwrap(), "hello");
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let data = vec![0u8; 16];
        assert!(decode_tokens(&[ParamKind::Uint256], &data).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_bool() {
        let mut data = vec![0u8; 32];
        data[31] = 2;
        assert!(decode_tokens(&[ParamKind::Bool], &data).is_err());
    }

    #[test]
    fn test_encode_call_arity_check() {
        let err = encode_call("vote", &[ParamKind::Uint256, ParamKind::Bool], &[Token::Uint(1)]);
        assert!(err.is_err());

        let ok = encode_call(
            "vote",
            &[ParamKind::Uint256, ParamKind::Bool],
            &[Token::Uint(1), Token::Bool(false)],
        )
        .unwrap();
        assert_eq!(ok.len(), 4 + 64);
        assert_eq!(&ok[..4], &selector("vote", &[ParamKind::Uint256, ParamKind::Bool]));
    }
}
