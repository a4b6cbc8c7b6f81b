//! Revert payload decoding
//!
//! Solidity encodes `require`/`revert` messages as `Error(string)` and
//! compiler-inserted checks as `Panic(uint256)`. Anything else is a custom
//! error that can only be shown as raw bytes without the contract ABI.

use ethers::abi::{decode, ParamType, Token};
use ethers::types::{Bytes, U256};

/// `keccak256("Error(string)")[..4]`
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// `keccak256("Panic(uint256)")[..4]`
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Decode an `Error(string)` or `Panic(uint256)` payload
pub fn decode_revert_data(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (selector, body) = data.split_at(4);

    if selector == ERROR_SELECTOR {
        return match decode(&[ParamType::String], body).ok()?.pop()? {
            Token::String(reason) => Some(reason),
            _ => None,
        };
    }

    if selector == PANIC_SELECTOR && body.len() >= 32 {
        let code = U256::from_big_endian(&body[..32]);
        if code > U256::from(u8::MAX) {
            return Some(format!("Panic error {:#x}: unknown panic code", code));
        }
        let code = code.as_u64();
        return Some(format!("Panic error {:#04x}: {}", code, panic_description(code)));
    }

    None
}

/// Human-readable reason for a revert; never empty
pub fn revert_reason(message: &str, data: Option<&Bytes>) -> String {
    if let Some(data) = data {
        if let Some(decoded) = decode_revert_data(data) {
            if data.starts_with(&PANIC_SELECTOR) {
                return decoded;
            }
            return if decoded.is_empty() {
                "execution reverted".to_string()
            } else {
                format!("execution reverted: {}", decoded)
            };
        }

        if data.len() >= 4 {
            return format!(
                "execution reverted with custom error 0x{} (data: {})",
                hex::encode(&data[..4]),
                data
            );
        }
    }

    let message = message.trim();
    if message.is_empty() {
        "execution reverted".to_string()
    } else {
        message.to_string()
    }
}

fn panic_description(code: u64) -> &'static str {
    match code {
        0x00 => "generic compiler panic",
        0x01 => "assert(false)",
        0x11 => "arithmetic operation overflowed or underflowed",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum value",
        0x22 => "invalid storage byte array encoding",
        0x31 => "pop() on an empty array",
        0x32 => "array index out of bounds",
        0x41 => "out of memory",
        0x51 => "call to a zero-initialized function variable",
        _ => "unknown panic code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::encode;

    fn error_payload(reason: &str) -> Bytes {
        let mut data = ERROR_SELECTOR.to_vec();
        data.extend(encode(&[Token::String(reason.to_string())]));
        Bytes::from(data)
    }

    fn panic_payload(code: u64) -> Bytes {
        let mut data = PANIC_SELECTOR.to_vec();
        data.extend(encode(&[Token::Uint(U256::from(code))]));
        Bytes::from(data)
    }

    #[test]
    fn test_decode_error_string() {
        let data = error_payload("Escrow: not funded");
        assert_eq!(
            decode_revert_data(&data).as_deref(),
            Some("Escrow: not funded")
        );
        assert_eq!(
            revert_reason("execution reverted", Some(&data)),
            "execution reverted: Escrow: not funded"
        );
    }

    #[test]
    fn test_decode_panic() {
        let data = panic_payload(0x11);
        assert_eq!(
            revert_reason("execution reverted", Some(&data)),
            "Panic error 0x11: arithmetic operation overflowed or underflowed"
        );
    }

    #[test]
    fn test_panic_code_formatting() {
        assert_eq!(
            decode_revert_data(&panic_payload(0x01)).as_deref(),
            Some("Panic error 0x01: assert(false)")
        );
        assert_eq!(
            decode_revert_data(&panic_payload(0x1234)).as_deref(),
            Some("Panic error 0x1234: unknown panic code")
        );
    }

    #[test]
    fn test_custom_error_shown_as_hex() {
        let data = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef, 0x01]);
        let reason = revert_reason("execution reverted", Some(&data));
        assert!(reason.contains("0xdeadbeef"));
        assert!(decode_revert_data(&data).is_none());
    }

    #[test]
    fn test_message_fallback() {
        assert_eq!(
            revert_reason("execution reverted: ERC20: insufficient allowance", None),
            "execution reverted: ERC20: insufficient allowance"
        );
        assert_eq!(revert_reason("  ", None), "execution reverted");
    }

    #[test]
    fn test_truncated_payload() {
        assert!(decode_revert_data(&ERROR_SELECTOR).is_none());
        assert!(decode_revert_data(&[0x08, 0xc3]).is_none());
        let truncated = Bytes::from(ERROR_SELECTOR.to_vec());
        let reason = revert_reason("execution reverted", Some(&truncated));
        assert!(!reason.is_empty());
    }
}
