//! Base-62 encoding of unsigned integers.
//!
//! Digits are emitted most-significant first over the alphabet
//! `0-9A-Za-z`, so codes sort the same way as the numbers they encode
//! when their lengths match.

/// The 62-character alphabet, in digit order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = 62;

/// Encodes `n` as a base-62 string. `encode(0)` is `"0"`.
///
/// # Examples
///
/// ```
/// use tiered_shortener::codegen::base62::encode;
///
/// assert_eq!(encode(0), "0");
/// assert_eq!(encode(62), "10");
/// assert_eq!(encode(12345), "3D7");
/// ```
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    // u64::MAX needs 11 base-62 digits
    let mut buf = [0u8; 11];
    let mut pos = buf.len();
    while n > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Decodes a base-62 string produced by [`encode`].
///
/// Returns `None` for characters outside the alphabet, for the empty string,
/// and for values that do not fit in a `u64`.
pub fn decode(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }

    s.bytes().try_fold(0u64, |acc, b| {
        let digit = digit_value(b)?;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

fn digit_value(b: u8) -> Option<u64> {
    let v = match b {
        b'0'..=b'9' => b - b'0',
        b'A'..=b'Z' => b - b'A' + 10,
        b'a'..=b'z' => b - b'a' + 36,
        _ => return None,
    };
    Some(u64::from(v))
}
