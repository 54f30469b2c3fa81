//! v3 PID: a 128-bit random value encoded in a 48-symbol alphabet that
//! omits vowels and visually ambiguous characters, always 23 digits.

use uuid::Uuid;

use super::error::KernelError;

const ALPHABET: &[u8; 48] = b"bcdfghjkmnpqrstvwxyzBCDFGHJKLMNPQRSTVWXYZ3456789";
const PID_LEN: usize = 23;

/// Generates a fresh v3 PID backed by a random 128-bit value.
pub fn generate_v3() -> String {
    encode_v3(Uuid::new_v4().as_u128())
}

/// Encodes `value` as a 23-digit base-48 string, most significant digit
/// first, via repeated `divmod(value, 48)`.
pub fn encode_v3(value: u128) -> String {
    let mut remainders = [0u8; PID_LEN];
    let mut v = value;
    for slot in remainders.iter_mut() {
        *slot = (v % 48) as u8;
        v /= 48;
    }
    remainders
        .iter()
        .rev()
        .map(|&d| ALPHABET[d as usize] as char)
        .collect()
}

/// Decodes a v3 PID back into its 128-bit value.
pub fn decode_v3(pid: &str) -> Result<u128, KernelError> {
    if pid.chars().count() != PID_LEN {
        return Err(KernelError::Validation {
            message: format!("v3 pid must be {PID_LEN} characters, got {}", pid.len()),
        });
    }
    let mut value: u128 = 0;
    for ch in pid.chars() {
        let digit = ALPHABET
            .iter()
            .position(|&c| c as char == ch)
            .ok_or_else(|| KernelError::Validation {
                message: format!("invalid v3 pid character: {ch}"),
            })?;
        value = value
            .checked_mul(48)
            .and_then(|v| v.checked_add(digit as u128))
            .ok_or_else(|| KernelError::Validation {
                message: "v3 pid overflows 128 bits".to_string(),
            })?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_values() {
        for raw in [0u128, 1, 47, 48, u128::MAX, 0x0123_4567_89ab_cdef_0123_4567_89ab_cdef] {
            let encoded = encode_v3(raw);
            assert_eq!(encoded.chars().count(), PID_LEN);
            assert_eq!(decode_v3(&encoded).unwrap(), raw);
        }
    }

    #[test]
    fn uses_only_alphabet_characters() {
        let encoded = encode_v3(u128::MAX);
        assert!(encoded.chars().all(|c| ALPHABET.contains(&(c as u8))));
    }

    #[test]
    fn generate_produces_fixed_length_pid() {
        let pid = generate_v3();
        assert_eq!(pid.chars().count(), PID_LEN);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(decode_v3("short").is_err());
    }

    #[test]
    fn decode_rejects_unknown_character() {
        let mut bad = "b".repeat(PID_LEN);
        bad.replace_range(0..1, "a"); // 'a' is a vowel, not in the alphabet
        assert!(decode_v3(&bad).is_err());
    }
}
