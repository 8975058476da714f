// src/codec.rs

//! Best-effort decoding of captured process output
//!
//! Reader binaries under test may emit filenames and diagnostics in
//! whatever bytes the malformed archive handed them. Output is decoded as
//! UTF-8 where possible and falls back to Latin-1, which never fails
//! because every byte maps to the code point of the same value.

/// Decode captured output bytes to text, never failing
pub fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode("hello wörld\n".as_bytes()), "hello wörld\n");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // 0xE9 is not valid UTF-8 on its own but is 'é' in Latin-1
        let bytes = [b't', b'e', b's', b't', 0xE9];
        assert_eq!(decode(&bytes), "testé");
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(b""), "");
    }

    #[test]
    fn test_decode_never_loses_length() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        assert_eq!(decode(&bytes).chars().count(), 256);
    }
}
