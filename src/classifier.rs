/// Returns true iff the lowercase hex text of `bytes` contains a letter (`a`–`f`).
///
/// A byte encodes to two hex characters, one per nibble, and a character is
/// alphabetic exactly when its nibble is >= 10. Testing nibbles directly lets
/// the scan loop stop at the first dirty byte without ever rendering the text.
pub(crate) fn contains_hex_letter(bytes: &[u8]) -> bool {
    bytes.iter().any(|&b| (b >> 4) >= 0xa || (b & 0x0f) >= 0xa)
}

#[cfg(test)]
mod tests {
    use super::contains_hex_letter;

    /// The slow path: render the hex text and look for a letter.
    fn text_has_letter(bytes: &[u8]) -> bool {
        bytes
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>()
            .chars()
            .any(|c| c.is_ascii_lowercase())
    }

    #[test]
    fn agrees_with_text_encoding_for_every_byte() {
        for b in 0u8..=255 {
            assert_eq!(
                contains_hex_letter(&[b]),
                text_has_letter(&[b]),
                "byte {b:#04x}"
            );
        }
    }

    #[test]
    fn whole_value_equals_byte_at_a_time() {
        for &v in &[
            0u32,
            9,
            10,
            99_999_999,
            0x0999_9999,
            0x1234_5678,
            0x00ff_0000,
            1_690_000_000,
            u32::MAX,
        ] {
            let bytes = v.to_be_bytes();
            let stepwise = bytes
                .iter()
                .any(|b| contains_hex_letter(std::slice::from_ref(b)));
            assert_eq!(contains_hex_letter(&bytes), stepwise, "value {v:#010x}");
        }
    }

    #[test]
    fn all_digit_encodings_pass() {
        assert!(!contains_hex_letter(&0x1234_5678u32.to_be_bytes()));
        assert!(!contains_hex_letter(&[0x00, 0x99, 0x10]));
        assert!(!contains_hex_letter(&[]));
    }

    #[test]
    fn letter_encodings_are_flagged() {
        assert!(contains_hex_letter(&0x0000_000au32.to_be_bytes()));
        assert!(contains_hex_letter(&[0xf0]));
        assert!(contains_hex_letter(&[0x0b]));
    }
}
