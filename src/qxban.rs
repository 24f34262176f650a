// 🔎 QXBAN Format - positional grammar of the SEPAmail account identifier
//
// Layout (34 characters):
//   [0..2)    "QX"
//   [2..4)    two decimal digits
//   [4..15)   BIC of the holding institution, normalized to 11 characters
//   [15..)    verification-type marker, then [A-Z0-9]* up to the end
//
// Validation is total: every malformed input is simply `false`.

use serde::{Deserialize, Serialize};

pub const QXBAN_LENGTH: usize = 34;
pub const QXBAN_PREFIX: &str = "QX";
pub const NORMALIZED_BIC_LENGTH: usize = 11;

const CHECK_DIGITS: std::ops::Range<usize> = 2..4;
const BIC_FIELD: std::ops::Range<usize> = 4..15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QxbanFormat {
    /// Literal that must follow the embedded BIC
    #[serde(default)]
    pub marker: String,

    /// Branch code appended to 8-character BICs
    #[serde(default = "default_filler")]
    pub filler: String,
}

fn default_filler() -> String {
    "XXX".to_string()
}

impl Default for QxbanFormat {
    fn default() -> Self {
        QxbanFormat {
            marker: String::new(),
            filler: default_filler(),
        }
    }
}

impl QxbanFormat {
    pub fn with_marker(marker: impl Into<String>) -> Self {
        QxbanFormat {
            marker: marker.into(),
            ..Self::default()
        }
    }

    /// 8-character BIC → BIC + filler, 11-character BIC unchanged, anything else rejected
    pub fn normalize_bic(&self, bic: &str) -> Option<String> {
        match bic.len() {
            8 => {
                let normalized = format!("{}{}", bic, self.filler);
                (normalized.len() == NORMALIZED_BIC_LENGTH).then_some(normalized)
            }
            NORMALIZED_BIC_LENGTH => Some(bic.to_string()),
            _ => None,
        }
    }

    /// Does `code` (surrounding whitespace ignored) belong to the institution `bic`?
    pub fn is_valid(&self, code: &str, bic: &str) -> bool {
        let code = code.trim().as_bytes();
        if code.len() != QXBAN_LENGTH {
            return false;
        }

        let bic = match self.normalize_bic(bic) {
            Some(bic) => bic,
            None => return false,
        };

        if &code[..CHECK_DIGITS.start] != QXBAN_PREFIX.as_bytes() {
            return false;
        }

        if !code[CHECK_DIGITS].iter().all(u8::is_ascii_digit) {
            return false;
        }

        if &code[BIC_FIELD] != bic.as_bytes() {
            return false;
        }

        let marker_end = BIC_FIELD.end + self.marker.len();
        if marker_end > QXBAN_LENGTH || &code[BIC_FIELD.end..marker_end] != self.marker.as_bytes() {
            return false;
        }

        code[marker_end..]
            .iter()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid_qxban(code: &str, bic: &str) -> bool {
        QxbanFormat::default().is_valid(code, bic)
    }

    /// "QX" + digits + normalized BIC + marker, padded with `fill` to 34 characters
    fn build(format: &QxbanFormat, bic: &str, fill: char) -> String {
        let mut code = format!(
            "QX00{}{}",
            format.normalize_bic(bic).unwrap(),
            format.marker
        );
        while code.len() < QXBAN_LENGTH {
            code.push(fill);
        }
        code
    }

    #[test]
    fn test_valid_qxban() {
        assert!(is_valid_qxban("QX12BICVERT1XXXA1B2C3D4E5F6G7H8I9J", "BICVERT1"));
        assert!(is_valid_qxban("QX12BICVERT1XXXA1B2C3D4E5F6G7H8I9J", "BICVERT1XXX"));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert!(is_valid_qxban("  QX12BICVERT1XXXA1B2C3D4E5F6G7H8I9J\n", "BICVERT1"));
    }

    #[test]
    fn test_wrong_length_always_fails() {
        let valid = "QX12BICVERT1XXXA1B2C3D4E5F6G7H8I9J";
        for len in 0..=40 {
            if len == QXBAN_LENGTH {
                continue;
            }
            let mut candidate: String = valid.chars().cycle().take(len).collect();
            if len > QXBAN_LENGTH {
                candidate = format!("{}{}", valid, "0".repeat(len - QXBAN_LENGTH));
            }
            assert!(!is_valid_qxban(&candidate, "BICVERT1"), "length {} accepted", len);
        }
    }

    #[test]
    fn test_eight_and_eleven_char_bic_are_equivalent() {
        let format = QxbanFormat::default();
        let code = build(&format, "AGRIFRPP", '7');

        assert_eq!(
            format.is_valid(&code, "AGRIFRPP"),
            format.is_valid(&code, "AGRIFRPPXXX")
        );
        assert!(format.is_valid(&code, "AGRIFRPP"));
    }

    #[test]
    fn test_eleven_char_bic_with_branch() {
        let format = QxbanFormat::default();
        let code = build(&format, "AGRIFRPP882", 'Z');

        assert!(format.is_valid(&code, "AGRIFRPP882"));
        assert!(!format.is_valid(&code, "AGRIFRPP"));
    }

    #[test]
    fn test_bad_bic_length_is_invalid() {
        let code = "QX12BICVERT1XXXA1B2C3D4E5F6G7H8I9J";
        assert!(!is_valid_qxban(code, ""));
        assert!(!is_valid_qxban(code, "BICVERT"));
        assert!(!is_valid_qxban(code, "BICVERT1XX"));
        assert!(!is_valid_qxban(code, "BICVERT1XXXX"));
    }

    #[test]
    fn test_wrong_prefix() {
        assert!(!is_valid_qxban("QY12BICVERT1XXXA1B2C3D4E5F6G7H8I9J", "BICVERT1"));
        assert!(!is_valid_qxban("qx12BICVERT1XXXA1B2C3D4E5F6G7H8I9J", "BICVERT1"));
    }

    #[test]
    fn test_check_digits_must_be_digits() {
        assert!(!is_valid_qxban("QX1ABICVERT1XXXA1B2C3D4E5F6G7H8I9J", "BICVERT1"));
        assert!(!is_valid_qxban("QX 2BICVERT1XXXA1B2C3D4E5F6G7H8I9J", "BICVERT1"));
    }

    #[test]
    fn test_embedded_bic_must_match() {
        assert!(!is_valid_qxban("QX12BICVERT2XXXA1B2C3D4E5F6G7H8I9J", "BICVERT1"));
    }

    #[test]
    fn test_suffix_charset() {
        assert!(!is_valid_qxban("QX12BICVERT1XXXa1B2C3D4E5F6G7H8I9J", "BICVERT1"));
        assert!(!is_valid_qxban("QX12BICVERT1XXXA1B2C3D4E5F6G7H8I-J", "BICVERT1"));
        assert!(!is_valid_qxban("QX12BICVERT1XXXA1B2C3D4 5F6G7H8I9J", "BICVERT1"));
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        // 34 bytes, but multi-byte characters straddle field boundaries
        let code = "QX12BICVERT1XXXÉÉÉÉÉÉÉÉÉ0";
        assert_eq!(code.len(), QXBAN_LENGTH);
        assert!(!is_valid_qxban(code, "BICVERT1"));
    }

    #[test]
    fn test_marker_round_trip() {
        let format = QxbanFormat::with_marker("VRF");
        let code = build(&format, "BNPAFRPP", '9');

        assert_eq!(code.len(), QXBAN_LENGTH);
        assert!(format.is_valid(&code, "BNPAFRPP"));

        // Flip each marker character in turn
        for i in 15..15 + format.marker.len() {
            let mut bytes = code.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let flipped = String::from_utf8(bytes).unwrap();
            assert!(!format.is_valid(&flipped, "BNPAFRPP"), "flip at {} accepted", i);
        }
    }

    #[test]
    fn test_marker_longer_than_code_is_invalid() {
        let format = QxbanFormat::with_marker("M".repeat(30));
        assert!(!format.is_valid("QX12BICVERT1XXXA1B2C3D4E5F6G7H8I9J", "BICVERT1"));
    }
}
