//! Field sanitizer
//!
//! Every decoded cell goes through a fixed chain of rewrites before it is
//! interpreted. The order matters: later rules see the output of earlier ones.
//!
//! 1. drop zero-width spaces and byte-order marks
//! 2. drop everything outside printable ASCII (`0x20..=0x7E`)
//! 3. drop `\r\n` and rewrite the `\n";` artifact to `";`
//! 4. drop double quotes
//! 5. `,` becomes `.` (the source locale writes decimals with a comma)
//! 6. `;;` becomes `;0;` (an empty field between delimiters reads as zero)
//! 7. `;` becomes `,`

/// Delimiter of the uploaded files
pub const RAW_DELIMITER: char = ';';

/// What the raw delimiter is rewritten to inside a cell
pub const NORMALIZED_DELIMITER: char = ',';

const ZERO_WIDTH_SPACE: char = '\u{200B}';
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Clean one raw cell. Never fails; a cell with nothing usable becomes `""`.
pub fn sanitize_field(raw: &str) -> String {
    let printable: String = raw
        .chars()
        .filter(|c| *c != ZERO_WIDTH_SPACE && *c != BYTE_ORDER_MARK)
        .filter(|c| is_printable_ascii(*c))
        .collect();

    printable
        .replace("\r\n", "")
        .replace("\n\";", "\";")
        .replace('"', "")
        .replace(',', ".")
        .replace(";;", ";0;")
        .replace(RAW_DELIMITER, ",")
}

fn is_printable_ascii(c: char) -> bool {
    matches!(c, ' '..='~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clean_field_is_unchanged() {
        assert_eq!(sanitize_field("JKT-001 Sprinter_7"), "JKT-001 Sprinter_7");
        assert_eq!(sanitize_field("2023-05-01 10:00:00"), "2023-05-01 10:00:00");
    }

    #[test]
    fn test_strips_zero_width_and_bom() {
        assert_eq!(sanitize_field("\u{FEFF}100\u{200B}"), "100");
    }

    #[test]
    fn test_strips_non_ascii_and_control_chars() {
        assert_eq!(sanitize_field("Bandung\u{00E9}\t\r\n"), "Bandung");
        assert_eq!(sanitize_field("\u{7F}x"), "x");
        assert_eq!(sanitize_field("日本"), "");
    }

    #[test]
    fn test_removes_quotes() {
        assert_eq!(sanitize_field("\"PT \"Maju\" Jaya\""), "PT Maju Jaya");
    }

    #[test]
    fn test_decimal_comma_becomes_period() {
        assert_eq!(sanitize_field("1,5"), "1.5");
    }

    #[test]
    fn test_doubled_delimiter_becomes_zero_field() {
        assert_eq!(sanitize_field(";;"), ",0,");
        assert_eq!(sanitize_field("a;;b"), "a,0,b");
    }

    #[test]
    fn test_delimiter_becomes_comma() {
        assert_eq!(sanitize_field("Jl. Merdeka; No 5"), "Jl. Merdeka, No 5");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize_field(""), "");
    }

    proptest! {
        #[test]
        fn prop_output_is_printable_without_quotes_or_delimiters(raw in any::<String>()) {
            let out = sanitize_field(&raw);
            prop_assert!(out.chars().all(is_printable_ascii));
            prop_assert!(!out.contains('"'));
            prop_assert!(!out.contains(RAW_DELIMITER));
        }

        #[test]
        fn prop_clean_ascii_is_idempotent(raw in "[A-Za-z0-9 ._:/-]{0,40}") {
            prop_assert_eq!(sanitize_field(&raw), raw);
        }
    }
}
