//! Standard number and producer code extraction from data-set file names.
//!
//! Two naming conventions are recognized on the base name:
//!
//! - `DDDPPPP...`: three-digit standard number then a four-character producer
//!   code, right-padded with `0` (e.g. `101NO000...`).
//! - `SDDDPP...`: `S`, three-digit standard number, two-character producer code.

use lazy_static::lazy_static;
use regex::Regex;

use crate::codec;

lazy_static! {
    static ref NUMERIC_PREFIX: Regex = Regex::new(r"^([0-9]{3})([A-Z0-9]{4})").unwrap();
    static ref S_PREFIX: Regex = Regex::new(r"^S([0-9]{3})([A-Z0-9]{2})").unwrap();
}

/// Shortest base name either convention can produce.
const MIN_BASE_NAME_LEN: usize = 5;

/// Suffix-stripped length of the old S-101 test data set names.
const LEGACY_NAME_LEN: usize = 10;

fn recognizable_base_name(file_name: &str) -> Option<&str> {
    let base = codec::base_name(file_name);
    (base.chars().count() >= MIN_BASE_NAME_LEN).then_some(base)
}

/// The standard number a data-set file belongs to, if it can be told.
///
/// Falls back to [`legacy_standard_number`] when neither naming convention
/// matches.
pub fn standard_number(file_name: &str) -> Option<u16> {
    let base = recognizable_base_name(file_name)?;

    let caps = NUMERIC_PREFIX
        .captures(base)
        .or_else(|| S_PREFIX.captures(base));
    if let Some(caps) = caps {
        return caps[1].parse().ok();
    }

    legacy_standard_number(base)
}

/// Early S-101 test data used ten-character names with no standard number.
///
/// This is a heuristic for that data only. It answers `Some(101)` for any
/// name whose suffix-stripped base is exactly ten characters long.
pub fn legacy_standard_number(file_name: &str) -> Option<u16> {
    let stem = codec::file_name_without_suffix(file_name);
    (stem.chars().count() == LEGACY_NAME_LEN).then_some(101)
}

/// The producer code encoded in a data-set file name.
///
/// For the numeric convention the padding zeros are stripped. When no
/// convention matches, the first two characters of the base name are used.
pub fn producer_code(file_name: &str) -> Option<String> {
    let base = recognizable_base_name(file_name)?;

    if let Some(caps) = NUMERIC_PREFIX.captures(base) {
        return Some(caps[2].trim_end_matches('0').to_string());
    }
    if let Some(caps) = S_PREFIX.captures(base) {
        return Some(caps[2].to_string());
    }

    Some(base.chars().take(2).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_convention() {
        assert_eq!(standard_number("101NO00012345.000"), Some(101));
        assert_eq!(producer_code("101NO00012345.000"), Some("NO".into()));
        assert_eq!(standard_number("/data/s102/102CA001ABC.h5"), Some(102));
        assert_eq!(producer_code("/data/s102/102CA001ABC.h5"), Some("CA".into()));
    }

    #[test]
    fn test_producer_code_strips_padding_zeros_only_at_end() {
        assert_eq!(producer_code("1110A00XYZ.h5"), Some("0A".into()));
        assert_eq!(producer_code("111AB00.h5"), Some("AB".into()));
    }

    #[test]
    fn test_s_convention() {
        assert_eq!(standard_number("S104NOabc.h5"), Some(104));
        assert_eq!(producer_code("S104NOabc.h5"), Some("NO".into()));
    }

    #[test]
    fn test_short_names_are_unrecognized() {
        assert_eq!(standard_number("abcd"), None);
        assert_eq!(producer_code("dir/abcd"), None);
    }

    #[test]
    fn test_legacy_fallback() {
        assert_eq!(standard_number("NO4ABCDEFG.000"), Some(101));
        assert_eq!(legacy_standard_number("NO4ABCDEFG"), Some(101));
        assert_eq!(legacy_standard_number("NO4ABCDEF.000"), None);
        assert_eq!(standard_number("nothing-to-see.txt"), None);
    }

    #[test]
    fn test_fallback_producer_code() {
        assert_eq!(producer_code("xyzzy.dat"), Some("xy".into()));
    }

    #[test]
    fn test_lowercase_does_not_match_conventions() {
        // Producer codes are upper case; the numeric prefix alone is not enough.
        assert_eq!(standard_number("101no00.000"), None);
    }
}
