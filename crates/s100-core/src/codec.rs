//! Byte codecs: hexadecimal text, CRC-32 checksums and file-name helpers.
//!
//! All hexadecimal output is uppercase. This matters for interchange: the
//! user permit CRC is computed over the ASCII bytes of the encrypted HW-ID,
//! so `ab01` and `AB01` produce different checksums.

use crate::error::Result;

/// Encode bytes as uppercase hexadecimal.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Decode hexadecimal text (either case).
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(text)?)
}

/// Decode hexadecimal text into a fixed-size array.
pub fn from_hex_array<const N: usize>(text: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text, &mut out)?;
    Ok(out)
}

/// Returns true if every character is a hexadecimal digit.
pub fn is_hex(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// CRC-32 (IEEE 802.3) of the given bytes.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// CRC-32 as uppercase hex without leading zeros.
pub fn crc32_string(data: &[u8]) -> String {
    format!("{:X}", crc32(data))
}

/// CRC-32 as an 8-character, zero-padded uppercase hex field.
pub fn crc32_field(data: &[u8]) -> String {
    format!("{:08X}", crc32(data))
}

/// The last path component of a file name, split on `/` or else `\`.
pub fn base_name(path: &str) -> &str {
    let idx = path.rfind('/').or_else(|| path.rfind('\\'));
    match idx {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// The base name cut at its first `.`, unless the dot is the first character.
///
/// `"a/bc/file.txt"` becomes `"file"`; `".profile"` stays `".profile"`.
pub fn file_name_without_suffix(path: &str) -> &str {
    let base = base_name(path);
    match base.find('.') {
        Some(p) if p > 0 => &base[..p],
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_is_uppercase() {
        assert_eq!(to_hex(&[0xab, 0x01, 0xff]), "AB01FF");
    }

    #[test]
    fn test_hex_decode_accepts_both_cases() {
        assert_eq!(from_hex("ab01FF").unwrap(), vec![0xab, 0x01, 0xff]);
    }

    #[test]
    fn test_hex_decode_rejects_odd_length() {
        assert!(from_hex("ABC").is_err());
        assert!(from_hex("ZZ").is_err());
    }

    #[test]
    fn test_hex_array_requires_exact_size() {
        let arr: [u8; 2] = from_hex_array("0102").unwrap();
        assert_eq!(arr, [1, 2]);
        assert!(from_hex_array::<2>("010203").is_err());
    }

    #[test]
    fn test_crc32_known_value() {
        // Standard check value for CRC-32/ISO-HDLC.
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
        assert_eq!(crc32_string(b"123456789"), "CBF43926");
    }

    #[test]
    fn test_crc32_worked_example() {
        assert_eq!(
            crc32_string(b"AD1DAD797C966EC9F6A55B66ED982815"),
            "99B3C7B1"
        );
    }

    #[test]
    fn test_crc32_field_is_padded() {
        // CRC of the empty input is zero.
        assert_eq!(crc32_string(b""), "0");
        assert_eq!(crc32_field(b""), "00000000");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("a/bc/file.txt"), "file.txt");
        assert_eq!(base_name(r"C:\data\101NO0001.000"), "101NO0001.000");
        assert_eq!(base_name("file.txt"), "file.txt");
    }

    #[test]
    fn test_file_name_without_suffix() {
        assert_eq!(file_name_without_suffix("a/bc/file.txt"), "file");
        assert_eq!(file_name_without_suffix("101NO12345678.000"), "101NO12345678");
        assert_eq!(file_name_without_suffix("archive.tar.gz"), "archive");
        assert_eq!(file_name_without_suffix(".hidden"), ".hidden");
        assert_eq!(file_name_without_suffix("noext"), "noext");
    }
}
