//! Decoding of legacy 8-bit and UTF-16 text.
//!
//! Legacy Office streams rarely say reliably which code page their 8-bit
//! text uses. Callers describe an ordered list of [`Candidate`] encodings;
//! the first candidate that decodes strictly to non-empty text wins, and
//! Latin-1 (which accepts every byte) is the terminal fallback.

use crate::error::{RedactorError, RedactorResult};
use encoding_rs::Encoding;

/// One entry of a decode chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// A Windows code page number such as 949 or 1252.
    CodePage(u16),
    Utf8,
}

/// Maps a Windows code page number to an encoding.
pub fn encoding_for_code_page(code_page: u16) -> Option<&'static Encoding> {
    let encoding = match code_page {
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1200 => encoding_rs::UTF_16LE,
        1201 => encoding_rs::UTF_16BE,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        // 367 (US-ASCII) is a subset of 1252
        367 | 1252 => encoding_rs::WINDOWS_1252,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        10000 => encoding_rs::MACINTOSH,
        65001 => encoding_rs::UTF_8,
        _ => return None,
    };
    Some(encoding)
}

fn decode_strict(data: &[u8], candidate: Candidate) -> Option<String> {
    let encoding = match candidate {
        Candidate::CodePage(cp) => encoding_for_code_page(cp)?,
        Candidate::Utf8 => encoding_rs::UTF_8,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(data)
        .map(|text| text.into_owned())
}

/// Tries each candidate in order without replacement characters.
///
/// Returns the first non-empty decode, an empty string for empty input, and
/// [`RedactorError::DecodeFailure`] when every candidate rejects the bytes.
pub fn decode_strict_chain(data: &[u8], candidates: &[Candidate]) -> RedactorResult<String> {
    if data.is_empty() {
        return Ok(String::new());
    }
    candidates
        .iter()
        .filter_map(|candidate| decode_strict(data, *candidate))
        .find(|text| !text.is_empty())
        .ok_or_else(|| RedactorError::DecodeFailure {
            context: format!("{} bytes with {:?}", data.len(), candidates),
        })
}

/// Like [`decode_strict_chain`] but falls back to Latin-1 instead of failing.
pub fn decode_chain(data: &[u8], candidates: &[Candidate]) -> String {
    decode_strict_chain(data, candidates).unwrap_or_else(|_| latin1(data))
}

/// Decodes every byte as the code point of the same value.
pub fn latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

/// Decodes little-endian UTF-16, replacing unpaired surrogates. A trailing
/// odd byte is ignored.
pub fn decode_utf16le(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
