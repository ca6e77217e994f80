//! Legacy Word (.doc) text through the piece table.
//!
//! The document text lives in the `WordDocument` stream as a sequence of
//! runs. Where each run starts, how long it is and whether it is stored as
//! 8-bit or UTF-16 is recorded in the piece table, which sits inside the
//! CLX block of one of the two table streams.

use super::container::StreamContainer;
use crate::error::{RedactorError, RedactorResult};
use crate::text::{decode_chain, decode_utf16le, Candidate};

pub const WORD_STREAM: &str = "WordDocument";

const FIB_FLAGS_OFFSET: usize = 0x000A;
const WHICH_TABLE_FLAG: u16 = 0x0200;
const FC_CLX_OFFSET: usize = 0x01A2;
const LCB_CLX_OFFSET: usize = 0x01A6;

const CLX_PRC: u8 = 0x01;
const CLX_PCDT: u8 = 0x02;

const PIECE_DESCRIPTOR_SIZE: usize = 8;
const FC_COMPRESSED: u32 = 0x4000_0000;
const FC_OFFSET_MASK: u32 = 0x3FFF_FFFF;

/// One contiguous run of document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun {
    /// Byte offset into the main stream.
    pub start_offset: u32,
    /// Number of bytes the run occupies.
    pub byte_length: u32,
    /// One byte per character when true, two otherwise.
    pub compressed: bool,
}

/// Reads the document text from a container holding a Word binary.
pub fn extract_word(container: &mut dyn StreamContainer) -> RedactorResult<String> {
    let word = container.read_stream(WORD_STREAM)?;
    let flags = read_u16(&word, FIB_FLAGS_OFFSET, "FIB flags")?;
    let table_name = if flags & WHICH_TABLE_FLAG != 0 {
        "1Table"
    } else {
        "0Table"
    };
    tracing::debug!(table = table_name, "selected table stream");
    let table = container.read_stream(table_name)?;
    word_text(&word, &table)
}

/// Decodes the text given the main stream and the selected table stream.
pub fn word_text(word: &[u8], table: &[u8]) -> RedactorResult<String> {
    let fc_clx = read_u32(word, FC_CLX_OFFSET, "fcClx")? as usize;
    let lcb_clx = read_u32(word, LCB_CLX_OFFSET, "lcbClx")? as usize;

    let clx = slice(table, fc_clx, lcb_clx, "CLX")?;
    let plc = find_piece_table(clx)?;
    let runs = parse_piece_table(plc);
    tracing::debug!(runs = runs.len(), "parsed piece table");

    let mut text = String::new();
    for run in &runs {
        match decode_run(word, run) {
            Some(decoded) => text.push_str(&decoded),
            None => tracing::warn!(
                offset = run.start_offset,
                length = run.byte_length,
                available = word.len(),
                "skipping text run outside the main stream"
            ),
        }
    }

    Ok(clean_control_chars(&text))
}

/// Locates the piece-table payload inside a CLX block.
///
/// Formatting blocks (tag 1) are skipped by their 2-byte length. The first
/// tag-2 block yields a payload of its 4-byte declared length.
pub fn find_piece_table(clx: &[u8]) -> RedactorResult<&[u8]> {
    let mut i = 0;
    while i < clx.len() {
        match clx[i] {
            CLX_PRC => {
                let cb = read_u16(clx, i + 1, "Prc length")? as usize;
                i += 3 + cb;
            }
            CLX_PCDT => {
                let lcb = read_u32(clx, i + 1, "PlcPcd length")? as usize;
                return slice(clx, i + 5, lcb, "PlcPcd");
            }
            tag => {
                return Err(RedactorError::malformed(
                    "piece table",
                    format!("unrecognized CLX tag 0x{:02X} at offset {}", tag, i),
                ))
            }
        }
    }
    Err(RedactorError::malformed(
        "piece table",
        "CLX holds no piece table block",
    ))
}

/// Parses a piece table into text runs.
///
/// The table is `n + 1` character positions followed by `n` 8-byte
/// descriptors. A size that does not fit that shape yields no runs.
pub fn parse_piece_table(plc: &[u8]) -> Vec<TextRun> {
    if plc.len() < 4 || (plc.len() - 4) % (4 + PIECE_DESCRIPTOR_SIZE) != 0 {
        tracing::warn!(size = plc.len(), "piece table size does not fit any piece count");
        return Vec::new();
    }
    let count = (plc.len() - 4) / (4 + PIECE_DESCRIPTOR_SIZE);
    let descriptors = 4 * (count + 1);

    let cp = |k: usize| u32::from_le_bytes([plc[4 * k], plc[4 * k + 1], plc[4 * k + 2], plc[4 * k + 3]]);

    let mut runs = Vec::with_capacity(count);
    for k in 0..count {
        let (first, last) = (cp(k), cp(k + 1));
        if last < first {
            tracing::warn!(piece = k, "character positions go backwards, skipping piece");
            continue;
        }
        let chars = last - first;

        // Descriptor: 2 bytes of flags, 4 bytes of fc, 2 bytes of prm
        let at = descriptors + k * PIECE_DESCRIPTOR_SIZE + 2;
        let fc = u32::from_le_bytes([plc[at], plc[at + 1], plc[at + 2], plc[at + 3]]);
        let compressed = fc & FC_COMPRESSED != 0;

        runs.push(TextRun {
            start_offset: fc & FC_OFFSET_MASK,
            byte_length: if compressed { chars } else { chars.saturating_mul(2) },
            compressed,
        });
    }
    runs
}

fn decode_run(word: &[u8], run: &TextRun) -> Option<String> {
    let start = run.start_offset as usize;
    let end = start.checked_add(run.byte_length as usize)?;
    let bytes = word.get(start..end)?;
    Some(if run.compressed {
        decode_chain(bytes, &[Candidate::CodePage(1252)])
    } else {
        decode_utf16le(bytes)
    })
}

/// Maps Word's in-band control characters onto plain text.
fn clean_control_chars(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            // paragraph end, hard line break, page/section break
            '\r' | '\u{0B}' | '\u{0C}' => Some('\n'),
            // table cell end
            '\u{07}' => Some('\t'),
            '\u{1E}' => Some('-'),
            '\n' | '\t' => Some(c),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

fn slice<'a>(data: &'a [u8], offset: usize, length: usize, what: &str) -> RedactorResult<&'a [u8]> {
    offset
        .checked_add(length)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| RedactorError::RangeOverflow {
            what: what.to_string(),
            offset,
            length,
            available: data.len(),
        })
}

fn read_u16(data: &[u8], offset: usize, what: &str) -> RedactorResult<u16> {
    let b = slice(data, offset, 2, what)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(data: &[u8], offset: usize, what: &str) -> RedactorResult<u32> {
    let b = slice(data, offset, 4, what)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}
