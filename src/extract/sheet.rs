//! Legacy Excel (.xls) text through BIFF records.
//!
//! Cell text is either stored once in the shared string table (SST) and
//! referenced by index, or inline in older label records. The SST is often
//! larger than one record can hold and spills into CONTINUE records, so it
//! is read through a [`ChunkCursor`] that treats all of them as one stream.

use crate::error::{RedactorError, RedactorResult};
use crate::text::{decode_chain, decode_utf16le, Candidate};

pub const WORKBOOK_STREAMS: [&str; 2] = ["Workbook", "Book"];

const SST: u16 = 0x00FC;
const CONTINUE: u16 = 0x003C;
const LABEL_SST: u16 = 0x00FD;
const LABEL: u16 = 0x0204;
const RSTRING: u16 = 0x00D6;
const CODEPAGE: u16 = 0x0042;

const FLAG_HIGH_BYTE: u8 = 0x01;
const FLAG_EXT: u8 = 0x04;
const FLAG_RICH: u8 = 0x08;

const CELL_HEADER_LEN: usize = 6;

/// A single BIFF record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiffRecord<'a> {
    pub opcode: u16,
    pub payload: &'a [u8],
}

/// Iterates the records of a workbook stream.
///
/// Stops at the end of the data or at a header that does not fit. A payload
/// cut short by the end of the data is yielded as far as it goes.
pub struct RecordIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> RecordIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = BiffRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.data.get(self.offset..self.offset + 4)?;
        let opcode = u16::from_le_bytes([header[0], header[1]]);
        let length = u16::from_le_bytes([header[2], header[3]]) as usize;

        let start = self.offset + 4;
        let end = (start + length).min(self.data.len());
        self.offset = start + length;
        Some(BiffRecord {
            opcode,
            payload: &self.data[start..end],
        })
    }
}

/// Sequential reader over an SST payload and its CONTINUE payloads.
pub struct ChunkCursor<'a> {
    chunks: Vec<&'a [u8]>,
    index: usize,
    pos: usize,
}

impl<'a> ChunkCursor<'a> {
    pub fn new(chunks: Vec<&'a [u8]>) -> Self {
        Self {
            chunks,
            index: 0,
            pos: 0,
        }
    }

    /// Bytes left across all remaining chunks.
    pub fn remaining(&self) -> usize {
        self.chunks
            .iter()
            .skip(self.index)
            .map(|c| c.len())
            .sum::<usize>()
            .saturating_sub(self.pos)
    }

    /// Reads exactly `n` bytes, crossing chunk boundaries as needed.
    pub fn read(&mut self, n: usize) -> RedactorResult<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            let chunk = self.chunks.get(self.index).ok_or_else(|| RedactorError::RangeOverflow {
                what: "shared string table".to_string(),
                offset: out.len(),
                length: n,
                available: out.len(),
            })?;
            let take = (n - out.len()).min(chunk.len() - self.pos);
            out.extend_from_slice(&chunk[self.pos..self.pos + take]);
            self.pos += take;
            if self.pos == chunk.len() {
                self.index += 1;
                self.pos = 0;
            }
        }
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> RedactorResult<()> {
        self.read(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> RedactorResult<u8> {
        Ok(self.read(1)?[0])
    }

    pub fn read_u16(&mut self) -> RedactorResult<u16> {
        let b = self.read(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> RedactorResult<u32> {
        let b = self.read(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Returns the code page declared by the first CODEPAGE record, if any.
pub fn declared_code_page(workbook: &[u8]) -> Option<u16> {
    RecordIter::new(workbook)
        .find(|r| r.opcode == CODEPAGE && r.payload.len() >= 2)
        .map(|r| u16::from_le_bytes([r.payload[0], r.payload[1]]))
}

/// Decode chain for 8-bit text in this workbook.
fn candidates_for(code_page: u16, default_code_page: u16) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(3);
    // 1200 marks the workbook as UTF-16, which says nothing about 8-bit runs
    if code_page != 1200 {
        out.push(Candidate::CodePage(code_page));
    }
    for fallback in [default_code_page, 1252] {
        if !out.contains(&Candidate::CodePage(fallback)) {
            out.push(Candidate::CodePage(fallback));
        }
    }
    out
}

/// Reads one string from the shared string table.
///
/// Layout: character count, flags, optional rich-run count, optional
/// extension size, characters, rich-run data, extension data.
pub fn read_sst_string(cursor: &mut ChunkCursor<'_>, candidates: &[Candidate]) -> RedactorResult<String> {
    let cch = cursor.read_u16()? as usize;
    let flags = cursor.read_u8()?;
    let runs = if flags & FLAG_RICH != 0 {
        cursor.read_u16()? as usize
    } else {
        0
    };
    let ext = if flags & FLAG_EXT != 0 {
        cursor.read_u32()? as usize
    } else {
        0
    };

    let text = if flags & FLAG_HIGH_BYTE != 0 {
        decode_utf16le(&cursor.read(cch * 2)?)
    } else {
        decode_chain(&cursor.read(cch)?, candidates)
    };

    cursor.skip(runs * 4)?;
    cursor.skip(ext)?;
    Ok(text)
}

/// Collects every string of the shared string table.
///
/// A string that cannot be read ends the table; strings read before it are kept.
pub fn shared_strings(workbook: &[u8], candidates: &[Candidate]) -> Vec<String> {
    let mut records = RecordIter::new(workbook).skip_while(|r| r.opcode != SST);
    let Some(sst) = records.next() else {
        return Vec::new();
    };
    if sst.payload.len() < 8 {
        tracing::warn!(size = sst.payload.len(), "SST record too short");
        return Vec::new();
    }

    let unique = u32::from_le_bytes([sst.payload[4], sst.payload[5], sst.payload[6], sst.payload[7]]);
    let mut chunks = vec![&sst.payload[8..]];
    chunks.extend(records.take_while(|r| r.opcode == CONTINUE).map(|r| r.payload));

    let mut cursor = ChunkCursor::new(chunks);
    let mut strings = Vec::new();
    for i in 0..unique {
        match read_sst_string(&mut cursor, candidates) {
            Ok(s) => strings.push(s),
            Err(e) => {
                tracing::warn!(index = i, declared = unique, error = %e, "SST ended early");
                break;
            }
        }
    }
    strings
}

/// Decodes the text of an inline LABEL or RSTRING cell.
fn inline_label(payload: &[u8], candidates: &[Candidate]) -> Option<String> {
    let body = payload.get(CELL_HEADER_LEN..)?;
    if body.len() < 2 {
        return None;
    }
    let cch = u16::from_le_bytes([body[0], body[1]]) as usize;
    let rest = &body[2..];

    // Newer layout carries a flags byte before the characters
    if let Some((&flags, chars)) = rest.split_first() {
        if flags & !FLAG_HIGH_BYTE == 0 {
            let width = if flags & FLAG_HIGH_BYTE != 0 { 2 } else { 1 };
            if let Some(raw) = chars.get(..cch * width) {
                return Some(if width == 2 {
                    decode_utf16le(raw)
                } else {
                    decode_chain(raw, candidates)
                });
            }
        }
    }

    // Older layout has the 8-bit characters straight after the count
    match rest.get(..cch) {
        Some(raw) => Some(decode_chain(raw, candidates)),
        None => Some(decode_chain(body, candidates)),
    }
}

/// Extracts the text of every string cell in record order.
pub fn extract_sheet(workbook: &[u8], default_code_page: u16) -> String {
    let code_page = declared_code_page(workbook).unwrap_or(default_code_page);
    let candidates = candidates_for(code_page, default_code_page);
    tracing::debug!(code_page, "workbook code page");

    let sst = shared_strings(workbook, &candidates);

    let mut values = Vec::new();
    for record in RecordIter::new(workbook) {
        let value = match record.opcode {
            LABEL_SST if record.payload.len() >= 10 => {
                let p = record.payload;
                let index = u32::from_le_bytes([p[6], p[7], p[8], p[9]]) as usize;
                let resolved = sst.get(index).cloned();
                if resolved.is_none() {
                    tracing::debug!(index, table = sst.len(), "label refers past the SST");
                }
                resolved
            }
            LABEL | RSTRING => inline_label(record.payload, &candidates),
            _ => None,
        };

        if let Some(v) = value {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                values.push(trimmed.to_string());
            }
        }
    }

    values.join("\n")
}
