//! Test fixtures and document builders.
//!
//! Provides builders for test PDFs with specific content and for the
//! compound files behind legacy .doc, .xls and .ppt uploads.

use anyhow::Result;
use printpdf::*;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// Builder for creating test PDFs with custom content.
///
/// Each line is placed separately so that it lands on its own text line
/// when the PDF is read back. The built-in Helvetica font only covers
/// Latin text, so fixtures use ASCII labels.
///
/// # Example
///
/// ```no_run
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let pdf = TestPdfBuilder::new()
///     .with_title("Customer Record")
///     .with_line("Email: kim@example.com")
///     .new_page()
///     .with_line("Mobile: 010-1234-5678")
///     .build_bytes()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    /// Creates a new test PDF builder with one empty A4 page.
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: vec![Vec::new()],
            page_width: Mm(210.0),
            page_height: Mm(297.0),
        }
    }

    /// Sets the document title, which is also printed as the first line.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Adds a line of text to the current page.
    pub fn with_line(mut self, line: &str) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(line.to_string());
        }
        self
    }

    /// Starts a new page; following lines go there.
    pub fn new_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Renders the PDF in memory.
    pub fn build_bytes(self) -> Result<Vec<u8>> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        for (index, lines) in self.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(self.page_width, self.page_height, "Layer 1");
                doc.get_page(page).get_layer(layer)
            };

            let mut y = 270.0;
            if index == 0 {
                layer.use_text(self.title.as_str(), 14.0, Mm(20.0), Mm(y), &font);
                y -= 12.0;
            }
            for line in lines {
                layer.use_text(line.as_str(), 12.0, Mm(20.0), Mm(y), &font);
                y -= 10.0;
            }
        }

        Ok(doc.save_to_bytes()?)
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let bytes = self.build_bytes()?;
        std::fs::write(output_path, bytes)?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A customer record with one item of every rule the PDF locator handles well.
pub fn create_customer_record(path: &Path) -> Result<PathBuf> {
    TestPdfBuilder::new()
        .with_title("Customer Record")
        .with_line("Name: Kim Minsu")
        .with_line("Email: kim@example.com")
        .with_line("Mobile: 010-1234-5678")
        .with_line("Office: 02-123-4567")
        .with_line("Card: 4111 1111 1111 1111")
        .with_line("Memo: renewal due next month")
        .build(path)
}

/// Packs named streams into an OLE2 compound file.
pub fn ole_file(streams: &[(&str, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new()))?;
    for (name, data) in streams {
        let mut stream = comp.create_stream(format!("/{}", name))?;
        stream.write_all(data)?;
    }
    comp.flush()?;
    Ok(comp.into_inner().into_inner())
}

const WORD_TEXT_OFFSET: u32 = 0x200;

/// Builds `WordDocument` and `1Table` streams holding `text` as one piece.
///
/// Compressed pieces store one byte per character (Windows-1252), the
/// others UTF-16LE.
pub fn word_streams(text: &str, compressed: bool) -> (Vec<u8>, Vec<u8>) {
    let (body, chars, fc) = if compressed {
        let body: Vec<u8> = text.chars().map(|c| c as u8).collect();
        let chars = body.len() as u32;
        (body, chars, 0x4000_0000 | WORD_TEXT_OFFSET)
    } else {
        let body: Vec<u8> = utf16le(text);
        let chars = text.encode_utf16().count() as u32;
        (body, chars, WORD_TEXT_OFFSET)
    };

    let mut plc = Vec::new();
    plc.extend_from_slice(&0u32.to_le_bytes());
    plc.extend_from_slice(&chars.to_le_bytes());
    plc.extend_from_slice(&[0, 0]);
    plc.extend_from_slice(&fc.to_le_bytes());
    plc.extend_from_slice(&[0, 0]);

    let mut table = vec![0x01, 0x01, 0x00, 0xFF];
    table.push(0x02);
    table.extend_from_slice(&(plc.len() as u32).to_le_bytes());
    table.extend_from_slice(&plc);

    let mut word = vec![0u8; WORD_TEXT_OFFSET as usize];
    word[0x0A..0x0C].copy_from_slice(&0x0200u16.to_le_bytes());
    word[0x1A2..0x1A6].copy_from_slice(&0u32.to_le_bytes());
    word[0x1A6..0x1AA].copy_from_slice(&(table.len() as u32).to_le_bytes());
    word.extend_from_slice(&body);

    (word, table)
}

/// A .doc file whose text is `text`.
pub fn word_file(text: &str) -> Result<Vec<u8>> {
    let (word, table) = word_streams(text, false);
    ole_file(&[("WordDocument", word), ("1Table", table)])
}

fn biff_record(opcode: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&opcode.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// A BIFF8 workbook stream with one LABELSST cell per shared string.
pub fn workbook_stream(strings: &[&str]) -> Vec<u8> {
    let mut book = biff_record(0x0809, &[0x00, 0x06, 0x05, 0x00]);
    book.extend(biff_record(0x0042, &949u16.to_le_bytes()));

    let count = strings.len() as u32;
    let mut sst = Vec::new();
    sst.extend_from_slice(&count.to_le_bytes());
    sst.extend_from_slice(&count.to_le_bytes());
    for s in strings {
        sst.extend_from_slice(&(s.encode_utf16().count() as u16).to_le_bytes());
        sst.push(0x01);
        sst.extend(utf16le(s));
    }
    book.extend(biff_record(0x00FC, &sst));

    for (row, _) in strings.iter().enumerate() {
        let mut cell = Vec::new();
        cell.extend_from_slice(&(row as u16).to_le_bytes());
        cell.extend_from_slice(&0u16.to_le_bytes());
        cell.extend_from_slice(&0x0Fu16.to_le_bytes());
        cell.extend_from_slice(&(row as u32).to_le_bytes());
        book.extend(biff_record(0x00FD, &cell));
    }
    book.extend(biff_record(0x000A, &[]));
    book
}

/// A .xls file whose cells hold `strings`, one per row.
pub fn workbook_file(strings: &[&str]) -> Result<Vec<u8>> {
    ole_file(&[("Workbook", workbook_stream(strings))])
}

/// A PowerPoint document stream with one TextCharsAtom per entry.
pub fn presentation_stream(texts: &[&str]) -> Vec<u8> {
    let mut stream = Vec::new();
    for text in texts {
        let payload = utf16le(text);
        stream.extend_from_slice(&[0x00, 0x00]);
        stream.extend_from_slice(&4000u16.to_le_bytes());
        stream.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        stream.extend(payload);
    }
    stream
}

/// A .ppt file whose slides hold `texts`.
pub fn presentation_file(texts: &[&str]) -> Result<Vec<u8>> {
    ole_file(&[("PowerPoint Document", presentation_stream(texts))])
}

pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let builder = TestPdfBuilder::new()
            .with_title("Test")
            .with_line("a")
            .new_page()
            .with_line("b");

        assert_eq!(builder.title, "Test");
        assert_eq!(builder.pages.len(), 2);
        assert_eq!(builder.pages[1], vec!["b".to_string()]);
    }

    #[test]
    fn test_ole_file_has_magic() -> Result<()> {
        let bytes = ole_file(&[("Workbook", vec![1, 2, 3])])?;
        assert!(docredact::extract::container::is_ole(&bytes));
        Ok(())
    }
}
