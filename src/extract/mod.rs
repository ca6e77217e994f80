//! Text extraction from uploaded documents.
//!
//! [`extract_document`] sniffs the input and routes it:
//!
//! - `%PDF-` goes to the PDF engine, page by page
//! - an OLE2 compound file goes to the Word, Excel or PowerPoint extractor
//!   depending on which stream it holds
//! - anything else that is valid UTF-8 is taken as plain text
//!
//! Every path returns an [`ExtractedText`]. Office formats have no page
//! model, so they report a single page holding the whole text.

pub mod container;
pub mod pdf;
pub mod sheet;
pub mod slide;
pub mod word;

use crate::config::EngineConfig;
use crate::error::{RedactorError, RedactorResult};
use container::{is_ole, OleContainer, StreamContainer};
use serde::{Deserialize, Serialize};

const PDF_MAGIC: &[u8] = b"%PDF-";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text of one page. Numbering starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    #[serde(rename = "page")]
    pub page_number: u32,
    pub text: String,
}

/// Extraction output: the full text plus its per-page breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub full_text: String,
    pub pages: Vec<PageText>,
}

impl ExtractedText {
    pub fn single_page(text: String) -> Self {
        Self {
            full_text: text.clone(),
            pages: vec![PageText {
                page_number: 1,
                text,
            }],
        }
    }

    /// Joins pages with a visible separator naming each page.
    pub fn from_pages(pages: Vec<PageText>) -> Self {
        let joined: String = pages
            .iter()
            .map(|p| format!("{}{}", page_separator(p.page_number), p.text))
            .collect();
        Self {
            full_text: joined.trim_start().to_string(),
            pages,
        }
    }
}

/// Separator placed before the text of each page in `full_text`.
pub fn page_separator(page_number: u32) -> String {
    format!("\n\n===== [Page {}] =====\n", page_number)
}

/// What an upload turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    Spreadsheet,
    Presentation,
    PlainText,
}

impl DocumentKind {
    pub fn name(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Word => "doc",
            DocumentKind::Spreadsheet => "xls",
            DocumentKind::Presentation => "ppt",
            DocumentKind::PlainText => "text",
        }
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Identifies the document kind from its leading bytes and, for compound
/// files, from the streams it holds.
pub fn classify(bytes: &[u8]) -> RedactorResult<DocumentKind> {
    if is_pdf(bytes) {
        return Ok(DocumentKind::Pdf);
    }
    if is_ole(bytes) {
        let container = OleContainer::open(bytes)?;
        return classify_container(&container);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return Ok(DocumentKind::PlainText);
    }
    Err(RedactorError::UnsupportedFormat {
        reason: "input is neither PDF, an OLE2 Office file nor UTF-8 text".to_string(),
    })
}

fn classify_container(container: &dyn StreamContainer) -> RedactorResult<DocumentKind> {
    if container.exists(word::WORD_STREAM) {
        Ok(DocumentKind::Word)
    } else if sheet::WORKBOOK_STREAMS.iter().any(|s| container.exists(s)) {
        Ok(DocumentKind::Spreadsheet)
    } else if container.exists(slide::PRESENTATION_STREAM) {
        Ok(DocumentKind::Presentation)
    } else {
        Err(RedactorError::UnsupportedFormat {
            reason: "compound file holds no Word, Excel or PowerPoint stream".to_string(),
        })
    }
}

/// Extracts text from any supported upload.
pub fn extract_document(bytes: &[u8], config: &EngineConfig) -> RedactorResult<ExtractedText> {
    if bytes.is_empty() {
        return Err(RedactorError::InvalidInput {
            parameter: "file".to_string(),
            reason: "empty upload".to_string(),
        });
    }

    let kind = classify(bytes)?;
    tracing::info!(kind = kind.name(), bytes = bytes.len(), "extracting text");

    match kind {
        DocumentKind::Pdf => pdf::extract_pdf(bytes),
        DocumentKind::PlainText => {
            let text = std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes))
                .map_err(|e| RedactorError::UnsupportedFormat {
                    reason: e.to_string(),
                })?;
            Ok(ExtractedText::single_page(text.to_string()))
        }
        office => {
            let mut container = OleContainer::open(bytes)?;
            extract_office(&mut container, office, config)
        }
    }
}

/// Runs the Office extractor for `kind` against an opened container.
pub fn extract_office(
    container: &mut dyn StreamContainer,
    kind: DocumentKind,
    config: &EngineConfig,
) -> RedactorResult<ExtractedText> {
    let text = match kind {
        DocumentKind::Word => word::extract_word(container)?,
        DocumentKind::Spreadsheet => {
            let name = sheet::WORKBOOK_STREAMS
                .iter()
                .find(|s| container.exists(s))
                .ok_or_else(|| RedactorError::missing_stream("Workbook"))?;
            let workbook = container.read_stream(name)?;
            sheet::extract_sheet(&workbook, config.extraction.default_code_page)
        }
        DocumentKind::Presentation => {
            let stream = container.read_stream(slide::PRESENTATION_STREAM)?;
            slide::extract_slides(
                &stream,
                config.extraction.slide_strategy,
                config.extraction.default_code_page,
            )
        }
        other => {
            return Err(RedactorError::UnsupportedFormat {
                reason: format!("{} is not an Office binary", other.name()),
            })
        }
    };
    Ok(ExtractedText::single_page(text))
}
