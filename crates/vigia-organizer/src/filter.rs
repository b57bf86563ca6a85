//! Invoice detection for incoming XML documents.
//!
//! The Ingestion API only accepts invoices; credit and debit notes deposited
//! in the same folder must be parked in the `ignored` bucket instead of being
//! uploaded. Classification is a tag sniff, not schema validation.

use std::fs;
use std::path::Path;

use crate::error::{OrganizerError, OrganizerResult};

/// Classification of an XML document found in the watch folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// An invoice document eligible for upload.
    Invoice,
    /// A credit or debit note, excluded from upload.
    CreditOrDebitNote,
    /// Neither an invoice nor a recognised note.
    Other,
}

impl DocumentKind {
    /// Whether this document should be submitted to the Ingestion API.
    #[must_use]
    pub const fn is_uploadable(self) -> bool {
        matches!(self, Self::Invoice)
    }
}

/// Classify an XML document by sniffing its root element tags.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn classify_document(path: &Path) -> OrganizerResult<DocumentKind> {
    let content =
        fs::read_to_string(path).map_err(|source| OrganizerError::io("classify", path, source))?;
    Ok(classify_content(&content))
}

fn classify_content(content: &str) -> DocumentKind {
    let lowered = content.to_lowercase();
    if contains_tag(&lowered, "notacredito") || contains_tag(&lowered, "notadebito") {
        return DocumentKind::CreditOrDebitNote;
    }
    if contains_tag(&lowered, "factura") {
        return DocumentKind::Invoice;
    }
    DocumentKind::Other
}

/// Match `<tag` followed by a non-identifier character, so `<factura>` and
/// `<factura id="...">` count while `<facturacion>` does not.
fn contains_tag(lowered: &str, tag: &str) -> bool {
    let needle = format!("<{tag}");
    let mut search_from = 0;
    while let Some(offset) = lowered[search_from..].find(&needle) {
        let end = search_from + offset + needle.len();
        match lowered.as_bytes().get(end) {
            Some(next) if next.is_ascii_alphanumeric() => {
                search_from = end;
            }
            _ => return true,
        }
    }
    false
}
