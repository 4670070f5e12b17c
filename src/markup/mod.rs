//! Parsed TCP markup.
//!
//! A [`Document`] is the immutable tree for one work's transcription. Element
//! names are matched case-insensitively on their local part, so EEBO-TCP P4
//! files (`<PB/>`, `<NOTE>`, `<GAP DISP="•"/>`) and TEI P5 files (`<pb/>`,
//! `<note>`, `<gap>`) are handled by the same code.

mod arena;
mod parser;

pub use arena::{Arena, Attribute, Node, NodeData, NodeId};

use crate::error::Result;
use crate::util::{decode_text, declared_encoding};

/// Page-begin marker.
pub(crate) const PB: &str = "pb";
/// Footnote or marginal note.
pub(crate) const NOTE: &str = "note";
/// Editorial gap.
pub(crate) const GAP: &str = "gap";
/// Gap description child (P5).
pub(crate) const DESC: &str = "desc";
/// Quotation block.
pub(crate) const Q: &str = "q";
/// Line group.
pub(crate) const LG: &str = "lg";
/// Verse line.
pub(crate) const L: &str = "l";
/// Bibliographic citation.
pub(crate) const BIBL: &str = "bibl";

/// Placeholder for a gap that declares no display text.
pub(crate) const DEFAULT_GAP_DISPLAY: &str = "\u{2022}";

/// A parsed TCP document.
#[derive(Debug)]
pub struct Document {
    arena: Arena,
}

impl Document {
    /// Parse a document from XML text.
    pub fn parse(xml: &str) -> Result<Self> {
        let arena = parser::parse_document(xml)?;
        log::debug!("parsed TCP document with {} nodes", arena.len());
        Ok(Self { arena })
    }

    /// Parse a document from raw bytes.
    ///
    /// A UTF-8 BOM is stripped; bytes that are not valid UTF-8 are decoded
    /// with the encoding named in the XML declaration, or Windows-1252.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = strip_bom(bytes);
        let text = decode_text(bytes, declared_encoding(bytes));
        Self::parse(&text)
    }

    /// The underlying node arena.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Number of page-begin markers.
    pub fn page_count(&self) -> usize {
        self.arena.elements_named(PB).count()
    }

    /// Display text for a gap element.
    ///
    /// P4 gaps carry a `DISP` attribute; P5 gaps hold a `desc` child.
    pub(crate) fn gap_display(&self, gap: NodeId) -> String {
        if let Some(disp) = self.arena.get_attr(gap, "disp") {
            return disp.to_string();
        }
        self.arena
            .children(gap)
            .find(|&child| self.arena.is_named(child, DESC))
            .map(|desc| self.arena.collect_text(desc))
            .unwrap_or_else(|| DEFAULT_GAP_DISPLAY.to_string())
    }

    /// Text under `id` with gaps rendered by their placeholders.
    pub(crate) fn rendered_text(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.rendered_text_recursive(id, &mut result);
        result
    }

    fn rendered_text_recursive(&self, id: NodeId, result: &mut String) {
        if let Some(text) = self.arena.text(id) {
            result.push_str(text);
        } else if self.arena.is_named(id, GAP) {
            result.push_str(&self.gap_display(id));
        } else {
            for child in self.arena.children(id) {
                self.rendered_text_recursive(child, result);
            }
        }
    }

    /// Nearest enclosing element with the given name.
    pub(crate) fn enclosing(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.arena
            .ancestors(id)
            .find(|&ancestor| self.arena.is_named(ancestor, name))
    }
}

/// Strip UTF-8 BOM if present.
fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        let with_bom = &[0xEF, 0xBB, 0xBF, b'h', b'i'];
        assert_eq!(strip_bom(with_bom), b"hi");
        assert_eq!(strip_bom(b"hello"), b"hello");
        assert_eq!(strip_bom(&[]), &[]);
    }

    #[test]
    fn test_from_bytes_latin1() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><P>caf\xe9</P>";
        let doc = Document::from_bytes(bytes).unwrap();
        let p = doc.arena().elements_named("p").next().unwrap();
        assert_eq!(doc.arena().collect_text(p), "café");
    }

    #[test]
    fn test_from_bytes_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<P>ſo</P>".as_bytes());
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.arena().len(), 3);
    }

    #[test]
    fn test_gap_display() {
        let doc = Document::parse(
            r#"<TEXT><GAP DISP="〈 in non-Latin alphabet 〉"/><gap reason="illegible"><desc>••</desc></gap><GAP/></TEXT>"#,
        )
        .unwrap();
        let gaps: Vec<_> = doc.arena().elements_named(GAP).collect();
        assert_eq!(doc.gap_display(gaps[0]), "〈 in non-Latin alphabet 〉");
        assert_eq!(doc.gap_display(gaps[1]), "••");
        assert_eq!(doc.gap_display(gaps[2]), "•");
    }

    #[test]
    fn test_page_count() {
        let doc = Document::parse("<TEXT><PB/>one<PB/>two<PB/></TEXT>").unwrap();
        assert_eq!(doc.page_count(), 3);

        let doc = Document::parse("<TEXT>no pages</TEXT>").unwrap();
        assert_eq!(doc.page_count(), 0);
    }
}
