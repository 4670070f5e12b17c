//! Line groups: blocks of verse anywhere in a document.

use crate::markup::{Document, L, LG, NodeId, Q};
use crate::pages::{PageMarker, marker_before};

use super::compose::compose;

/// A contiguous block of verse lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineGroup {
    /// Lines as transcribed, embedded newlines kept, citations excluded.
    pub text: String,
    /// Citation attached to the group.
    pub source: Option<String>,
    /// Declared language code, inherited from enclosing elements.
    pub language: Option<String>,
    /// Number of verse lines.
    pub line_count: usize,
    /// Page the group starts on.
    pub page: Option<PageMarker>,
    /// Whether the group sits inside a quotation.
    pub quoted: bool,
}

impl Document {
    /// Every line group in the document, in document order.
    ///
    /// Nested groups (stanzas inside a poem) are reported individually as
    /// well as part of their parent.
    pub fn line_groups(&self) -> Vec<LineGroup> {
        let markers = self.page_markers();
        self.arena()
            .elements_named(LG)
            .map(|id| self.line_group(&markers, id))
            .collect()
    }

    pub(crate) fn line_group(&self, markers: &[PageMarker], id: NodeId) -> LineGroup {
        let composed = compose(self, markers, id);
        let text = composed
            .chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<String>();

        LineGroup {
            text,
            source: composed.source,
            language: self.language(id),
            line_count: self.line_count(id),
            page: composed
                .leading_marker
                .or_else(|| marker_before(markers, id).cloned()),
            quoted: self.enclosing(id, Q).is_some(),
        }
    }

    /// Declared language of `id` or its nearest ancestor that declares one.
    pub(crate) fn language(&self, id: NodeId) -> Option<String> {
        let arena = self.arena();
        std::iter::once(id)
            .chain(arena.ancestors(id))
            .find_map(|node| arena.get_attr(node, "lang"))
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
    }

    fn line_count(&self, id: NodeId) -> usize {
        let arena = self.arena();
        let last = arena.last_descendant(id);
        (id.0 + 1..=last.0)
            .map(NodeId)
            .filter(|&node| arena.is_named(node, L))
            .count()
    }
}
