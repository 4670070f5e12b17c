//! Text composition for quotations and line groups.

use crate::markup::{BIBL, Document, GAP, NOTE, NodeId, PB};
use crate::pages::{PageMarker, marker_before};
use crate::util::{DIVIDER, has_content, strip_divider};

/// Text of a quotation on one physical page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Chunk {
    /// Text as transcribed, gaps rendered by their placeholders.
    pub text: String,
    /// The same text with gap placeholders left out.
    pub plain: String,
}

impl Chunk {
    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.plain.push_str(text);
    }

    fn clear(&mut self) {
        self.text.clear();
        self.plain.clear();
    }

    /// True if anything besides gaps, punctuation and whitespace remains.
    pub fn has_content(&self) -> bool {
        has_content(&self.plain)
    }
}

/// Result of composing the text under an element.
#[derive(Debug, Default)]
pub(crate) struct Composed {
    /// One chunk per page touched; split at every marker inside the element.
    pub chunks: Vec<Chunk>,
    /// Markers found inside the element after its first content, in order.
    pub markers: Vec<PageMarker>,
    /// Last marker met before any content. The element's text starts on
    /// this page rather than on the one before the element.
    pub leading_marker: Option<PageMarker>,
    /// Citation text, whitespace collapsed.
    pub source: Option<String>,
}

/// Compose the text under `id`.
///
/// Citations are captured separately and notes are skipped; neither is part
/// of the quoted text. Divider glyphs are removed.
pub(crate) fn compose(document: &Document, markers: &[PageMarker], id: NodeId) -> Composed {
    let mut composer = Composer {
        document,
        markers,
        composed: Composed {
            chunks: vec![Chunk::default()],
            ..Composed::default()
        },
    };
    for child in document.arena().children(id) {
        composer.visit(child);
    }

    let mut composed = composer.composed;
    for chunk in &mut composed.chunks {
        chunk.text.retain(|c| c != DIVIDER);
        chunk.plain.retain(|c| c != DIVIDER);
    }
    composed
}

struct Composer<'a> {
    document: &'a Document,
    markers: &'a [PageMarker],
    composed: Composed,
}

impl Composer<'_> {
    fn current(&mut self) -> &mut Chunk {
        // compose() seeds one chunk and chunks are only ever added
        let last = self.composed.chunks.len() - 1;
        &mut self.composed.chunks[last]
    }

    fn visit(&mut self, id: NodeId) {
        let document = self.document;
        let arena = document.arena();

        if let Some(text) = arena.text(id) {
            self.current().push_text(text);
            return;
        }

        match arena.element_name(id) {
            Some(PB) => {
                let marker = marker_before(self.markers, id).cloned();
                if self.composed.markers.is_empty() && self.current().text.trim().is_empty() {
                    // Only whitespace so far, which belongs to the previous page
                    self.current().clear();
                    self.composed.leading_marker = marker;
                } else {
                    self.composed.markers.extend(marker);
                    self.composed.chunks.push(Chunk::default());
                }
            }
            Some(GAP) => {
                let display = document.gap_display(id);
                self.current().text.push_str(&display);
            }
            Some(BIBL) => {
                let citation = collapse_whitespace(&document.rendered_text(id));
                if !citation.is_empty() {
                    match &mut self.composed.source {
                        Some(existing) => {
                            existing.push(' ');
                            existing.push_str(&citation);
                        }
                        None => self.composed.source = Some(citation),
                    }
                }
            }
            Some(NOTE) => {}
            _ => {
                for child in arena.children(id) {
                    self.visit(child);
                }
            }
        }
    }
}

/// Collapse whitespace runs to single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    strip_divider(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
