//! Page reconstruction.
//!
//! TCP markup does not nest page content inside page elements: an empty
//! `<PB/>` sits wherever a new physical page begins, possibly deep inside a
//! paragraph or a quotation. The [`Segmenter`] makes one pass over the tree
//! in document order, putting each piece of text into the bucket of the most
//! recent marker, then renders each bucket on demand.
//!
//! Rendering a page:
//! - main text is emitted in order;
//! - text inside a note is diverted to a notes section. The note's marker
//!   (declared label or `*, †, ‡, §` cycle) is inserted at the attachment
//!   point and prefixes the note text;
//! - gaps render their placeholder;
//! - notes follow the main text after a blank line;
//! - divider glyphs are removed.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use crate::markup::{Document, GAP, NOTE, NodeId, PB};
use crate::util::DIVIDER;

use super::marker::PageMarker;
use super::notes::render_note_marker;

/// Separator between a page's main text and its notes.
const NOTES_SEPARATOR: &str = "\n\n";

/// Configuration for page reconstruction.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Append notes at the foot of each page (default). When off, note text
    /// and inline markers are left out entirely.
    pub include_notes: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            include_notes: true,
        }
    }
}

/// Plain text of one physical page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedPage {
    pub marker: PageMarker,
    pub text: String,
}

impl ReconstructedPage {
    /// Printed page label, if any.
    pub fn label(&self) -> Option<&str> {
        self.marker.label()
    }
}

/// One run of page content in document order.
#[derive(Debug)]
struct Piece<'d> {
    text: Cow<'d, str>,
    /// Nearest enclosing note.
    note: Option<NodeId>,
    /// First piece of its note anywhere in the document.
    opens_note: bool,
}

/// Splits a document into physical pages.
#[derive(Debug)]
pub struct Segmenter<'d> {
    document: &'d Document,
    config: SegmentConfig,
    markers: Vec<PageMarker>,
    buckets: Vec<Vec<Piece<'d>>>,
}

impl<'d> Segmenter<'d> {
    /// Create a segmenter with default configuration.
    pub fn new(document: &'d Document) -> Self {
        Self::with_config(document, SegmentConfig::default())
    }

    /// Create a segmenter with the specified configuration.
    pub fn with_config(document: &'d Document, config: SegmentConfig) -> Self {
        let markers = document.page_markers();
        let mut walk = Walk {
            document,
            buckets: Vec::with_capacity(markers.len()),
            opened_notes: HashSet::new(),
        };
        walk.visit(NodeId::ROOT, None);

        log::debug!(
            "segmented {} pages ({} notes)",
            walk.buckets.len(),
            walk.opened_notes.len()
        );

        Self {
            document,
            config,
            markers,
            buckets: walk.buckets,
        }
    }

    /// Page markers, in document order.
    pub fn markers(&self) -> &[PageMarker] {
        &self.markers
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// True if the document has no page markers.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Plain text of the page that begins at `marker`.
    ///
    /// Returns an empty string for a marker that does not belong to this
    /// document.
    pub fn reconstruct_page(&self, marker: &PageMarker) -> String {
        let index = marker.seq.wrapping_sub(1);
        match (self.markers.get(index), self.buckets.get(index)) {
            (Some(own), Some(pieces)) if own.node == marker.node => self.render(pieces),
            _ => {
                log::warn!("page marker {} is not part of this document", marker.seq);
                String::new()
            }
        }
    }

    /// Every page, in order.
    pub fn pages(&self) -> impl Iterator<Item = ReconstructedPage> + '_ {
        self.markers
            .iter()
            .zip(&self.buckets)
            .map(|(marker, pieces)| ReconstructedPage {
                marker: marker.clone(),
                text: self.render(pieces),
            })
    }

    fn render(&self, pieces: &[Piece<'_>]) -> String {
        let arena = self.document.arena();

        let mut body = String::new();
        let mut notes: Vec<String> = Vec::new();
        let mut open_notes: HashMap<NodeId, usize> = HashMap::new();
        let mut note_index = 0;

        for piece in pieces {
            let Some(note) = piece.note else {
                body.push_str(&piece.text);
                continue;
            };
            if !self.config.include_notes {
                continue;
            }

            if let Some(&entry) = open_notes.get(&note) {
                notes[entry].push_str(&piece.text);
                continue;
            }

            let entry = if piece.opens_note {
                let marker = render_note_marker(arena.get_attr(note, "n"), note_index);
                note_index += 1;
                body.push_str(&marker);
                format!("{marker} {}", piece.text)
            } else {
                // Continuation of a note that began on an earlier page
                piece.text.to_string()
            };
            open_notes.insert(note, notes.len());
            notes.push(entry);
        }

        if !notes.is_empty() {
            body.push_str(NOTES_SEPARATOR);
            body.push_str(&notes.join("\n"));
        }

        body.retain(|c| c != DIVIDER);
        body
    }
}

impl Document {
    /// Reconstruct every page of the document.
    pub fn pages(&self) -> Vec<ReconstructedPage> {
        Segmenter::new(self).pages().collect()
    }
}

/// State for the bucketing pass.
struct Walk<'d> {
    document: &'d Document,
    buckets: Vec<Vec<Piece<'d>>>,
    opened_notes: HashSet<NodeId>,
}

impl<'d> Walk<'d> {
    fn visit(&mut self, id: NodeId, note: Option<NodeId>) {
        let document = self.document;
        let arena = document.arena();

        if let Some(text) = arena.text(id) {
            self.push(Cow::Borrowed(text), note);
            return;
        }

        match arena.element_name(id) {
            Some(PB) => self.buckets.push(Vec::new()),
            Some(GAP) => self.push(Cow::Owned(document.gap_display(id)), note),
            Some(NOTE) => {
                for child in arena.children(id) {
                    self.visit(child, Some(id));
                }
            }
            _ => {
                for child in arena.children(id) {
                    self.visit(child, note);
                }
            }
        }
    }

    fn push(&mut self, text: Cow<'d, str>, note: Option<NodeId>) {
        // Content before the first marker belongs to no page
        let Some(bucket) = self.buckets.last_mut() else {
            return;
        };
        let opens_note = note.is_some_and(|n| self.opened_notes.insert(n));
        bucket.push(Piece {
            text,
            note,
            opens_note,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(xml: &str) -> Vec<String> {
        let doc = Document::parse(xml).unwrap();
        doc.pages().into_iter().map(|p| p.text).collect()
    }

    #[test]
    fn test_basic_pages() {
        let result = pages("<TEXT><PB/><P>first page</P><PB/><P>second page</P></TEXT>");
        assert_eq!(result, vec!["first page", "second page"]);
    }

    #[test]
    fn test_text_before_first_marker_dropped() {
        let result = pages("<TEXT><P>front matter</P><PB/><P>page</P></TEXT>");
        assert_eq!(result, vec!["page"]);
    }

    #[test]
    fn test_marker_mid_paragraph() {
        let result = pages("<TEXT><PB/><P>the verse con<PB/>tinues here</P></TEXT>");
        assert_eq!(result, vec!["the verse con", "tinues here"]);
    }

    #[test]
    fn test_divider_removed() {
        let result = pages("<TEXT><PB/><P>Instituti∣ons of Poetry</P></TEXT>");
        assert_eq!(result, vec!["Institutions of Poetry"]);
    }

    #[test]
    fn test_divider_in_note_removed() {
        let result = pages("<TEXT><PB/><P>Text<NOTE>Com∣ment</NOTE></P></TEXT>");
        assert_eq!(result, vec!["Text*\n\n* Comment"]);
    }

    #[test]
    fn test_note_placement() {
        let result =
            pages("<TEXT><PB/><P>The verse<NOTE>Hor. de Arte Poet.</NOTE> continues.</P></TEXT>");
        assert_eq!(result, vec!["The verse* continues.\n\n* Hor. de Arte Poet."]);
    }

    #[test]
    fn test_note_labels_and_cycle() {
        let result = pages(
            r#"<TEXT><PB/><P>a<NOTE>one</NOTE> b<NOTE N="c">two</NOTE> d<NOTE>three</NOTE></P></TEXT>"#,
        );
        // The labelled note still consumes an index
        assert_eq!(result, vec!["a* bc d‡\n\n* one\nc two\n‡ three"]);
    }

    #[test]
    fn test_note_index_restarts_per_page() {
        let result = pages("<TEXT><PB/><P>a<NOTE>x</NOTE></P><PB/><P>b<NOTE>y</NOTE></P></TEXT>");
        assert_eq!(result, vec!["a*\n\n* x", "b*\n\n* y"]);
    }

    #[test]
    fn test_note_with_nested_markup() {
        let result = pages(
            "<TEXT><PB/><P>Verse<NOTE>See <HI>Ovid</HI>, <GAP DISP=\"•\"/>et.</NOTE> end</P></TEXT>",
        );
        assert_eq!(result, vec!["Verse* end\n\n* See Ovid, •et."]);
    }

    #[test]
    fn test_note_straddling_page_break() {
        let result = pages("<TEXT><PB/><P>a<NOTE>begins<PB/>ends</NOTE> b</P></TEXT>");
        assert_eq!(result, vec!["a*\n\n* begins", " b\n\nends"]);
    }

    #[test]
    fn test_gap_placeholder() {
        let result = pages(
            r#"<TEXT><PB/><L>graviter commotu<GAP DESC="illegible" DISP="•"/>, et alto</L></TEXT>"#,
        );
        assert_eq!(result, vec!["graviter commotu•, et alto"]);
    }

    #[test]
    fn test_exclude_notes() {
        let doc = Document::parse("<TEXT><PB/><P>Verse<NOTE>note</NOTE> end</P></TEXT>").unwrap();
        let segmenter = Segmenter::with_config(
            &doc,
            SegmentConfig {
                include_notes: false,
            },
        );
        let text: Vec<_> = segmenter.pages().map(|p| p.text).collect();
        assert_eq!(text, vec!["Verse end"]);
    }

    #[test]
    fn test_no_markers_no_pages() {
        let doc = Document::parse("<TEXT><P>no pages here</P></TEXT>").unwrap();
        let segmenter = Segmenter::new(&doc);
        assert!(segmenter.is_empty());
        assert_eq!(segmenter.pages().count(), 0);
    }

    #[test]
    fn test_reconstruct_page_idempotent() {
        let doc = Document::parse(
            "<TEXT><PB/><P>one<NOTE>n</NOTE></P><PB/><P>two<NOTE>m</NOTE></P></TEXT>",
        )
        .unwrap();
        let segmenter = Segmenter::new(&doc);
        for marker in segmenter.markers() {
            let first = segmenter.reconstruct_page(marker);
            let second = segmenter.reconstruct_page(marker);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_foreign_marker() {
        let doc = Document::parse("<TEXT><PB/><P>one</P></TEXT>").unwrap();
        let other = Document::parse("<TEXT><P>x</P><P>y</P><PB/><P>two</P></TEXT>").unwrap();
        let segmenter = Segmenter::new(&doc);
        let foreign = &other.page_markers()[0];
        assert_eq!(segmenter.reconstruct_page(foreign), "");
    }
}
