//! Quoted poems.
//!
//! A quotation (`<Q>`) is verse quoted inside prose. Because pages are
//! marked by empty `<PB/>` elements, a quotation may straddle one or more
//! page breaks; its text is therefore kept as one chunk per page so each
//! chunk can be aligned against the text of its own page.
//!
//! # Example
//!
//! ```
//! use ppa_excerpt::Document;
//!
//! let doc = Document::parse(
//!     r#"<TEXT><PB N="12"/><P>Thus Virgil:</P>
//! <Q><L>Arma virumque cano,</L><PB N="13"/><L>Troiae qui primus ab oris</L>
//! <BIBL>Aen. 1.</BIBL></Q></TEXT>"#,
//! )?;
//!
//! let poem = &doc.quoted_poems()[0];
//! assert_eq!(poem.source.as_deref(), Some("Aen. 1."));
//! let chunks: Vec<_> = poem.text_by_page(true).map(str::trim).collect();
//! assert_eq!(chunks, ["Arma virumque cano,", "Troiae qui primus ab oris"]);
//! # Ok::<(), ppa_excerpt::Error>(())
//! ```

mod compose;
mod linegroup;

pub use linegroup::LineGroup;

use crate::markup::{Document, LG, NodeId, Q};
use crate::pages::{PageMarker, marker_before};

use compose::{Chunk, compose};

/// A quotation block and its text, page by page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedPoem {
    /// Nearest marker at or before the quotation's first content. `None` when
    /// the quotation precedes every marker.
    pub start_page: Option<PageMarker>,
    /// Markers inside the quotation, one per page break it crosses.
    pub continue_pages: Vec<PageMarker>,
    /// Citation attached to the quotation, e.g. "Richard II. act 5. sc. 1.".
    pub source: Option<String>,
    /// Declared language code, inherited from enclosing elements.
    pub language: Option<String>,
    /// Outermost line groups inside the quotation.
    pub line_groups: Vec<LineGroup>,
    /// Whether the quotation sits inside another quotation, whose text
    /// already includes it.
    pub nested: bool,
    chunks: Vec<Chunk>,
}

impl QuotedPoem {
    /// First page the quotation continues onto, if it crosses a page break.
    pub fn continue_page(&self) -> Option<&PageMarker> {
        self.continue_pages.first()
    }

    /// Number of pages the quotation touches.
    pub fn page_count(&self) -> usize {
        self.chunks.len()
    }

    /// Page of each chunk, in order.
    pub fn pages(&self) -> impl Iterator<Item = Option<&PageMarker>> + '_ {
        std::iter::once(self.start_page.as_ref()).chain(self.continue_pages.iter().map(Some))
    }

    /// Full quoted text, citation excluded.
    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    /// Quoted text split at page breaks, one chunk per page touched.
    ///
    /// Whitespace is kept as transcribed. Gaps appear as their placeholder
    /// text. With `include_large_gaps` off, a chunk holding nothing but gap
    /// placeholders, punctuation and whitespace is returned as `""`.
    ///
    /// Each call starts a new pass over the same chunks.
    pub fn text_by_page(&self, include_large_gaps: bool) -> impl Iterator<Item = &str> + '_ {
        self.chunks.iter().map(move |chunk| {
            if include_large_gaps || chunk.has_content() {
                chunk.text.as_str()
            } else {
                ""
            }
        })
    }

    /// Chunks paired with the page each one is on.
    pub fn page_chunks(
        &self,
        include_large_gaps: bool,
    ) -> impl Iterator<Item = (Option<&PageMarker>, &str)> + '_ {
        self.pages().zip(self.text_by_page(include_large_gaps))
    }

    /// True if the quotation has any text beyond gaps, punctuation and
    /// whitespace.
    pub fn has_text(&self) -> bool {
        self.chunks.iter().any(Chunk::has_content)
    }
}

/// Every quotation in `document`, in document order.
pub fn find_quoted_poems(document: &Document) -> Vec<QuotedPoem> {
    document.quoted_poems()
}

impl Document {
    /// Every quotation, in document order.
    ///
    /// A quotation nested inside another is reported too, with
    /// [`QuotedPoem::nested`] set; its text is also part of its parent's.
    pub fn quoted_poems(&self) -> Vec<QuotedPoem> {
        let markers = self.page_markers();
        let poems: Vec<_> = self
            .arena()
            .elements_named(Q)
            .map(|id| self.quoted_poem(&markers, id))
            .collect();

        log::debug!(
            "found {} quotations ({} nested, {} crossing a page break)",
            poems.len(),
            poems.iter().filter(|p| p.nested).count(),
            poems.iter().filter(|p| p.page_count() > 1).count()
        );
        poems
    }

    fn quoted_poem(&self, markers: &[PageMarker], id: NodeId) -> QuotedPoem {
        let composed = compose(self, markers, id);

        QuotedPoem {
            start_page: composed
                .leading_marker
                .or_else(|| marker_before(markers, id).cloned()),
            continue_pages: composed.markers,
            source: composed.source,
            language: self.language(id),
            line_groups: self.outer_line_groups(markers, id),
            nested: self.enclosing(id, Q).is_some(),
            chunks: composed.chunks,
        }
    }

    fn outer_line_groups(&self, markers: &[PageMarker], quotation: NodeId) -> Vec<LineGroup> {
        let arena = self.arena();
        let last = arena.last_descendant(quotation);
        (quotation.0 + 1..=last.0)
            .map(NodeId)
            .filter(|&id| arena.is_named(id, LG))
            .filter(|&id| {
                self.enclosing(id, LG)
                    .is_none_or(|outer| !arena.is_inside(outer, quotation))
            })
            .map(|id| self.line_group(markers, id))
            .collect()
    }
}
