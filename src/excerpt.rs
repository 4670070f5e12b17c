//! Excerpt location across a whole work.
//!
//! The [`ExcerptLocator`] walks every quoted poem in a document, asks a
//! [`PageTextProvider`] for the canonical text of each page the poem touches,
//! and aligns each page chunk against it.
//!
//! # Example
//!
//! ```
//! use ppa_excerpt::{Document, ExcerptLocator, LocatorConfig, TcpPageText};
//!
//! let doc = Document::parse(
//!     r#"<TEXT><PB N="1"/><P>Hence Horace, <Q><L>Odi profanum vulgus</L>
//! <BIBL>Carm. 3.1</BIBL></Q> and so forth.</P></TEXT>"#,
//! )?;
//!
//! let pages = TcpPageText::new(&doc);
//! let report = ExcerptLocator::new(&doc, &pages, LocatorConfig::new("A12345")).run();
//!
//! let record = &report.records[0];
//! assert_eq!(record.page_id, "A12345.0001");
//! assert_eq!(record.text, "Odi profanum vulgus");
//! assert_eq!(record.notes, "source: Carm. 3.1");
//! # Ok::<(), ppa_excerpt::Error>(())
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use crate::align::{Aligner, AlignConfig, ExcerptSpan};
use crate::markup::Document;
use crate::pages::{PageMarker, ReconstructedPage, Segmenter};
use crate::quote::QuotedPoem;
use crate::util::zero_pad;

/// Detection method recorded for excerpts located from XML markup.
pub const DEFAULT_DETECTION_METHOD: &str = "xml";

/// Source of canonical page text.
pub trait PageTextProvider {
    /// Text of the page that begins at `page`, if available.
    fn page_text(&self, page: &PageMarker) -> Option<Cow<'_, str>>;
}

/// Page text reconstructed from the TCP markup itself.
#[derive(Debug, Clone)]
pub struct TcpPageText {
    pages: Vec<ReconstructedPage>,
}

impl TcpPageText {
    /// Reconstruct every page of `document` once.
    pub fn new(document: &Document) -> Self {
        Self::from_segmenter(&Segmenter::new(document))
    }

    /// Use pages from an already configured segmenter.
    pub fn from_segmenter(segmenter: &Segmenter<'_>) -> Self {
        Self {
            pages: segmenter.pages().collect(),
        }
    }

    /// Reconstructed pages, in order.
    pub fn pages(&self) -> &[ReconstructedPage] {
        &self.pages
    }
}

impl PageTextProvider for TcpPageText {
    fn page_text(&self, page: &PageMarker) -> Option<Cow<'_, str>> {
        let index = page.seq.checked_sub(1)?;
        self.pages
            .get(index)
            .filter(|p| p.marker == *page)
            .map(|p| Cow::Borrowed(p.text.as_str()))
    }
}

/// Separately OCR'd page text for one work, keyed by zero-padded page
/// sequence number ("0001", "0002", ...).
///
/// Load it once per work and reuse it for every lookup in that work.
#[derive(Debug, Clone, Default)]
pub struct OcrPageCache {
    pages: HashMap<String, String>,
}

impl OcrPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the text for page `seq` (1-based).
    pub fn insert(&mut self, seq: usize, text: impl Into<String>) {
        self.pages.insert(zero_pad(seq), text.into());
    }

    /// Store text under an existing key such as "0014".
    ///
    /// Numeric keys are re-padded so "14" and "0014" refer to the same page.
    pub fn insert_keyed(&mut self, key: &str, text: impl Into<String>) {
        let key = match key.trim().parse::<usize>() {
            Ok(seq) => zero_pad(seq),
            Err(_) => key.to_string(),
        };
        self.pages.insert(key, text.into());
    }

    /// Text stored under a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pages.get(key).map(String::as_str)
    }

    /// Number of pages stored.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for OcrPageCache {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut cache = Self::new();
        for (key, text) in iter {
            cache.insert_keyed(key.as_ref(), text);
        }
        cache
    }
}

impl PageTextProvider for OcrPageCache {
    fn page_text(&self, page: &PageMarker) -> Option<Cow<'_, str>> {
        self.get(&zero_pad(page.seq)).map(Cow::Borrowed)
    }
}

/// Configuration for excerpt location.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Work identifier used to build page ids.
    pub work_id: String,
    /// Detection method recorded on each excerpt.
    pub detection_method: String,
    /// Align chunks made only of gaps and punctuation too.
    pub include_large_gaps: bool,
    /// Alignment settings.
    pub align: AlignConfig,
}

impl LocatorConfig {
    /// Default configuration for a work.
    pub fn new(work_id: impl Into<String>) -> Self {
        Self {
            work_id: work_id.into(),
            detection_method: DEFAULT_DETECTION_METHOD.to_string(),
            include_large_gaps: false,
            align: AlignConfig::default(),
        }
    }

    pub fn with_detection_method(mut self, method: impl Into<String>) -> Self {
        self.detection_method = method.into();
        self
    }

    pub fn with_large_gaps(mut self, include: bool) -> Self {
        self.include_large_gaps = include;
        self
    }

    pub fn with_align(mut self, align: AlignConfig) -> Self {
        self.align = align;
        self
    }

    /// Page id for a marker: work id and zero-padded sequence number.
    pub fn page_id(&self, page: &PageMarker) -> String {
        format!("{}.{}", self.work_id, zero_pad(page.seq))
    }
}

/// A located excerpt, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExcerptRecord {
    pub page_id: String,
    pub start: usize,
    pub end: usize,
    /// Page text covered by the span.
    pub text: String,
    /// Free-text notes: citation, part of a multi-page quotation.
    pub notes: String,
    pub detection_method: String,
}

impl ExcerptRecord {
    pub fn span(&self) -> ExcerptSpan {
        ExcerptSpan {
            start: self.start,
            end: self.end,
        }
    }
}

/// Why a chunk could not be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlocatedReason {
    /// The quotation comes before the first page marker.
    NoPage,
    /// The provider has no text for the page.
    MissingPageText,
    /// Alignment found no match.
    NoMatch,
}

/// A chunk that could not be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlocatedExcerpt {
    pub page_id: Option<String>,
    pub excerpt: String,
    pub reason: UnlocatedReason,
}

/// Outcome of locating every quotation in a work.
#[derive(Debug, Clone, Default)]
pub struct ExcerptReport {
    pub records: Vec<ExcerptRecord>,
    pub unlocated: Vec<UnlocatedExcerpt>,
    /// Quotations with no text beyond gaps and punctuation.
    pub skipped_empty: usize,
    /// Quotations inside another quotation, located as part of their parent.
    pub skipped_nested: usize,
}

/// Locates every quoted poem of a document in canonical page text.
pub struct ExcerptLocator<'a, P: PageTextProvider + ?Sized> {
    document: &'a Document,
    provider: &'a P,
    config: LocatorConfig,
    aligner: Aligner,
}

impl<'a, P: PageTextProvider + ?Sized> ExcerptLocator<'a, P> {
    pub fn new(document: &'a Document, provider: &'a P, config: LocatorConfig) -> Self {
        let aligner = Aligner::with_config(config.align.clone());
        Self {
            document,
            provider,
            config,
            aligner,
        }
    }

    /// Locate every quotation in the document.
    pub fn run(&self) -> ExcerptReport {
        let mut report = ExcerptReport::default();

        for poem in self.document.quoted_poems() {
            if poem.nested {
                report.skipped_nested += 1;
                continue;
            }
            if !poem.has_text() {
                report.skipped_empty += 1;
                continue;
            }
            self.locate_poem(&poem, &mut report);
        }

        log::info!(
            "{}: located {} excerpts, {} unlocated, {} empty quotations skipped",
            self.config.work_id,
            report.records.len(),
            report.unlocated.len(),
            report.skipped_empty
        );
        report
    }

    fn locate_poem(&self, poem: &QuotedPoem, report: &mut ExcerptReport) {
        let parts = poem.page_count();

        for (part, (page, chunk)) in poem
            .page_chunks(self.config.include_large_gaps)
            .enumerate()
        {
            let excerpt = chunk.trim();
            if excerpt.is_empty() {
                continue;
            }

            let unlocated = |page_id: Option<String>, reason| UnlocatedExcerpt {
                page_id,
                excerpt: excerpt.to_string(),
                reason,
            };

            let Some(page) = page else {
                report.unlocated.push(unlocated(None, UnlocatedReason::NoPage));
                continue;
            };
            let page_id = self.config.page_id(page);

            let Some(page_text) = self.provider.page_text(page) else {
                log::warn!("no page text for {page_id}");
                report
                    .unlocated
                    .push(unlocated(Some(page_id), UnlocatedReason::MissingPageText));
                continue;
            };

            let Some(alignment) = self.aligner.locate(excerpt, &page_text) else {
                report
                    .unlocated
                    .push(unlocated(Some(page_id), UnlocatedReason::NoMatch));
                continue;
            };

            log::debug!(
                "{page_id}: excerpt at {}..{} ({:?})",
                alignment.span.start,
                alignment.span.end,
                alignment.strategy
            );
            report.records.push(ExcerptRecord {
                page_id,
                start: alignment.span.start,
                end: alignment.span.end,
                text: alignment.span.slice(&page_text).to_string(),
                notes: record_notes(poem, part, parts),
                detection_method: self.config.detection_method.clone(),
            });
        }
    }
}

/// Notes for one chunk of a quotation.
fn record_notes(poem: &QuotedPoem, part: usize, parts: usize) -> String {
    let mut notes = Vec::new();
    if let Some(source) = &poem.source {
        notes.push(format!("source: {source}"));
    }
    if parts > 1 {
        notes.push(format!("page {} of {} of quotation", part + 1, parts));
    }
    notes.join("\n")
}
