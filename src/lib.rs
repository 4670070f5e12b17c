//! # ppa-excerpt
//!
//! Page reconstruction and quoted-poetry excerpt location for EEBO-TCP and
//! ECCO-TCP transcriptions.
//!
//! ## Features
//!
//! - Reconstruct per-page plain text from markup that marks pages with empty
//!   `<PB/>` elements, with notes folded in at the foot of each page
//! - Extract quoted poems (`<Q>`), split into one chunk per physical page
//! - Locate each chunk in independently produced page text, tolerating
//!   long s, reflowed lines and garbled interior lines
//!
//! ## Quick Start
//!
//! ```
//! use ppa_excerpt::{Document, locate_span};
//!
//! let doc = Document::parse(
//!     r#"<TEXT><PB N="1"/><P>As the Poet<NOTE>Virg. Aen.</NOTE> sings,
//! <Q><L>Arma virumque cano</L></Q></P></TEXT>"#,
//! )?;
//!
//! let pages = doc.pages();
//! assert_eq!(pages[0].label(), Some("1"));
//! assert!(pages[0].text.ends_with("\n\n* Virg. Aen."));
//!
//! let poem = &doc.quoted_poems()[0];
//! let chunk = poem.text_by_page(false).next().unwrap_or_default();
//! let span = locate_span(chunk.trim(), &pages[0].text).unwrap();
//! assert_eq!(span.slice(&pages[0].text), "Arma virumque cano");
//! # Ok::<(), ppa_excerpt::Error>(())
//! ```
//!
//! ## Locating a whole work
//!
//! [`ExcerptLocator`] runs every quotation of a document against a
//! [`PageTextProvider`]: either [`TcpPageText`] (pages reconstructed from the
//! same markup) or an [`OcrPageCache`] loaded by the caller.

pub mod align;
pub mod error;
pub mod excerpt;
pub mod markup;
pub mod pages;
pub mod quote;
pub(crate) mod util;

pub use align::{AlignConfig, Aligner, Alignment, ExcerptSpan, MatchStrategy, locate_span};
pub use error::{Error, Result};
pub use excerpt::{
    ExcerptLocator, ExcerptRecord, ExcerptReport, LocatorConfig, OcrPageCache, PageTextProvider,
    TcpPageText, UnlocatedExcerpt, UnlocatedReason,
};
pub use markup::Document;
pub use pages::{
    Note, NotePlacement, PageMarker, ReconstructedPage, SegmentConfig, Segmenter,
    render_note_marker,
};
pub use quote::{LineGroup, QuotedPoem, find_quoted_poems};
