//! Physical pages of a TCP document: markers, notes and reconstructed text.

mod marker;
mod notes;
mod segment;

pub(crate) use marker::marker_before;
pub use marker::PageMarker;
pub use notes::{Note, NotePlacement, render_note_marker};
pub use segment::{ReconstructedPage, SegmentConfig, Segmenter};
