//! Footnotes and marginal notes.

use crate::markup::{Document, NOTE, NodeId};
use crate::util::strip_divider;

/// Symbols assigned to unlabelled notes, in order.
const NOTE_SYMBOLS: [char; 4] = ['*', '\u{2020}', '\u{2021}', '\u{00A7}'];

/// Where a note sits on the printed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotePlacement {
    /// Foot of the page.
    Foot,
    /// Page margin.
    Margin,
    /// Any other declared or missing placement.
    Other,
}

impl NotePlacement {
    fn from_attr(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v.starts_with("foot") || v == "bottom" => NotePlacement::Foot,
            Some(v) if v.starts_with("marg") || v == "left" || v == "right" => {
                NotePlacement::Margin
            }
            _ => NotePlacement::Other,
        }
    }
}

/// A note attached to a point in the main text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Label declared in the source (`N`), e.g. "*", "†" or "a".
    pub label: Option<String>,
    pub placement: NotePlacement,
    /// Full text of the note, gaps rendered by their placeholders.
    pub text: String,
}

impl Note {
    /// Marker for this note when it is the `index`th note on its page.
    pub fn marker(&self, index: usize) -> String {
        render_note_marker(self.label.as_deref(), index)
    }
}

/// Marker for a note: the declared label, or a symbol from the
/// `*, †, ‡, §` cycle repeated once more on every pass through it.
///
/// ```
/// use ppa_excerpt::render_note_marker;
///
/// assert_eq!(render_note_marker(None, 1), "†");
/// assert_eq!(render_note_marker(None, 4), "**");
/// assert_eq!(render_note_marker(Some("a"), 4), "a");
/// ```
pub fn render_note_marker(label: Option<&str>, index: usize) -> String {
    if let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) {
        return label.to_string();
    }
    let symbol = NOTE_SYMBOLS[index % NOTE_SYMBOLS.len()];
    let repeat = index / NOTE_SYMBOLS.len() + 1;
    std::iter::repeat_n(symbol, repeat).collect()
}

impl Document {
    /// All notes in the document, in document order.
    pub fn notes(&self) -> Vec<Note> {
        self.arena()
            .elements_named(NOTE)
            .map(|id| self.note(id))
            .collect()
    }

    fn note(&self, id: NodeId) -> Note {
        let arena = self.arena();
        Note {
            label: arena
                .get_attr(id, "n")
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            placement: NotePlacement::from_attr(arena.get_attr(id, "place")),
            text: strip_divider(&self.rendered_text(id)).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_cycle() {
        let expected = ["*", "†", "‡", "§", "**", "††", "‡‡", "§§", "***"];
        for (index, marker) in expected.iter().enumerate() {
            assert_eq!(render_note_marker(None, index), *marker, "index {index}");
        }
    }

    #[test]
    fn test_marker_rule() {
        for index in 0..40 {
            let marker = render_note_marker(None, index);
            let symbol = NOTE_SYMBOLS[index % 4];
            assert_eq!(marker.chars().count(), index / 4 + 1);
            assert!(marker.chars().all(|c| c == symbol));
        }
    }

    #[test]
    fn test_explicit_label_wins() {
        assert_eq!(render_note_marker(Some("a"), 0), "a");
        assert_eq!(render_note_marker(Some("12"), 7), "12");
        // Blank labels fall back to the cycle
        assert_eq!(render_note_marker(Some("  "), 2), "‡");
    }

    #[test]
    fn test_notes() {
        let doc = Document::parse(
            r#"<TEXT><PB/><P>Verse<NOTE PLACE="marg" N="a">Hor. <GAP DISP="•"/>rs Poet.</NOTE>
and prose<NOTE PLACE="foot">Ovid.</NOTE><NOTE>Bare.</NOTE></P></TEXT>"#,
        )
        .unwrap();

        let notes = doc.notes();
        assert_eq!(notes.len(), 3);

        assert_eq!(notes[0].label.as_deref(), Some("a"));
        assert_eq!(notes[0].placement, NotePlacement::Margin);
        assert_eq!(notes[0].text, "Hor. •rs Poet.");
        assert_eq!(notes[0].marker(0), "a");

        assert_eq!(notes[1].placement, NotePlacement::Foot);
        assert_eq!(notes[1].marker(1), "†");

        assert_eq!(notes[2].placement, NotePlacement::Other);
    }
}
