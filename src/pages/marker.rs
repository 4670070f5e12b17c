//! Page-begin markers.

use crate::markup::{Document, NodeId, NOTE, PB};

/// A page-begin marker and what the markup says about its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMarker {
    pub(crate) node: NodeId,
    /// 1-based position among all markers in the document.
    pub seq: usize,
    /// Sequence reference (`REF`, or `facs` in P5), usually the facsimile
    /// image number.
    pub reference: Option<String>,
    /// Printed page number (`N`), when the page carries one.
    pub number: Option<String>,
    /// `TYPE` of the nearest enclosing division that declares one
    /// (e.g. "title page", "book", "license").
    pub section_type: Option<String>,
    /// Notes between this marker and the next.
    pub note_count: usize,
}

impl PageMarker {
    /// Printed page label, if any.
    pub fn label(&self) -> Option<&str> {
        self.number.as_deref()
    }

    /// True if any note starts on this page.
    pub fn has_notes(&self) -> bool {
        self.note_count > 0
    }
}

impl Document {
    /// All page-begin markers, in document order.
    pub fn page_markers(&self) -> Vec<PageMarker> {
        let arena = self.arena();

        let mut markers: Vec<PageMarker> = Vec::new();
        for id in arena.elements() {
            if arena.is_named(id, PB) {
                markers.push(PageMarker {
                    node: id,
                    seq: markers.len() + 1,
                    reference: non_empty(
                        arena
                            .get_attr(id, "ref")
                            .or_else(|| arena.get_attr(id, "facs")),
                    ),
                    number: non_empty(arena.get_attr(id, "n")),
                    section_type: self.section_type(id),
                    note_count: 0,
                });
            } else if arena.is_named(id, NOTE)
                && let Some(current) = markers.last_mut()
            {
                current.note_count += 1;
            }
        }
        markers
    }

    fn section_type(&self, id: NodeId) -> Option<String> {
        let arena = self.arena();
        arena
            .ancestors(id)
            .filter(|&a| arena.element_name(a).is_some_and(|n| n.starts_with("div")))
            .find_map(|a| non_empty(arena.get_attr(a, "type")))
    }
}

/// Nearest marker at or before `id` in document order.
pub(crate) fn marker_before(markers: &[PageMarker], id: NodeId) -> Option<&PageMarker> {
    let after = markers.partition_point(|m| m.node <= id);
    after.checked_sub(1).map(|i| &markers[i])
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_attributes() {
        let doc = Document::parse(
            r#"<TEXT>
<DIV1 TYPE="title page"><PB REF="1"/><P>THE ART OF POETRY</P></DIV1>
<DIV1 TYPE="book"><DIV2><PB REF="2" N="1"/><P>Text<NOTE N="*">a note</NOTE></P>
<PB REF="3" N=" "/></DIV2></DIV1>
</TEXT>"#,
        )
        .unwrap();

        let markers = doc.page_markers();
        assert_eq!(markers.len(), 3);

        assert_eq!(markers[0].seq, 1);
        assert_eq!(markers[0].reference.as_deref(), Some("1"));
        assert_eq!(markers[0].label(), None);
        assert_eq!(markers[0].section_type.as_deref(), Some("title page"));
        assert!(!markers[0].has_notes());

        assert_eq!(markers[1].label(), Some("1"));
        assert_eq!(markers[1].section_type.as_deref(), Some("book"));
        assert_eq!(markers[1].note_count, 1);

        // Blank labels count as missing
        assert_eq!(markers[2].label(), None);
        assert!(!markers[2].has_notes());
    }

    #[test]
    fn test_marker_before() {
        let doc = Document::parse("<TEXT><P>front</P><PB/><P>one</P><PB/><Q>two</Q></TEXT>")
            .unwrap();
        let markers = doc.page_markers();
        let arena = doc.arena();

        let front = arena.elements_named("p").next().unwrap();
        assert!(marker_before(&markers, front).is_none());

        let q = arena.elements_named("q").next().unwrap();
        assert_eq!(marker_before(&markers, q).map(|m| m.seq), Some(2));
    }

    #[test]
    fn test_no_markers() {
        let doc = Document::parse("<TEXT><P>unpaginated</P></TEXT>").unwrap();
        assert!(doc.page_markers().is_empty());
    }
}
