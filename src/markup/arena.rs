//! Arena-based tree for parsed TCP markup.
//!
//! All nodes live in one vector. Nodes are allocated while the parser walks
//! the source, so a node's id is its position in document order: comparing
//! two ids compares where they occur in the text.

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// The document root is always allocated first.
    pub const ROOT: NodeId = NodeId(0);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node type in the arena.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Root,
    /// Element with lowercase local name and attributes.
    Element {
        name: String,
        attrs: Vec<Attribute>,
    },
    /// Text content.
    Text(String),
}

/// Element attribute, keyed by lowercase local name.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A node in the arena.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-backed markup tree.
#[derive(Debug)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    /// Create a new arena holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Root)],
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: String, attrs: Vec<Attribute>) -> NodeId {
        let id = self.alloc(Node::new(NodeData::Element { name, attrs }));
        self.append(parent, id);
        id
    }

    /// Append text to `parent`, merging with a trailing text node.
    ///
    /// Merging keeps one text node per run of character data, so entity
    /// references split by the reader do not fragment the text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }

        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let id = self.alloc(Node::new(NodeData::Text(text.to_string())));
        self.append(parent, id);
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if only the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        ChildrenIter {
            arena: self,
            current: first,
        }
    }

    /// Iterate over ancestors of a node, nearest first, root excluded.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE);
        std::iter::from_fn(move || {
            if current.is_none() || current == NodeId::ROOT {
                return None;
            }
            let id = current;
            current = self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE);
            Some(id)
        })
    }

    /// Iterate over every element, in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|&id| self.is_element(id))
    }

    /// Iterate over elements with the given local name, in document order.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.elements().filter(move |&id| self.is_named(id, name))
    }

    /// Last descendant of `id` in document order (or `id` itself if it is
    /// a leaf). Everything in `(id, last_descendant(id)]` is inside `id`.
    pub fn last_descendant(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(node) = self.get(current) {
            if node.last_child.is_none() {
                break;
            }
            current = node.last_child;
        }
        current
    }

    /// Check whether `id` lies strictly inside `ancestor`.
    pub fn is_inside(&self, id: NodeId, ancestor: NodeId) -> bool {
        id > ancestor && id <= self.last_descendant(ancestor)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    arena: &'a Arena,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .arena
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Convenience methods for element and text nodes.
impl Arena {
    /// Get element's local name.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Check if node is an element with the given local name.
    pub fn is_named(&self, id: NodeId, tag: &str) -> bool {
        self.element_name(id) == Some(tag)
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Check if node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Get text content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of every text node under `id`.
    pub fn collect_text(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text_recursive(id, &mut result);
        result
    }

    fn collect_text_recursive(&self, id: NodeId, result: &mut String) {
        if let Some(text) = self.text(id) {
            result.push_str(text);
            return;
        }
        for child in self.children(id) {
            self.collect_text_recursive(child, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(arena: &mut Arena, parent: NodeId, name: &str) -> NodeId {
        arena.append_element(parent, name.to_string(), Vec::new())
    }

    #[test]
    fn test_append_children() {
        let mut arena = Arena::new();

        let lg = element(&mut arena, NodeId::ROOT, "lg");
        let l1 = element(&mut arena, lg, "l");
        let l2 = element(&mut arena, lg, "l");

        let children: Vec<_> = arena.children(lg).collect();
        assert_eq!(children, vec![l1, l2]);
        assert_eq!(arena.get(l2).unwrap().prev_sibling, l1);
    }

    #[test]
    fn test_text_merging() {
        let mut arena = Arena::new();
        let l = element(&mut arena, NodeId::ROOT, "l");

        arena.append_text(l, "Of Mans ");
        arena.append_text(l, "first disobedience");

        let children: Vec<_> = arena.children(l).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(arena.text(children[0]), Some("Of Mans first disobedience"));
    }

    #[test]
    fn test_document_order_ids() {
        let mut arena = Arena::new();
        let q = element(&mut arena, NodeId::ROOT, "q");
        let l = element(&mut arena, q, "l");
        arena.append_text(l, "line");
        let after = element(&mut arena, NodeId::ROOT, "p");

        assert!(q < l);
        assert!(arena.is_inside(l, q));
        assert!(!arena.is_inside(after, q));
        assert_eq!(arena.last_descendant(q), NodeId(3));
    }

    #[test]
    fn test_ancestors_and_attrs() {
        let mut arena = Arena::new();
        let div = arena.append_element(
            NodeId::ROOT,
            "div1".to_string(),
            vec![Attribute {
                name: "type".to_string(),
                value: "book".to_string(),
            }],
        );
        let p = element(&mut arena, div, "p");
        let pb = element(&mut arena, p, "pb");

        let ancestors: Vec<_> = arena.ancestors(pb).collect();
        assert_eq!(ancestors, vec![p, div]);
        assert_eq!(arena.get_attr(div, "type"), Some("book"));
        assert_eq!(arena.get_attr(div, "n"), None);
        assert_eq!(arena.elements_named("pb").collect::<Vec<_>>(), vec![pb]);
    }

    #[test]
    fn test_collect_text() {
        let mut arena = Arena::new();
        let note = element(&mut arena, NodeId::ROOT, "note");
        arena.append_text(note, "See ");
        let hi = element(&mut arena, note, "hi");
        arena.append_text(hi, "Ovid");
        arena.append_text(note, ", Met.");

        assert_eq!(arena.collect_text(note), "See Ovid, Met.");
    }
}
