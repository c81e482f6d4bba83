//! The element arena.
//!
//! Elements live in a flat `Vec` and refer to each other by [`ElementId`].
//! Spans are byte offsets into the source the tree was built from; a parent
//! span always contains the spans of its descendants.

use crate::Span;

/// Index of an element in its [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

impl ElementId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the normalized document tree.
///
/// Mapping entries carry a `key`; sequence items and the root do not.
/// Scalar leaves carry `text` with surrounding quotes already stripped and
/// `span` shrunk to the unquoted content.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub key: Option<String>,
    pub key_span: Option<Span>,
    pub text: Option<String>,
    pub span: Span,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
}

/// An arena of [`Element`]s with a single root.
#[derive(Debug, Clone)]
pub struct ElementTree {
    elements: Vec<Element>,
}

impl ElementTree {
    /// Create a tree containing only a root element covering `span`.
    pub fn new(span: Span) -> Self {
        Self {
            elements: vec![Element {
                id: ElementId(0),
                key: None,
                key_span: None,
                text: None,
                span,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The root element id.
    #[inline]
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Look up an element by id.
    #[inline]
    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.index()]
    }

    /// Number of elements in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Iterate over all elements in document (preorder) order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Whether the tree holds only the root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    /// Append a child under `parent` and return its id.
    pub fn add_child(
        &mut self,
        parent: ElementId,
        key: Option<String>,
        key_span: Option<Span>,
        text: Option<String>,
        span: Span,
    ) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(Element {
            id,
            key,
            key_span,
            text,
            span,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.elements[parent.index()].children.push(id);
        id
    }

    /// The element's key, if it is a mapping entry.
    #[inline]
    pub fn key(&self, id: ElementId) -> Option<&str> {
        self.get(id).key.as_deref()
    }

    /// The element's scalar text, if it is a leaf.
    #[inline]
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.get(id).text.as_deref()
    }

    /// The element's parent.
    pub fn parent(&self, id: ElementId) -> Option<&Element> {
        self.get(id).parent.map(|p| self.get(p))
    }

    /// Iterate over the element's direct children.
    pub fn children(&self, id: ElementId) -> impl Iterator<Item = &Element> {
        self.get(id).children.iter().map(|&c| self.get(c))
    }

    /// The first direct child carrying `key`.
    pub fn child_with_key(&self, id: ElementId, key: &str) -> Option<&Element> {
        self.children(id).find(|c| c.key.as_deref() == Some(key))
    }

    /// Scalar text of the first direct or grandchild value under `key`.
    ///
    /// Mapping values are stored as a child element whose own children hold
    /// the scalar, so `jobs.build.runs-on` style lookups go through here.
    pub fn child_text(&self, id: ElementId, key: &str) -> Option<&str> {
        let child = self.child_with_key(id, key)?;
        if let Some(text) = child.text.as_deref() {
            return Some(text);
        }
        self.children(child.id).find_map(|c| c.text.as_deref())
    }

    /// The nearest ancestor (self included) carrying `key`.
    pub fn parent_with_key(&self, id: ElementId, key: &str) -> Option<&Element> {
        let mut current = Some(id);
        while let Some(cid) = current {
            let element = self.get(cid);
            if element.key.as_deref() == Some(key) {
                return Some(element);
            }
            current = element.parent;
        }
        None
    }

    /// The ancestor of `id` sitting directly below the nearest ancestor
    /// carrying `key`.
    ///
    /// With `key = "jobs"` this returns the enclosing job element; with
    /// `key = "steps"` the enclosing step.
    pub fn element_under_parent(&self, id: ElementId, key: &str) -> Option<&Element> {
        let mut current = self.get(id);
        while let Some(pid) = current.parent {
            let parent = self.get(pid);
            if parent.key.as_deref() == Some(key) {
                return Some(current);
            }
            current = parent;
        }
        None
    }

    /// All elements below `from` (self included) carrying `key`, in
    /// document order.
    pub fn find_all_with_key(&self, from: ElementId, key: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let element = self.get(id);
            if element.key.as_deref() == Some(key) {
                found.push(element);
            }
            // reversed so the stack pops in document order
            stack.extend(element.children.iter().rev().copied());
        }
        found
    }

    /// The deepest element whose span contains `offset`.
    pub fn element_at_offset(&self, offset: u32) -> Option<&Element> {
        let mut current = self.root();
        if !self.get(current).span.contains(offset) {
            return None;
        }
        loop {
            let next = self
                .get(current)
                .children
                .iter()
                .copied()
                .find(|&c| self.get(c).span.contains(offset));
            match next {
                Some(child) => current = child,
                None => return Some(self.get(current)),
            }
        }
    }

    /// Ancestor keys from the root down to `id`, joined with `/`.
    ///
    /// Anonymous elements (sequence items) contribute their `id:` child when
    /// they have one, so a step's path reads `jobs/build/steps/checkout`.
    pub fn path(&self, id: ElementId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(cid) = current {
            let element = self.get(cid);
            if let Some(key) = element.key.as_deref() {
                parts.push(key.to_string());
            } else if let Some(step_id) = self.child_text(cid, "id") {
                parts.push(step_id.to_string());
            }
            current = element.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Whether `ancestor` contains `id` (self included).
    pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            if cid == ancestor {
                return true;
            }
            current = self.get(cid).parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ElementTree {
        // jobs:
        //   build:
        //     steps: [...]
        let mut tree = ElementTree::new(Span::new(0, 100));
        let jobs = tree.add_child(
            tree.root(),
            Some("jobs".into()),
            Some(Span::new(0, 4)),
            None,
            Span::new(0, 100),
        );
        let build = tree.add_child(
            jobs,
            Some("build".into()),
            Some(Span::new(8, 13)),
            None,
            Span::new(8, 100),
        );
        let steps = tree.add_child(
            build,
            Some("steps".into()),
            Some(Span::new(20, 25)),
            None,
            Span::new(20, 100),
        );
        let item = tree.add_child(steps, None, None, None, Span::new(30, 60));
        let id_key = tree.add_child(
            item,
            Some("id".into()),
            Some(Span::new(30, 32)),
            None,
            Span::new(30, 45),
        );
        tree.add_child(id_key, None, None, Some("checkout".into()), Span::new(34, 42));
        tree
    }

    #[test]
    fn test_child_lookup() {
        let tree = sample();
        let jobs = tree.child_with_key(tree.root(), "jobs").unwrap();
        assert_eq!(tree.key(jobs.id), Some("jobs"));
        assert!(tree.child_with_key(tree.root(), "on").is_none());
    }

    #[test]
    fn test_enclosing_job_and_step() {
        let tree = sample();
        let leaf = tree.element_at_offset(35).unwrap();
        let job = tree.element_under_parent(leaf.id, "jobs").unwrap();
        assert_eq!(job.key.as_deref(), Some("build"));
        let step = tree.element_under_parent(leaf.id, "steps").unwrap();
        assert!(step.key.is_none());
        assert_eq!(tree.child_text(step.id, "id"), Some("checkout"));
    }

    #[test]
    fn test_path_uses_step_id() {
        let tree = sample();
        let leaf = tree.element_at_offset(35).unwrap();
        let step = tree.element_under_parent(leaf.id, "steps").unwrap();
        assert_eq!(tree.path(step.id), "jobs/build/steps/checkout");
    }

    #[test]
    fn test_offset_lookup_prefers_deepest() {
        let tree = sample();
        let leaf = tree.element_at_offset(10).unwrap();
        assert_eq!(leaf.key.as_deref(), Some("build"));
        assert!(tree.element_at_offset(200).is_none());
    }

    #[test]
    fn test_document_order_descent() {
        let tree = sample();
        let all = tree.find_all_with_key(tree.root(), "id");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key.as_deref(), Some("id"));
    }
}
