//! Simple in-memory tree provider used in tests and quick prototypes.
//!
//! Elements are Arc-backed handles compared by identity. Children live behind a
//! lock so a tree can still be extended after it was built.
//!
//! Example:
//! ```
//! use xpath_eval::model::simple::{elem, SimpleDocument};
//! use xpath_eval::model::{DocumentNode, ElementNode};
//!
//! // <root id="r">Hello<child/><child world="yes"/></root>
//! let root = elem("root")
//!     .attr("id", "r")
//!     .text("Hello")
//!     .child(elem("child"))
//!     .child(elem("child").attr("world", "yes"))
//!     .build();
//!
//! assert_eq!(root.name().local, "root");
//! assert_eq!(root.len(), 2);
//! assert_eq!(root.text().as_deref(), Some("Hello"));
//!
//! let document = SimpleDocument::parse("<a><b/>tail<b/></a>").unwrap();
//! assert_eq!(document.iter().len(), 3);
//! ```
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::model::{DocumentNode, ElementNode, collect_elements};
use crate::runtime::Error;
use crate::xdm::ExpandedName;

struct ElementInner {
    name: ExpandedName,
    attributes: Vec<(ExpandedName, String)>,
    text: Option<String>,
    children: RwLock<Vec<SimpleElement>>,
}

#[derive(Clone)]
pub struct SimpleElement(Arc<ElementInner>);

impl PartialEq for SimpleElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleElement {}
impl std::hash::Hash for SimpleElement {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleElement {
    // Children are left out: a cyclic tree would recurse forever.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleElement")
            .field("name", &self.0.name)
            .field("attributes", &self.0.attributes)
            .field("text", &self.0.text)
            .finish_non_exhaustive()
    }
}

impl SimpleElement {
    pub fn builder(name: impl Into<ExpandedName>) -> SimpleElementBuilder {
        SimpleElementBuilder { name: name.into(), attributes: Vec::new(), text: None, children: Vec::new() }
    }

    /// Append a child after construction. Nothing prevents appending an
    /// ancestor, which makes the tree cyclic.
    pub fn push_child(&self, child: SimpleElement) {
        self.0.children.write().unwrap_or_else(PoisonError::into_inner).push(child);
    }
}

impl ElementNode for SimpleElement {
    fn name(&self) -> ExpandedName {
        self.0.name.clone()
    }
    fn attributes(&self) -> Vec<(ExpandedName, String)> {
        self.0.attributes.clone()
    }
    fn text(&self) -> Option<String> {
        self.0.text.clone()
    }
    fn children(&self) -> Vec<Self> {
        self.0.children.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
    fn len(&self) -> usize {
        self.0.children.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct SimpleElementBuilder {
    name: ExpandedName,
    attributes: Vec<(ExpandedName, String)>,
    text: Option<String>,
    children: Vec<SimpleElement>,
}

impl SimpleElementBuilder {
    pub fn attr(mut self, name: impl Into<ExpandedName>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: impl Into<SimpleElementOrBuilder>) -> Self {
        self.children.push(child.into().build());
        self
    }

    pub fn children<I: IntoIterator<Item = SimpleElementOrBuilder>>(mut self, it: I) -> Self {
        self.children.extend(it.into_iter().map(SimpleElementOrBuilder::build));
        self
    }

    pub fn build(self) -> SimpleElement {
        SimpleElement(Arc::new(ElementInner {
            name: self.name,
            attributes: self.attributes,
            text: self.text,
            children: RwLock::new(self.children),
        }))
    }
}

pub enum SimpleElementOrBuilder {
    Built(SimpleElement),
    Builder(SimpleElementBuilder),
}

impl SimpleElementOrBuilder {
    fn build(self) -> SimpleElement {
        match self {
            SimpleElementOrBuilder::Built(e) => e,
            SimpleElementOrBuilder::Builder(b) => b.build(),
        }
    }
}

impl From<SimpleElement> for SimpleElementOrBuilder {
    fn from(e: SimpleElement) -> Self {
        SimpleElementOrBuilder::Built(e)
    }
}
impl From<SimpleElementBuilder> for SimpleElementOrBuilder {
    fn from(b: SimpleElementBuilder) -> Self {
        SimpleElementOrBuilder::Builder(b)
    }
}

#[derive(Debug)]
struct DocumentInner {
    root: SimpleElement,
}

/// A document wrapping one root element.
#[derive(Clone, Debug)]
pub struct SimpleDocument(Arc<DocumentInner>);

impl PartialEq for SimpleDocument {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl SimpleDocument {
    pub fn new(root: SimpleElement) -> Self {
        SimpleDocument(Arc::new(DocumentInner { root }))
    }
}

impl DocumentNode for SimpleDocument {
    type Element = SimpleElement;

    fn root_element(&self) -> SimpleElement {
        self.0.root.clone()
    }

    fn iter(&self) -> Vec<SimpleElement> {
        collect_elements(&self.0.root)
    }

    fn iter_matching(&self, name: &ExpandedName) -> Vec<SimpleElement> {
        let mut elements = self.iter();
        elements.retain(|e| e.0.name == *name);
        elements
    }

    fn parse(source: &str) -> Result<Self, Error> {
        let xml = roxmltree::Document::parse(source)?;
        let root = convert(xml.root_element());
        tracing::debug!(bytes = source.len(), root = %root.0.name, "document parsed");
        Ok(SimpleDocument::new(root))
    }
}

fn expanded(namespace: Option<&str>, local: &str) -> ExpandedName {
    ExpandedName::new(namespace.map(str::to_string), local)
}

fn convert(node: roxmltree::Node<'_, '_>) -> SimpleElement {
    let tag = node.tag_name();
    let attributes = node.attributes().map(|a| (expanded(a.namespace(), a.name()), a.value().to_string())).collect();
    // ElementTree semantics: only the text before the first child element.
    let text = node.first_child().filter(roxmltree::Node::is_text).and_then(|t| t.text()).map(str::to_string);
    let children = node.children().filter(roxmltree::Node::is_element).map(convert).collect();
    SimpleElement(Arc::new(ElementInner {
        name: expanded(tag.namespace(), tag.name()),
        attributes,
        text,
        children: RwLock::new(children),
    }))
}

// Convenience helpers for concise test code
pub fn elem(name: &str) -> SimpleElementBuilder {
    SimpleElement::builder(name)
}
pub fn doc(root: impl Into<SimpleElementOrBuilder>) -> SimpleDocument {
    SimpleDocument::new(root.into().build())
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn children_survive_a_poisoned_lock() {
        let root = elem("r").child(elem("a")).build();
        let poisoned = catch_unwind(AssertUnwindSafe(|| {
            let _guard = root.0.children.write();
            panic!("writer panicked");
        }));
        assert!(poisoned.is_err());
        assert!(root.0.children.is_poisoned());

        assert_eq!(root.len(), 1);
        root.push_child(elem("b").build());
        let names: Vec<String> = root.children().iter().map(|e| e.name().local).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
