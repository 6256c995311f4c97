//! Node model: the capability surface required from a tree provider and the
//! node classification predicates.
//!
//! Tree providers implement [`ElementNode`] and [`DocumentNode`]. Values coming
//! out of a provider are wrapped in [`Item`] exactly once, so every later
//! classification is a match on the variant rather than a capability probe.
use core::fmt;
use core::hash::Hash;
use std::collections::HashSet;

use crate::runtime::{Error, ErrorCode};
use crate::xdm::{ExpandedName, Item, Value};

pub mod simple;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Namespace,
    Text,
}

/// An attribute node: a `(name, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeNode {
    pub name: ExpandedName,
    pub value: String,
}

impl AttributeNode {
    pub fn new(name: impl Into<ExpandedName>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A namespace node: a `(prefix, uri)` pair. Structurally an attribute, kept as
/// a distinct type so the two never get confused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceNode {
    pub prefix: String,
    pub uri: String,
}

impl NamespaceNode {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), uri: uri.into() }
    }
}

/// Element capability set.
///
/// Equality and hashing must follow node identity: two handles are equal only
/// when they refer to the same element. The parent map relies on it.
pub trait ElementNode: Clone + Eq + Hash + fmt::Debug {
    fn name(&self) -> ExpandedName;
    /// Attributes as `(name, value)` pairs, in the provider's order.
    fn attributes(&self) -> Vec<(ExpandedName, String)>;
    /// Text content before the first child element, if any.
    fn text(&self) -> Option<String>;
    /// Direct child elements in document order.
    fn children(&self) -> Vec<Self>;

    fn len(&self) -> usize {
        self.children().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Document capability set.
pub trait DocumentNode: Clone + PartialEq + fmt::Debug {
    type Element: ElementNode;

    fn root_element(&self) -> Self::Element;
    /// All elements of the document in pre-order, root included.
    fn iter(&self) -> Vec<Self::Element>;
    /// All elements of the document with the given name, in pre-order.
    fn iter_matching(&self, name: &ExpandedName) -> Vec<Self::Element>;
    fn parse(source: &str) -> Result<Self, Error>
    where
        Self: Sized;
}

/// Root of an evaluation: an element or a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Root<D: DocumentNode> {
    Element(D::Element),
    Document(D),
}

impl<D: DocumentNode> Root<D> {
    /// The element where element navigation starts.
    pub fn root_element(&self) -> D::Element {
        match self {
            Root::Element(e) => e.clone(),
            Root::Document(d) => d.root_element(),
        }
    }

    pub fn to_item(&self) -> Item<D> {
        match self {
            Root::Element(e) => Item::Element(e.clone()),
            Root::Document(d) => Item::Document(d.clone()),
        }
    }
}

impl<D: DocumentNode> TryFrom<Item<D>> for Root<D> {
    type Error = Error;

    fn try_from(item: Item<D>) -> Result<Self, Error> {
        match item {
            Item::Element(e) => Ok(Root::Element(e)),
            Item::Document(d) => Ok(Root::Document(d)),
            other => Err(Error::from_code(
                ErrorCode::FODC0001,
                format!("argument 'root' must be an Element or a Document: {other:?}"),
            )),
        }
    }
}

/// Pre-order list of the elements under `root` (inclusive). Elements reached a
/// second time are not expanded again, so the walk ends on cyclic inputs.
pub fn collect_elements<E: ElementNode>(root: &E) -> Vec<E> {
    let mut seen: HashSet<E> = HashSet::new();
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(elem) = stack.pop() {
        if !seen.insert(elem.clone()) {
            continue;
        }
        let mut children = elem.children();
        children.reverse();
        stack.extend(children);
        out.push(elem);
    }
    out
}

// Node predicates. Total over every value, never fail.

/// Dynamic-context-item eligible: the document position, an element, an
/// attribute or a namespace.
pub fn is_xpath_node<D: DocumentNode>(value: &Value<D>) -> bool {
    matches!(
        value,
        Value::DocumentPosition | Value::Item(Item::Element(_) | Item::Attribute(_) | Item::Namespace(_))
    )
}

pub fn is_element_node<D: DocumentNode>(value: &Value<D>, name: Option<&ExpandedName>) -> bool {
    match value {
        Value::Item(Item::Element(e)) => name.is_none_or(|n| e.name() == *n),
        _ => false,
    }
}

pub fn is_document_node<D: DocumentNode>(value: &Value<D>) -> bool {
    matches!(value, Value::Item(Item::Document(_)))
}

/// Attribute test. A namespace node is never an attribute, with or without a name.
pub fn is_attribute_node<D: DocumentNode>(value: &Value<D>, name: Option<&ExpandedName>) -> bool {
    match value {
        Value::Item(Item::Attribute(a)) => name.is_none_or(|n| a.name == *n),
        _ => false,
    }
}

pub fn is_namespace_node<D: DocumentNode>(value: &Value<D>) -> bool {
    matches!(value, Value::Item(Item::Namespace(_)))
}
