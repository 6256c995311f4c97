use core::fmt;
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::context::{NodeKindTest, XPathContext};
use crate::model::{AttributeNode, DocumentNode, ElementNode};
use crate::runtime::{Error, ErrorCode};
use crate::xdm::{ContextItem, Item};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    SelfAxis,
    Attribute,
    Child,
    Descendant,
    Ancestor,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::SelfAxis => "self",
            Axis::Attribute => "attribute",
            Axis::Child => "child",
            Axis::Descendant => "descendant-or-self",
            Axis::Ancestor => "ancestor",
        })
    }
}

/// Pending step of a pre-order walk.
enum Visit<E> {
    Document,
    Element { elem: E, position: usize, size: usize },
    Text(String),
}

enum AxisState<D: DocumentNode> {
    Done,
    SelfOnce,
    RootOnce,
    Attributes(std::vec::IntoIter<AttributeNode>),
    Children {
        text: Option<String>,
        elements: std::iter::Enumerate<std::vec::IntoIter<D::Element>>,
        size: usize,
    },
    Descendants(Vec<Visit<D::Element>>),
    Ancestors {
        start: D::Element,
        current: D::Element,
        seen: HashSet<D::Element>,
        parents: Rc<OnceCell<HashMap<D::Element, D::Element>>>,
    },
}

/// A running axis walk over a context.
///
/// Yields the context item after each move; the context cursor follows the
/// walk. Dropping the walk restores the cursor saved when it started.
pub struct AxisWalk<'a, D: DocumentNode> {
    ctx: &'a mut XPathContext<D>,
    base: usize,
    axis: Axis,
    state: AxisState<D>,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

impl<'a, D: DocumentNode> AxisWalk<'a, D> {
    fn start(ctx: &'a mut XPathContext<D>, axis: Axis, from: Option<Item<D>>) -> Self {
        let base = ctx.push_frame();
        ctx.axis = Some(axis);
        ctx.node_kind_test = match axis {
            Axis::Attribute => NodeKindTest::Attribute,
            _ => NodeKindTest::Element,
        };
        if from.is_some() {
            ctx.item = from;
        }
        tracing::trace!(axis = %axis, depth = base, "axis walk started");
        let state = Self::initial_state(ctx, axis);
        Self { ctx, base, axis, state }
    }

    fn initial_state(ctx: &XPathContext<D>, axis: Axis) -> AxisState<D> {
        match (axis, &ctx.item) {
            (Axis::SelfAxis, _) => AxisState::SelfOnce,
            (Axis::Attribute, Some(Item::Element(e))) => {
                let mut attrs: Vec<AttributeNode> =
                    e.attributes().into_iter().map(|(name, value)| AttributeNode::new(name, value)).collect();
                attrs.sort();
                AxisState::Attributes(attrs.into_iter())
            }
            (Axis::Child, None) => AxisState::RootOnce,
            (Axis::Child, Some(Item::Element(e))) => {
                let children = e.children();
                AxisState::Children {
                    text: non_empty(e.text()),
                    size: children.len(),
                    elements: children.into_iter().enumerate(),
                }
            }
            (Axis::Descendant, None) => AxisState::Descendants(vec![
                Visit::Element { elem: ctx.root.root_element(), position: 0, size: 1 },
                Visit::Document,
            ]),
            (Axis::Descendant, Some(Item::Element(e))) => AxisState::Descendants(vec![Visit::Element {
                elem: e.clone(),
                position: ctx.position,
                size: ctx.size,
            }]),
            (Axis::Descendant, Some(_)) => AxisState::SelfOnce,
            (Axis::Ancestor, Some(Item::Element(e))) => {
                ctx.parent_map();
                AxisState::Ancestors {
                    start: e.clone(),
                    current: e.clone(),
                    seen: HashSet::from([e.clone()]),
                    parents: ctx.shared_parent_map(),
                }
            }
            _ => AxisState::Done,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The context driven by this walk.
    pub fn context(&self) -> &XPathContext<D> {
        self.ctx
    }

    /// Mutable access for nested evaluation; a nested walk started from here
    /// restores the cursor before this walk resumes.
    pub fn context_mut(&mut self) -> &mut XPathContext<D> {
        self.ctx
    }

    fn emit(&mut self, item: ContextItem<D>) -> Option<Result<ContextItem<D>, Error>> {
        self.ctx.item = item.clone();
        Some(Ok(item))
    }
}

impl<D: DocumentNode> Iterator for AxisWalk<'_, D> {
    type Item = Result<ContextItem<D>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            AxisState::Done => None,
            AxisState::SelfOnce => {
                self.state = AxisState::Done;
                Some(Ok(self.ctx.item.clone()))
            }
            AxisState::RootOnce => {
                self.state = AxisState::Done;
                self.ctx.size = 1;
                self.ctx.position = 0;
                let root = self.ctx.root.root_element();
                self.emit(Some(Item::Element(root)))
            }
            AxisState::Attributes(attrs) => match attrs.next() {
                Some(attr) => self.emit(Some(Item::Attribute(attr))),
                None => {
                    self.state = AxisState::Done;
                    None
                }
            },
            AxisState::Children { text, elements, size } => {
                if let Some(t) = text.take() {
                    return self.emit(Some(Item::Text(t)));
                }
                let size = *size;
                match elements.next() {
                    Some((index, child)) => {
                        self.ctx.size = size;
                        self.ctx.position = index + 1;
                        self.emit(Some(Item::Element(child)))
                    }
                    None => {
                        self.state = AxisState::Done;
                        None
                    }
                }
            }
            AxisState::Descendants(pending) => match pending.pop() {
                Some(Visit::Document) => {
                    self.ctx.size = 1;
                    self.ctx.position = 0;
                    self.emit(None)
                }
                Some(Visit::Text(t)) => self.emit(Some(Item::Text(t))),
                Some(Visit::Element { elem, position, size }) => {
                    let children = elem.children();
                    let count = children.len();
                    for (index, child) in children.into_iter().enumerate().rev() {
                        pending.push(Visit::Element { elem: child, position: index + 1, size: count });
                    }
                    if let Some(t) = non_empty(elem.text()) {
                        pending.push(Visit::Text(t));
                    }
                    self.ctx.size = size;
                    self.ctx.position = position;
                    self.emit(Some(Item::Element(elem)))
                }
                None => {
                    self.state = AxisState::Done;
                    None
                }
            },
            AxisState::Ancestors { start, current, seen, parents } => {
                let parent = parents.get().and_then(|map| map.get(current)).cloned();
                let Some(parent) = parent else {
                    self.state = AxisState::Done;
                    return None;
                };
                if !seen.insert(parent.clone()) {
                    tracing::warn!(start = ?start, revisited = ?parent, "cycle in ancestor chain");
                    let err = Error::from_code(
                        ErrorCode::FOER0000,
                        format!("not an element tree, circularity found for {start:?}"),
                    );
                    self.state = AxisState::Done;
                    return Some(Err(err));
                }
                *current = parent.clone();
                self.emit(Some(Item::Element(parent)))
            }
        }
    }
}

impl<D: DocumentNode> Drop for AxisWalk<'_, D> {
    fn drop(&mut self) {
        self.ctx.restore_frame(self.base);
        tracing::trace!(axis = %self.axis, depth = self.base, "axis walk restored");
    }
}

impl<D: DocumentNode> XPathContext<D> {
    /// Start a walk of `axis` from the current item.
    pub fn walk(&mut self, axis: Axis) -> AxisWalk<'_, D> {
        AxisWalk::start(self, axis, None)
    }

    /// Yield the current item once.
    pub fn iter_self(&mut self) -> AxisWalk<'_, D> {
        AxisWalk::start(self, Axis::SelfAxis, None)
    }

    /// Attributes of the current element, sorted by name.
    pub fn iter_attributes(&mut self) -> AxisWalk<'_, D> {
        AxisWalk::start(self, Axis::Attribute, None)
    }

    /// Text content, then child elements of the current element. At the
    /// document position the only child is the root element.
    pub fn iter_children(&mut self) -> AxisWalk<'_, D> {
        AxisWalk::start(self, Axis::Child, None)
    }

    pub fn iter_children_from(&mut self, item: Item<D>) -> AxisWalk<'_, D> {
        AxisWalk::start(self, Axis::Child, Some(item))
    }

    /// Pre-order walk of the current item: itself, its text, then each child
    /// subtree. At the document position the document comes first, then the
    /// walk of the root element.
    pub fn iter_descendants(&mut self) -> AxisWalk<'_, D> {
        AxisWalk::start(self, Axis::Descendant, None)
    }

    pub fn iter_descendants_from(&mut self, item: Item<D>) -> AxisWalk<'_, D> {
        AxisWalk::start(self, Axis::Descendant, Some(item))
    }

    /// Parents of the current element up to the root. A chain that comes back
    /// to a node already seen fails with `FOER0000`.
    pub fn iter_ancestors(&mut self) -> AxisWalk<'_, D> {
        AxisWalk::start(self, Axis::Ancestor, None)
    }

    pub fn iter_ancestors_from(&mut self, item: Item<D>) -> AxisWalk<'_, D> {
        AxisWalk::start(self, Axis::Ancestor, Some(item))
    }
}
