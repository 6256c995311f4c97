//! Dynamic evaluation context.
//!
//! An [`XPathContext`] holds the cursor of an in-progress evaluation (item,
//! position, size) together with the state shared by its forks: the root,
//! the variable bindings, the parent map and the schema proxy.
//!
//! Axis walks borrow the context mutably and move its cursor while they
//! produce items. Every walk pushes the cursor on the context's frame stack
//! when it starts and pops it back when the walk is dropped, so a walk that
//! is exhausted, abandoned or fails leaves the cursor as it found it.
//!
//! ```
//! use xpath_eval::context::XPathContext;
//! use xpath_eval::model::Root;
//! use xpath_eval::model::simple::{elem, SimpleDocument};
//! use xpath_eval::xdm::Item;
//!
//! let root = elem("root").child(elem("a")).child(elem("b")).build();
//! let mut ctx = XPathContext::<SimpleDocument>::new(Root::Element(root.clone()));
//! ctx.item = Some(Item::Element(root));
//!
//! let names: Vec<String> = ctx
//!     .iter_children()
//!     .filter_map(|r| match r {
//!         Ok(Some(Item::Element(e))) => Some(xpath_eval::model::ElementNode::name(&e).local),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(names, ["a", "b"]);
//! // The walk is over: the cursor is back on the root.
//! assert!(matches!(ctx.item, Some(Item::Element(_))));
//! assert_eq!(ctx.position, 0);
//! ```
use core::fmt;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::model::{DocumentNode, ElementNode, Root, collect_elements};
use crate::runtime::Error;
use crate::schema::SchemaProxy;
use crate::xdm::{ContextItem, ExpandedName, Item, Value, XdmSequence};

mod axes;

pub use axes::{Axis, AxisWalk};

/// Which node kind a name test selects on the running axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKindTest {
    Element,
    Attribute,
}

/// Cursor saved by an axis walk.
struct Frame<D: DocumentNode> {
    item: ContextItem<D>,
    size: usize,
    position: usize,
    axis: Option<Axis>,
    node_kind_test: NodeKindTest,
}

type ParentMap<E> = HashMap<E, E>;

pub struct XPathContext<D: DocumentNode> {
    /// `None` when positioned on the document.
    pub item: ContextItem<D>,
    /// Position of the item within the sequence being processed; 0 when undefined.
    pub position: usize,
    pub size: usize,
    root: Root<D>,
    variables: Rc<HashMap<ExpandedName, Value<D>>>,
    parent_map: Rc<OnceCell<ParentMap<D::Element>>>,
    schema: Option<Arc<dyn SchemaProxy>>,
    axis: Option<Axis>,
    node_kind_test: NodeKindTest,
    frames: SmallVec<[Frame<D>; 8]>,
}

impl<D: DocumentNode> XPathContext<D> {
    pub fn new(root: Root<D>) -> Self {
        tracing::debug!(root = ?root, "evaluation context created");
        Self {
            item: None,
            position: 0,
            size: 1,
            root,
            variables: Rc::new(HashMap::new()),
            parent_map: Rc::new(OnceCell::new()),
            schema: None,
            axis: None,
            node_kind_test: NodeKindTest::Element,
            frames: SmallVec::new(),
        }
    }

    /// Context rooted at `root`, which must be an element or a document.
    pub fn from_item(root: Item<D>) -> Result<Self, Error> {
        Root::try_from(root).map(Self::new)
    }

    pub fn builder(root: Item<D>) -> XPathContextBuilder<D> {
        XPathContextBuilder::new(root)
    }

    pub fn root(&self) -> &Root<D> {
        &self.root
    }

    /// Fork sharing root, bindings, parent map and schema, with its own cursor.
    pub fn copy(&self) -> Self {
        Self {
            item: self.item.clone(),
            position: self.position,
            size: self.size,
            root: self.root.clone(),
            variables: Rc::clone(&self.variables),
            parent_map: Rc::clone(&self.parent_map),
            schema: self.schema.clone(),
            axis: None,
            node_kind_test: NodeKindTest::Element,
            frames: SmallVec::new(),
        }
    }

    pub fn copy_with_item(&self, item: ContextItem<D>) -> Self {
        let mut ctx = self.copy();
        ctx.item = item;
        ctx
    }

    /// Child to parent index over every element under the root, built on
    /// first use and shared with forks.
    pub fn parent_map(&self) -> &ParentMap<D::Element> {
        self.parent_map.get_or_init(|| {
            let elements = match &self.root {
                Root::Document(doc) => doc.iter(),
                Root::Element(elem) => collect_elements(elem),
            };
            let mut map = HashMap::with_capacity(elements.len());
            for parent in &elements {
                for child in parent.children() {
                    map.insert(child, parent.clone());
                }
            }
            tracing::debug!(entries = map.len(), "parent map built");
            map
        })
    }

    pub(crate) fn shared_parent_map(&self) -> Rc<OnceCell<ParentMap<D::Element>>> {
        Rc::clone(&self.parent_map)
    }

    /// The axis whose walk currently drives the cursor.
    pub fn active_axis(&self) -> Option<Axis> {
        self.axis
    }

    pub fn node_kind_test(&self) -> NodeKindTest {
        self.node_kind_test
    }

    /// Whether the current item is of the principal node kind of the running
    /// axis: attributes on the attribute axis, elements everywhere else.
    pub fn principal_node_kind(&self) -> bool {
        match self.node_kind_test {
            NodeKindTest::Element => matches!(self.item, Some(Item::Element(_))),
            NodeKindTest::Attribute => matches!(self.item, Some(Item::Attribute(_))),
        }
    }

    pub fn variable(&self, name: &ExpandedName) -> Option<&Value<D>> {
        self.variables.get(name)
    }

    /// Bind a variable. Forks made earlier keep their own bindings.
    pub fn set_variable(&mut self, name: impl Into<ExpandedName>, value: impl Into<Value<D>>) {
        Rc::make_mut(&mut self.variables).insert(name.into(), value.into());
    }

    pub fn variables(&self) -> impl Iterator<Item = (&ExpandedName, &Value<D>)> {
        self.variables.iter()
    }

    pub fn schema(&self) -> Option<&dyn SchemaProxy> {
        self.schema.as_deref()
    }

    pub fn set_schema(&mut self, schema: Option<Arc<dyn SchemaProxy>>) {
        self.schema = schema;
    }

    /// Number of axis walks currently running on this context.
    pub fn walk_depth(&self) -> usize {
        self.frames.len()
    }

    /// Flatten a value into items. The document position stands for the root.
    pub fn resolve(&self, value: Value<D>) -> XdmSequence<D> {
        match value {
            Value::DocumentPosition => vec![self.root.to_item()],
            other => other.into_items(),
        }
    }

    fn push_frame(&mut self) -> usize {
        let base = self.frames.len();
        self.frames.push(Frame {
            item: self.item.clone(),
            size: self.size,
            position: self.position,
            axis: self.axis,
            node_kind_test: self.node_kind_test,
        });
        base
    }

    /// Pop every frame from `base` up and restore the cursor saved at `base`.
    fn restore_frame(&mut self, base: usize) {
        self.frames.truncate(base + 1);
        if let Some(frame) = self.frames.pop() {
            self.item = frame.item;
            self.size = frame.size;
            self.position = frame.position;
            self.axis = frame.axis;
            self.node_kind_test = frame.node_kind_test;
        }
    }
}

impl<D: DocumentNode> fmt::Debug for XPathContext<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XPathContext")
            .field("root", &self.root)
            .field("item", &self.item)
            .field("position", &self.position)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

pub struct XPathContextBuilder<D: DocumentNode> {
    root: Item<D>,
    item: ContextItem<D>,
    position: usize,
    size: usize,
    variables: HashMap<ExpandedName, Value<D>>,
    schema: Option<Arc<dyn SchemaProxy>>,
}

impl<D: DocumentNode> XPathContextBuilder<D> {
    pub fn new(root: Item<D>) -> Self {
        Self { root, item: None, position: 0, size: 1, variables: HashMap::new(), schema: None }
    }

    pub fn with_item(mut self, item: impl Into<Item<D>>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_variable(mut self, name: impl Into<ExpandedName>, value: impl Into<Value<D>>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (ExpandedName, Value<D>)>,
    {
        self.variables.extend(vars);
        self
    }

    pub fn with_schema(mut self, schema: Arc<dyn SchemaProxy>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Fails with a type error unless the root is an element or a document.
    pub fn build(self) -> Result<XPathContext<D>, Error> {
        let mut ctx = XPathContext::from_item(self.root)?;
        ctx.item = self.item;
        ctx.position = self.position;
        ctx.size = self.size;
        ctx.variables = Rc::new(self.variables);
        ctx.schema = self.schema;
        Ok(ctx)
    }
}
