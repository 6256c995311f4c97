pub mod consts;
pub mod context;
pub mod model;
pub mod runtime;
pub mod schema;
pub mod token;
pub mod types;
pub mod xdm;

pub use context::{Axis, AxisWalk, NodeKindTest, XPathContext, XPathContextBuilder};
pub use model::simple::{SimpleDocument, SimpleElement, doc as simple_doc, elem};
pub use model::{
    AttributeNode, DocumentNode, ElementNode, NamespaceNode, NodeKind, Root, is_attribute_node,
    is_document_node, is_element_node, is_namespace_node, is_xpath_node,
};
pub use runtime::{Error, ErrorCode, ErrorKind};
pub use schema::{MapSchemaProxy, SchemaProxy};
pub use token::{Token, TokenValue};
pub use types::{ItemType, KindTest, Occurrence, SequenceType};
pub use xdm::{AtomicValue, ContextItem, ExpandedName, Item, Value, XdmSequence};
