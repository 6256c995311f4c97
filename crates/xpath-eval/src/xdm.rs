use crate::model::{AttributeNode, DocumentNode, NamespaceNode, NodeKind};
use core::fmt;
use rust_decimal::Decimal;

/// A namespace-qualified name. Displays in Clark notation (`{uri}local`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self { ns_uri, local: local.into() }
    }

    /// A name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(None, local)
    }

    pub fn ns(ns_uri: &str, local: impl Into<String>) -> Self {
        Self::new(Some(ns_uri.to_string()), local)
    }

    /// Parse Clark notation; a string without braces is a local name.
    pub fn from_clark(s: &str) -> Self {
        if let Some((ns, local)) = s.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
            return Self::ns(ns, local);
        }
        Self::local(s)
    }
}

impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns_uri {
            Some(ns) if !ns.is_empty() => write!(f, "{{{}}}{}", ns, self.local),
            _ => f.write_str(&self.local),
        }
    }
}

impl From<&str> for ExpandedName {
    fn from(s: &str) -> Self {
        Self::from_clark(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomicValue {
    Boolean(bool),
    String(String),
    UntypedAtomic(String),
    AnyUri(String),
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
    Float(f32),
}

impl AtomicValue {
    /// The `xs:` local name of the value's dynamic type.
    pub fn type_name(&self) -> &'static str {
        match self {
            AtomicValue::Boolean(_) => "boolean",
            AtomicValue::String(_) => "string",
            AtomicValue::UntypedAtomic(_) => "untypedAtomic",
            AtomicValue::AnyUri(_) => "anyURI",
            AtomicValue::Integer(_) => "integer",
            AtomicValue::Decimal(_) => "decimal",
            AtomicValue::Double(_) => "double",
            AtomicValue::Float(_) => "float",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AtomicValue::Integer(_) | AtomicValue::Decimal(_) | AtomicValue::Double(_) | AtomicValue::Float(_)
        )
    }

    /// Truthiness of a single atomic value. Empty strings, zero and NaN are false.
    pub fn truthiness(&self) -> bool {
        match self {
            AtomicValue::Boolean(b) => *b,
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) | AtomicValue::AnyUri(s) => !s.is_empty(),
            AtomicValue::Integer(i) => *i != 0,
            AtomicValue::Decimal(d) => !d.is_zero(),
            AtomicValue::Double(d) => *d != 0.0 && !d.is_nan(),
            AtomicValue::Float(f) => *f != 0.0 && !f.is_nan(),
        }
    }
}

/// Canonical lexical form of an `xs:double`.
pub(crate) fn format_double(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let abs = v.abs();
    if (1e-6..1e6).contains(&abs) {
        return format!("{v}");
    }
    let s = format!("{v:E}");
    match s.split_once('E') {
        Some((mantissa, exp)) if !mantissa.contains('.') => format!("{mantissa}.0E{exp}"),
        _ => s,
    }
}

impl fmt::Display for AtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomicValue::Boolean(b) => write!(f, "{b}"),
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) | AtomicValue::AnyUri(s) => f.write_str(s),
            AtomicValue::Integer(i) => write!(f, "{i}"),
            AtomicValue::Decimal(d) => write!(f, "{}", d.normalize()),
            AtomicValue::Double(d) => f.write_str(&format_double(*d)),
            AtomicValue::Float(v) => f.write_str(&format_double(f64::from(*v))),
        }
    }
}

impl From<bool> for AtomicValue {
    fn from(b: bool) -> Self {
        AtomicValue::Boolean(b)
    }
}

impl From<i64> for AtomicValue {
    fn from(i: i64) -> Self {
        AtomicValue::Integer(i)
    }
}

impl From<Decimal> for AtomicValue {
    fn from(d: Decimal) -> Self {
        AtomicValue::Decimal(d)
    }
}

impl From<f64> for AtomicValue {
    fn from(d: f64) -> Self {
        AtomicValue::Double(d)
    }
}

impl From<&str> for AtomicValue {
    fn from(s: &str) -> Self {
        AtomicValue::String(s.to_string())
    }
}

impl From<String> for AtomicValue {
    fn from(s: String) -> Self {
        AtomicValue::String(s)
    }
}

/// A single item. Node kinds are decided once, when the item is created by
/// the tree provider, so downstream code matches on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Item<D: DocumentNode> {
    Element(D::Element),
    Attribute(AttributeNode),
    Namespace(NamespaceNode),
    Document(D),
    /// Text content of an element.
    Text(String),
    Atomic(AtomicValue),
}

impl<D: DocumentNode> Item<D> {
    /// Node kind of the item; `None` for atomic values.
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            Item::Element(_) => Some(NodeKind::Element),
            Item::Attribute(_) => Some(NodeKind::Attribute),
            Item::Namespace(_) => Some(NodeKind::Namespace),
            Item::Document(_) => Some(NodeKind::Document),
            Item::Text(_) => Some(NodeKind::Text),
            Item::Atomic(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&D::Element> {
        match self {
            Item::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            Item::Atomic(a) => Some(a),
            _ => None,
        }
    }

    /// Native truthiness: atomic values and text by content, every other node is true.
    pub fn truthiness(&self) -> bool {
        match self {
            Item::Atomic(a) => a.truthiness(),
            Item::Text(t) => !t.is_empty(),
            _ => true,
        }
    }
}

impl<D: DocumentNode> From<AtomicValue> for Item<D> {
    fn from(a: AtomicValue) -> Self {
        Item::Atomic(a)
    }
}

impl<D: DocumentNode> From<AttributeNode> for Item<D> {
    fn from(a: AttributeNode) -> Self {
        Item::Attribute(a)
    }
}

impl<D: DocumentNode> From<NamespaceNode> for Item<D> {
    fn from(n: NamespaceNode) -> Self {
        Item::Namespace(n)
    }
}

pub type XdmSequence<D> = Vec<Item<D>>;

/// The context item: `None` means the context is positioned on the document.
pub type ContextItem<D> = Option<Item<D>>;

/// Result of evaluating a token.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<D: DocumentNode> {
    /// No item is selected; the evaluation is positioned on the document.
    DocumentPosition,
    /// A single bare item, not wrapped in a sequence.
    Item(Item<D>),
    Sequence(XdmSequence<D>),
}

impl<D: DocumentNode> Value<D> {
    pub fn empty() -> Self {
        Value::Sequence(Vec::new())
    }

    pub fn is_empty_sequence(&self) -> bool {
        matches!(self, Value::Sequence(s) if s.is_empty())
    }

    /// Flatten into a sequence. The document position has no item of its own
    /// and flattens to the empty sequence; resolve it against a context first
    /// when the document root matters.
    pub fn into_items(self) -> XdmSequence<D> {
        match self {
            Value::DocumentPosition => Vec::new(),
            Value::Item(item) => vec![item],
            Value::Sequence(items) => items,
        }
    }

    /// Collapse a sequence of exactly one item into a bare item.
    pub fn into_singleton(self) -> Self {
        match self {
            Value::Sequence(mut items) if items.len() == 1 => items.pop().map_or_else(Value::empty, Value::Item),
            other => other,
        }
    }
}

impl<D: DocumentNode> From<ContextItem<D>> for Value<D> {
    fn from(item: ContextItem<D>) -> Self {
        item.map_or(Value::DocumentPosition, Value::Item)
    }
}

impl<D: DocumentNode> From<Item<D>> for Value<D> {
    fn from(item: Item<D>) -> Self {
        Value::Item(item)
    }
}

impl<D: DocumentNode> From<XdmSequence<D>> for Value<D> {
    fn from(items: XdmSequence<D>) -> Self {
        Value::Sequence(items)
    }
}

impl<D: DocumentNode> From<AtomicValue> for Value<D> {
    fn from(a: AtomicValue) -> Self {
        Value::Item(Item::Atomic(a))
    }
}
