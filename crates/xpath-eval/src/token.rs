//! Expression-tree tokens and their evaluation protocol.
//!
//! A [`Token`] is a symbol, its child tokens and an optional literal value.
//! [`Token::evaluate`] produces a single value, [`Token::select`] a lazy
//! stream of values that moves the context cursor along the way. Symbols the
//! core does not know evaluate to their literal value and select it as a
//! singleton.
use core::fmt;

use crate::context::{Axis, AxisWalk, XPathContext};
use crate::model::{DocumentNode, ElementNode, Root, is_xpath_node};
use crate::runtime::{Error, ErrorCode};
use crate::types::check::{require_attribute_declaration, require_element_declaration};
use crate::types::{SequenceType, cast_as, castable_as, instance_of, treat_as};
use crate::xdm::{AtomicValue, ContextItem, ExpandedName, Item, Value, XdmSequence};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Atomic(AtomicValue),
    Name(ExpandedName),
    SequenceType(SequenceType),
}

impl TokenValue {
    /// Rendering used in messages: strings and names quoted, numbers bare.
    fn repr(&self) -> String {
        match self {
            TokenValue::Atomic(
                AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) | AtomicValue::AnyUri(s),
            ) => format!("'{s}'"),
            TokenValue::Atomic(other) => other.to_string(),
            TokenValue::Name(name) => format!("'{name}'"),
            TokenValue::SequenceType(t) => t.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub symbol: String,
    pub children: Vec<Token>,
    pub value: Option<TokenValue>,
}

/// Lazy stream returned by [`Token::select`].
pub type Selected<'a, D> = Box<dyn Iterator<Item = Result<Value<D>, Error>> + 'a>;

impl Token {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), children: Vec::new(), value: None }
    }

    /// Literal token; the symbol follows the value's type.
    pub fn literal(value: impl Into<AtomicValue>) -> Self {
        let value = value.into();
        let symbol = match value {
            AtomicValue::Integer(_) => "(integer)",
            AtomicValue::Decimal(_) => "(decimal)",
            AtomicValue::Double(_) | AtomicValue::Float(_) => "(double)",
            AtomicValue::Boolean(_) => "(boolean)",
            _ => "(string)",
        };
        Self { value: Some(TokenValue::Atomic(value)), ..Self::new(symbol) }
    }

    pub fn name_test(name: impl Into<ExpandedName>) -> Self {
        Self { value: Some(TokenValue::Name(name.into())), ..Self::new("(name)") }
    }

    pub fn sequence_type(t: SequenceType) -> Self {
        Self { value: Some(TokenValue::SequenceType(t)), ..Self::new("(sequence-type)") }
    }

    /// `$name`
    pub fn variable(name: impl Into<ExpandedName>) -> Self {
        Self::new("$").with_child(Self::name_test(name))
    }

    pub fn with_child(mut self, child: Token) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Token>) -> Self {
        self.children.extend(children);
        self
    }

    /// Evaluate to a single value. Tokens that depend on the dynamic context
    /// fail with `XPDY0002` when `ctx` is `None`.
    pub fn evaluate<D: DocumentNode>(&self, ctx: Option<&mut XPathContext<D>>) -> Result<Value<D>, Error> {
        match self.symbol.as_str() {
            "." => match ctx {
                Some(ctx) => Ok(Value::from(ctx.item.clone())),
                None => Err(self.missing_context()),
            },
            "$" => self.evaluate_variable(ctx),
            "," => {
                let mut ctx = ctx;
                let mut items = Vec::new();
                for child in &self.children {
                    let value = child.evaluate(ctx.as_deref_mut())?;
                    items.extend(flatten(ctx.as_deref(), value));
                }
                Ok(Value::Sequence(items))
            }
            "(" => match self.children.first() {
                Some(inner) => inner.evaluate(ctx),
                None => Ok(Value::empty()),
            },
            "schema-element(" | "schema-attribute(" => self.evaluate_schema_test(ctx),
            "boolean(" => {
                let items = self.operand_items(0, ctx)?;
                Ok(AtomicValue::Boolean(self.boolean(&Value::Sequence(items))?).into())
            }
            "name(" => {
                let value = match (self.children.first(), ctx) {
                    (Some(arg), ctx) => arg.evaluate(ctx)?.into_singleton(),
                    (None, Some(ctx)) => Value::from(ctx.item.clone()),
                    (None, None) => return Err(self.missing_context()),
                };
                Ok(AtomicValue::String(self.name(&value)?).into())
            }
            "instance" | "treat" | "cast" | "castable" => self.evaluate_type_operator(ctx),
            _ if self.step_axis().is_some() => match ctx {
                Some(ctx) => {
                    let values = self.select(&mut *ctx).collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::Sequence(step_items(ctx, values)))
                }
                None => Err(self.missing_context()),
            },
            _ => Ok(match &self.value {
                Some(TokenValue::Atomic(a)) => Value::from(a.clone()),
                _ => Value::empty(),
            }),
        }
    }

    /// Lazily produce the token's values, moving the context item to each.
    ///
    /// Steps delegate to the matching axis walk and keep the items that pass
    /// their node test; the cursor is restored once the stream is dropped.
    /// Every other token evaluates once and becomes the context item.
    pub fn select<'a, D>(&'a self, ctx: &'a mut XPathContext<D>) -> Selected<'a, D>
    where
        D: DocumentNode + 'a,
    {
        let Some(axis) = self.step_axis() else {
            return Box::new(std::iter::once_with(move || -> Result<Value<D>, Error> {
                let value = self.evaluate(Some(&mut *ctx))?;
                match &value {
                    Value::DocumentPosition => ctx.item = None,
                    Value::Item(item) => ctx.item = Some(item.clone()),
                    Value::Sequence(_) => {}
                }
                Ok(value)
            }));
        };
        let test = if self.symbol.ends_with("::") { self.children.first() } else { Some(self) };
        Box::new(NodeTestFilter { walk: ctx.walk(axis), test })
    }

    /// Axis walked by a step token: explicit axes, or the default axis of a
    /// bare node test.
    fn step_axis(&self) -> Option<Axis> {
        Some(match self.symbol.as_str() {
            "self::" => Axis::SelfAxis,
            "child::" | "*" | "(name)" | "element(" | "text(" | "node(" => Axis::Child,
            "descendant-or-self::" => Axis::Descendant,
            "ancestor::" => Axis::Ancestor,
            "attribute::" | "attribute(" => Axis::Attribute,
            _ => return None,
        })
    }

    /// Node test of a step, applied to the item an axis walk just moved to.
    pub fn matches_node<D: DocumentNode>(&self, item: &ContextItem<D>, ctx: &XPathContext<D>) -> bool {
        match (self.symbol.as_str(), item) {
            ("*", _) => ctx.principal_node_kind(),
            ("(name)", Some(Item::Element(e))) => ctx.principal_node_kind() && self.names(&e.name()),
            ("(name)", Some(Item::Attribute(a))) => ctx.principal_node_kind() && self.names(&a.name),
            ("node(", Some(item)) => item.node_kind().is_some(),
            ("node(", None) => true,
            ("text(", Some(Item::Text(_))) => true,
            ("element(", Some(Item::Element(e))) => self.kind_test_names(&e.name()),
            ("attribute(", Some(Item::Attribute(a))) => self.kind_test_names(&a.name),
            _ => false,
        }
    }

    fn names(&self, name: &ExpandedName) -> bool {
        matches!(&self.value, Some(TokenValue::Name(n)) if n == name)
    }

    /// `element()`, `element(*)` and `element(Q)` style name constraint.
    fn kind_test_names(&self, name: &ExpandedName) -> bool {
        match self.children.first() {
            Some(arg) if arg.symbol == "(name)" => arg.names(name),
            _ => true,
        }
    }

    /// Effective boolean value.
    ///
    /// The empty sequence is false and a sequence starting with a node is
    /// true. A single atomic item counts by its own truthiness; more than one
    /// is an error, as is a node that is not wrapped in a sequence.
    pub fn boolean<D: DocumentNode>(&self, value: &Value<D>) -> Result<bool, Error> {
        match value {
            Value::Sequence(items) => match items.as_slice() {
                [] => Ok(false),
                [Item::Element(_) | Item::Attribute(_) | Item::Namespace(_), ..] => Ok(true),
                [only] => Ok(only.truthiness()),
                _ => Err(self.ebv_error("not a test expression")),
            },
            Value::Item(item) if !is_xpath_node(value) => Ok(item.truthiness()),
            Value::Item(_) | Value::DocumentPosition => Err(self.ebv_error("not a test expression")),
        }
    }

    /// Name of an element or attribute in Clark notation. Documents,
    /// namespaces, sequences and truthy non-node values have the empty name.
    /// Falsy atomic values are a type error.
    pub fn name<D: DocumentNode>(&self, value: &Value<D>) -> Result<String, Error> {
        match value {
            Value::Item(Item::Element(e)) => Ok(e.name().to_string()),
            Value::Item(Item::Attribute(a)) => Ok(a.name.to_string()),
            Value::DocumentPosition | Value::Sequence(_) | Value::Item(Item::Document(_) | Item::Namespace(_)) => {
                Ok(String::new())
            }
            Value::Item(item) if item.truthiness() => Ok(String::new()),
            Value::Item(item) => Err(self.wrong_type(&format!("an XPath node required: {item:?}"))),
        }
    }

    /// Pass `value` through when it is a node, else fail with a type error.
    pub fn node<D: DocumentNode>(&self, value: Value<D>) -> Result<Value<D>, Error> {
        if is_xpath_node(&value) { Ok(value) } else { Err(self.wrong_type("an XPath node required")) }
    }

    pub fn missing_context(&self) -> Error {
        Error::from_code(ErrorCode::XPDY0002, format!("{self}: dynamic context required for evaluate"))
    }

    pub fn wrong_type(&self, message: &str) -> Error {
        Error::type_error(format!("{self}: {message}"))
    }

    fn ebv_error(&self, message: &str) -> Error {
        Error::from_code(ErrorCode::FORG0006, format!("{self}: {message}"))
    }

    fn missing_operand(&self) -> Error {
        Error::from_code(ErrorCode::XPST0003, format!("{self}: missing operand"))
    }

    fn operand_name(&self) -> Result<ExpandedName, Error> {
        match self.children.first().and_then(|c| c.value.as_ref()) {
            Some(TokenValue::Name(name)) => Ok(name.clone()),
            _ => Err(self.missing_operand()),
        }
    }

    /// Items of the `index`-th operand; the document position stands for the root.
    fn operand_items<D: DocumentNode>(
        &self,
        index: usize,
        ctx: Option<&mut XPathContext<D>>,
    ) -> Result<XdmSequence<D>, Error> {
        let operand = self.children.get(index).ok_or_else(|| self.missing_operand())?;
        let mut ctx = ctx;
        let value = operand.evaluate(ctx.as_deref_mut())?;
        Ok(flatten(ctx.as_deref(), value))
    }

    fn evaluate_variable<D: DocumentNode>(&self, ctx: Option<&mut XPathContext<D>>) -> Result<Value<D>, Error> {
        let name = self.operand_name()?;
        let Some(ctx) = ctx else {
            return Err(self.missing_context());
        };
        ctx.variable(&name)
            .cloned()
            .ok_or_else(|| Error::from_code(ErrorCode::XPST0008, format!("unknown variable ${name}")))
    }

    /// `schema-element(Q)` / `schema-attribute(Q)`: the context item when it
    /// is a node with that name, else the empty sequence. `Q` must be declared.
    fn evaluate_schema_test<D: DocumentNode>(&self, ctx: Option<&mut XPathContext<D>>) -> Result<Value<D>, Error> {
        let name = self.operand_name()?;
        let schema = ctx.as_deref().and_then(XPathContext::schema);
        let element = self.symbol == "schema-element(";
        if element {
            require_element_declaration(&name, schema)?;
        } else {
            require_attribute_declaration(&name, schema)?;
        }
        let Some(ctx) = ctx else {
            return Ok(Value::empty());
        };
        let matched = match &ctx.item {
            Some(Item::Element(e)) => element && e.name() == name,
            Some(Item::Attribute(a)) => !element && a.name == name,
            _ => false,
        };
        Ok(if matched { Value::from(ctx.item.clone()) } else { Value::empty() })
    }

    fn evaluate_type_operator<D: DocumentNode>(&self, ctx: Option<&mut XPathContext<D>>) -> Result<Value<D>, Error> {
        let target = match self.children.get(1).and_then(|c| c.value.as_ref()) {
            Some(TokenValue::SequenceType(t)) => t,
            _ => return Err(self.missing_operand()),
        };
        let mut ctx = ctx;
        let items = self.operand_items(0, ctx.as_deref_mut())?;
        let schema = ctx.as_deref().and_then(XPathContext::schema);
        match self.symbol.as_str() {
            "instance" => Ok(AtomicValue::Boolean(instance_of(&items, target, schema)?).into()),
            "treat" => Ok(Value::Sequence(treat_as(items, target, schema)?)),
            "castable" => Ok(AtomicValue::Boolean(castable_as(items, target, schema)?).into()),
            _ => cast_as(items, target, schema),
        }
    }
}

/// Flatten step results. Under an element root the document position stands
/// for the root element, so it is dropped when that element was selected too.
fn step_items<D: DocumentNode>(ctx: &XPathContext<D>, values: Vec<Value<D>>) -> XdmSequence<D> {
    let root_selected = match ctx.root() {
        Root::Element(root) => values.iter().any(|v| matches!(v, Value::Item(Item::Element(e)) if e == root)),
        Root::Document(_) => false,
    };
    values
        .into_iter()
        .filter(|v| !(root_selected && matches!(v, Value::DocumentPosition)))
        .flat_map(|v| ctx.resolve(v))
        .collect()
}

fn flatten<D: DocumentNode>(ctx: Option<&XPathContext<D>>, value: Value<D>) -> XdmSequence<D> {
    match ctx {
        Some(ctx) => ctx.resolve(value),
        None => value.into_items(),
    }
}

struct NodeTestFilter<'a, D: DocumentNode> {
    walk: AxisWalk<'a, D>,
    test: Option<&'a Token>,
}

impl<D: DocumentNode> Iterator for NodeTestFilter<'_, D> {
    type Item = Result<Value<D>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.walk.next()? {
                Ok(item) => item,
                Err(e) => return Some(Err(e)),
            };
            if self.test.is_none_or(|t| t.matches_node(&item, self.walk.context())) {
                return Some(Ok(Value::from(item)));
            }
        }
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphabetic() || c == '-')
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.symbol.as_str();
        if symbol == "$" {
            let name = self.children.first().and_then(|c| c.value.as_ref());
            return match name {
                Some(TokenValue::Name(name)) => write!(f, "${name} variable reference"),
                _ => f.write_str("$ variable reference"),
            };
        }
        if symbol == "," {
            return f.write_str("comma operator");
        }
        if let Some(name) = symbol.strip_suffix('(').filter(|n| is_word(n)) {
            let args: Vec<String> = self
                .children
                .iter()
                .map(|c| c.value.as_ref().map_or_else(|| c.to_string(), TokenValue::repr))
                .collect();
            return write!(f, "{name}({}) function", args.join(", "));
        }
        if let Some(name) = symbol.strip_suffix("::").filter(|n| is_word(n)) {
            return write!(f, "{name} axis");
        }
        match (symbol, &self.value) {
            ("(name)", Some(value)) => write!(f, "{} name", value.repr()),
            ("(integer)" | "(decimal)" | "(double)" | "(string)" | "(boolean)", Some(value)) => {
                write!(f, "{} {} literal", value.repr(), &symbol[1..symbol.len() - 1])
            }
            _ => write!(f, "'{symbol}' operator"),
        }
    }
}
