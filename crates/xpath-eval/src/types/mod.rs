//! Sequence types: item type plus occurrence indicator.
//!
//! The text form is parsed with a small pest grammar; see [`SequenceType::parse_with_namespaces`].
use core::fmt;
use core::str::FromStr;
use std::collections::HashMap;

use pest::Parser;
use pest::iterators::Pair;

use crate::consts::{XML_URI, XS, XSI};
use crate::runtime::{Error, ErrorCode};
use crate::xdm::ExpandedName;

pub mod cast;
pub mod check;

pub use cast::{cast_as, cast_atomic, castable_as};
pub use check::{instance_of, treat_as};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occurrence {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Occurrence {
    /// Whether a sequence of `count` items satisfies the indicator.
    pub fn allows(self, count: usize) -> bool {
        match self {
            Occurrence::One => count == 1,
            Occurrence::ZeroOrOne => count <= 1,
            Occurrence::ZeroOrMore => true,
            Occurrence::OneOrMore => count >= 1,
        }
    }

    pub fn allows_empty(self) -> bool {
        matches!(self, Occurrence::ZeroOrOne | Occurrence::ZeroOrMore)
    }

    pub fn allows_many(self) -> bool {
        matches!(self, Occurrence::ZeroOrMore | Occurrence::OneOrMore)
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Occurrence::One => "",
            Occurrence::ZeroOrOne => "?",
            Occurrence::ZeroOrMore => "*",
            Occurrence::OneOrMore => "+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindTest {
    AnyKind,
    Document,
    Text,
    /// `element()` or `element(*)` when the name is `None`.
    Element(Option<ExpandedName>),
    Attribute(Option<ExpandedName>),
    SchemaElement(ExpandedName),
    SchemaAttribute(ExpandedName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemType {
    Item,
    Kind(KindTest),
    Atomic(ExpandedName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceType {
    EmptySequence,
    Typed { item: ItemType, occ: Occurrence },
}

impl SequenceType {
    /// An `xs:` atomic type with the given occurrence.
    pub fn xs(local: &str, occ: Occurrence) -> Self {
        SequenceType::Typed { item: ItemType::Atomic(ExpandedName::ns(XS, local)), occ }
    }

    pub fn kind(test: KindTest, occ: Occurrence) -> Self {
        SequenceType::Typed { item: ItemType::Kind(test), occ }
    }

    /// Parse with the predeclared `xs`, `xsi` and `xml` prefixes plus `namespaces`.
    pub fn parse_with_namespaces(text: &str, namespaces: &HashMap<String, String>) -> Result<Self, Error> {
        let mut pairs = SequenceTypeParser::parse(Rule::sequence_type, text).map_err(|e| {
            Error::from_code(ErrorCode::XPST0003, format!("invalid sequence type {text:?}: {e}"))
        })?;
        let resolver = PrefixResolver { namespaces };
        let Some(root) = pairs.next() else {
            return Err(Error::from_code(ErrorCode::XPST0003, format!("empty sequence type {text:?}")));
        };
        let mut item = None;
        let mut occ = Occurrence::One;
        for pair in root.into_inner() {
            match pair.as_rule() {
                Rule::empty_sequence => return Ok(SequenceType::EmptySequence),
                Rule::item_type => item = Some(resolver.item_type(pair)?),
                Rule::occurrence => {
                    occ = match pair.as_str() {
                        "?" => Occurrence::ZeroOrOne,
                        "*" => Occurrence::ZeroOrMore,
                        _ => Occurrence::OneOrMore,
                    };
                }
                _ => {}
            }
        }
        item.map(|item| SequenceType::Typed { item, occ })
            .ok_or_else(|| Error::from_code(ErrorCode::XPST0003, format!("missing item type in {text:?}")))
    }
}

impl FromStr for SequenceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::parse_with_namespaces(s, &HashMap::new())
    }
}

#[derive(pest_derive::Parser)]
#[grammar = "sequence_type.pest"]
struct SequenceTypeParser;

struct PrefixResolver<'a> {
    namespaces: &'a HashMap<String, String>,
}

impl PrefixResolver<'_> {
    fn item_type(&self, pair: Pair<'_, Rule>) -> Result<ItemType, Error> {
        let Some(inner) = pair.into_inner().next() else {
            return Err(Error::from_code(ErrorCode::XPST0003, "empty item type"));
        };
        match inner.as_rule() {
            Rule::any_item => Ok(ItemType::Item),
            Rule::atomic_type => Ok(ItemType::Atomic(self.qname_in(inner)?)),
            Rule::kind_test => self.kind_test(inner).map(ItemType::Kind),
            other => Err(Error::from_code(ErrorCode::XPST0003, format!("unexpected {other:?} in item type"))),
        }
    }

    fn kind_test(&self, pair: Pair<'_, Rule>) -> Result<KindTest, Error> {
        let Some(test) = pair.into_inner().next() else {
            return Err(Error::from_code(ErrorCode::XPST0003, "empty kind test"));
        };
        let rule = test.as_rule();
        let name = test.into_inner().find(|p| p.as_rule() == Rule::qname).map(|p| self.qname(p)).transpose()?;
        match (rule, name) {
            (Rule::document_test, _) => Ok(KindTest::Document),
            (Rule::text_test, _) => Ok(KindTest::Text),
            (Rule::any_kind_test, _) => Ok(KindTest::AnyKind),
            (Rule::element_test, name) => Ok(KindTest::Element(name)),
            (Rule::attribute_test, name) => Ok(KindTest::Attribute(name)),
            (Rule::schema_element_test, Some(name)) => Ok(KindTest::SchemaElement(name)),
            (Rule::schema_attribute_test, Some(name)) => Ok(KindTest::SchemaAttribute(name)),
            (other, _) => Err(Error::from_code(ErrorCode::XPST0003, format!("unexpected {other:?} in kind test"))),
        }
    }

    fn qname_in(&self, pair: Pair<'_, Rule>) -> Result<ExpandedName, Error> {
        match pair.into_inner().next() {
            Some(q) => self.qname(q),
            None => Err(Error::from_code(ErrorCode::XPST0003, "missing type name")),
        }
    }

    fn qname(&self, pair: Pair<'_, Rule>) -> Result<ExpandedName, Error> {
        let parts: Vec<&str> = pair.into_inner().map(|p| p.as_str()).collect();
        match parts.as_slice() {
            [local] => Ok(ExpandedName::local(*local)),
            [prefix, local] => {
                let uri = self.resolve(prefix)?;
                Ok(ExpandedName::ns(&uri, *local))
            }
            _ => Err(Error::from_code(ErrorCode::XPST0003, "malformed QName")),
        }
    }

    fn resolve(&self, prefix: &str) -> Result<String, Error> {
        if let Some(uri) = self.namespaces.get(prefix) {
            return Ok(uri.clone());
        }
        match prefix {
            "xs" => Ok(XS.to_string()),
            "xsi" => Ok(XSI.to_string()),
            "xml" => Ok(XML_URI.to_string()),
            _ => Err(Error::from_code(ErrorCode::XPST0081, format!("namespace prefix {prefix:?} is not bound"))),
        }
    }
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &ExpandedName) -> fmt::Result {
    match name.ns_uri.as_deref() {
        Some(XS) => write!(f, "xs:{}", name.local),
        Some(XML_URI) => write!(f, "xml:{}", name.local),
        _ => write!(f, "{name}"),
    }
}

impl fmt::Display for KindTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (keyword, name) = match self {
            KindTest::AnyKind => ("node", None),
            KindTest::Document => ("document-node", None),
            KindTest::Text => ("text", None),
            KindTest::Element(name) => ("element", name.as_ref()),
            KindTest::Attribute(name) => ("attribute", name.as_ref()),
            KindTest::SchemaElement(name) => ("schema-element", Some(name)),
            KindTest::SchemaAttribute(name) => ("schema-attribute", Some(name)),
        };
        write!(f, "{keyword}(")?;
        if let Some(name) = name {
            write_name(f, name)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Item => f.write_str("item()"),
            ItemType::Kind(k) => write!(f, "{k}"),
            ItemType::Atomic(name) => write_name(f, name),
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceType::EmptySequence => f.write_str("empty-sequence()"),
            SequenceType::Typed { item, occ } => write!(f, "{item}{}", occ.indicator()),
        }
    }
}
