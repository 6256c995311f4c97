//! `instance of` and `treat as`.

use crate::consts::XS;
use crate::model::{DocumentNode, ElementNode};
use crate::runtime::{Error, ErrorCode};
use crate::schema::SchemaProxy;
use crate::types::{ItemType, KindTest, SequenceType};
use crate::xdm::{AtomicValue, ExpandedName, Item, XdmSequence};

/// Built-in atomic types known without a schema.
pub(crate) const BUILTIN_ATOMIC_TYPES: &[&str] = &[
    "anyAtomicType",
    "string",
    "untypedAtomic",
    "anyURI",
    "boolean",
    "decimal",
    "integer",
    "double",
    "float",
];

pub(crate) fn is_builtin(name: &ExpandedName) -> bool {
    name.ns_uri.as_deref() == Some(XS) && BUILTIN_ATOMIC_TYPES.contains(&name.local.as_str())
}

/// True when every item matches the item type and the count satisfies the
/// occurrence indicator. `empty-sequence()` matches only the empty sequence.
pub fn instance_of<D: DocumentNode>(
    items: &[Item<D>],
    t: &SequenceType,
    schema: Option<&dyn SchemaProxy>,
) -> Result<bool, Error> {
    match t {
        SequenceType::EmptySequence => Ok(items.is_empty()),
        SequenceType::Typed { item, occ } => {
            if !occ.allows(items.len()) {
                return Ok(false);
            }
            for it in items {
                if !item_matches_type(it, item, schema)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

/// Return the sequence unchanged when it is an instance of `t`, else a type error.
pub fn treat_as<D: DocumentNode>(
    items: XdmSequence<D>,
    t: &SequenceType,
    schema: Option<&dyn SchemaProxy>,
) -> Result<XdmSequence<D>, Error> {
    if instance_of(&items, t, schema)? {
        Ok(items)
    } else {
        Err(Error::from_code(
            ErrorCode::XPDY0050,
            format!("a sequence of {} item(s) does not match the sequence type {t}", items.len()),
        ))
    }
}

pub fn item_matches_type<D: DocumentNode>(
    item: &Item<D>,
    t: &ItemType,
    schema: Option<&dyn SchemaProxy>,
) -> Result<bool, Error> {
    match (item, t) {
        (_, ItemType::Item) => Ok(true),
        (Item::Atomic(a), ItemType::Atomic(name)) => atomic_matches_name(a, name, schema),
        (Item::Atomic(_), ItemType::Kind(_)) => Ok(false),
        (_, ItemType::Atomic(name)) => {
            // Nodes never match an atomic type, but an unknown name is still an error.
            known_atomic_type(name, schema)?;
            Ok(false)
        }
        (node, ItemType::Kind(k)) => kind_matches(node, k, schema),
    }
}

pub fn kind_matches<D: DocumentNode>(
    item: &Item<D>,
    k: &KindTest,
    schema: Option<&dyn SchemaProxy>,
) -> Result<bool, Error> {
    Ok(match (k, item) {
        (_, Item::Atomic(_)) => false,
        (KindTest::AnyKind, _) => true,
        (KindTest::Document, node) => matches!(node, Item::Document(_)),
        (KindTest::Text, node) => matches!(node, Item::Text(_)),
        (KindTest::Element(name), Item::Element(e)) => name.as_ref().is_none_or(|n| e.name() == *n),
        (KindTest::Attribute(name), Item::Attribute(a)) => name.as_ref().is_none_or(|n| a.name == *n),
        (KindTest::SchemaElement(name), node) => {
            require_element_declaration(name, schema)?;
            matches!(node, Item::Element(e) if e.name() == *name)
        }
        (KindTest::SchemaAttribute(name), node) => {
            require_attribute_declaration(name, schema)?;
            matches!(node, Item::Attribute(a) if a.name == *name)
        }
        (KindTest::Element(_) | KindTest::Attribute(_), _) => false,
    })
}

pub(crate) fn require_element_declaration(
    name: &ExpandedName,
    schema: Option<&dyn SchemaProxy>,
) -> Result<ExpandedName, Error> {
    schema.and_then(|s| s.element_type(name)).ok_or_else(|| {
        Error::from_code(ErrorCode::XPST0008, format!("no element declaration in scope for {name}"))
    })
}

pub(crate) fn require_attribute_declaration(
    name: &ExpandedName,
    schema: Option<&dyn SchemaProxy>,
) -> Result<ExpandedName, Error> {
    schema.and_then(|s| s.attribute_type(name)).ok_or_else(|| {
        Error::from_code(ErrorCode::XPST0008, format!("no attribute declaration in scope for {name}"))
    })
}

fn known_atomic_type(name: &ExpandedName, schema: Option<&dyn SchemaProxy>) -> Result<(), Error> {
    if is_builtin(name) || schema.is_some_and(|s| s.has_type(name)) {
        Ok(())
    } else {
        Err(Error::from_code(ErrorCode::XPST0051, format!("unknown atomic type {name}")))
    }
}

pub fn atomic_matches_name(
    a: &AtomicValue,
    exp: &ExpandedName,
    schema: Option<&dyn SchemaProxy>,
) -> Result<bool, Error> {
    if is_builtin(exp) {
        return Ok(builtin_matches(a, &exp.local));
    }
    known_atomic_type(exp, schema)?;
    match schema.and_then(|s| s.is_instance(a, exp)) {
        Some(matched) => Ok(matched),
        None => Err(Error::from_code(ErrorCode::XPST0051, format!("schema cannot test instances of {exp}"))),
    }
}

pub(crate) fn builtin_matches(a: &AtomicValue, local: &str) -> bool {
    use AtomicValue::*;
    match local {
        "anyAtomicType" => true,
        "string" => matches!(a, String(_)),
        "untypedAtomic" => matches!(a, UntypedAtomic(_)),
        "anyURI" => matches!(a, AnyUri(_)),
        "boolean" => matches!(a, Boolean(_)),
        // integer is derived from decimal
        "decimal" => matches!(a, Decimal(_) | Integer(_)),
        "integer" => matches!(a, Integer(_)),
        "double" => matches!(a, Double(_)),
        "float" => matches!(a, Float(_)),
        _ => false,
    }
}
