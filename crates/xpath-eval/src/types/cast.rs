//! `cast as` and `castable as`.
//!
//! Wrong shape (cardinality, non-castable type pair) is a type-kind error;
//! wrong content (lexical form, out-of-range value) is a value-kind error.

use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::consts::XS;
use crate::model::{DocumentNode, ElementNode, collect_elements};
use crate::runtime::{Error, ErrorCode, ErrorKind};
use crate::schema::SchemaProxy;
use crate::types::check::is_builtin;
use crate::types::{ItemType, Occurrence, SequenceType};
use crate::xdm::{AtomicValue, ExpandedName, Item, Value, XdmSequence};

/// Cast every item of `items` to the atomic type of `target`.
///
/// A singular target (`T` or `T?`) yields a bare item, a starred or plussed
/// target a sequence. Only a `T?` target accepts the empty sequence; for any
/// other target an empty input is `FORG0005`.
pub fn cast_as<D: DocumentNode>(
    items: XdmSequence<D>,
    target: &SequenceType,
    schema: Option<&dyn SchemaProxy>,
) -> Result<Value<D>, Error> {
    let (name, occ) = match target {
        SequenceType::Typed { item: ItemType::Atomic(name), occ } => (name, *occ),
        other => return Err(Error::type_error(format!("cast target must be an atomic type, not {other}"))),
    };
    match items.len() {
        0 if occ == Occurrence::ZeroOrOne => return Ok(Value::empty()),
        0 => {
            return Err(Error::from_code(
                ErrorCode::FORG0005,
                format!("an empty sequence cannot be cast to {target}"),
            ));
        }
        n if n > 1 && !occ.allows_many() => {
            return Err(Error::type_error(format!("a sequence of {n} items cannot be cast to {target}")));
        }
        _ => {}
    }
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(Item::Atomic(cast_atomic(atomize(item), name, schema)?));
    }
    if occ.allows_many() { Ok(Value::Sequence(out)) } else { Ok(Value::Sequence(out).into_singleton()) }
}

/// Whether [`cast_as`] would succeed. Type and value errors mean `false`;
/// unresolvable names still propagate.
pub fn castable_as<D: DocumentNode>(
    items: XdmSequence<D>,
    target: &SequenceType,
    schema: Option<&dyn SchemaProxy>,
) -> Result<bool, Error> {
    match cast_as(items, target, schema) {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind(), ErrorKind::Type | ErrorKind::Value) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Typed value of an item. Nodes atomize to `xs:untypedAtomic`.
pub fn atomize<D: DocumentNode>(item: Item<D>) -> AtomicValue {
    match item {
        Item::Atomic(a) => a,
        Item::Text(t) => AtomicValue::UntypedAtomic(t),
        Item::Attribute(a) => AtomicValue::UntypedAtomic(a.value),
        Item::Namespace(ns) => AtomicValue::String(ns.uri),
        Item::Element(e) => AtomicValue::UntypedAtomic(string_value(&e)),
        Item::Document(d) => AtomicValue::UntypedAtomic(string_value(&d.root_element())),
    }
}

/// Concatenated text of an element and its descendants, in document order.
pub fn string_value<E: ElementNode>(elem: &E) -> String {
    collect_elements(elem).iter().filter_map(ElementNode::text).collect()
}

pub fn cast_atomic(
    value: AtomicValue,
    target: &ExpandedName,
    schema: Option<&dyn SchemaProxy>,
) -> Result<AtomicValue, Error> {
    if is_builtin(target) {
        return cast_builtin(value, &target.local);
    }
    if target.ns_uri.as_deref() != Some(XS)
        && let Some(result) = schema.and_then(|s| s.cast_as(&value, target))
    {
        return result;
    }
    Err(Error::from_code(ErrorCode::XPST0051, format!("unknown atomic type {target}")))
}

fn not_castable(value: &AtomicValue, target: &str) -> Error {
    Error::type_error(format!("xs:{} cannot be cast to xs:{target}", value.type_name()))
}

fn invalid_lexical(text: &str, target: &str) -> Error {
    Error::from_code(ErrorCode::FORG0001, format!("invalid lexical value {text:?} for xs:{target}"))
}

fn out_of_range(value: &AtomicValue, target: &str) -> Error {
    Error::from_code(ErrorCode::FOCA0001, format!("{value} is out of range for xs:{target}"))
}

/// String content of `xs:string`/`xs:untypedAtomic`, whitespace-collapsed at the edges.
fn lexical<'a>(value: &'a AtomicValue, target: &str) -> Result<&'a str, Error> {
    match value {
        AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => Ok(s.trim()),
        other => Err(not_castable(other, target)),
    }
}

// Rust's float parser also takes words like "inf" or "infinity".
fn parse_float_lexical(text: &str, target: &str) -> Result<f64, Error> {
    match text {
        "INF" | "+INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ if text.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            Err(invalid_lexical(text, target))
        }
        _ => text.parse::<f64>().map_err(|_| invalid_lexical(text, target)),
    }
}

pub(crate) fn cast_builtin(value: AtomicValue, target: &str) -> Result<AtomicValue, Error> {
    use AtomicValue::*;
    match target {
        "anyAtomicType" => Ok(value),
        "string" => Ok(String(value.to_string())),
        "untypedAtomic" => Ok(UntypedAtomic(value.to_string())),
        "anyURI" => match value {
            AnyUri(u) => Ok(AnyUri(u)),
            other => lexical(&other, target).map(|s| AnyUri(s.to_string())),
        },
        "boolean" => match value {
            Boolean(b) => Ok(Boolean(b)),
            AnyUri(_) => Err(not_castable(&value, target)),
            String(_) | UntypedAtomic(_) => match lexical(&value, target)? {
                "true" | "1" => Ok(Boolean(true)),
                "false" | "0" => Ok(Boolean(false)),
                other => Err(invalid_lexical(other, target)),
            },
            numeric => Ok(Boolean(numeric.truthiness())),
        },
        "integer" => match value {
            Integer(i) => Ok(Integer(i)),
            Boolean(b) => Ok(Integer(i64::from(b))),
            Decimal(d) => d.trunc().to_i64().map(Integer).ok_or_else(|| out_of_range(&value, target)),
            Double(d) => float_to_integer(d, &value, target),
            Float(f) => float_to_integer(f64::from(f), &value, target),
            String(_) | UntypedAtomic(_) => {
                let text = lexical(&value, target)?;
                text.parse::<i64>().map(Integer).map_err(|_| invalid_lexical(text, target))
            }
            AnyUri(_) => Err(not_castable(&value, target)),
        },
        "decimal" => match value {
            Decimal(d) => Ok(Decimal(d)),
            Integer(i) => Ok(Decimal(rust_decimal::Decimal::from(i))),
            Boolean(b) => Ok(Decimal(rust_decimal::Decimal::from(u8::from(b)))),
            Double(d) => float_to_decimal(d, &value, target),
            Float(f) => float_to_decimal(f64::from(f), &value, target),
            String(_) | UntypedAtomic(_) => {
                let text = lexical(&value, target)?;
                if text.contains(['e', 'E']) {
                    return Err(invalid_lexical(text, target));
                }
                rust_decimal::Decimal::from_str(text).map(Decimal).map_err(|_| invalid_lexical(text, target))
            }
            AnyUri(_) => Err(not_castable(&value, target)),
        },
        "double" => match value {
            Double(d) => Ok(Double(d)),
            Float(f) => Ok(Double(f64::from(f))),
            Integer(i) => Ok(Double(i as f64)),
            Decimal(d) => Ok(Double(d.to_f64().unwrap_or(f64::NAN))),
            Boolean(b) => Ok(Double(if b { 1.0 } else { 0.0 })),
            String(_) | UntypedAtomic(_) => parse_float_lexical(lexical(&value, target)?, target).map(Double),
            AnyUri(_) => Err(not_castable(&value, target)),
        },
        "float" => match value {
            Float(f) => Ok(Float(f)),
            Double(d) => Ok(Float(d as f32)),
            Integer(i) => Ok(Float(i as f32)),
            Decimal(d) => Ok(Float(d.to_f32().unwrap_or(f32::NAN))),
            Boolean(b) => Ok(Float(if b { 1.0 } else { 0.0 })),
            String(_) | UntypedAtomic(_) => {
                parse_float_lexical(lexical(&value, target)?, target).map(|v| Float(v as f32))
            }
            AnyUri(_) => Err(not_castable(&value, target)),
        },
        other => Err(Error::from_code(ErrorCode::XPST0051, format!("unknown atomic type xs:{other}"))),
    }
}

fn float_to_integer(v: f64, value: &AtomicValue, target: &str) -> Result<AtomicValue, Error> {
    let t = v.trunc();
    // i64::MAX is not representable as f64; the bound is exclusive.
    if !t.is_finite() || t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return Err(out_of_range(value, target));
    }
    Ok(AtomicValue::Integer(t as i64))
}

fn float_to_decimal(v: f64, value: &AtomicValue, target: &str) -> Result<AtomicValue, Error> {
    if !v.is_finite() {
        return Err(out_of_range(value, target));
    }
    Decimal::from_f64(v).map(AtomicValue::Decimal).ok_or_else(|| out_of_range(value, target))
}
