//! Schema proxy: the type oracle behind schema-aware sequence types.
//!
//! The core never loads XSD documents itself. Hosts with a schema processor
//! implement [`SchemaProxy`]; [`MapSchemaProxy`] covers tests and hosts that
//! only need a handful of declarations.
use std::collections::HashMap;

use crate::consts::XS;
use crate::runtime::{Error, ErrorCode};
use crate::types::cast::cast_builtin;
use crate::types::check::{builtin_matches, is_builtin};
use crate::xdm::{AtomicValue, ExpandedName};

pub trait SchemaProxy: Send + Sync {
    /// Declared type of a global element, `None` when no declaration exists.
    fn element_type(&self, name: &ExpandedName) -> Option<ExpandedName>;

    /// Declared type of a global attribute, `None` when no declaration exists.
    fn attribute_type(&self, name: &ExpandedName) -> Option<ExpandedName>;

    /// Whether `name` is an atomic type the schema knows.
    fn has_type(&self, name: &ExpandedName) -> bool;

    /// Instance test against a schema type. `None` defers to the caller, which
    /// reports the type as unknown.
    fn is_instance(&self, _value: &AtomicValue, _type_name: &ExpandedName) -> Option<bool> {
        None
    }

    /// Cast to a schema type. `None` when the schema cannot cast to it.
    fn cast_as(&self, _value: &AtomicValue, _type_name: &ExpandedName) -> Option<Result<AtomicValue, Error>> {
        None
    }
}

/// A user-defined simple type restricting a built-in `xs:` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleType {
    /// Local name of the built-in base type (`"integer"`, `"string"`, ...).
    pub base: String,
    /// Allowed values in canonical lexical form; `None` allows every base value.
    pub enumeration: Option<Vec<String>>,
}

impl SimpleType {
    fn admits(&self, value: &AtomicValue) -> bool {
        self.enumeration.as_ref().is_none_or(|allowed| allowed.iter().any(|v| *v == value.to_string()))
    }
}

/// In-memory schema built from explicit declarations.
#[derive(Debug, Clone, Default)]
pub struct MapSchemaProxy {
    elements: HashMap<ExpandedName, ExpandedName>,
    attributes: HashMap<ExpandedName, ExpandedName>,
    simple_types: HashMap<ExpandedName, SimpleType>,
}

impl MapSchemaProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, name: impl Into<ExpandedName>, type_name: impl Into<ExpandedName>) -> Self {
        self.elements.insert(name.into(), type_name.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<ExpandedName>, type_name: impl Into<ExpandedName>) -> Self {
        self.attributes.insert(name.into(), type_name.into());
        self
    }

    /// Declare a simple type derived from the built-in `xs:{base}`, optionally
    /// restricted to an enumeration.
    pub fn with_simple_type(
        mut self,
        name: impl Into<ExpandedName>,
        base: &str,
        enumeration: Option<Vec<String>>,
    ) -> Self {
        self.simple_types.insert(name.into(), SimpleType { base: base.to_string(), enumeration });
        self
    }

    pub fn simple_type(&self, name: &ExpandedName) -> Option<&SimpleType> {
        self.simple_types.get(name)
    }
}

impl SchemaProxy for MapSchemaProxy {
    fn element_type(&self, name: &ExpandedName) -> Option<ExpandedName> {
        self.elements.get(name).cloned()
    }

    fn attribute_type(&self, name: &ExpandedName) -> Option<ExpandedName> {
        self.attributes.get(name).cloned()
    }

    fn has_type(&self, name: &ExpandedName) -> bool {
        is_builtin(name) || self.simple_types.contains_key(name)
    }

    fn is_instance(&self, value: &AtomicValue, type_name: &ExpandedName) -> Option<bool> {
        if is_builtin(type_name) {
            return Some(builtin_matches(value, &type_name.local));
        }
        let st = self.simple_types.get(type_name)?;
        Some(builtin_matches(value, &st.base) && st.admits(value))
    }

    fn cast_as(&self, value: &AtomicValue, type_name: &ExpandedName) -> Option<Result<AtomicValue, Error>> {
        if type_name.ns_uri.as_deref() == Some(XS) {
            return None;
        }
        let st = self.simple_types.get(type_name)?;
        let result = cast_builtin(value.clone(), &st.base).and_then(|cast| {
            if st.admits(&cast) {
                Ok(cast)
            } else {
                Err(Error::from_code(ErrorCode::FORG0001, format!("{cast} is not a valid value of {type_name}")))
            }
        });
        Some(result)
    }
}
