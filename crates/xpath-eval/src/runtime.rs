use crate::consts::ERR_NS;
use crate::xdm::ExpandedName;
use core::fmt;
use std::sync::Arc;

/// Error codes raised by the evaluation core.
///
/// Each code belongs to exactly one [`ErrorKind`]; see [`ErrorCode::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Type kind
    XPTY0004, // wrong item category or cardinality
    XPDY0050, // treat as: dynamic type does not match
    FORG0006, // effective boolean value undefined
    // Value kind
    XPDY0002, // dynamic context required
    FORG0001, // invalid lexical form for cast
    FOCA0001, // value out of range for cast target
    FORG0005, // empty sequence where exactly one item is required
    FOER0000, // structural integrity violation (cyclic tree)
    FODC0006, // source is not a well-formed document
    FODC0001, // evaluation root is not an element or a document
    // Name kind
    XPST0008, // unknown schema declaration or variable
    XPST0051, // unknown atomic type
    XPST0081, // unbound namespace prefix
    // Syntax kind
    XPST0003, // malformed sequence type text
}

/// Coarse error category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operand has the wrong category or cardinality.
    Type,
    /// Missing context, bad lexical form, or malformed input.
    Value,
    /// A name (variable, declaration, type, prefix) could not be resolved.
    Name,
    /// Text handed to a parser is malformed.
    Syntax,
}

impl ErrorCode {
    pub fn kind(self) -> ErrorKind {
        use ErrorCode::*;
        match self {
            XPTY0004 | XPDY0050 | FORG0006 => ErrorKind::Type,
            XPDY0002 | FORG0001 | FOCA0001 | FORG0005 | FOER0000 | FODC0006 | FODC0001 => ErrorKind::Value,
            XPST0008 | XPST0051 | XPST0081 => ErrorKind::Name,
            XPST0003 => ErrorKind::Syntax,
        }
    }

    pub fn as_str(self) -> &'static str {
        use ErrorCode::*;
        match self {
            XPTY0004 => "XPTY0004",
            XPDY0050 => "XPDY0050",
            FORG0006 => "FORG0006",
            XPDY0002 => "XPDY0002",
            FORG0001 => "FORG0001",
            FOCA0001 => "FOCA0001",
            FORG0005 => "FORG0005",
            FOER0000 => "FOER0000",
            FODC0006 => "FODC0006",
            FODC0001 => "FODC0001",
            XPST0008 => "XPST0008",
            XPST0051 => "XPST0051",
            XPST0081 => "XPST0081",
            XPST0003 => "XPST0003",
        }
    }

    /// Returns the QName of this code in the xqt-errors namespace.
    pub fn qname(self) -> ExpandedName {
        ExpandedName::new(Some(ERR_NS.to_string()), self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), source: None }
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::XPTY0004, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    pub fn is_value_error(&self) -> bool {
        self.kind() == ErrorKind::Value
    }

    pub fn is_name_error(&self) -> bool {
        self.kind() == ErrorKind::Name
    }

    /// Compose an error with a source cause.
    pub fn with_source(mut self, source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>) -> Self {
        self.source = source.into();
        self
    }

    pub fn format_code(&self) -> String {
        format!("err:{}", self.code.as_str())
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::from_code(ErrorCode::FODC0006, e.to_string())
            .with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} ({})", self.message, self.format_code())
    }
}
