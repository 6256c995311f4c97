//! Well-known namespace URIs.

/// XML Schema namespace (`xs:` prefix).
pub const XS: &str = "http://www.w3.org/2001/XMLSchema";
/// Namespace bound to the reserved `xml` prefix.
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";
/// XML Schema instance namespace (`xsi:` prefix).
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Namespace of W3C-defined XPath/XQuery error codes.
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";
