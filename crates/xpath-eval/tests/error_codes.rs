use std::error::Error as _;
use std::sync::Arc;

use rstest::rstest;
use xpath_eval::consts::ERR_NS;
use xpath_eval::runtime::{Error, ErrorCode, ErrorKind};
use xpath_eval::xdm::ExpandedName;

#[rstest]
#[case(ErrorCode::XPTY0004, ErrorKind::Type)]
#[case(ErrorCode::XPDY0050, ErrorKind::Type)]
#[case(ErrorCode::FORG0006, ErrorKind::Type)]
#[case(ErrorCode::XPDY0002, ErrorKind::Value)]
#[case(ErrorCode::FORG0001, ErrorKind::Value)]
#[case(ErrorCode::FOCA0001, ErrorKind::Value)]
#[case(ErrorCode::FORG0005, ErrorKind::Value)]
#[case(ErrorCode::FOER0000, ErrorKind::Value)]
#[case(ErrorCode::FODC0006, ErrorKind::Value)]
#[case(ErrorCode::FODC0001, ErrorKind::Value)]
#[case(ErrorCode::XPST0008, ErrorKind::Name)]
#[case(ErrorCode::XPST0051, ErrorKind::Name)]
#[case(ErrorCode::XPST0081, ErrorKind::Name)]
#[case(ErrorCode::XPST0003, ErrorKind::Syntax)]
fn every_code_has_one_kind(#[case] code: ErrorCode, #[case] kind: ErrorKind) {
    assert_eq!(code.kind(), kind);
    let err = Error::from_code(code, "m");
    assert_eq!(err.kind(), kind);
    assert_eq!(err.is_type_error(), kind == ErrorKind::Type);
    assert_eq!(err.is_value_error(), kind == ErrorKind::Value);
    assert_eq!(err.is_name_error(), kind == ErrorKind::Name);
}

#[rstest]
fn display_carries_message_and_code() {
    let err = Error::from_code(ErrorCode::FORG0006, "invalid argument type");
    assert_eq!(err.to_string(), "error: invalid argument type (err:FORG0006)");
    assert_eq!(err.format_code(), "err:FORG0006");
    assert_eq!(Error::type_error("x").code, ErrorCode::XPTY0004);
}

#[rstest]
fn codes_live_in_the_error_namespace() {
    assert_eq!(ErrorCode::FOER0000.qname(), ExpandedName::ns(ERR_NS, "FOER0000"));
    assert_eq!(ErrorCode::XPST0081.as_str(), "XPST0081");
}

#[rstest]
fn sources_are_chained() {
    let cause = std::io::Error::other("disk");
    let err = Error::from_code(ErrorCode::FODC0006, "cannot read")
        .with_source(Some(Arc::new(cause) as Arc<dyn std::error::Error + Send + Sync>));
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk"));
    assert!(Error::from_code(ErrorCode::FODC0006, "x").source().is_none());
}
