use std::error::Error as _;

use rstest::rstest;
use xpath_eval::context::XPathContext;
use xpath_eval::model::simple::{SimpleDocument, elem};
use xpath_eval::model::{DocumentNode, ElementNode, Root};
use xpath_eval::runtime::{ErrorCode, ErrorKind};
use xpath_eval::xdm::{ExpandedName, Item};

const SOURCE: &str = r#"<p:root xmlns:p="urn:p" p:id="1" plain="x">head<p:a>alpha</p:a>tail<b/></p:root>"#;

#[rstest]
fn parses_names_and_namespaces() {
    let d = SimpleDocument::parse(SOURCE).unwrap();
    let root = d.root_element();
    assert_eq!(root.name(), ExpandedName::ns("urn:p", "root"));
    let mut attributes = root.attributes();
    attributes.sort();
    assert_eq!(
        attributes,
        [(ExpandedName::local("plain"), "x".to_string()), (ExpandedName::ns("urn:p", "id"), "1".to_string())]
    );
    let children: Vec<ExpandedName> = root.children().iter().map(ElementNode::name).collect();
    assert_eq!(children, [ExpandedName::ns("urn:p", "a"), ExpandedName::local("b")]);
}

#[rstest]
fn text_is_only_the_leading_run() {
    let d = SimpleDocument::parse(SOURCE).unwrap();
    let root = d.root_element();
    assert_eq!(root.text().as_deref(), Some("head"));
    assert_eq!(root.children()[0].text().as_deref(), Some("alpha"));
    assert_eq!(root.children()[1].text(), None);
}

#[rstest]
fn elements_compare_by_identity() {
    let a = elem("a").build();
    let b = elem("a").build();
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
}

#[rstest]
fn malformed_source_is_a_value_error() {
    let err = SimpleDocument::parse("<a><b></a>").unwrap_err();
    assert_eq!(err.code, ErrorCode::FODC0006);
    assert_eq!(err.kind(), ErrorKind::Value);
    assert!(err.source().is_some());
}

#[rstest]
fn parsed_documents_walk_like_built_ones() {
    let d = SimpleDocument::parse(SOURCE).unwrap();
    let mut ctx = XPathContext::new(Root::Document(d));
    let names: Vec<String> = ctx
        .iter_descendants()
        .filter_map(|r| match r.unwrap() {
            Some(Item::Element(e)) => Some(e.name().local),
            _ => None,
        })
        .collect();
    assert_eq!(names, ["root", "a", "b"]);
}
