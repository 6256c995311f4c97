use rstest::rstest;
use xpath_eval::model::simple::{SimpleDocument, SimpleElement, doc, elem};
use xpath_eval::model::{
    AttributeNode, DocumentNode, ElementNode, NamespaceNode, NodeKind, Root, collect_elements, is_attribute_node,
    is_document_node, is_element_node, is_namespace_node, is_xpath_node,
};
use xpath_eval::runtime::ErrorCode;
use xpath_eval::xdm::{AtomicValue, ExpandedName, Item, Value};

type V = Value<SimpleDocument>;

fn element(name: &str) -> V {
    Value::Item(Item::Element(elem(name).build()))
}

fn attribute() -> V {
    Value::Item(Item::Attribute(AttributeNode::new("id", "1")))
}

fn namespace() -> V {
    Value::Item(Item::Namespace(NamespaceNode::new("p", "urn:p")))
}

fn document() -> V {
    Value::Item(Item::Document(doc(elem("root"))))
}

//                                           xpath  element  document  attribute  namespace
#[rstest]
#[case::document_position(Value::DocumentPosition, [true, false, false, false, false])]
#[case::element(element("a"), [true, true, false, false, false])]
#[case::attribute(attribute(), [true, false, false, true, false])]
#[case::namespace(namespace(), [true, false, false, false, true])]
#[case::document(document(), [false, false, true, false, false])]
#[case::text(Value::Item(Item::Text("t".into())), [false, false, false, false, false])]
#[case::atomic(Value::from(AtomicValue::Integer(1)), [false, false, false, false, false])]
#[case::sequence(Value::Sequence(vec![Item::Element(elem("a").build())]), [false, false, false, false, false])]
fn predicate_table(#[case] value: V, #[case] expected: [bool; 5]) {
    let got = [
        is_xpath_node(&value),
        is_element_node(&value, None),
        is_document_node(&value),
        is_attribute_node(&value, None),
        is_namespace_node(&value),
    ];
    assert_eq!(got, expected);
}

#[rstest]
fn name_filters() {
    let a = element("a");
    assert!(is_element_node(&a, Some(&"a".into())));
    assert!(!is_element_node(&a, Some(&"b".into())));
    assert!(!is_element_node(&a, Some(&ExpandedName::ns("urn:x", "a"))));

    let id = attribute();
    assert!(is_attribute_node(&id, Some(&"id".into())));
    assert!(!is_attribute_node(&id, Some(&"class".into())));
    assert!(!is_attribute_node(&namespace(), Some(&"p".into())));
}

#[rstest]
fn node_kinds() {
    let kinds: Vec<Option<NodeKind>> = [
        Item::<SimpleDocument>::Element(elem("a").build()),
        Item::Attribute(AttributeNode::new("id", "1")),
        Item::Namespace(NamespaceNode::new("p", "urn:p")),
        Item::Text("t".into()),
        Item::Atomic(AtomicValue::Integer(1)),
    ]
    .iter()
    .map(Item::node_kind)
    .collect();
    assert_eq!(
        kinds,
        [Some(NodeKind::Element), Some(NodeKind::Attribute), Some(NodeKind::Namespace), Some(NodeKind::Text), None]
    );
}

#[rstest]
fn collect_elements_is_preorder() {
    let root = elem("r").child(elem("a").child(elem("c"))).child(elem("b")).build();
    let names: Vec<String> = collect_elements(&root).iter().map(|e| e.name().local).collect();
    assert_eq!(names, ["r", "a", "c", "b"]);
}

#[rstest]
fn collect_elements_ends_on_cycles() {
    let c = elem("c").build();
    let a = elem("a").child(c.clone()).build();
    let root = elem("r").child(a.clone()).build();
    c.push_child(a.clone());
    let names: Vec<String> = collect_elements(&root).iter().map(|e| e.name().local).collect();
    assert_eq!(names, ["r", "a", "c"]);
}

#[rstest]
fn root_conversions() {
    let e: SimpleElement = elem("r").build();
    let root = Root::<SimpleDocument>::try_from(Item::Element(e.clone())).unwrap();
    assert_eq!(root.root_element(), e);
    assert_eq!(root.to_item(), Item::Element(e.clone()));

    let d = SimpleDocument::new(e.clone());
    let root = Root::try_from(Item::Document(d.clone())).unwrap();
    assert_eq!(root.root_element(), e);
    assert_eq!(root.to_item(), Item::Document(d));

    let err = Root::<SimpleDocument>::try_from(Item::Text("t".into())).unwrap_err();
    assert_eq!(err.code, ErrorCode::FODC0001);
}

#[rstest]
fn iter_matching_filters_by_name() {
    let d = doc(elem("r").child(elem("a")).child(elem("b").child(elem("a"))));
    assert_eq!(d.iter().len(), 4);
    assert_eq!(d.iter_matching(&"a".into()).len(), 2);
    assert!(d.iter_matching(&"z".into()).is_empty());
}
