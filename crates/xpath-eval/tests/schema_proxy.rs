use std::collections::HashMap;
use std::sync::Arc;

use rstest::{fixture, rstest};
use xpath_eval::context::XPathContext;
use xpath_eval::model::simple::{SimpleDocument, elem};
use xpath_eval::model::{AttributeNode, Root};
use xpath_eval::runtime::ErrorCode;
use xpath_eval::schema::{MapSchemaProxy, SchemaProxy, SimpleType};
use xpath_eval::token::Token;
use xpath_eval::types::{SequenceType, cast_as, castable_as, instance_of};
use xpath_eval::xdm::{AtomicValue, ExpandedName, Item, Value, XdmSequence};

type Seq = XdmSequence<SimpleDocument>;

const T: &str = "urn:test";

fn color_type() -> SequenceType {
    let ns = HashMap::from([("t".to_string(), T.to_string())]);
    SequenceType::parse_with_namespaces("t:color", &ns).unwrap()
}

fn atom(value: impl Into<AtomicValue>) -> Seq {
    vec![Item::Atomic(value.into())]
}

#[fixture]
fn schema() -> MapSchemaProxy {
    MapSchemaProxy::new()
        .with_element("a", "{http://www.w3.org/2001/XMLSchema}string")
        .with_attribute("id", "{http://www.w3.org/2001/XMLSchema}integer")
        .with_simple_type(
            ExpandedName::ns(T, "color"),
            "string",
            Some(vec!["red".to_string(), "green".to_string()]),
        )
        .with_simple_type(ExpandedName::ns(T, "size"), "integer", None)
}

#[rstest]
fn declarations(schema: MapSchemaProxy) {
    assert_eq!(schema.element_type(&"a".into()), Some(ExpandedName::ns(xpath_eval::consts::XS, "string")));
    assert_eq!(schema.element_type(&"b".into()), None);
    assert!(schema.attribute_type(&"id".into()).is_some());
    assert!(schema.has_type(&ExpandedName::ns(T, "color")));
    assert!(schema.has_type(&ExpandedName::ns(xpath_eval::consts::XS, "decimal")));
    assert!(!schema.has_type(&ExpandedName::ns(T, "shape")));
    assert_eq!(
        schema.simple_type(&ExpandedName::ns(T, "size")),
        Some(&SimpleType { base: "integer".to_string(), enumeration: None })
    );
}

#[rstest]
#[case("red", true)]
#[case("green", true)]
#[case("blue", false)]
fn enumeration_instances(schema: MapSchemaProxy, #[case] value: &str, #[case] expected: bool) {
    assert_eq!(instance_of(&atom(value), &color_type(), Some(&schema)).unwrap(), expected);
}

#[rstest]
fn base_type_mismatch_is_not_an_instance(schema: MapSchemaProxy) {
    assert!(!instance_of(&atom(3_i64), &color_type(), Some(&schema)).unwrap());
    let ns = HashMap::from([("t".to_string(), T.to_string())]);
    let size = SequenceType::parse_with_namespaces("t:size+", &ns).unwrap();
    let sizes: Seq = vec![Item::Atomic(AtomicValue::Integer(1)), Item::Atomic(AtomicValue::Integer(2))];
    assert!(instance_of(&sizes, &size, Some(&schema)).unwrap());
}

#[rstest]
fn casts_through_the_schema(schema: MapSchemaProxy) {
    assert_eq!(
        cast_as(atom(" red "), &color_type(), Some(&schema)).unwrap(),
        Value::from(AtomicValue::from("red"))
    );
    let err = cast_as(atom("blue"), &color_type(), Some(&schema)).unwrap_err();
    assert_eq!(err.code, ErrorCode::FORG0001);
    assert!(castable_as(atom("green"), &color_type(), Some(&schema)).unwrap());
    assert!(!castable_as(atom("blue"), &color_type(), Some(&schema)).unwrap());
}

#[rstest]
fn user_types_without_a_schema_are_unknown() {
    let err = instance_of(&atom("red"), &color_type(), None).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0051);
    assert!(err.is_name_error());

    let err = cast_as(atom("red"), &color_type(), None).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0051);
}

#[rstest]
fn nodes_are_never_atomic_instances(schema: MapSchemaProxy) {
    let element: Seq = vec![Item::Element(elem("a").build())];
    assert!(!instance_of(&element, &color_type(), Some(&schema)).unwrap());
}

#[rstest]
fn schema_kind_tests(schema: MapSchemaProxy) {
    let element: Seq = vec![Item::Element(elem("a").build())];
    let attribute: Seq = vec![Item::Attribute(AttributeNode::new("id", "7"))];

    assert!(instance_of(&element, &"schema-element(a)".parse().unwrap(), Some(&schema)).unwrap());
    assert!(!instance_of(&attribute, &"schema-element(a)".parse().unwrap(), Some(&schema)).unwrap());
    assert!(instance_of(&attribute, &"schema-attribute(id)".parse().unwrap(), Some(&schema)).unwrap());

    let err = instance_of(&element, &"schema-element(b)".parse().unwrap(), Some(&schema)).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0008);
    let err = instance_of(&element, &"schema-element(a)".parse().unwrap(), None).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0008);
}

#[rstest]
fn context_carries_the_schema(schema: MapSchemaProxy) {
    let root = elem("a").build();
    let mut ctx = XPathContext::<SimpleDocument>::new(Root::Element(root));
    assert!(ctx.schema().is_none());

    let shared: Arc<dyn SchemaProxy> = Arc::new(schema);
    ctx.set_schema(Some(shared));
    let copy = ctx.copy();
    assert!(copy.schema().is_some_and(|s| s.element_type(&"a".into()).is_some()));

    let token = Token::new("instance").with_children([
        Token::literal(AtomicValue::from("red")),
        Token::sequence_type(color_type()),
    ]);
    assert_eq!(token.evaluate(Some(&mut ctx)).unwrap(), Value::from(AtomicValue::Boolean(true)));
}
