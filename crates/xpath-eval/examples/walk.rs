use xpath_eval::{
    context::XPathContext,
    model::{DocumentNode, ElementNode, Root, simple::SimpleDocument},
    token::Token,
    types::SequenceType,
    xdm::{AtomicValue, Item},
};

fn describe(item: &Option<Item<SimpleDocument>>) -> String {
    match item {
        None => "(document)".to_string(),
        Some(Item::Element(e)) => format!("<{}>", e.name()),
        Some(Item::Attribute(a)) => format!("@{}={:?}", a.name, a.value),
        Some(Item::Text(t)) => format!("text {t:?}"),
        Some(other) => format!("{other:?}"),
    }
}

fn main() -> Result<(), xpath_eval::runtime::Error> {
    let document = SimpleDocument::parse(
        r#"<catalog lang="en">Books<book id="b1" year="2001"><title>Dune</title></book><book id="b2"/></catalog>"#,
    )?;
    let mut ctx = XPathContext::new(Root::Document(document));

    println!("descendant-or-self:");
    for item in ctx.iter_descendants() {
        println!("  {}", describe(&item?));
    }

    let catalog = ctx.root().root_element();
    let first_book = catalog.children().into_iter().next();
    if let Some(book) = first_book {
        println!("first book:");
        for item in ctx.iter_children_from(Item::Element(book.clone())) {
            println!("  child {}", describe(&item?));
        }
        ctx.item = Some(Item::Element(book));
        for item in ctx.iter_attributes() {
            println!("  attribute {}", describe(&item?));
        }
    }

    ctx.set_variable("limit", AtomicValue::Integer(2));
    let books = Token::new("descendant-or-self::").with_child(Token::name_test("book"));
    let check = Token::new("instance")
        .with_child(Token::variable("limit"))
        .with_child(Token::sequence_type("xs:integer".parse::<SequenceType>()?));
    ctx.item = None;
    println!("{books} -> {:?}", books.evaluate(Some(&mut ctx))?.into_items().len());
    println!("{check} -> {:?}", check.evaluate(Some(&mut ctx))?);
    Ok(())
}
