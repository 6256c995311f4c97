use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use xpath_eval::context::XPathContext;
use xpath_eval::model::simple::{SimpleDocument, SimpleElement, elem};
use xpath_eval::model::{DocumentNode, Root};
use xpath_eval::token::Token;
use xpath_eval::types::{SequenceType, cast_as};
use xpath_eval::xdm::{AtomicValue, Item};

fn build_tree(sections: usize, items: usize) -> SimpleElement {
    let mut root = elem("root").attr("lang", "en");
    for s in 0..sections {
        let mut section = elem("section").attr("name", format!("s{s}"));
        for i in 0..items {
            section = section.child(
                elem("item")
                    .attr("id", format!("item-{s}-{i}"))
                    .attr("type", if i % 2 == 0 { "a" } else { "b" })
                    .text(format!("Item {i}")),
            );
        }
        root = root.child(section);
    }
    root.build()
}

fn benchmark_descendants(c: &mut Criterion) {
    let mut group = c.benchmark_group("axes/descendants");
    for size in [10, 50] {
        let root = build_tree(size, size);
        group.bench_with_input(BenchmarkId::from_parameter(size * size), &root, |b, root| {
            let mut ctx = XPathContext::<SimpleDocument>::new(Root::Element(root.clone()));
            b.iter(|| {
                let count = ctx.iter_descendants().filter(Result::is_ok).count();
                black_box(count);
            });
        });
    }
    group.finish();
}

fn benchmark_ancestors(c: &mut Criterion) {
    let root = build_tree(50, 50);
    let document = SimpleDocument::new(root);
    let leaves = document.iter_matching(&"item".into());
    let mut ctx = XPathContext::new(Root::Document(document));
    // First call builds the parent map; keep it out of the measurement.
    black_box(ctx.parent_map().len());
    c.bench_function("axes/ancestors", |b| {
        b.iter(|| {
            for leaf in &leaves {
                let count = ctx.iter_ancestors_from(Item::Element(leaf.clone())).count();
                black_box(count);
            }
        });
    });
}

fn benchmark_child_step(c: &mut Criterion) {
    let root = build_tree(20, 20);
    let mut ctx = XPathContext::<SimpleDocument>::new(Root::Element(root.clone()));
    ctx.item = Some(Item::Element(root));
    let child = Token::name_test("section");
    c.bench_function("token/child_step", |b| {
        b.iter(|| {
            let selected = child.select(&mut ctx).filter(Result::is_ok).count();
            black_box(selected);
        });
    });
}

fn benchmark_casts(c: &mut Criterion) {
    let target: SequenceType = "xs:integer*".parse().expect("valid sequence type");
    let inputs: Vec<Item<SimpleDocument>> =
        (0..1000).map(|i| Item::Atomic(AtomicValue::String(format!(" {i} ")))).collect();
    c.bench_function("types/cast_as", |b| {
        b.iter(|| {
            let result = cast_as(black_box(inputs.clone()), &target, None).map(|v| v.into_items().len());
            black_box(result.ok());
        });
    });
}

criterion_group!(benches, benchmark_descendants, benchmark_ancestors, benchmark_child_step, benchmark_casts);
criterion_main!(benches);
